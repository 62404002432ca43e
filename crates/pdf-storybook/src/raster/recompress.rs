//! JPEG recompression with a pixel budget

use super::RasterImage;
use crate::types::*;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, Rgb, RgbImage};

/// Encodings the recompressor produces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageEncoding {
    Jpeg,
}

/// An encoded image ready to be embedded as an Image XObject
#[derive(Debug, Clone, PartialEq)]
pub struct CompressedImage {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub quality: u8,
}

impl CompressedImage {
    pub fn encoding(&self) -> ImageEncoding {
        ImageEncoding::Jpeg
    }

    pub fn byte_size(&self) -> usize {
        self.data.len()
    }
}

/// Check recompression parameters
pub fn validate_quality(quality: u8, max_dimension: u32) -> Result<()> {
    if !(1..=100).contains(&quality) {
        return Err(PipelineError::Config(format!(
            "quality must be between 1 and 100, got {}",
            quality
        )));
    }
    if max_dimension == 0 {
        return Err(PipelineError::Config(
            "max_dimension must be at least 1 pixel".to_string(),
        ));
    }
    Ok(())
}

/// Downscale to `max_dimension`, flatten onto white and encode as JPEG
pub fn recompress(image: RasterImage, quality: u8, max_dimension: u32) -> Result<CompressedImage> {
    validate_quality(quality, max_dimension)?;

    let image = image.into_image();
    let (width, height) = fit_within(image.width(), image.height(), max_dimension);
    let image = if (width, height) != (image.width(), image.height()) {
        image.resize_exact(width, height, FilterType::Lanczos3)
    } else {
        image
    };

    let rgb = flatten_onto_white(&image);
    let mut data = Vec::new();
    JpegEncoder::new_with_quality(&mut data, quality).encode_image(&rgb)?;

    Ok(CompressedImage {
        data,
        width: rgb.width(),
        height: rgb.height(),
        quality,
    })
}

/// Largest size within `max_dimension` on the longer side, keeping aspect ratio
pub fn fit_within(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    let longest = width.max(height);
    if longest <= max_dimension {
        return (width, height);
    }
    let ratio = max_dimension as f64 / longest as f64;
    let scale = |v: u32| ((v as f64 * ratio).round() as u32).clamp(1, max_dimension);
    if width >= height {
        (max_dimension, scale(height))
    } else {
        (scale(width), max_dimension)
    }
}

/// Convert to RGB, compositing any alpha over white: `c' = c·a + 255·(1 − a)`
pub fn flatten_onto_white(image: &DynamicImage) -> RgbImage {
    if !image.color().has_alpha() {
        return image.to_rgb8();
    }

    let rgba = image.to_rgba8();
    let mut rgb = RgbImage::new(rgba.width(), rgba.height());
    for (dst, src) in rgb.pixels_mut().zip(rgba.pixels()) {
        let [r, g, b, a] = src.0;
        let a = a as u32;
        let blend = |c: u8| ((c as u32 * a + 255 * (255 - a) + 127) / 255) as u8;
        *dst = Rgb([blend(r), blend(g), blend(b)]);
    }
    rgb
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgba, RgbaImage};

    fn gradient(width: u32, height: u32) -> RasterImage {
        let img = RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x * 7 % 256) as u8, (y * 5 % 256) as u8, ((x ^ y) % 256) as u8])
        });
        RasterImage::new(DynamicImage::ImageRgb8(img))
    }

    #[test]
    fn test_fit_within_keeps_aspect() {
        assert_eq!(fit_within(4000, 2000, 2000), (2000, 1000));
        assert_eq!(fit_within(1000, 3000, 1500), (500, 1500));
        assert_eq!(fit_within(800, 600, 2000), (800, 600));
        assert_eq!(fit_within(10000, 1, 100), (100, 1));
    }

    #[test]
    fn test_downscale_longest_side() {
        let out = recompress(gradient(300, 150), 85, 100).unwrap();
        assert_eq!((out.width, out.height), (100, 50));
        assert_eq!(out.encoding(), ImageEncoding::Jpeg);
        assert_eq!(&out.data[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_lower_quality_is_not_larger() {
        let low = recompress(gradient(256, 256), 70, 2000).unwrap();
        let high = recompress(gradient(256, 256), 95, 2000).unwrap();
        assert!(low.byte_size() <= high.byte_size());
    }

    #[test]
    fn test_deterministic() {
        let a = recompress(gradient(64, 64), 80, 2000).unwrap();
        let b = recompress(gradient(64, 64), 80, 2000).unwrap();
        assert_eq!(a.data, b.data);
    }

    #[test]
    fn test_alpha_flattened_against_white() {
        let mut img = RgbaImage::from_pixel(2, 1, Rgba([0, 0, 0, 0]));
        img.put_pixel(1, 0, Rgba([0, 0, 0, 255]));
        let rgb = flatten_onto_white(&DynamicImage::ImageRgba8(img));
        assert_eq!(rgb.get_pixel(0, 0).0, [255, 255, 255]);
        assert_eq!(rgb.get_pixel(1, 0).0, [0, 0, 0]);
    }

    #[test]
    fn test_gray_expands_to_rgb() {
        let img = GrayImage::from_pixel(1, 1, Luma([42]));
        let rgb = flatten_onto_white(&DynamicImage::ImageLuma8(img));
        assert_eq!(rgb.get_pixel(0, 0).0, [42, 42, 42]);
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(matches!(
            recompress(gradient(8, 8), 0, 100),
            Err(PipelineError::Config(_))
        ));
        assert!(matches!(
            recompress(gradient(8, 8), 101, 100),
            Err(PipelineError::Config(_))
        ));
        assert!(matches!(
            recompress(gradient(8, 8), 50, 0),
            Err(PipelineError::Config(_))
        ));
    }
}
