//! Built-in page renderer
//!
//! Paints every Image XObject a page places onto a white canvas. Text and
//! vector paths are not drawn.

use super::decode::{decode_image, is_stencil_mask};
use super::{PageRenderer, RasterImage, canvas_dimensions, check_scale};
use crate::content::{Matrix, PlacedImage, scan_page};
use crate::layout::Rect;
use crate::source::SourcePage;
use crate::types::*;
use image::imageops::FilterType;
use image::{DynamicImage, Rgb, RgbImage, RgbaImage};
use lopdf::Object;

/// Composites a page's images at the requested resolution
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCompositor;

impl PageRenderer for ImageCompositor {
    fn render(&self, page: &SourcePage<'_>, scale: f32) -> Result<RasterImage> {
        check_scale(scale)?;

        let (width, height) = canvas_dimensions(page, scale)?;
        let mut canvas = RgbImage::from_pixel(width, height, Rgb([255, 255, 255]));

        let objects = scan_page(page)?;
        let media_box = page.media_box();
        // page space (y up) to pixel space (y down)
        let to_pixels = Matrix::new(
            scale,
            0.0,
            0.0,
            -scale,
            -media_box.x * scale,
            media_box.top() * scale,
        );

        for placed in &objects.images {
            paint_image(page, placed, &to_pixels, &mut canvas)?;
        }

        log::debug!(
            "rendered page {} at {}x{} ({} images)",
            page.index(),
            width,
            height,
            objects.images.len()
        );
        Ok(RasterImage::new(DynamicImage::ImageRgb8(canvas)))
    }
}

fn paint_image(
    page: &SourcePage<'_>,
    placed: &PlacedImage,
    to_pixels: &Matrix,
    canvas: &mut RgbImage,
) -> Result<()> {
    let doc = page.document();
    let Ok(Object::Stream(stream)) = doc.get_object(placed.object_id) else {
        return Ok(());
    };
    if is_stencil_mask(stream) {
        return Ok(());
    }

    let unit_to_pixels = placed.ctm.multiply(to_pixels);
    let Some(pixels_to_unit) = unit_to_pixels.invert() else {
        // degenerate placement paints nothing
        return Ok(());
    };

    let canvas_rect = Rect::new(0.0, 0.0, canvas.width() as f32, canvas.height() as f32);
    let Some(target) = unit_to_pixels
        .transform_rect(&Rect::new(0.0, 0.0, 1.0, 1.0))
        .intersection(&canvas_rect)
    else {
        return Ok(());
    };

    let decoded = decode_image(doc, stream).map_err(|reason| {
        PipelineError::raster(
            page.index(),
            format!("image {} {}: {}", placed.object_id.0, placed.object_id.1, reason),
        )
    })?;
    let source = downsample_to(
        decoded,
        unit_to_pixels.scale_x().ceil() as u32,
        unit_to_pixels.scale_y().ceil() as u32,
    );
    let (sw, sh) = source.dimensions();

    let x0 = target.x.floor() as u32;
    let y0 = target.y.floor() as u32;
    let x1 = (target.right().ceil() as u32).min(canvas.width());
    let y1 = (target.top().ceil() as u32).min(canvas.height());

    for py in y0..y1 {
        for px in x0..x1 {
            let (u, v) = pixels_to_unit.transform_point(px as f32 + 0.5, py as f32 + 0.5);
            if !(0.0..1.0).contains(&u) || !(0.0..1.0).contains(&v) {
                continue;
            }
            // image row 0 is the top of the unit square
            let sx = ((u * sw as f32) as u32).min(sw - 1);
            let sy = (((1.0 - v) * sh as f32) as u32).min(sh - 1);
            let [r, g, b, a] = source.get_pixel(sx, sy).0;
            if a == 0 {
                continue;
            }
            let dst = canvas.get_pixel_mut(px, py);
            if a == 255 {
                dst.0 = [r, g, b];
            } else {
                let alpha = a as u32;
                for (d, s) in dst.0.iter_mut().zip([r, g, b]) {
                    *d = ((s as u32 * alpha + *d as u32 * (255 - alpha) + 127) / 255) as u8;
                }
            }
        }
    }
    Ok(())
}

/// Shrink an image towards its on-canvas size; never enlarges
fn downsample_to(image: DynamicImage, width: u32, height: u32) -> RgbaImage {
    let width = width.clamp(1, image.width());
    let height = height.clamp(1, image.height());
    if (width, height) == (image.width(), image.height()) {
        return image.into_rgba8();
    }
    image
        .resize_exact(width, height, FilterType::Triangle)
        .into_rgba8()
}
