//! Page rasterization and image recompression
//!
//! Rendering sits behind the [`PageRenderer`] trait. The built-in
//! [`ImageCompositor`] is pure Rust and paints the Image XObjects a page
//! places; with the `pdfium` feature, [`PdfiumRenderer`] renders through a
//! pdfium library instead.

mod compositor;
pub(crate) mod decode;
#[cfg(feature = "pdfium")]
mod pdfium;
mod recompress;

pub use compositor::ImageCompositor;
#[cfg(feature = "pdfium")]
pub use pdfium::{PdfiumRenderer, init_pdfium};
pub use recompress::*;

use crate::constants::MAX_CANVAS_PIXELS;
use crate::source::SourcePage;
use crate::types::*;
use image::DynamicImage;

/// Color model of a raster's pixel buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorModel {
    Gray,
    GrayAlpha,
    Rgb,
    Rgba,
}

impl ColorModel {
    fn of(image: &DynamicImage) -> Self {
        match (image.color().has_color(), image.color().has_alpha()) {
            (false, false) => ColorModel::Gray,
            (false, true) => ColorModel::GrayAlpha,
            (true, false) => ColorModel::Rgb,
            (true, true) => ColorModel::Rgba,
        }
    }
}

/// A rendered page (or part of one)
#[derive(Debug, Clone)]
pub struct RasterImage {
    image: DynamicImage,
    color_model: ColorModel,
}

impl RasterImage {
    pub fn new(image: DynamicImage) -> Self {
        let color_model = ColorModel::of(&image);
        Self { image, color_model }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn color_model(&self) -> ColorModel {
        self.color_model
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    pub fn into_image(self) -> DynamicImage {
        self.image
    }

    /// Cut out a pixel rectangle; the rectangle is clamped to the image
    pub fn crop(&self, x: u32, y: u32, width: u32, height: u32) -> RasterImage {
        let x = x.min(self.width().saturating_sub(1));
        let y = y.min(self.height().saturating_sub(1));
        let width = width.clamp(1, self.width() - x);
        let height = height.clamp(1, self.height() - y);
        RasterImage::new(self.image.crop_imm(x, y, width, height))
    }
}

/// Which renderer the pipeline drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RasterBackend {
    /// Pure-Rust image compositor
    #[default]
    Builtin,
    /// pdfium library (requires the `pdfium` feature)
    Pdfium,
}

/// Renders one source page to pixels
pub trait PageRenderer: Send + Sync {
    /// Render `page` at `scale` pixels per point
    fn render(&self, page: &SourcePage<'_>, scale: f32) -> Result<RasterImage>;

    /// Whether pages may be rendered from several threads at once
    fn supports_parallel(&self) -> bool {
        true
    }
}

/// Build the renderer for a configured backend
pub fn renderer(backend: RasterBackend) -> Result<Box<dyn PageRenderer>> {
    match backend {
        RasterBackend::Builtin => Ok(Box::new(ImageCompositor)),
        #[cfg(feature = "pdfium")]
        RasterBackend::Pdfium => Ok(Box::new(PdfiumRenderer)),
        #[cfg(not(feature = "pdfium"))]
        RasterBackend::Pdfium => Err(PipelineError::Config(
            "the pdfium backend is not compiled in (enable the `pdfium` feature)".to_string(),
        )),
    }
}

/// Render a page with the built-in compositor
pub fn rasterize(page: &SourcePage<'_>, scale: f32) -> Result<RasterImage> {
    ImageCompositor.render(page, scale)
}

/// Output pixel size for a page: points × scale, rounded, at least 1
pub fn pixel_dimensions(width_pt: f32, height_pt: f32, scale: f32) -> (u32, u32) {
    let px = |v: f32| ((v * scale).round() as u32).max(1);
    (px(width_pt), px(height_pt))
}

/// Pixel size of a page's canvas; pages over [`MAX_CANVAS_PIXELS`] are refused
pub(crate) fn canvas_dimensions(page: &SourcePage<'_>, scale: f32) -> Result<(u32, u32)> {
    let (width, height) = pixel_dimensions(page.width(), page.height(), scale);
    let pixels = u64::from(width) * u64::from(height);
    if pixels > MAX_CANVAS_PIXELS {
        return Err(PipelineError::raster(
            page.index(),
            format!(
                "{}x{} pt at scale {} needs a {}x{} canvas, over the {} pixel limit",
                page.width(),
                page.height(),
                scale,
                width,
                height,
                MAX_CANVAS_PIXELS
            ),
        ));
    }
    Ok((width, height))
}

pub(crate) fn check_scale(scale: f32) -> Result<()> {
    if !scale.is_finite() || scale <= 0.0 {
        return Err(PipelineError::Config(format!(
            "render scale must be positive, got {}",
            scale
        )));
    }
    Ok(())
}
