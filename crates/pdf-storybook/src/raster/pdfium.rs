//! pdfium-backed renderer

use super::{PageRenderer, RasterImage, canvas_dimensions, check_scale};
use crate::source::SourcePage;
use crate::types::*;
use image::{DynamicImage, RgbaImage};
use pdfium_render::prelude::*;

/// Initialize Pdfium, trying the vendored library first, then falling back to system
pub fn init_pdfium() -> std::result::Result<Pdfium, PdfiumError> {
    // Try to load from vendor directory (relative to workspace root)
    let vendor_path = std::env::current_dir().ok().and_then(|mut p| {
        p.push("vendor/pdfium/lib");
        if p.exists() { Some(p) } else { None }
    });

    if let Some(vendor_path) = vendor_path {
        if let Ok(binding) =
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(&vendor_path))
        {
            return Ok(Pdfium::new(binding));
        }
    }

    // Fallback to system library or default search paths
    Pdfium::bind_to_system_library().map(Pdfium::new)
}

/// Full-fidelity rendering through pdfium.
///
/// Binds the library per call and renders from the original input bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfiumRenderer;

impl PageRenderer for PdfiumRenderer {
    fn render(&self, page: &SourcePage<'_>, scale: f32) -> Result<RasterImage> {
        check_scale(scale)?;
        let index = page.index();
        let fail = |e: PdfiumError| PipelineError::raster(index, e);

        let (width, height) = canvas_dimensions(page, scale)?;
        let quarter_turns = page.rotation().rem_euclid(360) / 90;
        // pdfium renders in display orientation
        let (target_w, target_h) = if quarter_turns % 2 == 1 {
            (height, width)
        } else {
            (width, height)
        };

        let pdfium = init_pdfium().map_err(fail)?;
        let document = pdfium
            .load_pdf_from_byte_slice(page.source().raw_bytes(), None)
            .map_err(fail)?;
        let pdf_page = document.pages().get(index as u16).map_err(fail)?;

        let config = PdfRenderConfig::new().set_target_size(target_w as i32, target_h as i32);
        let bitmap = pdf_page.render_with_config(&config).map_err(fail)?;
        let rgba = RgbaImage::from_raw(
            bitmap.width() as u32,
            bitmap.height() as u32,
            bitmap.as_rgba_bytes().to_vec(),
        )
        .ok_or_else(|| PipelineError::raster(index, "pdfium bitmap size mismatch"))?;

        // back to unrotated page space, matching the MediaBox
        let image = match quarter_turns {
            1 => DynamicImage::ImageRgba8(image::imageops::rotate270(&rgba)),
            2 => DynamicImage::ImageRgba8(image::imageops::rotate180(&rgba)),
            3 => DynamicImage::ImageRgba8(image::imageops::rotate90(&rgba)),
            _ => DynamicImage::ImageRgba8(rgba),
        };
        Ok(RasterImage::new(image))
    }

    fn supports_parallel(&self) -> bool {
        false
    }
}
