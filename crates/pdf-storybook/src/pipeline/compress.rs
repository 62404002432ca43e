//! Compress mode: every page rendered, recompressed and re-embedded full-bleed

use super::{CancelFlag, Converted, map_pages, render_compressed};
use crate::options::CompressOptions;
use crate::raster::renderer;
use crate::render::{AssembledPage, OutputDocument, PageContent, PageItem, assemble};
use crate::source::SourceDocument;
use crate::stats::{CompressStats, reduction_percent};
use crate::types::*;

/// Compress a PDF (async wrapper)
pub async fn compress(
    input: Vec<u8>,
    options: CompressOptions,
    cancel: CancelFlag,
) -> Result<Converted<CompressStats>> {
    tokio::task::spawn_blocking(move || compress_sync(input, &options, &cancel)).await?
}

/// Compress a PDF: same page count, order and page sizes, raster content
pub fn compress_sync(
    input: Vec<u8>,
    options: &CompressOptions,
    cancel: &CancelFlag,
) -> Result<Converted<CompressStats>> {
    options.validate()?;
    let source = SourceDocument::from_bytes(input)?;
    log::info!(
        "Compressing {} pages ({} bytes) at quality {}",
        source.page_count(),
        source.byte_len(),
        options.raster.quality
    );

    let renderer = renderer(options.raster.backend)?;
    let pages = map_pages(
        source.page_count(),
        renderer.supports_parallel(),
        cancel,
        |index| {
            let page = source.page(index)?;
            let image = render_compressed(renderer.as_ref(), &page, &options.raster)?;

            let media_box = page.media_box();
            let mut assembled = AssembledPage::new(PageSize::new(media_box.width, media_box.height));
            assembled.rotate = page.rotation();
            assembled.items.push(PageItem {
                content: PageContent::Image(image),
                frame: assembled.bounds(),
                scaling: ScalingMode::Stretch,
                rotation: Rotation::None,
            });
            Ok(assembled)
        },
    )?;

    cancel.check()?;
    let output = OutputDocument { pages };
    let pdf = assemble(&output, &source)?;

    let stats = CompressStats {
        pages: output.page_count(),
        original_size: source.byte_len(),
        compressed_size: pdf.len(),
        reduction_percent: reduction_percent(source.byte_len(), pdf.len()),
    };
    log::info!(
        "Compressed {} -> {} bytes ({}% smaller)",
        stats.original_size,
        stats.compressed_size,
        stats.reduction_percent
    );
    Ok(Converted { pdf, stats })
}
