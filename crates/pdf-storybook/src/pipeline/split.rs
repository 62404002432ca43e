//! Split mode: one output page per content region

use super::{CancelFlag, Converted, map_pages};
use crate::classify::{ContentRegion, RegionContent};
use crate::options::SplitOptions;
use crate::raster::{PageRenderer, RasterImage, decode, recompress, renderer};
use crate::render::{AssembledPage, OutputDocument, PageContent, PageItem, assemble};
use crate::source::{SourceDocument, SourcePage};
use crate::stats::{SplitStats, reduction_percent};
use crate::types::*;
use lopdf::Object;

/// Split spreads into single pages (async wrapper)
pub async fn split(
    input: Vec<u8>,
    options: SplitOptions,
    cancel: CancelFlag,
) -> Result<Converted<SplitStats>> {
    tokio::task::spawn_blocking(move || split_sync(input, &options, &cancel)).await?
}

/// Split spreads into single pages, image before text for each source page
pub fn split_sync(
    input: Vec<u8>,
    options: &SplitOptions,
    cancel: &CancelFlag,
) -> Result<Converted<SplitStats>> {
    options.validate()?;
    let source = SourceDocument::from_bytes(input)?;
    split_document(&source, options, cancel)
}

enum PageSplit {
    Regions(Vec<PageContent>),
    Skipped,
}

pub(crate) fn split_document(
    source: &SourceDocument,
    options: &SplitOptions,
    cancel: &CancelFlag,
) -> Result<Converted<SplitStats>> {
    log::info!(
        "Splitting {} pages with {:?} detection",
        source.page_count(),
        options.detector
    );

    let detector = options.detector.build(options.cover_right_half_only);
    let renderer = renderer(options.raster.backend)?;

    let per_page = map_pages(
        source.page_count(),
        renderer.supports_parallel(),
        cancel,
        |index| {
            let page = source.page(index)?;
            match detector.detect(&page) {
                Ok(regions) => Ok(PageSplit::Regions(region_contents(
                    &page,
                    &regions,
                    renderer.as_ref(),
                    options,
                )?)),
                Err(PipelineError::NoExtractableContent { page_index }) => {
                    log::warn!("Page {} has no extractable content, skipped", page_index);
                    Ok(PageSplit::Skipped)
                }
                Err(e) => Err(e),
            }
        },
    )?;

    cancel.check()?;
    let page_size = options.page_size();
    let mut output = OutputDocument::new();
    let mut skipped_pages = Vec::new();
    for (index, result) in per_page.into_iter().enumerate() {
        let PageSplit::Regions(contents) = result else {
            skipped_pages.push(index);
            continue;
        };
        for content in contents {
            let mut page = AssembledPage::new(page_size);
            page.items.push(PageItem {
                content,
                frame: page.bounds(),
                scaling: options.scaling,
                rotation: Rotation::None,
            });
            output.push(page);
        }
    }

    if output.page_count() == 0 {
        return Err(PipelineError::InvalidInput(
            "no page has extractable content".to_string(),
        ));
    }

    let pdf = assemble(&output, source)?;
    let stats = SplitStats {
        original_pages: source.page_count(),
        output_pages: output.page_count(),
        skipped_pages,
        original_size: source.byte_len(),
        output_size: pdf.len(),
        reduction_percent: reduction_percent(source.byte_len(), pdf.len()),
    };
    log::info!(
        "Split {} pages into {} ({} skipped)",
        stats.original_pages,
        stats.output_pages,
        stats.skipped_pages.len()
    );
    Ok(Converted { pdf, stats })
}

/// Turn detected regions into output content, rendering the page at most once
fn region_contents(
    page: &SourcePage<'_>,
    regions: &[ContentRegion],
    renderer: &dyn PageRenderer,
    options: &SplitOptions,
) -> Result<Vec<PageContent>> {
    let raster = &options.raster;
    let mut rendered: Option<RasterImage> = None;
    let mut contents = Vec::with_capacity(regions.len());

    for region in regions {
        let content = match region.content {
            RegionContent::Vector => PageContent::Passthrough {
                page_index: page.index(),
                clip: region.bbox,
            },
            RegionContent::EmbeddedImage(id) => {
                let image = match page.document().get_object(id) {
                    Ok(Object::Stream(stream)) => decode::decode_image(page.document(), stream)
                        .map_err(|reason| PipelineError::raster(page.index(), reason))?,
                    _ => {
                        return Err(PipelineError::raster(
                            page.index(),
                            format!("image object {} {} missing", id.0, id.1),
                        ));
                    }
                };
                PageContent::Image(recompress(
                    RasterImage::new(image),
                    raster.quality,
                    raster.max_dimension,
                )?)
            }
            RegionContent::Raster => {
                let full = match rendered.take() {
                    Some(full) => full,
                    None => renderer.render(page, raster.render_scale)?,
                };
                let cropped = crop_to_region(&full, page, region);
                rendered = Some(full);
                PageContent::Image(recompress(cropped, raster.quality, raster.max_dimension)?)
            }
        };
        log::debug!("page {}: {:?} region {:?}", page.index(), region.kind, region.bbox);
        contents.push(content);
    }
    Ok(contents)
}

/// Crop a rendered page to a region given in page coordinates
fn crop_to_region(full: &RasterImage, page: &SourcePage<'_>, region: &ContentRegion) -> RasterImage {
    let media_box = page.media_box();
    let sx = full.width() as f32 / media_box.width;
    let sy = full.height() as f32 / media_box.height;

    let left = ((region.bbox.x - media_box.x) * sx).round().max(0.0) as u32;
    let top = ((media_box.top() - region.bbox.top()) * sy).round().max(0.0) as u32;
    let width = (region.bbox.width * sx).round().max(1.0) as u32;
    let height = (region.bbox.height * sy).round().max(1.0) as u32;
    full.crop(left, top, width, height)
}
