//! Booklet mode: saddle-stitch imposition, two pages per sheet face

use super::split::split_document;
use super::{CancelFlag, Converted, map_pages, render_compressed};
use crate::layout::{BookletPlacement, Rect, Slot, faces, plan};
use crate::options::{BookletContent, BookletOptions};
use crate::raster::{CompressedImage, renderer};
use crate::render::{AssembledPage, OutputDocument, PageContent, PageItem, assemble};
use crate::source::SourceDocument;
use crate::stats::{BookletStats, booklet_statistics, reduction_percent};
use crate::types::*;

/// Build a print-ready booklet (async wrapper)
pub async fn booklet(
    input: Vec<u8>,
    options: BookletOptions,
    cancel: CancelFlag,
) -> Result<Converted<BookletStats>> {
    tokio::task::spawn_blocking(move || booklet_sync(input, &options, &cancel)).await?
}

/// Build a print-ready booklet
pub fn booklet_sync(
    input: Vec<u8>,
    options: &BookletOptions,
    cancel: &CancelFlag,
) -> Result<Converted<BookletStats>> {
    options.validate()?;
    let original = SourceDocument::from_bytes(input)?;

    // Split output is already recompressed, so it is imposed as-is
    let (split_source, content) = if options.split_spreads {
        let split = split_document(&original, &options.split, cancel)?;
        (
            Some(SourceDocument::from_bytes(split.pdf)?),
            BookletContent::Passthrough,
        )
    } else {
        (None, options.content)
    };
    let source = split_source.as_ref().unwrap_or(&original);

    let page_count = source.page_count();
    let geometry = booklet_statistics(page_count, options.layout)?;
    let placements = plan(page_count, options.layout, options.duplex)?;
    log::info!(
        "Imposing {} pages onto {} sheets ({} blanks, {:?} flip)",
        page_count,
        geometry.sheets,
        geometry.blank_pages_added,
        options.duplex
    );

    let mut slot_contents = page_contents(source, options, content, cancel)?;

    cancel.check()?;
    let sheet_size = options.sheet_size();
    let mut output = OutputDocument::new();
    for face in faces(&placements) {
        let mut page = AssembledPage::new(sheet_size);
        for placement in &face {
            page.items.push(PageItem {
                content: take_content(&mut slot_contents, placement),
                frame: slot_frame(placement.slot, &sheet_size),
                scaling: options.scaling,
                rotation: placement.rotation,
            });
        }
        output.push(page);
    }

    let pdf = assemble(&output, source)?;
    let stats = BookletStats {
        original_pages: original.page_count(),
        booklet_pages: output.page_count(),
        sheets: geometry.sheets,
        blank_pages_added: geometry.blank_pages_added,
        original_size: original.byte_len(),
        output_size: pdf.len(),
        reduction_percent: reduction_percent(original.byte_len(), pdf.len()),
    };
    log::info!(
        "Booklet: {} sheets, {} faces, {} bytes",
        stats.sheets,
        stats.booklet_pages,
        stats.output_size
    );
    Ok(Converted { pdf, stats })
}

/// Content for every source page, indexed by page
fn page_contents(
    source: &SourceDocument,
    options: &BookletOptions,
    content: BookletContent,
    cancel: &CancelFlag,
) -> Result<Vec<Option<PageContent>>> {
    match content {
        BookletContent::Passthrough => source
            .pages()
            .map(|page| {
                let page = page?;
                Ok(Some(PageContent::Passthrough {
                    page_index: page.index(),
                    clip: page.media_box(),
                }))
            })
            .collect(),
        BookletContent::Raster => {
            let renderer = renderer(options.raster.backend)?;
            let images: Vec<CompressedImage> = map_pages(
                source.page_count(),
                renderer.supports_parallel(),
                cancel,
                |index| {
                    let page = source.page(index)?;
                    render_compressed(renderer.as_ref(), &page, &options.raster)
                },
            )?;
            Ok(images
                .into_iter()
                .map(|image| Some(PageContent::Image(image)))
                .collect())
        }
    }
}

/// Each source page appears in exactly one placement, so its content is moved out
fn take_content(contents: &mut [Option<PageContent>], placement: &BookletPlacement) -> PageContent {
    placement
        .source_page
        .and_then(|index| contents.get_mut(index))
        .and_then(Option::take)
        .unwrap_or(PageContent::Blank)
}

/// Half of the sheet a slot occupies, in the upright face
fn slot_frame(slot: Slot, sheet: &PageSize) -> Rect {
    let half = sheet.width_pt / 2.0;
    match slot {
        Slot::Left => Rect::new(0.0, 0.0, half, sheet.height_pt),
        Slot::Right => Rect::new(half, 0.0, half, sheet.height_pt),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{DuplexFlip, SheetLayout, SheetSide};

    #[test]
    fn test_slot_frames_split_sheet_in_half() {
        let sheet = PageSize::new(842.0, 595.0);
        assert_eq!(slot_frame(Slot::Left, &sheet), Rect::new(0.0, 0.0, 421.0, 595.0));
        assert_eq!(slot_frame(Slot::Right, &sheet), Rect::new(421.0, 0.0, 421.0, 595.0));
    }

    #[test]
    fn test_take_content_blanks_padding() {
        let placements = plan(3, SheetLayout::SaddleStitch4Up, DuplexFlip::ShortEdge).unwrap();
        let mut contents: Vec<Option<PageContent>> = (0..3)
            .map(|i| {
                Some(PageContent::Passthrough {
                    page_index: i,
                    clip: Rect::new(0.0, 0.0, 100.0, 100.0),
                })
            })
            .collect();

        // front-left of the only sheet is page 4: padding
        let front_left = placements
            .iter()
            .find(|p| p.side == SheetSide::Front && p.slot == Slot::Left)
            .unwrap();
        assert_eq!(take_content(&mut contents, front_left), PageContent::Blank);

        let front_right = placements
            .iter()
            .find(|p| p.side == SheetSide::Front && p.slot == Slot::Right)
            .unwrap();
        assert!(matches!(
            take_content(&mut contents, front_right),
            PageContent::Passthrough { page_index: 0, .. }
        ));
        assert!(contents[0].is_none());
    }
}
