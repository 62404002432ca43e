use super::{ContentRegion, RegionContent, RegionDetector, RegionKind};
use crate::content::{PlacedImage, scan_page};
use crate::layout::Rect;
use crate::source::SourcePage;
use crate::types::*;

/// The largest placed image is the picture; text beside it is the caption.
///
/// Text runs that overlap the picture are ignored. The remaining runs are
/// grouped by the side of the picture they sit on, checked right, left,
/// below, above; the group with the most runs becomes the text region, ties
/// going to the earlier side. Every run in a group lies in that side's half
/// plane, so the two regions cannot overlap.
#[derive(Debug, Clone, Copy, Default)]
pub struct LargestImageDetector;

impl RegionDetector for LargestImageDetector {
    fn detect(&self, page: &SourcePage<'_>) -> Result<Vec<ContentRegion>> {
        let objects = scan_page(page)?;
        let page_rect = page.media_box();

        let runs: Vec<Rect> = objects
            .text_runs
            .iter()
            .filter_map(|run| run.bbox.intersection(&page_rect))
            .collect();

        let Some((image, image_rect)) = largest_image(&objects.images, &page_rect) else {
            return match union_all(runs.iter()) {
                Some(bbox) => Ok(vec![text_region(bbox)]),
                None => Err(PipelineError::NoExtractableContent {
                    page_index: page.index(),
                }),
            };
        };

        let mut regions = vec![ContentRegion {
            kind: RegionKind::Image,
            bbox: image_rect,
            content: RegionContent::EmbeddedImage(image.object_id),
        }];

        let mut groups: [Vec<&Rect>; 4] = Default::default();
        for run in runs.iter().filter(|r| !r.intersects(&image_rect)) {
            if let Some(side) = side_of(run, &image_rect) {
                groups[side].push(run);
            }
        }

        // max_by_key keeps the last maximum, so walk the sides in reverse
        let best = groups
            .iter()
            .rev()
            .max_by_key(|group| group.len())
            .filter(|group| !group.is_empty());
        if let Some(bbox) = best.and_then(|group| union_all(group.iter().copied())) {
            regions.push(text_region(bbox));
        }

        log::debug!(
            "page {}: {} region(s), {} image(s), {} text run(s)",
            page.index(),
            regions.len(),
            objects.images.len(),
            runs.len()
        );
        Ok(regions)
    }
}

fn largest_image<'a>(images: &'a [PlacedImage], page: &Rect) -> Option<(&'a PlacedImage, Rect)> {
    let mut best: Option<(&PlacedImage, Rect)> = None;
    for image in images {
        let Some(visible) = image.bbox.intersection(page) else {
            continue;
        };
        match best {
            Some((_, current)) if current.area() >= visible.area() => {}
            _ => best = Some((image, visible)),
        }
    }
    best
}

/// 0 = right, 1 = left, 2 = below, 3 = above
fn side_of(run: &Rect, image: &Rect) -> Option<usize> {
    if run.x >= image.right() {
        Some(0)
    } else if run.right() <= image.x {
        Some(1)
    } else if run.top() <= image.y {
        Some(2)
    } else if run.y >= image.top() {
        Some(3)
    } else {
        None
    }
}

fn union_all<'a>(mut rects: impl Iterator<Item = &'a Rect>) -> Option<Rect> {
    let first = *rects.next()?;
    Some(rects.fold(first, |acc, r| acc.union(r)))
}

fn text_region(bbox: Rect) -> ContentRegion {
    ContentRegion {
        kind: RegionKind::Text,
        bbox,
        content: RegionContent::Vector,
    }
}
