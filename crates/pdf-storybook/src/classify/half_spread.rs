use super::{ContentRegion, RegionContent, RegionDetector, RegionKind};
use crate::content::scan_page;
use crate::layout::Rect;
use crate::source::SourcePage;
use crate::types::*;

/// Splits landscape spreads down the middle: picture left, text right.
///
/// Portrait pages are a single picture. The cover (page 0) keeps only its
/// right half when `cover_right_half_only` is set, since exporters put the
/// back cover on the left.
#[derive(Debug, Clone, Copy)]
pub struct HalfSpreadDetector {
    pub cover_right_half_only: bool,
}

impl Default for HalfSpreadDetector {
    fn default() -> Self {
        Self {
            cover_right_half_only: true,
        }
    }
}

impl RegionDetector for HalfSpreadDetector {
    fn detect(&self, page: &SourcePage<'_>) -> Result<Vec<ContentRegion>> {
        if scan_page(page)?.is_empty() {
            return Err(PipelineError::NoExtractableContent {
                page_index: page.index(),
            });
        }

        let bounds = page.media_box();
        if bounds.width <= bounds.height {
            return Ok(vec![raster_region(RegionKind::Image, bounds)]);
        }

        let half = bounds.width / 2.0;
        let left = Rect::new(bounds.x, bounds.y, half, bounds.height);
        let right = Rect::new(bounds.x + half, bounds.y, half, bounds.height);

        if page.index() == 0 && self.cover_right_half_only {
            return Ok(vec![raster_region(RegionKind::Image, right)]);
        }
        Ok(vec![
            raster_region(RegionKind::Image, left),
            raster_region(RegionKind::Text, right),
        ])
    }
}

fn raster_region(kind: RegionKind, bbox: Rect) -> ContentRegion {
    ContentRegion {
        kind,
        bbox,
        content: RegionContent::Raster,
    }
}
