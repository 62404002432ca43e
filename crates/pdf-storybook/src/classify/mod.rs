//! Spread classification
//!
//! Decides which visual units a page holds. A page decomposes into zero, one
//! or two non-overlapping [`ContentRegion`]s, image first. Detection is a
//! strategy behind [`RegionDetector`]:
//!
//! - [`LargestImageDetector`]: content-aware, from image placements and text runs
//! - [`HalfSpreadDetector`]: fixed halves for exporters that bake text into one image

mod half_spread;
mod largest_image;

pub use half_spread::HalfSpreadDetector;
pub use largest_image::LargestImageDetector;

use crate::layout::Rect;
use crate::source::SourcePage;
use crate::types::*;
use lopdf::ObjectId;

/// What a region shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RegionKind {
    Image,
    Text,
}

/// Where a region's pixels or operators come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionContent {
    /// A single embedded Image XObject
    EmbeddedImage(ObjectId),
    /// The page's own content, clipped to the region
    Vector,
    /// The rendered page, cropped to the region
    Raster,
}

/// One visual unit on a page
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContentRegion {
    pub kind: RegionKind,
    /// Bounding box in page coordinates
    pub bbox: Rect,
    pub content: RegionContent,
}

/// Strategy for locating regions on a page
pub trait RegionDetector: Send + Sync {
    /// Regions on the page, image first; `NoExtractableContent` when there is nothing
    fn detect(&self, page: &SourcePage<'_>) -> Result<Vec<ContentRegion>>;
}

/// Detector selection in configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DetectorKind {
    #[default]
    LargestImage,
    HalfSpread,
}

impl DetectorKind {
    pub fn build(self, cover_right_half_only: bool) -> Box<dyn RegionDetector> {
        match self {
            DetectorKind::LargestImage => Box::new(LargestImageDetector),
            DetectorKind::HalfSpread => Box::new(HalfSpreadDetector {
                cover_right_half_only,
            }),
        }
    }
}

/// Classify a page with the default detector
pub fn classify(page: &SourcePage<'_>) -> Result<Vec<ContentRegion>> {
    LargestImageDetector.detect(page)
}
