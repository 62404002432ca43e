//! Storybook PDF conversions: compress, split spreads, and saddle-stitch booklets.

pub mod classify;
pub mod constants;
pub mod content;
pub mod layout;
mod options;
pub mod pipeline;
pub mod raster;
pub mod render;
mod source;
mod stats;
mod types;

pub use classify::{
    ContentRegion, DetectorKind, HalfSpreadDetector, LargestImageDetector, RegionContent,
    RegionDetector, RegionKind, classify,
};
pub use layout::{
    BookletPlacement, DuplexFlip, Rect, SheetLayout, SheetSide, Slot, fold_reading_order, plan,
};
pub use options::*;
pub use pipeline::{
    CancelFlag, Converted, booklet, booklet_sync, compress, compress_sync, read_pdf, split,
    split_sync, write_pdf,
};
pub use raster::{
    CompressedImage, PageRenderer, RasterBackend, RasterImage, rasterize, recompress,
};
pub use render::{OutputDocument, assemble};
pub use source::{SourceDocument, SourcePage};
pub use stats::*;
pub use types::*;
