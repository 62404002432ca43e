use crate::layout::{SheetLayout, padded_page_count};
use crate::types::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Result statistics for compress mode
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CompressStats {
    pub pages: usize,
    pub original_size: usize,
    pub compressed_size: usize,
    pub reduction_percent: f64,
}

/// Result statistics for split mode
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SplitStats {
    pub original_pages: usize,
    pub output_pages: usize,
    /// 0-based indices of pages with nothing to extract
    pub skipped_pages: Vec<usize>,
    pub original_size: usize,
    pub output_size: usize,
    pub reduction_percent: f64,
}

/// Result statistics for booklet mode
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BookletStats {
    pub original_pages: usize,
    /// Output pages, one per sheet face
    pub booklet_pages: usize,
    pub sheets: usize,
    pub blank_pages_added: usize,
    pub original_size: usize,
    pub output_size: usize,
    pub reduction_percent: f64,
}

/// Booklet geometry for a page count, computed without any PDF
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BookletPlan {
    pub source_pages: usize,
    pub padded_pages: usize,
    pub sheets: usize,
    /// Printed faces, front and back of each sheet
    pub output_faces: usize,
    pub blank_pages_added: usize,
}

/// Calculate booklet statistics for a page count
pub fn booklet_statistics(page_count: usize, layout: SheetLayout) -> Result<BookletPlan> {
    if page_count == 0 {
        return Err(PipelineError::InvalidPageCount(0));
    }

    let padded_pages = padded_page_count(page_count, layout);
    let sheets = padded_pages / layout.pages_per_sheet();

    Ok(BookletPlan {
        source_pages: page_count,
        padded_pages,
        sheets,
        output_faces: sheets * 2,
        blank_pages_added: padded_pages - page_count,
    })
}

/// `100 · (1 − output / input)`, rounded to one decimal; negative when the output grew
pub fn reduction_percent(input_bytes: usize, output_bytes: usize) -> f64 {
    if input_bytes == 0 {
        return 0.0;
    }
    let ratio = output_bytes as f64 / input_bytes as f64;
    ((1.0 - ratio) * 1000.0).round() / 10.0
}
