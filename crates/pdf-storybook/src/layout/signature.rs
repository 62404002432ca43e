//! Saddle-stitch signature planning
//!
//! Sheets are folded once and nested, sheet 0 outermost. For a padded page
//! count `N = 4k`, sheet `s` (1-indexed) carries, in the reading frame of
//! each face:
//!
//! ```text
//!            left          right
//! front:  N - (2s - 2)    2s - 1
//! back:   2s              N - (2s - 1)
//! ```
//!
//! 8 pages: sheet 1 = front [8, 1], back [2, 7]; sheet 2 = front [6, 3], back [4, 5].
//!
//! ## Rotation table
//!
//! | duplex     | front | back |
//! |------------|-------|------|
//! | short edge | 0°    | 0°   |
//! | long edge  | 0°    | 180° |
//!
//! Slots are always given in the reading frame. A 180° placement is printed
//! with the face turned about its centre, which also moves it into the
//! opposite half; after a long-edge flip the back face reads upright.

use crate::types::{PipelineError, Result, Rotation};

use super::{BookletPlacement, DuplexFlip, SheetLayout, SheetSide, Slot};

// =============================================================================
// Planning
// =============================================================================

/// Plan every placement needed to impose `page_count` pages.
///
/// Placements are returned sheet by sheet in print order: front-left,
/// front-right, back-left, back-right.
pub fn plan(
    page_count: usize,
    layout: SheetLayout,
    duplex: DuplexFlip,
) -> Result<Vec<BookletPlacement>> {
    if page_count == 0 {
        return Err(PipelineError::InvalidPageCount(page_count));
    }

    let padded = padded_page_count(page_count, layout);
    let sheets = padded / layout.pages_per_sheet();
    let back_rotation = match duplex {
        DuplexFlip::ShortEdge => Rotation::None,
        DuplexFlip::LongEdge => Rotation::Clockwise180,
    };

    let mut placements = Vec::with_capacity(padded);
    for sheet in 1..=sheets {
        let page_numbers = [
            (SheetSide::Front, Slot::Left, padded - (2 * sheet - 2)),
            (SheetSide::Front, Slot::Right, 2 * sheet - 1),
            (SheetSide::Back, Slot::Left, 2 * sheet),
            (SheetSide::Back, Slot::Right, padded - (2 * sheet - 1)),
        ];

        for (side, slot, page_number) in page_numbers {
            placements.push(BookletPlacement {
                sheet_index: sheet - 1,
                side,
                slot,
                source_page: source_index(page_number, page_count),
                rotation: match side {
                    SheetSide::Front => Rotation::None,
                    SheetSide::Back => back_rotation,
                },
            });
        }
    }

    Ok(placements)
}

/// Pad to the next multiple of the sheet's page capacity
pub fn padded_page_count(page_count: usize, layout: SheetLayout) -> usize {
    let per_sheet = layout.pages_per_sheet();
    page_count.div_ceil(per_sheet) * per_sheet
}

/// Map a 1-indexed page number to a 0-based source index, or blank
fn source_index(page_number: usize, page_count: usize) -> Option<usize> {
    if page_number <= page_count {
        Some(page_number - 1)
    } else {
        None
    }
}

// =============================================================================
// Folding
// =============================================================================

/// The sequence a reader sees after folding the sheets and nesting them in order.
///
/// Walks the first half of the booklet inward (front-right then back-left of
/// each sheet) and the second half outward (back-right then front-left).
pub fn fold_reading_order(placements: &[BookletPlacement]) -> Vec<Option<usize>> {
    let sheets = placements
        .iter()
        .map(|p| p.sheet_index + 1)
        .max()
        .unwrap_or(0);

    let find = |sheet: usize, side: SheetSide, slot: Slot| {
        placements
            .iter()
            .find(|p| p.sheet_index == sheet && p.side == side && p.slot == slot)
            .and_then(|p| p.source_page)
    };

    let mut order = Vec::with_capacity(sheets * 4);
    for sheet in 0..sheets {
        order.push(find(sheet, SheetSide::Front, Slot::Right));
        order.push(find(sheet, SheetSide::Back, Slot::Left));
    }
    for sheet in (0..sheets).rev() {
        order.push(find(sheet, SheetSide::Back, Slot::Right));
        order.push(find(sheet, SheetSide::Front, Slot::Left));
    }
    order
}

/// Group placements into printed faces, in print order (sheet 0 front, sheet 0 back, ...)
pub fn faces(placements: &[BookletPlacement]) -> Vec<Vec<BookletPlacement>> {
    let mut faces: Vec<Vec<BookletPlacement>> = Vec::new();
    for placement in placements {
        match faces.last_mut() {
            Some(face)
                if face[0].sheet_index == placement.sheet_index
                    && face[0].side == placement.side =>
            {
                face.push(*placement)
            }
            _ => faces.push(vec![*placement]),
        }
    }
    faces
}

// =============================================================================
// Tests
// =============================================================================
