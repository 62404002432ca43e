use pdf_storybook::layout::faces;
use pdf_storybook::{
    DuplexFlip, PipelineError, Rotation, SheetLayout, SheetSide, Slot, booklet_statistics,
    fold_reading_order, plan,
};

const LAYOUT: SheetLayout = SheetLayout::SaddleStitch4Up;

#[test]
fn test_folded_booklet_reads_in_order() {
    for n in [1, 3, 4, 7, 8, 20] {
        let placements = plan(n, LAYOUT, DuplexFlip::ShortEdge).unwrap();
        let padded = n.div_ceil(4) * 4;
        assert_eq!(placements.len(), padded, "n = {}", n);

        let order = fold_reading_order(&placements);
        let expected: Vec<Option<usize>> = (0..padded)
            .map(|i| if i < n { Some(i) } else { None })
            .collect();
        assert_eq!(order, expected, "n = {}", n);
    }
}

#[test]
fn test_every_page_placed_exactly_once() {
    for n in 1..=33 {
        let placements = plan(n, LAYOUT, DuplexFlip::LongEdge).unwrap();
        let mut seen = vec![0usize; n];
        for p in &placements {
            if let Some(i) = p.source_page {
                seen[i] += 1;
            }
        }
        assert!(seen.iter().all(|&c| c == 1), "n = {}", n);

        let sheets = placements.iter().map(|p| p.sheet_index).max().unwrap() + 1;
        assert_eq!(sheets, n.div_ceil(4));
    }
}

#[test]
fn test_five_pages_need_two_sheets_and_three_blanks() {
    let stats = booklet_statistics(5, LAYOUT).unwrap();
    assert_eq!(stats.padded_pages, 8);
    assert_eq!(stats.sheets, 2);
    assert_eq!(stats.output_faces, 4);
    assert_eq!(stats.blank_pages_added, 3);

    let placements = plan(5, LAYOUT, DuplexFlip::ShortEdge).unwrap();
    let at = |sheet: usize, side: SheetSide, slot: Slot| {
        placements
            .iter()
            .find(|p| p.sheet_index == sheet && p.side == side && p.slot == slot)
            .unwrap()
            .source_page
    };

    // outer sheet: 8|1 on the front, 2|7 on the back (1-based)
    assert_eq!(at(0, SheetSide::Front, Slot::Left), None);
    assert_eq!(at(0, SheetSide::Front, Slot::Right), Some(0));
    assert_eq!(at(0, SheetSide::Back, Slot::Left), Some(1));
    assert_eq!(at(0, SheetSide::Back, Slot::Right), None);
    // inner sheet: 6|3 and 4|5
    assert_eq!(at(1, SheetSide::Front, Slot::Left), None);
    assert_eq!(at(1, SheetSide::Front, Slot::Right), Some(2));
    assert_eq!(at(1, SheetSide::Back, Slot::Left), Some(3));
    assert_eq!(at(1, SheetSide::Back, Slot::Right), Some(4));

    let blanks = placements.iter().filter(|p| p.is_blank()).count();
    assert_eq!(blanks, 3);
}

#[test]
fn test_blanks_only_pad_the_end() {
    for n in 1..=21 {
        let placements = plan(n, LAYOUT, DuplexFlip::ShortEdge).unwrap();
        let order = fold_reading_order(&placements);
        let first_blank = order.iter().position(Option::is_none).unwrap_or(order.len());
        assert_eq!(first_blank, n);
        assert!(order[first_blank..].iter().all(Option::is_none));
    }
}

#[test]
fn test_long_edge_turns_backs_only() {
    let placements = plan(8, LAYOUT, DuplexFlip::LongEdge).unwrap();
    for p in &placements {
        let expected = match p.side {
            SheetSide::Front => Rotation::None,
            SheetSide::Back => Rotation::Clockwise180,
        };
        assert_eq!(p.rotation, expected);
    }

    let short = plan(8, LAYOUT, DuplexFlip::ShortEdge).unwrap();
    assert!(short.iter().all(|p| p.rotation == Rotation::None));
}

#[test]
fn test_faces_group_front_then_back() {
    let placements = plan(8, LAYOUT, DuplexFlip::ShortEdge).unwrap();
    let faces = faces(&placements);
    assert_eq!(faces.len(), 4);
    for (i, face) in faces.iter().enumerate() {
        assert_eq!(face.len(), 2);
        assert_eq!(face[0].sheet_index, i / 2);
        let side = if i % 2 == 0 { SheetSide::Front } else { SheetSide::Back };
        assert!(face.iter().all(|p| p.side == side));
    }
}

#[test]
fn test_zero_pages_rejected() {
    assert!(matches!(
        plan(0, LAYOUT, DuplexFlip::ShortEdge),
        Err(PipelineError::InvalidPageCount(0))
    ));
    assert!(matches!(
        booklet_statistics(0, LAYOUT),
        Err(PipelineError::InvalidPageCount(0))
    ));
}
