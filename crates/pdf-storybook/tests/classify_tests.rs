mod common;

use common::*;
use pdf_storybook::{
    ContentRegion, DetectorKind, HalfSpreadDetector, PipelineError, Rect, RegionContent,
    RegionDetector, RegionKind, SourceDocument, classify,
};

fn regions_of(pdf: Vec<u8>, index: usize, detector: &dyn RegionDetector) -> Vec<ContentRegion> {
    let source = SourceDocument::from_bytes(pdf).unwrap();
    detector.detect(&source.page(index).unwrap()).unwrap()
}

#[test]
fn test_spread_yields_image_then_text() {
    let source = SourceDocument::from_bytes(spreads_pdf(1)).unwrap();
    let regions = classify(&source.page(0).unwrap()).unwrap();

    assert_eq!(regions.len(), 2);
    assert_eq!(regions[0].kind, RegionKind::Image);
    assert_eq!(regions[0].bbox, Rect::new(0.0, 0.0, 400.0, 400.0));
    assert!(matches!(regions[0].content, RegionContent::EmbeddedImage(_)));

    assert_eq!(regions[1].kind, RegionKind::Text);
    assert_eq!(regions[1].content, RegionContent::Vector);
    assert!(approx(regions[1].bbox.x, 450.0));
    assert!(regions[1].bbox.y < 200.0 && regions[1].bbox.top() > 200.0);
    assert!(!regions[0].bbox.intersects(&regions[1].bbox));
}

#[test]
fn test_text_only_page_is_one_text_region() {
    let source = SourceDocument::from_bytes(text_pdf(1)).unwrap();
    let regions = classify(&source.page(0).unwrap()).unwrap();

    assert_eq!(regions.len(), 1);
    assert_eq!(regions[0].kind, RegionKind::Text);
    // both lines are covered
    assert!(regions[0].bbox.y < 680.0);
    assert!(regions[0].bbox.top() > 700.0);
}

#[test]
fn test_leading_moves_text_down() {
    let mut builder = PdfBuilder::new();
    builder.page(
        612.0,
        792.0,
        "BT /F1 12 Tf 14 TL 72 700 Td (First line) Tj T* (Second line) Tj (Third line) ' ET",
        &[],
    );
    let source = SourceDocument::from_bytes(builder.build()).unwrap();
    let regions = classify(&source.page(0).unwrap()).unwrap();

    // baselines at 700, 686 and 672
    assert_eq!(regions.len(), 1);
    assert!(regions[0].bbox.y < 672.0 && regions[0].bbox.y > 660.0);
    assert!(regions[0].bbox.top() > 700.0);
}

#[test]
fn test_picture_without_text_is_one_image_region() {
    let source = SourceDocument::from_bytes(picture_book(1)).unwrap();
    let regions = classify(&source.page(0).unwrap()).unwrap();

    assert_eq!(regions.len(), 1);
    assert_eq!(regions[0].kind, RegionKind::Image);
    assert_eq!(regions[0].bbox, Rect::new(0.0, 0.0, 200.0, 300.0));
}

#[test]
fn test_empty_page_has_no_extractable_content() {
    let mut builder = PdfBuilder::new();
    add_spread(&mut builder);
    builder.page(612.0, 792.0, "q Q", &[]);
    let source = SourceDocument::from_bytes(builder.build()).unwrap();

    let err = classify(&source.page(1).unwrap()).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::NoExtractableContent { page_index: 1 }
    ));
}

#[test]
fn test_image_inside_form_is_found() {
    let mut builder = PdfBuilder::new();
    let image = builder.rgb_image(8, 8, gradient);
    let form = builder.form(
        [0.0, 0.0, 200.0, 200.0],
        [1.0, 0.0, 0.0, 1.0, 100.0, 0.0],
        "q 200 0 0 200 0 0 cm /Im0 Do Q",
        &[("Im0", image)],
    );
    builder.page(612.0, 792.0, "/Fm0 Do", &[("Fm0", form)]);
    let source = SourceDocument::from_bytes(builder.build()).unwrap();

    let regions = classify(&source.page(0).unwrap()).unwrap();
    assert_eq!(regions.len(), 1);
    assert_eq!(regions[0].bbox, Rect::new(100.0, 0.0, 200.0, 200.0));
    assert_eq!(regions[0].content, RegionContent::EmbeddedImage(image));
}

#[test]
fn test_largest_of_several_images_wins() {
    let mut builder = PdfBuilder::new();
    let small = builder.rgb_image(4, 4, gradient);
    let large = builder.rgb_image(4, 4, gradient);
    builder.page(
        800.0,
        400.0,
        "q 100 0 0 100 500 250 cm /Im0 Do Q q 300 0 0 300 0 50 cm /Im1 Do Q",
        &[("Im0", small), ("Im1", large)],
    );
    let source = SourceDocument::from_bytes(builder.build()).unwrap();

    let regions = classify(&source.page(0).unwrap()).unwrap();
    assert_eq!(regions[0].content, RegionContent::EmbeddedImage(large));
    assert_eq!(regions[0].bbox, Rect::new(0.0, 50.0, 300.0, 300.0));
}

#[test]
fn test_half_spread_splits_landscape_pages() {
    let detector = HalfSpreadDetector::default();

    // cover keeps only its right half
    let cover = regions_of(spreads_pdf(2), 0, &detector);
    assert_eq!(cover.len(), 1);
    assert_eq!(cover[0].bbox, Rect::new(400.0, 0.0, 400.0, 400.0));

    let inner = regions_of(spreads_pdf(2), 1, &detector);
    assert_eq!(inner.len(), 2);
    assert_eq!(inner[0].kind, RegionKind::Image);
    assert_eq!(inner[0].bbox, Rect::new(0.0, 0.0, 400.0, 400.0));
    assert_eq!(inner[1].kind, RegionKind::Text);
    assert_eq!(inner[1].bbox, Rect::new(400.0, 0.0, 400.0, 400.0));
    assert!(inner.iter().all(|r| r.content == RegionContent::Raster));
}

#[test]
fn test_half_spread_full_cover_and_portrait() {
    let detector = DetectorKind::HalfSpread.build(false);
    let cover = regions_of(spreads_pdf(1), 0, detector.as_ref());
    assert_eq!(cover.len(), 2);

    let portrait = regions_of(text_pdf(1), 0, detector.as_ref());
    assert_eq!(portrait.len(), 1);
    assert_eq!(portrait[0].bbox, Rect::new(0.0, 0.0, 612.0, 792.0));
}
