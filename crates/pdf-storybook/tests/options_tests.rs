use pdf_storybook::{
    BookletContent, DetectorKind, DuplexFlip, Orientation, PaperSize, PipelineConfig,
    PipelineError, RasterBackend, ScalingMode,
};
use tempfile::NamedTempFile;

#[tokio::test]
async fn test_config_save_and_load() {
    let mut config = PipelineConfig::default();
    config.compress.raster.quality = 70;
    config.split.detector = DetectorKind::HalfSpread;
    config.split.cover_right_half_only = false;
    config.split.paper = PaperSize::Custom {
        width_mm: 200.0,
        height_mm: 200.0,
    };
    config.booklet.duplex = DuplexFlip::ShortEdge;
    config.booklet.content = BookletContent::Passthrough;
    config.booklet.scaling = ScalingMode::Fill;

    let file = NamedTempFile::new().unwrap();
    config.save(file.path()).await.unwrap();
    let loaded = PipelineConfig::load(file.path()).await.unwrap();

    assert_eq!(loaded, config);
}

#[tokio::test]
async fn test_partial_config_uses_defaults() {
    let file = NamedTempFile::new().unwrap();
    tokio::fs::write(
        file.path(),
        r#"{ "booklet": { "paper": "A5", "orientation": "Portrait" } }"#,
    )
    .await
    .unwrap();

    let loaded = PipelineConfig::load(file.path()).await.unwrap();
    assert_eq!(loaded.booklet.paper, PaperSize::A5);
    assert_eq!(loaded.booklet.orientation, Orientation::Portrait);
    assert_eq!(loaded.booklet.raster.quality, 85);
    assert_eq!(loaded.compress.raster.backend, RasterBackend::Builtin);
    assert_eq!(loaded.split.paper, PaperSize::A4);
}

#[tokio::test]
async fn test_malformed_config_is_a_config_error() {
    let file = NamedTempFile::new().unwrap();
    tokio::fs::write(file.path(), "{ not json").await.unwrap();

    let err = PipelineConfig::load(file.path()).await.unwrap_err();
    assert!(matches!(err, PipelineError::Config(_)));
}

#[tokio::test]
async fn test_out_of_range_config_rejected_on_load() {
    let file = NamedTempFile::new().unwrap();
    tokio::fs::write(file.path(), r#"{ "compress": { "raster": { "quality": 0 } } }"#)
        .await
        .unwrap();

    let err = PipelineConfig::load(file.path()).await.unwrap_err();
    assert!(matches!(err, PipelineError::Config(_)));
}
