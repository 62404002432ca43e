use crate::classify::DetectorKind;
use crate::constants::{DEFAULT_MAX_DIMENSION, DEFAULT_QUALITY, DEFAULT_RENDER_SCALE};
use crate::layout::{DuplexFlip, SheetLayout};
use crate::raster::{RasterBackend, check_scale, renderer, validate_quality};
use crate::types::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Rendering and recompression settings shared by every mode
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct RasterOptions {
    /// Pixels per point when rendering (2.0 = 144 DPI)
    pub render_scale: f32,
    /// JPEG quality, 1..=100
    pub quality: u8,
    /// Longest side of an embedded image, in pixels
    pub max_dimension: u32,
    pub backend: RasterBackend,
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self {
            render_scale: DEFAULT_RENDER_SCALE,
            quality: DEFAULT_QUALITY,
            max_dimension: DEFAULT_MAX_DIMENSION,
            backend: RasterBackend::Builtin,
        }
    }
}

impl RasterOptions {
    pub fn validate(&self) -> Result<()> {
        check_scale(self.render_scale)?;
        validate_quality(self.quality, self.max_dimension)?;
        renderer(self.backend).map(|_| ())
    }
}

/// Options for compress mode
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct CompressOptions {
    pub raster: RasterOptions,
}

impl CompressOptions {
    pub fn validate(&self) -> Result<()> {
        self.raster.validate()
    }
}

/// Options for split mode
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct SplitOptions {
    pub raster: RasterOptions,
    pub detector: DetectorKind,
    /// Half-spread detection: keep only the right half of the cover
    pub cover_right_half_only: bool,
    pub paper: PaperSize,
    pub orientation: Orientation,
    pub scaling: ScalingMode,
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self {
            raster: RasterOptions::default(),
            detector: DetectorKind::LargestImage,
            cover_right_half_only: true,
            paper: PaperSize::A4,
            orientation: Orientation::Portrait,
            scaling: ScalingMode::Fit,
        }
    }
}

impl SplitOptions {
    pub fn page_size(&self) -> PageSize {
        self.paper.page_size(self.orientation)
    }

    pub fn validate(&self) -> Result<()> {
        self.raster.validate()?;
        validate_paper(self.paper)
    }
}

/// What booklet slots are filled with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum BookletContent {
    /// Rendered and recompressed pages
    #[default]
    Raster,
    /// Source page content copied as vector forms
    Passthrough,
}

/// Options for booklet mode
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct BookletOptions {
    pub raster: RasterOptions,
    pub paper: PaperSize,
    pub orientation: Orientation,
    pub layout: SheetLayout,
    pub duplex: DuplexFlip,
    pub content: BookletContent,
    pub scaling: ScalingMode,
    /// Split spreads first and impose the split pages
    pub split_spreads: bool,
    /// Used when `split_spreads` is set
    pub split: SplitOptions,
}

impl Default for BookletOptions {
    fn default() -> Self {
        Self {
            raster: RasterOptions::default(),
            paper: PaperSize::A4,
            orientation: Orientation::Landscape,
            layout: SheetLayout::SaddleStitch4Up,
            duplex: DuplexFlip::LongEdge,
            content: BookletContent::Raster,
            scaling: ScalingMode::Fit,
            split_spreads: false,
            split: SplitOptions::default(),
        }
    }
}

impl BookletOptions {
    pub fn sheet_size(&self) -> PageSize {
        self.paper.page_size(self.orientation)
    }

    pub fn validate(&self) -> Result<()> {
        self.raster.validate()?;
        validate_paper(self.paper)?;
        if self.split_spreads {
            self.split.validate()?;
        }
        Ok(())
    }
}

/// Options for every mode, as stored in a configuration file
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(default))]
pub struct PipelineConfig {
    pub compress: CompressOptions,
    pub split: SplitOptions,
    pub booklet: BookletOptions,
}

impl PipelineConfig {
    /// Load options from JSON file
    #[cfg(feature = "serde")]
    pub async fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let config: PipelineConfig = serde_json::from_slice(&bytes)
            .map_err(|e| PipelineError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Save options to JSON file
    #[cfg(feature = "serde")]
    pub async fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| PipelineError::Config(format!("Failed to serialize config: {}", e)))?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }

    /// Validate the options
    pub fn validate(&self) -> Result<()> {
        self.compress.validate()?;
        self.split.validate()?;
        self.booklet.validate()
    }
}

fn validate_paper(paper: PaperSize) -> Result<()> {
    let (w, h) = paper.dimensions_mm();
    if !(w.is_finite() && h.is_finite()) || w <= 0.0 || h <= 0.0 {
        return Err(PipelineError::Config(format!(
            "paper size must be positive, got {}x{} mm",
            w, h
        )));
    }
    Ok(())
}
