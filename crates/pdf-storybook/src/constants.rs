//! Shared constants for the storybook pipeline
//!
//! This module centralizes defaults and magic numbers used by the
//! rasterizer, recompressor, classifier and assembler.

// =============================================================================
// Unit Conversion
// =============================================================================

/// Points per millimeter (1 inch = 72 points, 1 inch = 25.4mm)
pub const POINTS_PER_MM: f32 = 72.0 / 25.4; // ≈ 2.83465

/// Convert millimeters to points
#[inline]
pub fn mm_to_pt(mm: f32) -> f32 {
    mm * POINTS_PER_MM
}

// =============================================================================
// Page Dimensions
// =============================================================================

/// Page width used when a page tree carries no MediaBox at all (US Letter)
pub const DEFAULT_PAGE_WIDTH_PT: f32 = 612.0;

/// Page height used when a page tree carries no MediaBox at all (US Letter)
pub const DEFAULT_PAGE_HEIGHT_PT: f32 = 792.0;

// =============================================================================
// Raster Defaults
// =============================================================================

/// Point-to-pixel scale for page rendering (2.0 = 144 DPI)
pub const DEFAULT_RENDER_SCALE: f32 = 2.0;

/// JPEG quality used when none is configured
pub const DEFAULT_QUALITY: u8 = 85;

/// Longest side, in pixels, a recompressed image may keep
pub const DEFAULT_MAX_DIMENSION: u32 = 2000;

/// Largest page canvas a renderer will allocate (about 300 MB as RGB)
pub const MAX_CANVAS_PIXELS: u64 = 100_000_000;

// =============================================================================
// Text Geometry
// =============================================================================

/// Approximate character width ratio for Helvetica
pub const HELVETICA_CHAR_WIDTH_RATIO: f32 = 0.5;

/// Glyph ascent as a fraction of the font size
pub const TEXT_ASCENT_RATIO: f32 = 0.8;

/// Glyph descent as a fraction of the font size (below the baseline)
pub const TEXT_DESCENT_RATIO: f32 = 0.2;

/// Nesting limit for Form XObjects
pub const MAX_FORM_DEPTH: usize = 12;
