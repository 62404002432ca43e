//! Page content analysis
//!
//! - Affine matrices in PDF convention
//! - Operator walk that locates painted images and shown text

mod matrix;
mod scan;

pub use matrix::*;
pub use scan::*;
