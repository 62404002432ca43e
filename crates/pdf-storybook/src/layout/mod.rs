//! Layout calculation modules
//!
//! - Shared geometry (`Rect`)
//! - Saddle-stitch signature planning (which source page goes where, and how it is rotated)

mod signature;
mod types;

pub use signature::*;
pub use types::*;
