//! Input/output helpers.
//!
//! - chain artifact JSON read/write (`artifact`)
//! - per-model sample CSV export (`export`)

pub mod artifact;
pub mod export;

pub use artifact::*;
pub use export::*;
