//! Stretch-move ensemble sampling.

pub mod chain;
pub mod ensemble;
pub mod stretch;

pub use chain::*;
pub use ensemble::*;
pub use stretch::*;
