//! Convergence diagnostics over a frozen chain.

pub mod convergence;

pub use convergence::*;
