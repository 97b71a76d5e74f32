//! Numerical utilities: descriptive statistics and autocorrelation.

pub mod autocorr;
pub mod stats;

pub use autocorr::*;
pub use stats::*;
