//! Evidence (marginal likelihood) estimation and model comparison.

pub mod estimator;

pub use estimator::*;
