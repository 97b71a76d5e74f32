//! Priors, likelihood terms and log-posterior evaluation.
//!
//! Models are plain immutable values: build them once (priors validated,
//! dataset bound into the likelihood) and hand them to the sampler.

pub mod cosmology;
pub mod likelihood;
pub mod model;
pub mod prior;

pub use cosmology::*;
pub use likelihood::*;
pub use model::*;
pub use prior::*;
