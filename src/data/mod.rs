//! Observational inputs: the name-keyed dataset and its seeded mock.

pub mod dataset;
pub mod mock;

pub use dataset::*;
pub use mock::*;
