//! `brane-evidence` library crate.
//!
//! Bayesian parameter estimation and model comparison: priors, log-posterior
//! models, a stretch-move ensemble sampler, convergence diagnostics and
//! evidence / Bayes-factor estimation.
//!
//! The binary (`brane`) is a thin wrapper around this library so the engine is
//! testable without spawning processes.

pub mod app;
pub mod cli;
pub mod data;
pub mod diagnostics;
pub mod domain;
pub mod error;
pub mod evidence;
pub mod io;
pub mod logging;
pub mod math;
pub mod models;
pub mod report;
pub mod sampler;
