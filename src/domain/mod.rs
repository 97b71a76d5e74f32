//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - run configuration (`ModelSpec`, `AnalysisConfig`, `CosmologyConfig`)
//! - model metadata (`ModelKind`, `Parameter`)
//! - derived records (`ConvergenceReport`, `EvidenceEstimate`, `BayesFactorResult`)

pub mod float_serde;
pub mod types;

pub use types::*;
