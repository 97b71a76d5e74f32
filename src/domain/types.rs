//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during sampling and diagnostics
//! - exported to JSON/CSV for downstream plotting and reporting
//! - reloaded later to re-derive diagnostics

use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::domain::float_serde;

/// Which model(s) a run samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ModelSpec {
    Oscillating,
    Lcdm,
    /// Sample both models and compute the Bayes factor.
    Both,
}

impl ModelSpec {
    pub fn kinds(self) -> Vec<ModelKind> {
        match self {
            ModelSpec::Oscillating => vec![ModelKind::Oscillating],
            ModelSpec::Lcdm => vec![ModelKind::Lcdm],
            ModelSpec::Both => vec![ModelKind::Oscillating, ModelKind::Lcdm],
        }
    }
}

/// Concrete model variant.
///
/// The set is closed: each variant carries its own parameter list, priors and
/// likelihood (see `models::cosmology`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    /// Oscillating brane model.
    Oscillating,
    /// ΛCDM reference model.
    Lcdm,
}

impl ModelKind {
    /// Human-readable label for terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            ModelKind::Oscillating => "Oscillating brane",
            ModelKind::Lcdm => "ΛCDM",
        }
    }

    /// Short, filesystem-safe identifier.
    pub fn slug(self) -> &'static str {
        match self {
            ModelKind::Oscillating => "oscillating",
            ModelKind::Lcdm => "lcdm",
        }
    }
}

/// Which prior table the models are built with.
///
/// `Flat` is the main-analysis choice (bounded uniform / log-uniform). The
/// other three are the documented alternatives a sensitivity run compares.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PriorSet {
    #[default]
    Flat,
    /// Truncated Gaussians on `T` and `Omega_m`.
    Standard,
    /// Wider ranges, log-uniform amplitude.
    Conservative,
    /// Gaussians on every oscillating parameter.
    Informative,
}

impl PriorSet {
    /// Sets compared by a sensitivity run, in report order.
    pub const SENSITIVITY: [PriorSet; 3] = [PriorSet::Standard, PriorSet::Conservative, PriorSet::Informative];

    pub fn slug(self) -> &'static str {
        match self {
            PriorSet::Flat => "flat",
            PriorSet::Standard => "standard",
            PriorSet::Conservative => "conservative",
            PriorSet::Informative => "informative",
        }
    }
}

/// A named model parameter. The unit is informational only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub unit: String,
}

impl Parameter {
    pub fn new(name: impl Into<String>, unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            unit: unit.into(),
        }
    }
}

/// Physical constants entering the likelihoods.
///
/// Passed explicitly into model construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CosmologyConfig {
    /// H0 value the oscillating model predicts (km/s/Mpc).
    pub h0_reference: f64,
    /// Measurement uncertainty applied to H0 samples.
    pub h0_sigma: f64,
    /// S8 prediction of the oscillating model (with suppression).
    pub s8_oscillating: f64,
    /// S8 prediction of ΛCDM.
    pub s8_lcdm: f64,
    /// Measurement uncertainty applied to S8 samples.
    pub s8_sigma: f64,
    /// Lookback time proxy: `t(z) = ln(1 + z) / lookback_rate`.
    pub lookback_rate: f64,
}

impl Default for CosmologyConfig {
    fn default() -> Self {
        Self {
            h0_reference: 67.4,
            h0_sigma: 0.5,
            s8_oscillating: 0.79,
            s8_lcdm: 0.83,
            s8_sigma: 0.02,
            lookback_rate: 0.7,
        }
    }
}

/// Per-parameter convergence and posterior summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSummary {
    pub name: String,
    #[serde(with = "float_serde::scalar")]
    pub r_hat: f64,
    #[serde(with = "float_serde::scalar")]
    pub ess: f64,
    #[serde(with = "float_serde::scalar")]
    pub mean: f64,
    #[serde(with = "float_serde::scalar")]
    pub std: f64,
    #[serde(with = "float_serde::scalar")]
    pub median: f64,
    #[serde(with = "float_serde::scalar")]
    pub q025: f64,
    #[serde(with = "float_serde::scalar")]
    pub q16: f64,
    #[serde(with = "float_serde::scalar")]
    pub q84: f64,
    #[serde(with = "float_serde::scalar")]
    pub q975: f64,
}

/// Convergence diagnostics for a whole chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvergenceReport {
    /// Burn-in steps dropped from the front of every walker.
    pub discard: usize,
    /// Pooled post-burn-in sample count per parameter.
    pub n_samples: usize,
    /// Mean acceptance fraction over all walkers (`NaN` if unknown).
    #[serde(with = "float_serde::scalar")]
    pub acceptance_fraction: f64,
    pub params: Vec<ParamSummary>,
}

impl ConvergenceReport {
    /// Largest R-hat over all parameters (`+inf` if any is degenerate).
    pub fn max_r_hat(&self) -> f64 {
        self.params
            .iter()
            .map(|p| p.r_hat)
            .fold(f64::NEG_INFINITY, f64::max)
    }
}

/// Marginal-likelihood estimate for one model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvidenceEstimate {
    #[serde(with = "float_serde::scalar")]
    pub log_evidence: f64,
    #[serde(with = "float_serde::scalar")]
    pub error: f64,
    /// Number of post-burn-in samples used.
    pub n_samples: usize,
}

/// Qualitative strength of a Bayes factor (Jeffreys-style scale).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceStrength {
    /// `log K < 0`: the data favour model B (the reference).
    FavorsReference,
    /// `0 <= log K < 1`
    Weak,
    /// `1 <= log K < 2.3`
    Positive,
    /// `2.3 <= log K < 3.5`
    Strong,
    /// `log K >= 3.5`
    VeryStrong,
    /// `log K` is NaN.
    Undetermined,
}

impl EvidenceStrength {
    pub fn label(self) -> &'static str {
        match self {
            EvidenceStrength::FavorsReference => "favors reference model",
            EvidenceStrength::Weak => "weak",
            EvidenceStrength::Positive => "positive",
            EvidenceStrength::Strong => "strong",
            EvidenceStrength::VeryStrong => "very strong",
            EvidenceStrength::Undetermined => "undetermined",
        }
    }
}

/// Bayes factor between two evidence estimates (A over B).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BayesFactorResult {
    #[serde(with = "float_serde::scalar")]
    pub log_k: f64,
    #[serde(with = "float_serde::scalar")]
    pub combined_error: f64,
    pub strength: EvidenceStrength,
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus environment and defaults).
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub model_spec: ModelSpec,
    pub n_walkers: usize,
    pub n_steps: usize,
    pub discard: usize,
    pub seed: u64,
    /// Stretch-move scale `a` (> 1).
    pub stretch_scale: f64,
    pub prior_set: PriorSet,

    /// Dataset JSON; a seeded mock dataset is generated when absent.
    pub data_path: Option<PathBuf>,
    pub mock_seed: u64,

    /// Worker threads for log-posterior evaluation (rayon default when `None`).
    pub threads: Option<usize>,

    pub export_artifact: Option<PathBuf>,
    pub export_samples_dir: Option<PathBuf>,

    pub cosmology: CosmologyConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            model_spec: ModelSpec::Both,
            n_walkers: 32,
            n_steps: 2000,
            discard: 1000,
            seed: 42,
            stretch_scale: 2.0,
            prior_set: PriorSet::Flat,
            data_path: None,
            mock_seed: 42,
            threads: None,
            export_artifact: None,
            export_samples_dir: None,
            cosmology: CosmologyConfig::default(),
        }
    }
}
