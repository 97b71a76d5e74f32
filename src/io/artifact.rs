//! Read/write chain artifact JSON files.
//!
//! The artifact is what downstream plotting and reporting consume: per model,
//! the flattened post-burn-in samples, their log-posteriors and the evidence
//! estimate, plus the Bayes factor when both models were run. The engine only
//! reads it back to re-derive diagnostics.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{BayesFactorResult, CosmologyConfig, EvidenceEstimate, ModelKind, PriorSet, float_serde};
use crate::error::AppError;
use crate::sampler::Chain;

pub const TOOL_NAME: &str = "brane";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainArtifact {
    pub tool: String,
    pub generated_at: DateTime<Utc>,
    pub cosmology: CosmologyConfig,
    /// Artifacts written before prior sets existed used the flat priors.
    #[serde(default)]
    pub prior_set: PriorSet,
    pub models: Vec<ModelArtifact>,
    pub bayes_factor: Option<BayesFactorResult>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub kind: ModelKind,
    pub param_names: Vec<String>,
    pub n_walkers: usize,
    /// Steps per walker kept after burn-in.
    pub n_steps: usize,
    /// Steps dropped from the front of every walker.
    pub discard: usize,
    #[serde(with = "float_serde::scalar")]
    pub acceptance_fraction: f64,
    /// Walker-major rows: walker 0's kept steps first.
    pub samples: Vec<Vec<f64>>,
    #[serde(with = "float_serde::vec")]
    pub log_probs: Vec<f64>,
    pub evidence: EvidenceEstimate,
}

impl ModelArtifact {
    pub fn from_chain(kind: ModelKind, chain: &Chain, discard: usize, evidence: EvidenceEstimate) -> Self {
        Self {
            kind,
            param_names: chain.param_names().to_vec(),
            n_walkers: chain.n_walkers(),
            n_steps: chain.n_steps().saturating_sub(discard),
            discard,
            acceptance_fraction: chain.mean_acceptance_fraction(),
            samples: chain.flat_samples(discard),
            log_probs: chain.flat_log_probs(discard),
            evidence,
        }
    }

    /// Rebuild the kept part of the chain. Acceptance counts are not stored
    /// per walker, so the rebuilt chain reports none.
    pub fn to_chain(&self) -> Result<Chain, AppError> {
        if self.samples.len() != self.n_walkers * self.n_steps {
            return Err(AppError::invalid(format!(
                "Artifact model '{}' lists {} samples for {} walkers x {} steps.",
                self.kind.slug(),
                self.samples.len(),
                self.n_walkers,
                self.n_steps
            )));
        }
        Chain::from_walker_major(self.param_names.clone(), self.n_walkers, &self.samples, &self.log_probs)
    }
}

impl ChainArtifact {
    pub fn new(
        cosmology: CosmologyConfig,
        prior_set: PriorSet,
        models: Vec<ModelArtifact>,
        bayes_factor: Option<BayesFactorResult>,
    ) -> Self {
        Self {
            tool: TOOL_NAME.to_string(),
            generated_at: Utc::now(),
            cosmology,
            prior_set,
            models,
            bayes_factor,
        }
    }
}

pub fn write_artifact_json(path: &Path, artifact: &ChainArtifact) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(4, format!("Failed to create artifact '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(BufWriter::new(file), artifact)
        .map_err(|e| AppError::new(4, format!("Failed to write artifact JSON: {e}")))?;
    Ok(())
}

pub fn read_artifact_json(path: &Path) -> Result<ChainArtifact, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::invalid(format!("Failed to open artifact '{}': {e}", path.display())))?;
    let artifact: ChainArtifact = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| AppError::invalid(format!("Invalid artifact JSON '{}': {e}", path.display())))?;
    if artifact.models.is_empty() {
        return Err(AppError::invalid(format!("Artifact '{}' contains no models.", path.display())));
    }
    Ok(artifact)
}
