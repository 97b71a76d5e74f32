//! Command-line parsing for the brane model-comparison tool.
//!
//! Argument parsing and command dispatch stay separate from the numerical
//! code. Numeric run settings fall back to `BRANE_*` environment variables
//! (a `.env` file is honoured) before their defaults.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{ModelKind, PriorSet};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "brane", version, about = "Bayesian comparison of an oscillating brane model against ΛCDM")]
pub struct Cli {
    /// Debug-level logging (overridden by BRANE_LOG).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sample both models, print diagnostics, evidences and the Bayes factor.
    Compare(RunArgs),
    /// Sample a single model.
    Sample(SampleArgs),
    /// Re-derive convergence diagnostics from a saved chain artifact.
    Diagnose(DiagnoseArgs),
    /// Rerun the comparison under the standard, conservative and informative
    /// priors and print ln K for each (`--prior-set` and exports do not apply).
    Sensitivity(RunArgs),
}

/// Sampler and data options shared by `compare`, `sample` and `sensitivity`.
#[derive(Debug, Args, Clone)]
pub struct RunArgs {
    /// Number of walkers.
    #[arg(short = 'w', long, env = "BRANE_WALKERS", default_value_t = 32)]
    pub walkers: usize,

    /// Steps per walker.
    #[arg(short = 'n', long, env = "BRANE_STEPS", default_value_t = 2000)]
    pub steps: usize,

    /// Burn-in steps dropped from every walker.
    #[arg(short = 'd', long, env = "BRANE_DISCARD", default_value_t = 1000)]
    pub discard: usize,

    /// Sampler seed.
    #[arg(long, env = "BRANE_SEED", default_value_t = 42)]
    pub seed: u64,

    /// Stretch-move scale `a` (> 1).
    #[arg(long, default_value_t = 2.0)]
    pub stretch: f64,

    /// Prior table the models are built with.
    #[arg(long, value_enum, env = "BRANE_PRIOR_SET", default_value_t = PriorSet::Flat)]
    pub prior_set: PriorSet,

    /// Dataset JSON; a seeded mock dataset is used when omitted.
    #[arg(long, env = "BRANE_DATA", value_name = "JSON")]
    pub data: Option<PathBuf>,

    /// Seed for the mock dataset.
    #[arg(long, default_value_t = 42)]
    pub mock_seed: u64,

    /// Worker threads for log-posterior evaluation.
    #[arg(long, env = "BRANE_THREADS")]
    pub threads: Option<usize>,

    /// Write the chain artifact (samples, log-posteriors, evidence) to JSON.
    #[arg(long = "export-artifact", value_name = "JSON")]
    pub export_artifact: Option<PathBuf>,

    /// Write `<model>_samples.csv` files into this directory.
    #[arg(long = "export-samples", value_name = "DIR")]
    pub export_samples: Option<PathBuf>,
}

/// Options for sampling one model.
#[derive(Debug, Args, Clone)]
pub struct SampleArgs {
    /// Model to sample.
    #[arg(short = 'm', long, value_enum)]
    pub model: ModelKind,

    #[command(flatten)]
    pub run: RunArgs,
}

/// Options for re-deriving diagnostics.
#[derive(Debug, Args, Clone)]
pub struct DiagnoseArgs {
    /// Artifact JSON produced by `--export-artifact`.
    #[arg(long, value_name = "JSON")]
    pub artifact: PathBuf,
}
