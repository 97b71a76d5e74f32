//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and parses CLI arguments
//! - installs the tracing subscriber
//! - runs the sampling pipeline
//! - prints reports and writes optional exports

use std::path::Path;

use clap::Parser;
use tracing::{info, warn};

use crate::cli::{Command, DiagnoseArgs, RunArgs, SampleArgs};
use crate::domain::{AnalysisConfig, CosmologyConfig, ModelKind, ModelSpec};
use crate::error::AppError;
use crate::io::{read_artifact_json, samples_csv_path, write_artifact_json, write_samples_csv};
use crate::report::{format_bayes_factor, format_convergence, format_evidence, format_run_header, format_sensitivity};

pub mod pipeline;

/// Entry point for the `brane` binary.
pub fn run() -> Result<(), AppError> {
    // Environment fallbacks for clap args may come from a `.env` file.
    dotenvy::dotenv().ok();

    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);
    crate::logging::init_tracing(cli.verbose);

    match cli.command {
        Command::Compare(args) => handle_run(config_from_args(&args, ModelSpec::Both)),
        Command::Sample(SampleArgs { model, run }) => handle_run(config_from_args(&run, single(model))),
        Command::Diagnose(args) => handle_diagnose(args),
        Command::Sensitivity(args) => handle_sensitivity(config_from_args(&args, ModelSpec::Both)),
    }
}

fn single(kind: ModelKind) -> ModelSpec {
    match kind {
        ModelKind::Oscillating => ModelSpec::Oscillating,
        ModelKind::Lcdm => ModelSpec::Lcdm,
    }
}

fn handle_run(config: AnalysisConfig) -> Result<(), AppError> {
    let run = pipeline::run_analysis(&config)?;

    print!("{}", format_run_header(&config, &run.data_label));
    println!("Priors: {}\n", config.prior_set.slug());
    for m in &run.models {
        println!("{}", format_convergence(m.kind, &m.convergence));
    }
    println!("Evidence:");
    for m in &run.models {
        print!("{}", format_evidence(m.kind, &m.evidence));
    }
    if let Some(bf) = &run.bayes_factor {
        println!();
        print!("{}", format_bayes_factor(ModelKind::Oscillating, ModelKind::Lcdm, bf));
    }

    if let Some(path) = &config.export_artifact {
        write_artifact_json(path, &run.to_artifact(&config))?;
        info!(path = %path.display(), "artifact written");
    }
    if let Some(dir) = &config.export_samples_dir {
        export_samples(dir, &run, config.discard)?;
    }
    Ok(())
}

fn export_samples(dir: &Path, run: &pipeline::RunOutput, discard: usize) -> Result<(), AppError> {
    std::fs::create_dir_all(dir)
        .map_err(|e| AppError::new(4, format!("Failed to create export directory '{}': {e}", dir.display())))?;
    for m in &run.models {
        let path = samples_csv_path(dir, m.kind);
        write_samples_csv(&path, &m.chain, discard)?;
        info!(path = %path.display(), "samples written");
    }
    Ok(())
}

fn handle_sensitivity(config: AnalysisConfig) -> Result<(), AppError> {
    if config.export_artifact.is_some() || config.export_samples_dir.is_some() {
        warn!("export flags are ignored by the sensitivity run");
    }
    let out = pipeline::run_sensitivity(&config)?;

    println!("{}", format_run_header(&config, &out.data_label));
    print!("{}", format_sensitivity(ModelKind::Oscillating, ModelKind::Lcdm, &out.rows));
    Ok(())
}

fn handle_diagnose(args: DiagnoseArgs) -> Result<(), AppError> {
    let artifact = read_artifact_json(&args.artifact)?;
    println!(
        "=== brane - diagnostics for {} (generated {}, {} priors) ===\n",
        args.artifact.display(),
        artifact.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
        artifact.prior_set.slug()
    );
    for (kind, report) in pipeline::diagnose_artifact(&artifact)? {
        println!("{}", format_convergence(kind, &report));
    }
    println!("Evidence:");
    for m in &artifact.models {
        print!("{}", format_evidence(m.kind, &m.evidence));
    }
    if let Some(bf) = &artifact.bayes_factor {
        println!();
        print!("{}", format_bayes_factor(ModelKind::Oscillating, ModelKind::Lcdm, bf));
    }
    Ok(())
}

pub fn config_from_args(args: &RunArgs, model_spec: ModelSpec) -> AnalysisConfig {
    AnalysisConfig {
        model_spec,
        n_walkers: args.walkers,
        n_steps: args.steps,
        discard: args.discard,
        seed: args.seed,
        stretch_scale: args.stretch,
        prior_set: args.prior_set,
        data_path: args.data.clone(),
        mock_seed: args.mock_seed,
        threads: args.threads,
        export_artifact: args.export_artifact.clone(),
        export_samples_dir: args.export_samples.clone(),
        cosmology: CosmologyConfig::default(),
    }
}

const SUBCOMMANDS: [&str; 4] = ["compare", "sample", "diagnose", "sensitivity"];

/// Rewrite argv so `brane` defaults to `brane compare`.
///
/// Rules:
/// - `brane`                       -> `brane compare`
/// - `brane -n 500 ...`            -> `brane compare -n 500 ...`
/// - `brane -v diagnose ...`       -> unchanged (`-v` is global)
/// - `brane --help/--version/-h`   -> unchanged (top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("compare".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(arg1.as_str(), "-h" | "--help" | "-V" | "--version" | "help");
    if is_top_level_help_or_version {
        return argv;
    }

    let names_subcommand = argv[1..].iter().any(|a| SUBCOMMANDS.contains(&a.as_str()));
    if names_subcommand {
        return argv;
    }

    if arg1.starts_with('-') {
        argv.insert(1, "compare".to_string());
    }
    argv
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use crate::domain::PriorSet;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocations_default_to_compare() {
        assert_eq!(rewrite_args(args(&["brane"])), args(&["brane", "compare"]));
        assert_eq!(
            rewrite_args(args(&["brane", "-n", "500"])),
            args(&["brane", "compare", "-n", "500"])
        );
        assert_eq!(rewrite_args(args(&["brane", "--help"])), args(&["brane", "--help"]));
        assert_eq!(
            rewrite_args(args(&["brane", "diagnose", "--artifact", "a.json"])),
            args(&["brane", "diagnose", "--artifact", "a.json"])
        );
        assert_eq!(rewrite_args(args(&["brane", "-v"])), args(&["brane", "compare", "-v"]));

        let global_first = args(&["brane", "-v", "diagnose", "--artifact", "a.json"]);
        assert_eq!(rewrite_args(global_first.clone()), global_first);
        let cli = Cli::try_parse_from(rewrite_args(global_first)).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Command::Diagnose(_)));

        let cli = Cli::try_parse_from(rewrite_args(args(&["brane", "-v", "sensitivity", "-n", "300"]))).unwrap();
        let Command::Sensitivity(run) = cli.command else {
            panic!("expected sensitivity");
        };
        assert_eq!(run.steps, 300);
    }

    #[test]
    fn parsed_flags_become_an_analysis_config() {
        let cli = Cli::parse_from(rewrite_args(args(&["brane", "-w", "48", "-n", "300", "-d", "100", "--seed", "7"])));
        let Command::Compare(run) = cli.command else {
            panic!("expected compare");
        };
        let config = config_from_args(&run, ModelSpec::Both);
        assert_eq!(config.n_walkers, 48);
        assert_eq!(config.n_steps, 300);
        assert_eq!(config.discard, 100);
        assert_eq!(config.seed, 7);
        assert_eq!(config.stretch_scale, 2.0);
        assert_eq!(config.prior_set, PriorSet::Flat);

        let cli = Cli::parse_from(args(&["brane", "sample", "--model", "lcdm", "--prior-set", "informative"]));
        let Command::Sample(SampleArgs { model, run }) = cli.command else {
            panic!("expected sample");
        };
        assert_eq!(single(model), ModelSpec::Lcdm);
        assert_eq!(config_from_args(&run, single(model)).prior_set, PriorSet::Informative);
    }
}
