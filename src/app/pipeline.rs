//! Shared analysis pipeline used by every subcommand.
//!
//! dataset -> model -> ensemble sampling -> {diagnostics, evidence} -> Bayes factor
//!
//! The CLI layer only prints and exports what this returns.

use tracing::info;

use crate::data::{Dataset, generate_mock_dataset, load_dataset_json};
use crate::domain::{
    AnalysisConfig, BayesFactorResult, ConvergenceReport, EvidenceEstimate, ModelKind, ModelSpec, PriorSet,
};
use crate::error::AppError;
use crate::evidence::{bayes_factor, estimate};
use crate::io::{ChainArtifact, ModelArtifact};
use crate::models::build_model;
use crate::sampler::{Chain, EnsembleSampler, StretchMove, WalkerInit};

/// Outputs for one sampled model.
#[derive(Debug, Clone)]
pub struct ModelRun {
    pub kind: ModelKind,
    pub chain: Chain,
    pub convergence: ConvergenceReport,
    pub evidence: EvidenceEstimate,
}

/// All computed outputs of a single run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    /// Where the data came from (file path or mock seed).
    pub data_label: String,
    pub models: Vec<ModelRun>,
    /// Oscillating over ΛCDM, when both were sampled.
    pub bayes_factor: Option<BayesFactorResult>,
}

impl RunOutput {
    pub fn model(&self, kind: ModelKind) -> Option<&ModelRun> {
        self.models.iter().find(|m| m.kind == kind)
    }

    pub fn to_artifact(&self, config: &AnalysisConfig) -> ChainArtifact {
        let models = self
            .models
            .iter()
            .map(|m| ModelArtifact::from_chain(m.kind, &m.chain, config.discard, m.evidence))
            .collect();
        ChainArtifact::new(config.cosmology, config.prior_set, models, self.bayes_factor)
    }
}

/// Bayes factors of a prior-sensitivity run, in [`PriorSet::SENSITIVITY`] order.
#[derive(Debug, Clone)]
pub struct SensitivityOutput {
    pub data_label: String,
    pub rows: Vec<(PriorSet, BayesFactorResult)>,
}

/// Validate run settings before any sampling happens.
pub fn validate_config(config: &AnalysisConfig) -> Result<(), AppError> {
    if config.n_steps == 0 {
        return Err(AppError::invalid("Number of steps must be > 0."));
    }
    if config.discard >= config.n_steps {
        return Err(AppError::insufficient(format!(
            "Burn-in ({}) must be smaller than the number of steps ({}).",
            config.discard, config.n_steps
        )));
    }
    if config.threads == Some(0) {
        return Err(AppError::invalid("Thread count must be > 0."));
    }
    StretchMove::new(config.stretch_scale)?;
    Ok(())
}

pub fn load_data(config: &AnalysisConfig) -> Result<(Dataset, String), AppError> {
    match &config.data_path {
        Some(path) => Ok((load_dataset_json(path)?, path.display().to_string())),
        None => Ok((
            generate_mock_dataset(config.mock_seed, &config.cosmology)?,
            format!("mock (seed {})", config.mock_seed),
        )),
    }
}

/// Execute the full pipeline for every model selected by the config.
pub fn run_analysis(config: &AnalysisConfig) -> Result<RunOutput, AppError> {
    validate_config(config)?;
    in_pool(config, || {
        let (dataset, data_label) = load_data(config)?;
        run_models(config, &dataset, data_label)
    })
}

/// Bayes factor of the oscillating model over ΛCDM under each prior set in
/// [`PriorSet::SENSITIVITY`], on one shared dataset.
///
/// Both models are always sampled; `config.model_spec` and `config.prior_set`
/// are ignored.
pub fn run_sensitivity(config: &AnalysisConfig) -> Result<SensitivityOutput, AppError> {
    validate_config(config)?;
    in_pool(config, || {
        let (dataset, data_label) = load_data(config)?;
        let mut rows = Vec::with_capacity(PriorSet::SENSITIVITY.len());
        for prior_set in PriorSet::SENSITIVITY {
            info!(priors = prior_set.slug(), "sensitivity run");
            let per_set = AnalysisConfig {
                model_spec: ModelSpec::Both,
                prior_set,
                ..config.clone()
            };
            let run = run_models(&per_set, &dataset, data_label.clone())?;
            let bf = run
                .bayes_factor
                .ok_or_else(|| AppError::new(4, "Sensitivity run produced no Bayes factor."))?;
            rows.push((prior_set, bf));
        }
        Ok(SensitivityOutput { data_label, rows })
    })
}

fn in_pool<T, F>(config: &AnalysisConfig, work: F) -> Result<T, AppError>
where
    T: Send,
    F: FnOnce() -> Result<T, AppError> + Send,
{
    match config.threads {
        Some(n) => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build()
                .map_err(|e| AppError::new(4, format!("Failed to start worker pool: {e}")))?;
            pool.install(work)
        }
        None => work(),
    }
}

fn run_models(config: &AnalysisConfig, dataset: &Dataset, data_label: String) -> Result<RunOutput, AppError> {
    let series = dataset.names().collect::<Vec<_>>().join(",");
    info!(data = %data_label, series = %series, priors = config.prior_set.slug(), "dataset ready");

    let mut models = Vec::new();
    for kind in config.model_spec.kinds() {
        models.push(sample_model(kind, dataset, config)?);
    }

    let osc = models.iter().find(|m| m.kind == ModelKind::Oscillating);
    let lcdm = models.iter().find(|m| m.kind == ModelKind::Lcdm);
    let bayes_factor = match (osc, lcdm) {
        (Some(a), Some(b)) => {
            let bf = bayes_factor(&a.evidence, &b.evidence);
            info!(log_k = bf.log_k, error = bf.combined_error, strength = bf.strength.label(), "bayes factor");
            Some(bf)
        }
        _ => None,
    };

    Ok(RunOutput {
        data_label,
        models,
        bayes_factor,
    })
}

/// Build, sample and summarise one model.
pub fn sample_model(kind: ModelKind, dataset: &Dataset, config: &AnalysisConfig) -> Result<ModelRun, AppError> {
    let model = build_model(kind, config.prior_set, dataset, &config.cosmology)?;
    info!(model = kind.slug(), params = %model.param_names().join(","), "sampling model");

    let chain = EnsembleSampler::for_model(&model, config.n_walkers)?
        .with_stretch(StretchMove::new(config.stretch_scale)?)
        .with_seed(config.seed)
        .run(config.n_steps, &WalkerInit::for_model(&model))?;

    let convergence = crate::diagnostics::compute(&chain, config.discard)?;
    let evidence = estimate(&chain, config.discard)?;
    info!(
        model = kind.slug(),
        log_evidence = evidence.log_evidence,
        error = evidence.error,
        max_r_hat = convergence.max_r_hat(),
        "model done"
    );

    Ok(ModelRun {
        kind,
        chain,
        convergence,
        evidence,
    })
}

/// Convergence reports re-derived from a saved artifact (kept steps only,
/// so no further burn-in is dropped).
pub fn diagnose_artifact(artifact: &ChainArtifact) -> Result<Vec<(ModelKind, ConvergenceReport)>, AppError> {
    artifact
        .models
        .iter()
        .map(|m| {
            let chain = m.to_chain()?;
            let mut report = crate::diagnostics::compute(&chain, 0)?;
            report.discard = m.discard;
            report.acceptance_fraction = m.acceptance_fraction;
            Ok((m.kind, report))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick_config(spec: ModelSpec) -> AnalysisConfig {
        AnalysisConfig {
            model_spec: spec,
            n_walkers: 16,
            n_steps: 120,
            discard: 40,
            threads: Some(2),
            ..AnalysisConfig::default()
        }
    }

    #[test]
    fn compare_run_produces_both_models_and_a_bayes_factor() {
        let out = run_analysis(&quick_config(ModelSpec::Both)).unwrap();
        assert_eq!(out.models.len(), 2);
        let osc = out.model(ModelKind::Oscillating).unwrap();
        assert_eq!(osc.convergence.params.len(), 4);
        assert_eq!(osc.convergence.n_samples, 16 * 80);
        assert!(osc.evidence.log_evidence.is_finite());

        let bf = out.bayes_factor.unwrap();
        let lcdm = out.model(ModelKind::Lcdm).unwrap();
        assert_eq!(bf.log_k, osc.evidence.log_evidence - lcdm.evidence.log_evidence);
    }

    #[test]
    fn results_do_not_depend_on_thread_count() {
        let mut one = quick_config(ModelSpec::Lcdm);
        one.threads = Some(1);
        let mut four = one.clone();
        four.threads = Some(4);
        let a = run_analysis(&one).unwrap();
        let b = run_analysis(&four).unwrap();
        assert_eq!(a.models[0].chain, b.models[0].chain);
        assert!(a.bayes_factor.is_none());
    }

    #[test]
    fn artifact_diagnostics_match_the_live_run() {
        let config = quick_config(ModelSpec::Lcdm);
        let out = run_analysis(&config).unwrap();
        let artifact = out.to_artifact(&config);
        let reports = diagnose_artifact(&artifact).unwrap();
        let live = &out.models[0].convergence;
        let (kind, saved) = &reports[0];
        assert_eq!(*kind, ModelKind::Lcdm);
        assert_eq!(saved.n_samples, live.n_samples);
        assert_eq!(saved.discard, live.discard);
        for (p, q) in saved.params.iter().zip(&live.params) {
            assert_eq!(p.name, q.name);
            assert!((p.mean - q.mean).abs() < 1e-9);
            assert!((p.r_hat - q.r_hat).abs() < 1e-9 || (p.r_hat.is_infinite() && q.r_hat.is_infinite()));
        }
    }

    #[test]
    fn sensitivity_reports_one_bayes_factor_per_prior_set() {
        let config = quick_config(ModelSpec::Oscillating);
        let rows = run_sensitivity(&config).unwrap().rows;
        let sets: Vec<PriorSet> = rows.iter().map(|(s, _)| *s).collect();
        assert_eq!(sets, PriorSet::SENSITIVITY);
        for (_, bf) in &rows {
            assert!(bf.log_k.is_finite());
            assert!(bf.combined_error >= 0.0);
        }

        // The standard row is the same run `compare --prior-set standard` does.
        let standard = run_analysis(&AnalysisConfig {
            prior_set: PriorSet::Standard,
            ..quick_config(ModelSpec::Both)
        })
        .unwrap();
        assert_eq!(standard.bayes_factor.unwrap(), rows[0].1);
    }

    #[test]
    fn burn_in_longer_than_run_is_rejected_up_front() {
        let mut config = quick_config(ModelSpec::Lcdm);
        config.discard = config.n_steps;
        assert_eq!(run_analysis(&config).unwrap_err().exit_code(), 3);
        config.discard = 0;
        config.stretch_scale = 1.0;
        assert_eq!(run_analysis(&config).unwrap_err().exit_code(), 2);
    }
}
