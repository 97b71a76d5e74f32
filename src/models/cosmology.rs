//! The two competing cosmological models.
//!
//! Both read the same dataset series; they differ in parameters, priors and in
//! what they predict for each series:
//!
//! | series           | oscillating brane                      | ΛCDM            |
//! | ---------------- | -------------------------------------- | --------------- |
//! | `H0_samples`     | fixed `h0_reference`                   | parameter `H0`  |
//! | `S8_samples`     | `s8_oscillating` (suppressed)          | `s8_lcdm`       |
//! | `w_measurements` | `-1 + A_w sin(2π t(z) / T)`            | `-1`            |
//!
//! with the lookback-time proxy `t(z) = ln(1 + z) / lookback_rate`.
//!
//! Priors come from a [`PriorSet`]. Only `Flat` and `Standard` differ for
//! ΛCDM; the alternative sets change the oscillating priors alone.

use std::f64::consts::PI;
use std::sync::Arc;

use tracing::warn;

use crate::data::{Dataset, H0_SAMPLES, S8_SAMPLES, W_MEASUREMENTS};
use crate::domain::{CosmologyConfig, ModelKind, Parameter, PriorSet};
use crate::error::AppError;
use crate::models::likelihood::{BinnedTerm, SampleSetTerm};
use crate::models::model::{LikelihoodFn, Model};
use crate::models::prior::PriorSpec;

/// Build the model for `kind` against `dataset`, with priors from `prior_set`.
pub fn build_model(
    kind: ModelKind,
    prior_set: PriorSet,
    dataset: &Dataset,
    cosmology: &CosmologyConfig,
) -> Result<Model, AppError> {
    validate_cosmology(cosmology)?;
    if dataset.is_empty() {
        warn!(model = kind.slug(), "dataset is empty; posterior equals the prior");
    }
    match kind {
        ModelKind::Oscillating => oscillating(prior_set, dataset, cosmology),
        ModelKind::Lcdm => lcdm(prior_set, dataset, cosmology),
    }
}

/// `[tau_0, f_osc, T, A_w]`
fn oscillating_priors(set: PriorSet) -> [PriorSpec; 4] {
    match set {
        PriorSet::Flat => [
            PriorSpec::log_uniform(1e19, 1e20),
            PriorSpec::uniform(0.05, 0.20),
            PriorSpec::uniform(1.5, 2.5),
            PriorSpec::uniform(0.001, 0.005),
        ],
        PriorSet::Standard => [
            PriorSpec::log_uniform(1e19, 1e20),
            PriorSpec::uniform(0.05, 0.20),
            PriorSpec::truncated_gaussian(2.0, 0.3, 1.5, 2.5),
            PriorSpec::uniform(0.001, 0.005),
        ],
        PriorSet::Conservative => [
            PriorSpec::log_uniform(5e18, 5e20),
            PriorSpec::uniform(0.01, 0.30),
            PriorSpec::uniform(1.0, 3.0),
            PriorSpec::log_uniform(1e-4, 1e-2),
        ],
        PriorSet::Informative => [
            PriorSpec::gaussian(7e19, 1e19),
            PriorSpec::gaussian(0.10, 0.02),
            PriorSpec::gaussian(2.0, 0.15),
            PriorSpec::gaussian(0.003, 0.001),
        ],
    }
}

/// `[H0, Omega_m]`
fn lcdm_priors(set: PriorSet) -> [PriorSpec; 2] {
    match set {
        PriorSet::Flat => [PriorSpec::uniform(60.0, 80.0), PriorSpec::uniform(0.25, 0.35)],
        PriorSet::Standard | PriorSet::Conservative | PriorSet::Informative => [
            PriorSpec::uniform(60.0, 80.0),
            PriorSpec::truncated_gaussian(0.31, 0.02, 0.25, 0.35),
        ],
    }
}

fn oscillating(set: PriorSet, dataset: &Dataset, cosmology: &CosmologyConfig) -> Result<Model, AppError> {
    let names = [
        Parameter::new("tau_0", "J/m^2"),
        Parameter::new("f_osc", ""),
        Parameter::new("T", "Gyr"),
        Parameter::new("A_w", ""),
    ];
    let params: Vec<_> = names.into_iter().zip(oscillating_priors(set)).collect();

    let h0 = SampleSetTerm::from_dataset(dataset, H0_SAMPLES, cosmology.h0_sigma)?;
    let s8 = SampleSetTerm::from_dataset(dataset, S8_SAMPLES, cosmology.s8_sigma)?;
    let w = BinnedTerm::from_dataset(dataset, W_MEASUREMENTS)?;
    let c = *cosmology;

    let likelihood: LikelihoodFn = Arc::new(move |theta: &[f64]| {
        let (period, a_w) = (theta[2], theta[3]);
        let mut ll = 0.0;
        if let Some(term) = &h0 {
            ll += term.log_likelihood(c.h0_reference);
        }
        if let Some(term) = &s8 {
            ll += term.log_likelihood(c.s8_oscillating);
        }
        if let Some(term) = &w {
            ll += term.log_likelihood(|z| {
                -1.0 + a_w * (2.0 * PI * lookback_time(z, c.lookback_rate) / period).sin()
            });
        }
        ll
    });

    Model::new(ModelKind::Oscillating.slug(), params, likelihood)?.with_init_cluster(vec![
        (3e19, 9e19),
        (0.08, 0.12),
        (1.8, 2.2),
        (0.002, 0.004),
    ])
}

fn lcdm(set: PriorSet, dataset: &Dataset, cosmology: &CosmologyConfig) -> Result<Model, AppError> {
    let names = [Parameter::new("H0", "km/s/Mpc"), Parameter::new("Omega_m", "")];
    let params: Vec<_> = names.into_iter().zip(lcdm_priors(set)).collect();

    let h0 = SampleSetTerm::from_dataset(dataset, H0_SAMPLES, cosmology.h0_sigma)?;
    let s8 = SampleSetTerm::from_dataset(dataset, S8_SAMPLES, cosmology.s8_sigma)?;
    let w = BinnedTerm::from_dataset(dataset, W_MEASUREMENTS)?;
    let c = *cosmology;

    let likelihood: LikelihoodFn = Arc::new(move |theta: &[f64]| {
        let mut ll = 0.0;
        if let Some(term) = &h0 {
            ll += term.log_likelihood(theta[0]);
        }
        if let Some(term) = &s8 {
            ll += term.log_likelihood(c.s8_lcdm);
        }
        if let Some(term) = &w {
            ll += term.log_likelihood(|_| -1.0);
        }
        ll
    });

    Model::new(ModelKind::Lcdm.slug(), params, likelihood)?
        .with_init_cluster(vec![(65.0, 70.0), (0.30, 0.32)])
}

/// Lookback-time proxy in Gyr-like units.
pub fn lookback_time(z: f64, lookback_rate: f64) -> f64 {
    (1.0 + z).ln() / lookback_rate
}

fn validate_cosmology(c: &CosmologyConfig) -> Result<(), AppError> {
    let positive = [
        ("h0_sigma", c.h0_sigma),
        ("s8_sigma", c.s8_sigma),
        ("lookback_rate", c.lookback_rate),
    ];
    for (name, v) in positive {
        if !(v.is_finite() && v > 0.0) {
            return Err(AppError::invalid(format!("Cosmology '{name}' must be finite and > 0, got {v}.")));
        }
    }
    let finite = [
        ("h0_reference", c.h0_reference),
        ("s8_oscillating", c.s8_oscillating),
        ("s8_lcdm", c.s8_lcdm),
    ];
    for (name, v) in finite {
        if !v.is_finite() {
            return Err(AppError::invalid(format!("Cosmology '{name}' must be finite, got {v}.")));
        }
    }
    Ok(())
}
