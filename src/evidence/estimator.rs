//! Marginal-likelihood estimate from posterior samples, with a jackknife
//! error, and the Bayes factor between two models.
//!
//! The estimate is `log mean exp(log p)` over the kept log-posterior values
//! (the harmonic-mean family). It is cheap and reproducible but has high
//! variance and can be biased; treat the result as indicative, not exact.

use tracing::warn;

use crate::domain::{BayesFactorResult, EvidenceEstimate, EvidenceStrength};
use crate::error::AppError;
use crate::math::{mean, std_dev};
use crate::sampler::Chain;

const MAX_JACKKNIFE_RESAMPLES: usize = 100;

/// Evidence of one model from its chain after dropping `discard` steps per walker.
pub fn estimate(chain: &Chain, discard: usize) -> Result<EvidenceEstimate, AppError> {
    if discard >= chain.n_steps() {
        return Err(AppError::insufficient(format!(
            "Burn-in of {discard} steps leaves nothing of a {}-step chain.",
            chain.n_steps()
        )));
    }
    estimate_from_log_probs(&chain.flat_log_probs(discard))
}

/// Evidence from flattened log-posterior values. Needs at least two values.
pub fn estimate_from_log_probs(log_probs: &[f64]) -> Result<EvidenceEstimate, AppError> {
    let n = log_probs.len();
    if n < 2 {
        return Err(AppError::insufficient(format!(
            "Evidence estimation needs at least 2 samples, got {n}."
        )));
    }

    let log_evidence = log_mean_exp(log_probs);

    // Resample i drops every value whose index is congruent to i mod k.
    let k = MAX_JACKKNIFE_RESAMPLES.min(n);
    let estimates: Vec<f64> = (0..k)
        .map(|i| {
            let kept: Vec<f64> = log_probs
                .iter()
                .enumerate()
                .filter(|(j, _)| j % k != i)
                .map(|(_, &lp)| lp)
                .collect();
            log_mean_exp(&kept)
        })
        .collect();

    let error = if log_evidence.is_finite() {
        std_dev(&estimates) * (k as f64).sqrt()
    } else {
        warn!(log_evidence, "evidence is not finite; jackknife error undefined");
        f64::NAN
    };

    Ok(EvidenceEstimate {
        log_evidence,
        error,
        n_samples: n,
    })
}

/// `max + ln(mean(exp(x - max)))`; `-inf` when every value is `-inf`.
fn log_mean_exp(values: &[f64]) -> f64 {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max.is_infinite() {
        return max;
    }
    let scaled: Vec<f64> = values.iter().map(|v| (v - max).exp()).collect();
    max + mean(&scaled).ln()
}

/// `ln K = ln Z_a - ln Z_b` with errors added in quadrature.
pub fn bayes_factor(a: &EvidenceEstimate, b: &EvidenceEstimate) -> BayesFactorResult {
    let log_k = a.log_evidence - b.log_evidence;
    BayesFactorResult {
        log_k,
        combined_error: a.error.hypot(b.error),
        strength: interpret(log_k),
    }
}

/// Jeffreys-style scale: `< 0` favours the reference model, then breakpoints
/// at 1, 2.3 and 3.5.
pub fn interpret(log_k: f64) -> EvidenceStrength {
    if log_k.is_nan() {
        EvidenceStrength::Undetermined
    } else if log_k < 0.0 {
        EvidenceStrength::FavorsReference
    } else if log_k < 1.0 {
        EvidenceStrength::Weak
    } else if log_k < 2.3 {
        EvidenceStrength::Positive
    } else if log_k < 3.5 {
        EvidenceStrength::Strong
    } else {
        EvidenceStrength::VeryStrong
    }
}
