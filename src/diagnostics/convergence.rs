//! R-hat, effective sample size and posterior summaries.
//!
//! Every statistic is computed on the pooled post-burn-in sequence of one
//! parameter, gathered walker by walker (see [`Chain::pooled`]).

use tracing::{debug, warn};

use crate::domain::{ConvergenceReport, ParamSummary};
use crate::error::AppError;
use crate::math::{autocorrelation, mean, percentile_sorted, sorted, std_dev, variance};
use crate::sampler::Chain;

const R_HAT_SEGMENTS: usize = 4;
const MIN_R_HAT_SAMPLES: usize = 2 * R_HAT_SEGMENTS;
const MAX_ACF_LAG: usize = 100;

/// Per-parameter convergence report after dropping `discard` steps from every
/// walker.
pub fn compute(chain: &Chain, discard: usize) -> Result<ConvergenceReport, AppError> {
    if discard >= chain.n_steps() {
        return Err(AppError::insufficient(format!(
            "Burn-in of {discard} steps leaves nothing of a {}-step chain.",
            chain.n_steps()
        )));
    }

    let mut params = Vec::with_capacity(chain.n_params());
    let mut n_samples = 0;
    for (i, name) in chain.param_names().iter().enumerate() {
        let values = chain.pooled(i, discard);
        n_samples = values.len();
        let r_hat = r_hat(&values)?;
        if r_hat.is_infinite() {
            warn!(param = %name, "zero within-segment variance; R-hat is infinite");
        }
        let ess = effective_sample_size(&values);
        params.push(summarize(name, &values, r_hat, ess));
    }

    Ok(ConvergenceReport {
        discard,
        n_samples,
        acceptance_fraction: chain.mean_acceptance_fraction(),
        params,
    })
}

fn summarize(name: &str, values: &[f64], r_hat: f64, ess: f64) -> ParamSummary {
    let s = sorted(values);
    ParamSummary {
        name: name.to_string(),
        r_hat,
        ess,
        mean: mean(values),
        std: std_dev(values),
        median: percentile_sorted(&s, 50.0),
        q025: percentile_sorted(&s, 2.5),
        q16: percentile_sorted(&s, 16.0),
        q84: percentile_sorted(&s, 84.0),
        q975: percentile_sorted(&s, 97.5),
    }
}

/// Potential scale reduction over 4 contiguous segments (the last one takes
/// the remainder). `+inf` when the within-segment variance is zero.
pub fn r_hat(values: &[f64]) -> Result<f64, AppError> {
    let n = values.len();
    if n < MIN_R_HAT_SAMPLES {
        return Err(AppError::insufficient(format!(
            "R-hat needs at least {MIN_R_HAT_SAMPLES} samples, got {n}."
        )));
    }

    let size = n / R_HAT_SEGMENTS;
    let segments: Vec<&[f64]> = (0..R_HAT_SEGMENTS)
        .map(|i| {
            let end = if i + 1 == R_HAT_SEGMENTS { n } else { (i + 1) * size };
            &values[i * size..end]
        })
        .collect();

    let means: Vec<f64> = segments.iter().map(|s| mean(s)).collect();
    let within: Vec<f64> = segments.iter().map(|s| variance(s, 1)).collect();
    let size = size as f64;
    let b = size * variance(&means, 1);
    let w = mean(&within);
    if w == 0.0 {
        return Ok(f64::INFINITY);
    }
    let var_plus = ((size - 1.0) * w + b) / size;
    Ok((var_plus / w).sqrt())
}

/// `n / τ_int`, with `τ_int` summed over positive-lag autocorrelations up to
/// the first negative one (at most `min(100, n/4)` lags).
///
/// Falls back to `n / 10` when the autocorrelation is undefined. Never exceeds
/// `n`.
pub fn effective_sample_size(values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let max_lag = MAX_ACF_LAG.min(values.len() / 4);
    let Some(acf) = autocorrelation(values, max_lag) else {
        debug!(n = values.len(), "autocorrelation undefined; using n/10 for ESS");
        return n / 10.0;
    };

    let positive: f64 = acf[1..].iter().take_while(|&&rho| rho >= 0.0).sum();
    let tau = 1.0 + 2.0 * positive;
    (n / tau).min(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::DMatrix;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rand_distr::{Distribution, Normal};

    /// Chain whose walker `w` at step `s` sits at `f(w, s)`.
    fn chain_from(n_walkers: usize, n_steps: usize, mut f: impl FnMut(usize, usize) -> f64) -> Chain {
        let mut chain = Chain::new(vec!["x".into()], n_walkers);
        for s in 0..n_steps {
            let col: Vec<f64> = (0..n_walkers).map(|w| f(w, s)).collect();
            let lps = vec![0.0; n_walkers];
            chain.push_step(&DMatrix::from_column_slice(n_walkers, 1, &col), &lps);
        }
        chain
    }

    #[test]
    fn well_mixed_gaussian_noise_has_r_hat_near_one() {
        let mut rng = StdRng::seed_from_u64(1);
        let normal = Normal::new(0.0, 1.0).unwrap();
        let chain = chain_from(8, 1000, |_, _| normal.sample(&mut rng));
        let report = compute(&chain, 0).unwrap();
        let r = report.params[0].r_hat;
        assert!((0.99..=1.05).contains(&r), "R-hat {r}");
        assert_eq!(report.n_samples, 8000);
    }

    #[test]
    fn separated_offsets_are_flagged() {
        let mut rng = StdRng::seed_from_u64(2);
        let normal = Normal::new(0.0, 1.0).unwrap();
        let chain = chain_from(4, 500, |w, _| 10.0 * w as f64 + normal.sample(&mut rng));
        let r = compute(&chain, 0).unwrap().params[0].r_hat;
        assert!(r > 1.2, "R-hat {r}");
    }

    #[test]
    fn constant_chain_is_degenerate_not_converged() {
        let chain = chain_from(4, 50, |_, _| 3.0);
        let p = &compute(&chain, 10).unwrap().params[0];
        assert_eq!(p.r_hat, f64::INFINITY);
        assert_eq!(p.ess, 16.0);
        assert_eq!(p.mean, 3.0);
        assert_eq!(p.std, 0.0);
    }

    #[test]
    fn iid_sequence_has_ess_close_to_n() {
        let mut rng = StdRng::seed_from_u64(3);
        let normal = Normal::new(0.0, 1.0).unwrap();
        let xs: Vec<f64> = (0..40_000).map(|_| normal.sample(&mut rng)).collect();
        let ess = effective_sample_size(&xs);
        assert!(ess <= 40_000.0);
        assert!(ess >= 0.9 * 40_000.0, "ess {ess}");
    }

    #[test]
    fn correlated_sequence_has_reduced_ess() {
        let mut rng = StdRng::seed_from_u64(4);
        let normal = Normal::new(0.0, 1.0).unwrap();
        let mut x = 0.0;
        let xs: Vec<f64> = (0..20_000)
            .map(|_| {
                x = 0.9 * x + normal.sample(&mut rng);
                x
            })
            .collect();
        // AR(1) with phi = 0.9: tau = (1 + phi) / (1 - phi) = 19
        let ess = effective_sample_size(&xs);
        assert!(ess < 20_000.0 / 10.0, "ess {ess}");
        assert!(ess > 20_000.0 / 40.0, "ess {ess}");
    }

    #[test]
    fn summaries_and_burn_in() {
        let chain = chain_from(2, 11, |w, s| (w * 100 + s) as f64);
        let report = compute(&chain, 1).unwrap();
        let p = &report.params[0];
        assert_eq!(report.discard, 1);
        assert_eq!(report.n_samples, 20);
        assert!((p.mean - 55.5).abs() < 1e-12);
        assert!(p.q025 < p.q16 && p.q16 < p.median && p.median < p.q84 && p.q84 < p.q975);

        assert_eq!(compute(&chain, 11).unwrap_err().exit_code(), 3);
        assert_eq!(r_hat(&[1.0; 7]).unwrap_err().exit_code(), 3);
    }
}
