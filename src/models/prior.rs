//! Prior distributions over a single scalar parameter.
//!
//! Densities are returned in log space. A value outside the declared support
//! yields `-inf`, which is an ordinary "zero probability" result rather than
//! an error.
//!
//! Truncated Gaussians are not renormalised: the bounds only move the `-inf`
//! cutoff. Sampling a truncated Gaussian clips into range, which biases the
//! tails; it is meant for walker initialisation, never for density evaluation.

use std::f64::consts::PI;

use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Declarative prior descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PriorSpec {
    Uniform {
        lo: f64,
        hi: f64,
    },
    /// Uniform in `ln(value)`; requires `0 < lo < hi`.
    LogUniform {
        lo: f64,
        hi: f64,
    },
    Gaussian {
        mean: f64,
        std: f64,
        /// Optional truncation `[lo, hi]`.
        bounds: Option<(f64, f64)>,
    },
}

impl PriorSpec {
    pub fn uniform(lo: f64, hi: f64) -> Self {
        PriorSpec::Uniform { lo, hi }
    }

    pub fn log_uniform(lo: f64, hi: f64) -> Self {
        PriorSpec::LogUniform { lo, hi }
    }

    pub fn gaussian(mean: f64, std: f64) -> Self {
        PriorSpec::Gaussian {
            mean,
            std,
            bounds: None,
        }
    }

    pub fn truncated_gaussian(mean: f64, std: f64, lo: f64, hi: f64) -> Self {
        PriorSpec::Gaussian {
            mean,
            std,
            bounds: Some((lo, hi)),
        }
    }

    /// Check the descriptor's invariants (`lo < hi`, `std > 0`, finite values).
    pub fn validate(&self) -> Result<(), AppError> {
        match *self {
            PriorSpec::Uniform { lo, hi } => check_bounds("Uniform", lo, hi),
            PriorSpec::LogUniform { lo, hi } => {
                check_bounds("LogUniform", lo, hi)?;
                if lo <= 0.0 {
                    return Err(AppError::invalid(format!(
                        "LogUniform prior requires lo > 0, got lo={lo}."
                    )));
                }
                Ok(())
            }
            PriorSpec::Gaussian { mean, std, bounds } => {
                if !mean.is_finite() {
                    return Err(AppError::invalid(format!("Gaussian prior mean must be finite, got {mean}.")));
                }
                if !(std.is_finite() && std > 0.0) {
                    return Err(AppError::invalid(format!(
                        "Gaussian prior std must be finite and > 0, got {std}."
                    )));
                }
                match bounds {
                    Some((lo, hi)) => check_bounds("Gaussian", lo, hi),
                    None => Ok(()),
                }
            }
        }
    }

    /// Support bounds, if any.
    pub fn bounds(&self) -> Option<(f64, f64)> {
        match *self {
            PriorSpec::Uniform { lo, hi } | PriorSpec::LogUniform { lo, hi } => Some((lo, hi)),
            PriorSpec::Gaussian { bounds, .. } => bounds,
        }
    }

    /// Log density at `value` (`-inf` outside the support).
    pub fn log_density(&self, value: f64) -> f64 {
        if let Some((lo, hi)) = self.bounds() {
            if !(value >= lo && value <= hi) {
                return f64::NEG_INFINITY;
            }
        }
        match *self {
            PriorSpec::Uniform { lo, hi } => -(hi - lo).ln(),
            PriorSpec::LogUniform { lo, hi } => {
                if value <= 0.0 {
                    return f64::NEG_INFINITY;
                }
                -value.ln() - (hi / lo).ln().ln()
            }
            PriorSpec::Gaussian { mean, std, .. } => {
                if !value.is_finite() {
                    return f64::NEG_INFINITY;
                }
                let u = (value - mean) / std;
                -0.5 * u * u - (std * (2.0 * PI).sqrt()).ln()
            }
        }
    }

    /// Draw one value.
    ///
    /// Assumes a validated descriptor (see [`PriorSpec::validate`]).
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match *self {
            PriorSpec::Uniform { lo, hi } => lo + (hi - lo) * rng.r#gen::<f64>(),
            PriorSpec::LogUniform { lo, hi } => {
                let (ln_lo, ln_hi) = (lo.ln(), hi.ln());
                (ln_lo + (ln_hi - ln_lo) * rng.r#gen::<f64>()).exp()
            }
            PriorSpec::Gaussian { mean, std, bounds } => {
                let draw = match Normal::new(mean, std) {
                    Ok(normal) => normal.sample(rng),
                    Err(_) => mean,
                };
                match bounds {
                    Some((lo, hi)) => draw.clamp(lo, hi),
                    None => draw,
                }
            }
        }
    }
}

fn check_bounds(kind: &str, lo: f64, hi: f64) -> Result<(), AppError> {
    if !(lo.is_finite() && hi.is_finite()) {
        return Err(AppError::invalid(format!(
            "{kind} prior bounds must be finite, got [{lo}, {hi}]."
        )));
    }
    if lo >= hi {
        return Err(AppError::invalid(format!(
            "{kind} prior requires lo < hi, got [{lo}, {hi}]."
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn uniform_is_flat_inside_and_impossible_outside() {
        let p = PriorSpec::uniform(2.0, 6.0);
        let inside = p.log_density(2.0);
        assert!(inside.is_finite());
        assert_eq!(p.log_density(4.0), inside);
        assert_eq!(p.log_density(6.0), inside);
        assert_eq!(p.log_density(1.999), f64::NEG_INFINITY);
        assert_eq!(p.log_density(6.001), f64::NEG_INFINITY);
        assert_eq!(p.log_density(f64::NAN), f64::NEG_INFINITY);
    }

    #[test]
    fn uniform_density_integrates_to_one() {
        let (a, b) = (-1.5, 3.0);
        let p = PriorSpec::uniform(a, b);
        let n = 10_000;
        let h = (b - a) / n as f64;
        let integral: f64 = (0..n)
            .map(|i| p.log_density(a + (i as f64 + 0.5) * h).exp() * h)
            .sum();
        assert!((integral - 1.0).abs() < 1e-9, "integral = {integral}");
    }

    #[test]
    fn log_uniform_matches_closed_form() {
        let p = PriorSpec::log_uniform(1e19, 1e20);
        let v = 3e19_f64;
        let expected = -v.ln() - (10.0_f64).ln().ln();
        assert!((p.log_density(v) - expected).abs() < 1e-12);
        assert_eq!(p.log_density(2e20), f64::NEG_INFINITY);
    }

    #[test]
    fn truncated_gaussian_is_not_renormalised() {
        let full = PriorSpec::gaussian(0.0, 2.0);
        let cut = PriorSpec::truncated_gaussian(0.0, 2.0, -1.0, 1.0);
        assert_eq!(full.log_density(0.5), cut.log_density(0.5));
        assert_eq!(cut.log_density(1.5), f64::NEG_INFINITY);
        let peak = -(2.0 * (2.0 * PI).sqrt()).ln();
        assert!((full.log_density(0.0) - peak).abs() < 1e-12);
    }

    #[test]
    fn malformed_priors_are_rejected() {
        assert!(PriorSpec::uniform(1.0, 1.0).validate().is_err());
        assert!(PriorSpec::uniform(2.0, 1.0).validate().is_err());
        assert!(PriorSpec::log_uniform(0.0, 1.0).validate().is_err());
        assert!(PriorSpec::gaussian(0.0, 0.0).validate().is_err());
        assert!(PriorSpec::gaussian(0.0, -1.0).validate().is_err());
        assert!(PriorSpec::truncated_gaussian(0.0, 1.0, 3.0, -3.0).validate().is_err());
        assert!(PriorSpec::uniform(f64::NEG_INFINITY, 0.0).validate().is_err());
        assert!(PriorSpec::truncated_gaussian(0.0, 1.0, -3.0, 3.0).validate().is_ok());
    }

    #[test]
    fn samples_respect_support() {
        let mut rng = StdRng::seed_from_u64(11);
        let priors = [
            PriorSpec::uniform(0.05, 0.2),
            PriorSpec::log_uniform(1e19, 1e20),
            PriorSpec::truncated_gaussian(0.0, 5.0, -0.1, 0.1),
        ];
        for p in priors {
            for _ in 0..500 {
                let v = p.sample(&mut rng);
                assert!(p.log_density(v).is_finite(), "{p:?} drew {v}");
            }
        }
    }
}
