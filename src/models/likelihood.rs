//! Chi-square likelihood terms.
//!
//! Each term owns a copy of the data it needs, so likelihood closures built from
//! them are `Send + Sync` and free of shared mutable state. Every term
//! contributes `-0.5 * chi_square` to the log-likelihood.

use crate::data::Dataset;
use crate::error::AppError;

/// Point-estimate samples of one quantity compared to a scalar prediction.
///
/// The chi-square is normalised by the number of samples, so the term acts as a
/// single effective measurement regardless of how many samples were drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleSetTerm {
    values: Vec<f64>,
    sigma: f64,
}

impl SampleSetTerm {
    pub fn new(values: Vec<f64>, sigma: f64) -> Result<Self, AppError> {
        if values.is_empty() {
            return Err(AppError::invalid("Sample-set likelihood term needs at least one sample."));
        }
        if !(sigma.is_finite() && sigma > 0.0) {
            return Err(AppError::invalid(format!(
                "Sample-set likelihood sigma must be finite and > 0, got {sigma}."
            )));
        }
        Ok(Self { values, sigma })
    }

    /// Build from a named `Samples` series; `Ok(None)` if the series is absent.
    pub fn from_dataset(dataset: &Dataset, name: &str, sigma: f64) -> Result<Option<Self>, AppError> {
        match dataset.samples(name)? {
            Some(values) => Ok(Some(Self::new(values.to_vec(), sigma)?)),
            None => Ok(None),
        }
    }

    pub fn log_likelihood(&self, prediction: f64) -> f64 {
        let chi2: f64 = self
            .values
            .iter()
            .map(|v| {
                let r = (v - prediction) / self.sigma;
                r * r
            })
            .sum();
        -0.5 * chi2 / self.values.len() as f64
    }
}

/// Binned `(x, y, sigma)` measurements compared to a model curve `y(x)`.
#[derive(Debug, Clone, PartialEq)]
pub struct BinnedTerm {
    x: Vec<f64>,
    y: Vec<f64>,
    sigma: Vec<f64>,
}

impl BinnedTerm {
    /// Build from a named `Binned` series; `Ok(None)` if the series is absent.
    pub fn from_dataset(dataset: &Dataset, name: &str) -> Result<Option<Self>, AppError> {
        Ok(dataset.binned(name)?.map(|b| Self {
            x: b.x.to_vec(),
            y: b.y.to_vec(),
            sigma: b.sigma.to_vec(),
        }))
    }

    pub fn log_likelihood(&self, curve: impl Fn(f64) -> f64) -> f64 {
        let chi2: f64 = self
            .x
            .iter()
            .zip(&self.y)
            .zip(&self.sigma)
            .map(|((&x, &y), &s)| {
                let r = (y - curve(x)) / s;
                r * r
            })
            .sum();
        -0.5 * chi2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Series, W_MEASUREMENTS};

    #[test]
    fn sample_set_term_is_normalised_by_count() {
        let one = SampleSetTerm::new(vec![1.0], 0.5).unwrap();
        let four = SampleSetTerm::new(vec![1.0; 4], 0.5).unwrap();
        // (1 - 0) / 0.5 = 2 -> chi2 = 4 per sample
        assert!((one.log_likelihood(0.0) - -2.0).abs() < 1e-12);
        assert!((four.log_likelihood(0.0) - -2.0).abs() < 1e-12);
        assert_eq!(one.log_likelihood(1.0), 0.0);
    }

    #[test]
    fn binned_term_sums_weighted_residuals() {
        let ds = Dataset::new()
            .with_series(
                W_MEASUREMENTS,
                Series::Binned {
                    x: vec![0.0, 1.0],
                    y: vec![-1.0, -0.9],
                    sigma: vec![0.1, 0.05],
                },
            )
            .unwrap();
        let term = BinnedTerm::from_dataset(&ds, W_MEASUREMENTS).unwrap().unwrap();
        // residuals: 0 and 0.1/0.05 = 2 -> chi2 = 4
        let ll = term.log_likelihood(|_| -1.0);
        assert!((ll - -2.0).abs() < 1e-9);
    }
}
