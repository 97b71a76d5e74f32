//! Seeded mock observations for demos and tests.
//!
//! The mock mirrors the shape of the real inputs:
//! - 100 local H0 measurements around the reference value
//! - 100 S8 measurements around the suppressed (oscillating) prediction
//! - 20 redshift bins of `w(z)` carrying a small sinusoidal signal

use std::f64::consts::PI;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};

use crate::data::dataset::{Dataset, H0_SAMPLES, S8_SAMPLES, Series, W_MEASUREMENTS};
use crate::domain::CosmologyConfig;
use crate::error::AppError;

const N_SAMPLES: usize = 100;
const N_BINS: usize = 20;
const Z_MAX: f64 = 2.0;
const W_AMPLITUDE: f64 = 0.003;
const W_PERIOD: f64 = 2.0;
const W_SIGMA: f64 = 0.05;

/// Generate the mock dataset deterministically from `seed`.
pub fn generate_mock_dataset(seed: u64, cosmology: &CosmologyConfig) -> Result<Dataset, AppError> {
    let mut rng = StdRng::seed_from_u64(seed);

    let h0 = Normal::new(cosmology.h0_reference, cosmology.h0_sigma)
        .map_err(|e| AppError::invalid(format!("H0 mock distribution error: {e}")))?;
    let s8 = Normal::new(cosmology.s8_oscillating, cosmology.s8_sigma)
        .map_err(|e| AppError::invalid(format!("S8 mock distribution error: {e}")))?;

    let h0_values: Vec<f64> = (0..N_SAMPLES).map(|_| h0.sample(&mut rng)).collect();
    let s8_values: Vec<f64> = (0..N_SAMPLES).map(|_| s8.sample(&mut rng)).collect();

    let z: Vec<f64> = (0..N_BINS)
        .map(|i| Z_MAX * i as f64 / (N_BINS - 1) as f64)
        .collect();
    let w: Vec<f64> = z
        .iter()
        .map(|zi| -1.0 + W_AMPLITUDE * (2.0 * PI * zi / W_PERIOD).sin())
        .collect();
    let sigma = vec![W_SIGMA; N_BINS];

    Dataset::new()
        .with_series(H0_SAMPLES, Series::Samples { values: h0_values })?
        .with_series(S8_SAMPLES, Series::Samples { values: s8_values })?
        .with_series(W_MEASUREMENTS, Series::Binned { x: z, y: w, sigma })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_is_reproducible_and_well_formed() {
        let cosmo = CosmologyConfig::default();
        let a = generate_mock_dataset(7, &cosmo).unwrap();
        let b = generate_mock_dataset(7, &cosmo).unwrap();
        assert_eq!(a, b);

        let h0 = a.samples(H0_SAMPLES).unwrap().unwrap();
        assert_eq!(h0.len(), N_SAMPLES);
        let mean = crate::math::mean(h0);
        assert!((mean - 67.4).abs() < 0.3, "H0 mock mean drifted: {mean}");

        let w = a.binned(W_MEASUREMENTS).unwrap().unwrap();
        assert_eq!(w.x.len(), N_BINS);
        assert_eq!(w.x[0], 0.0);
        assert!((w.x[N_BINS - 1] - Z_MAX).abs() < 1e-12);
    }
}
