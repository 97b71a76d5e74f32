//! Autocorrelation function of a 1-D sequence.
//!
//! Uses the biased estimator (denominator `n` at every lag), which keeps the
//! sequence positive semi-definite:
//!
//! ```text
//! ρ(k) = Σ_{i<n-k} (x_i - x̄)(x_{i+k} - x̄) / Σ_i (x_i - x̄)^2
//! ```

use crate::math::stats::mean;

/// Autocorrelation at lags `0..=max_lag` (lag 0 is `1.0`).
///
/// Returns `None` when the sequence is empty, has zero variance, or contains
/// non-finite values. Lags beyond `n - 1` are reported as `0.0`.
pub fn autocorrelation(values: &[f64], max_lag: usize) -> Option<Vec<f64>> {
    let n = values.len();
    if n == 0 {
        return None;
    }
    let m = mean(values);
    let centered: Vec<f64> = values.iter().map(|v| v - m).collect();
    let c0: f64 = centered.iter().map(|v| v * v).sum();
    if !(c0.is_finite() && c0 > 0.0) {
        return None;
    }

    let mut out = Vec::with_capacity(max_lag + 1);
    out.push(1.0);
    for lag in 1..=max_lag {
        if lag >= n {
            out.push(0.0);
            continue;
        }
        let ck: f64 = centered[..n - lag]
            .iter()
            .zip(&centered[lag..])
            .map(|(a, b)| a * b)
            .sum();
        out.push(ck / c0);
    }

    if out.iter().any(|v| !v.is_finite()) {
        return None;
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alternating_sequence_is_anticorrelated_at_lag_one() {
        let v: Vec<f64> = (0..200).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        let acf = autocorrelation(&v, 2).unwrap();
        assert_eq!(acf[0], 1.0);
        assert!(acf[1] < -0.9);
        assert!(acf[2] > 0.9);
    }

    #[test]
    fn constant_sequence_has_no_acf() {
        assert!(autocorrelation(&[3.0; 50], 10).is_none());
        assert!(autocorrelation(&[], 10).is_none());
    }
}
