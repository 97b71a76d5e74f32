//! Descriptive statistics over plain `f64` slices.
//!
//! Conventions follow the usual array-library defaults so that reports are
//! comparable with other tooling:
//! - `variance(values, ddof)` divides by `n - ddof`
//! - `std_dev` is the population standard deviation (`ddof = 0`)
//! - `percentile` interpolates linearly between order statistics
//!
//! The mean is computed relative to the first element. For a constant input the
//! deviations are exactly zero, so the mean reproduces the constant bit-for-bit
//! and every variance is exactly `0.0`.

/// Arithmetic mean. Returns `NaN` for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    let Some(&pivot) = values.first() else {
        return f64::NAN;
    };
    let shifted: f64 = values.iter().map(|v| v - pivot).sum();
    pivot + shifted / values.len() as f64
}

/// Variance with `ddof` delta degrees of freedom.
///
/// Returns `NaN` when `values.len() <= ddof`.
pub fn variance(values: &[f64], ddof: usize) -> f64 {
    let n = values.len();
    if n <= ddof {
        return f64::NAN;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    ss / (n - ddof) as f64
}

/// Population standard deviation (`ddof = 0`).
pub fn std_dev(values: &[f64]) -> f64 {
    variance(values, 0).sqrt()
}

/// Return a sorted copy (NaNs last).
pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut out = values.to_vec();
    out.sort_by(|a, b| a.total_cmp(b));
    out
}

/// Percentile `p` in `[0, 100]` of already-sorted data.
pub fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let p = p.clamp(0.0, 100.0);
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        return sorted[lo];
    }
    let frac = rank - lo as f64;
    sorted[lo] + frac * (sorted[hi] - sorted[lo])
}

/// Percentile `p` in `[0, 100]` of unsorted data.
pub fn percentile(values: &[f64], p: f64) -> f64 {
    percentile_sorted(&sorted(values), p)
}

pub fn median(values: &[f64]) -> f64 {
    percentile(values, 50.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variance_uses_requested_ddof() {
        let v = [1.0, 2.0, 3.0, 4.0];
        assert!((variance(&v, 0) - 1.25).abs() < 1e-12);
        assert!((variance(&v, 1) - 5.0 / 3.0).abs() < 1e-12);
        assert!(variance(&[1.0], 1).is_nan());
    }

    #[test]
    fn constant_input_has_exact_mean_and_zero_spread() {
        let v = vec![-1234.567_891_f64; 97];
        assert_eq!(mean(&v), -1234.567_891);
        assert_eq!(std_dev(&v), 0.0);
    }

    #[test]
    fn percentile_interpolates_linearly() {
        let v = [4.0, 1.0, 3.0, 2.0, 5.0];
        assert_eq!(median(&v), 3.0);
        assert!((percentile(&v, 25.0) - 2.0).abs() < 1e-12);
        assert!((percentile(&v, 10.0) - 1.4).abs() < 1e-12);
        assert_eq!(percentile(&v, 100.0), 5.0);
        assert_eq!(median(&[1.0, 2.0]), 1.5);
    }
}
