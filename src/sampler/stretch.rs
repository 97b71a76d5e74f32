use rand::Rng;

use crate::error::AppError;

/// Goodman & Weare stretch move with scale `a`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StretchMove {
    a: f64,
}

impl Default for StretchMove {
    fn default() -> Self {
        Self { a: 2.0 }
    }
}

impl StretchMove {
    pub fn new(a: f64) -> Result<Self, AppError> {
        if !(a.is_finite() && a > 1.0) {
            return Err(AppError::invalid(format!("Stretch scale must be finite and > 1, got {a}.")));
        }
        Ok(Self { a })
    }

    pub fn scale(&self) -> f64 {
        self.a
    }

    /// Draw `z` from `g(z) ∝ 1/sqrt(z)` on `[1/a, a]` by inverting the CDF.
    pub fn sample_z<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let u: f64 = rng.r#gen();
        ((self.a - 1.0) * u + 1.0).powi(2) / self.a
    }

    /// `theta_j + z (theta_k - theta_j)`, written into `out`.
    pub fn propose_into(&self, current: &[f64], partner: &[f64], z: f64, out: &mut [f64]) {
        for ((o, &x), &c) in out.iter_mut().zip(current).zip(partner) {
            *o = c + z * (x - c);
        }
    }

    /// Metropolis test in log space. `ln_u` is the log of a uniform draw.
    pub fn accepts(&self, z: f64, dim: usize, lp_old: f64, lp_new: f64, ln_u: f64) -> bool {
        if !lp_new.is_finite() {
            return false;
        }
        let log_ratio = (dim as f64 - 1.0) * z.ln() + (lp_new - lp_old);
        ln_u < log_ratio
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn z_stays_in_range_and_follows_inverse_sqrt() {
        let mv = StretchMove::new(2.0).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let n = 200_000;
        let mut below_one = 0usize;
        for _ in 0..n {
            let z = mv.sample_z(&mut rng);
            assert!((0.5..=2.0).contains(&z));
            if z < 1.0 {
                below_one += 1;
            }
        }
        // P(z < 1) = sqrt(2) - 1 for a = 2
        let expected = (1.0 - 0.5f64.sqrt()) / (2.0f64.sqrt() - 0.5f64.sqrt());
        let observed = below_one as f64 / n as f64;
        assert!((observed - expected).abs() < 0.01, "{observed} vs {expected}");
    }

    #[test]
    fn acceptance_rules() {
        let mv = StretchMove::default();
        assert!(!mv.accepts(1.0, 2, 0.0, f64::NEG_INFINITY, f64::NEG_INFINITY));
        assert!(!mv.accepts(1.0, 2, 0.0, f64::NAN, f64::NEG_INFINITY));
        // Uphill moves at z = 1 always pass since ln u < 0.
        assert!(mv.accepts(1.0, 3, -5.0, -1.0, -1e-12));
        // Escape from -inf whenever the proposal is finite.
        assert!(mv.accepts(1.5, 2, f64::NEG_INFINITY, -100.0, -0.1));
        assert!(!mv.accepts(1.0, 2, 0.0, -1.0, -0.5));
    }

    #[test]
    fn proposal_lies_on_the_line_through_partner() {
        let mv = StretchMove::default();
        let mut out = [0.0; 2];
        mv.propose_into(&[1.0, 2.0], &[0.0, 0.0], 1.5, &mut out);
        assert_eq!(out, [1.5, 3.0]);
        assert!(StretchMove::new(1.0).is_err());
    }
}
