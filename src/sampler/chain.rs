//! Walker × step × parameter sample store.
//!
//! Storage is step-major (one contiguous block of `n_walkers × n_params` values
//! per step) because steps are appended whole. Readers that need per-walker
//! traces go through [`Chain::walker_trace`] / [`Chain::pooled`], which gather
//! in walker-major order: walker 0's kept steps, then walker 1's, and so on.

use nalgebra::DMatrix;

use crate::error::AppError;

#[derive(Debug, Clone, PartialEq)]
pub struct Chain {
    param_names: Vec<String>,
    n_walkers: usize,
    n_steps: usize,
    positions: Vec<f64>,
    log_probs: Vec<f64>,
    accepted: Vec<u64>,
}

impl Chain {
    pub fn new(param_names: Vec<String>, n_walkers: usize) -> Self {
        Self {
            param_names,
            n_walkers,
            n_steps: 0,
            positions: Vec::new(),
            log_probs: Vec::new(),
            accepted: vec![0; n_walkers],
        }
    }

    /// Rebuild a chain from walker-major flattened rows (`n_walkers × n_steps`
    /// rows of `n_params` values, walker 0 first).
    pub fn from_walker_major(
        param_names: Vec<String>,
        n_walkers: usize,
        samples: &[Vec<f64>],
        log_probs: &[f64],
    ) -> Result<Self, AppError> {
        let n_params = param_names.len();
        if n_walkers == 0 || samples.len() % n_walkers != 0 {
            return Err(AppError::invalid(format!(
                "{} samples cannot be split across {n_walkers} walkers.",
                samples.len()
            )));
        }
        if log_probs.len() != samples.len() {
            return Err(AppError::invalid(format!(
                "Got {} samples but {} log-posterior values.",
                samples.len(),
                log_probs.len()
            )));
        }
        if let Some(row) = samples.iter().find(|row| row.len() != n_params) {
            return Err(AppError::invalid(format!(
                "Sample row has {} values, expected {n_params}.",
                row.len()
            )));
        }

        let n_steps = samples.len() / n_walkers;
        let mut chain = Self::new(param_names, n_walkers);
        for step in 0..n_steps {
            let rows = (0..n_walkers).map(|w| &samples[w * n_steps + step]);
            let block = DMatrix::from_row_iterator(n_walkers, n_params, rows.flatten().copied());
            let lps: Vec<f64> = (0..n_walkers).map(|w| log_probs[w * n_steps + step]).collect();
            chain.push_step(&block, &lps);
        }
        Ok(chain)
    }

    /// Append one full ensemble step (rows = walkers).
    pub fn push_step(&mut self, positions: &DMatrix<f64>, log_probs: &[f64]) {
        debug_assert_eq!(positions.nrows(), self.n_walkers);
        debug_assert_eq!(positions.ncols(), self.n_params());
        debug_assert_eq!(log_probs.len(), self.n_walkers);
        for w in 0..self.n_walkers {
            self.positions.extend(positions.row(w).iter());
        }
        self.log_probs.extend_from_slice(log_probs);
        self.n_steps += 1;
    }

    pub(crate) fn record_accept(&mut self, walker: usize) {
        self.accepted[walker] += 1;
    }

    pub fn param_names(&self) -> &[String] {
        &self.param_names
    }

    pub fn n_walkers(&self) -> usize {
        self.n_walkers
    }

    pub fn n_steps(&self) -> usize {
        self.n_steps
    }

    pub fn n_params(&self) -> usize {
        self.param_names.len()
    }

    pub fn position(&self, walker: usize, step: usize) -> &[f64] {
        let start = (step * self.n_walkers + walker) * self.n_params();
        &self.positions[start..start + self.n_params()]
    }

    pub fn log_prob(&self, walker: usize, step: usize) -> f64 {
        self.log_probs[step * self.n_walkers + walker]
    }

    /// One walker's trace for one parameter, steps `discard..`.
    pub fn walker_trace(&self, walker: usize, param: usize, discard: usize) -> Vec<f64> {
        (discard.min(self.n_steps)..self.n_steps)
            .map(|s| self.position(walker, s)[param])
            .collect()
    }

    /// All walkers' kept values for `param`, concatenated walker by walker.
    pub fn pooled(&self, param: usize, discard: usize) -> Vec<f64> {
        (0..self.n_walkers)
            .flat_map(|w| self.walker_trace(w, param, discard))
            .collect()
    }

    /// Kept parameter vectors, walker-major.
    pub fn flat_samples(&self, discard: usize) -> Vec<Vec<f64>> {
        let start = discard.min(self.n_steps);
        (0..self.n_walkers)
            .flat_map(|w| (start..self.n_steps).map(move |s| (w, s)))
            .map(|(w, s)| self.position(w, s).to_vec())
            .collect()
    }

    /// Kept log-posterior values, same order as [`Chain::flat_samples`].
    pub fn flat_log_probs(&self, discard: usize) -> Vec<f64> {
        let start = discard.min(self.n_steps);
        (0..self.n_walkers)
            .flat_map(|w| (start..self.n_steps).map(move |s| self.log_prob(w, s)))
            .collect()
    }

    /// Per-walker fraction of accepted proposals.
    pub fn acceptance_fraction(&self) -> Vec<f64> {
        self.accepted
            .iter()
            .map(|&a| if self.n_steps == 0 { 0.0 } else { a as f64 / self.n_steps as f64 })
            .collect()
    }

    pub fn mean_acceptance_fraction(&self) -> f64 {
        let fractions = self.acceptance_fraction();
        if fractions.is_empty() {
            return 0.0;
        }
        fractions.iter().sum::<f64>() / fractions.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_walker_chain() -> Chain {
        let mut chain = Chain::new(vec!["a".into(), "b".into()], 2);
        for step in 0..3 {
            let s = step as f64;
            let m = DMatrix::from_row_slice(2, 2, &[s, 10.0 + s, 100.0 + s, 110.0 + s]);
            chain.push_step(&m, &[-s, -10.0 - s]);
        }
        chain
    }

    #[test]
    fn pooled_is_walker_major_after_discard() {
        let chain = two_walker_chain();
        assert_eq!(chain.n_steps(), 3);
        assert_eq!(chain.pooled(0, 1), vec![1.0, 2.0, 101.0, 102.0]);
        assert_eq!(chain.flat_log_probs(1), vec![-1.0, -2.0, -11.0, -12.0]);
        assert_eq!(chain.flat_samples(2), vec![vec![2.0, 12.0], vec![102.0, 112.0]]);
        assert!(chain.pooled(0, 10).is_empty());
    }

    #[test]
    fn walker_major_rows_rebuild_the_same_chain() {
        let chain = two_walker_chain();
        let rebuilt = Chain::from_walker_major(
            chain.param_names().to_vec(),
            2,
            &chain.flat_samples(0),
            &chain.flat_log_probs(0),
        )
        .unwrap();
        assert_eq!(rebuilt.position(1, 2), chain.position(1, 2));
        assert_eq!(rebuilt.log_prob(0, 1), chain.log_prob(0, 1));
        assert!(Chain::from_walker_major(vec!["a".into()], 2, &vec![vec![0.0]; 3], &[0.0; 3]).is_err());
    }

    #[test]
    fn acceptance_fraction_counts_per_walker() {
        let mut chain = two_walker_chain();
        chain.record_accept(0);
        chain.record_accept(0);
        chain.record_accept(1);
        let fr = chain.acceptance_fraction();
        assert!((fr[0] - 2.0 / 3.0).abs() < 1e-12);
        assert!((fr[1] - 1.0 / 3.0).abs() < 1e-12);
        assert!((chain.mean_acceptance_fraction() - 0.5).abs() < 1e-12);
    }
}
