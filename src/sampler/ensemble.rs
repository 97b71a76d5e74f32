//! Affine-invariant ensemble sampler.
//!
//! Each step updates the two halves `[0, W/2)` and `[W/2, W)` in turn. A
//! half-step reads a frozen snapshot of the ensemble and writes a fresh
//! next-state matrix, so the second half sees the first half's updated
//! positions and walkers within a half never see each other.
//!
//! Every random draw of a half-step (partner index, stretch factor, acceptance
//! uniform) is taken serially before the log-posteriors are evaluated on the
//! rayon pool. Results depend only on the seed, not on the thread count.

use std::ops::{ControlFlow, Range};

use nalgebra::DMatrix;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::error::AppError;
use crate::models::{LogPosterior, Model, PriorSpec};
use crate::sampler::chain::Chain;
use crate::sampler::stretch::StretchMove;

/// How walker positions are seeded.
#[derive(Debug, Clone, PartialEq)]
pub enum WalkerInit {
    /// Independent draws from each parameter's prior.
    Prior(Vec<PriorSpec>),
    /// Uniform draws inside a per-parameter `[lo, hi]` box.
    Cluster(Vec<(f64, f64)>),
    /// Rows are walkers.
    Explicit(DMatrix<f64>),
}

impl WalkerInit {
    /// The model's narrow cluster if it has one, else its priors.
    pub fn for_model(model: &Model) -> Self {
        match model.init_cluster() {
            Some(bounds) => WalkerInit::Cluster(bounds.to_vec()),
            None => WalkerInit::Prior(model.priors().to_vec()),
        }
    }

    fn initialize<R: Rng + ?Sized>(
        &self,
        n_walkers: usize,
        dim: usize,
        rng: &mut R,
    ) -> Result<DMatrix<f64>, AppError> {
        let positions = match self {
            WalkerInit::Prior(priors) => {
                check_dim("prior list", priors.len(), dim)?;
                DMatrix::from_fn(n_walkers, dim, |_, j| priors[j].sample(rng))
            }
            WalkerInit::Cluster(bounds) => {
                check_dim("init cluster", bounds.len(), dim)?;
                DMatrix::from_fn(n_walkers, dim, |_, j| {
                    let (lo, hi) = bounds[j];
                    lo + (hi - lo) * rng.r#gen::<f64>()
                })
            }
            WalkerInit::Explicit(m) => {
                if m.nrows() != n_walkers {
                    return Err(AppError::invalid(format!(
                        "Initial positions have {} walkers, expected {n_walkers}.",
                        m.nrows()
                    )));
                }
                check_dim("initial positions", m.ncols(), dim)?;
                m.clone()
            }
        };
        if positions.iter().any(|v| !v.is_finite()) {
            return Err(AppError::invalid("Initial walker positions must be finite."));
        }
        Ok(positions)
    }
}

fn check_dim(what: &str, got: usize, dim: usize) -> Result<(), AppError> {
    if got != dim {
        return Err(AppError::invalid(format!("{what} has dimension {got}, expected {dim}.")));
    }
    Ok(())
}

/// Snapshot handed to the progress callback after each completed step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressInfo {
    /// Completed steps (1-based).
    pub step: usize,
    pub total: usize,
    pub acceptance_rate: f64,
    pub mean_log_prob: f64,
}

/// Sampler over any [`LogPosterior`] target.
pub struct EnsembleSampler<'a, P: LogPosterior + ?Sized> {
    target: &'a P,
    param_names: Vec<String>,
    n_walkers: usize,
    stretch: StretchMove,
    seed: u64,
}

impl<'a, P: LogPosterior + ?Sized> EnsembleSampler<'a, P> {
    pub fn new(target: &'a P, param_names: Vec<String>, n_walkers: usize) -> Result<Self, AppError> {
        let dim = target.dim();
        if param_names.len() != dim {
            return Err(AppError::invalid(format!(
                "Got {} parameter names for a {dim}-dimensional target.",
                param_names.len()
            )));
        }
        if n_walkers < 2 || n_walkers < 2 * dim {
            return Err(AppError::invalid(format!(
                "Need at least max(2, 2 x dim) = {} walkers, got {n_walkers}.",
                (2 * dim).max(2)
            )));
        }
        Ok(Self {
            target,
            param_names,
            n_walkers,
            stretch: StretchMove::default(),
            seed: 0,
        })
    }

    pub fn with_stretch(mut self, stretch: StretchMove) -> Self {
        self.stretch = stretch;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn run(&self, n_steps: usize, init: &WalkerInit) -> Result<Chain, AppError> {
        self.run_with_progress(n_steps, init, |_| ControlFlow::Continue(()))
    }

    /// Run up to `n_steps` steps. Returning `ControlFlow::Break` from
    /// `progress` stops after the current step; the chain then holds every
    /// completed step.
    pub fn run_with_progress<F>(
        &self,
        n_steps: usize,
        init: &WalkerInit,
        mut progress: F,
    ) -> Result<Chain, AppError>
    where
        F: FnMut(&ProgressInfo) -> ControlFlow<()>,
    {
        let dim = self.target.dim();
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut positions = init.initialize(self.n_walkers, dim, &mut rng)?;
        let mut log_probs = self.evaluate(&positions);

        let stuck = log_probs.iter().filter(|lp| !lp.is_finite()).count();
        if stuck > 0 {
            warn!(walkers = stuck, "walkers start with a non-finite log-posterior");
        }

        info!(
            walkers = self.n_walkers,
            steps = n_steps,
            dim,
            seed = self.seed,
            a = self.stretch.scale(),
            "ensemble sampling started"
        );

        let half = self.n_walkers / 2;
        let lower = 0..half;
        let upper = half..self.n_walkers;
        let report_every = (n_steps / 10).max(1);
        let mut chain = Chain::new(self.param_names.clone(), self.n_walkers);

        for step in 0..n_steps {
            let (mid, mid_lp) =
                self.half_step(&positions, &log_probs, lower.clone(), upper.clone(), &mut rng, &mut chain);
            let (next, next_lp) = self.half_step(&mid, &mid_lp, upper.clone(), lower.clone(), &mut rng, &mut chain);
            positions = next;
            log_probs = next_lp;
            chain.push_step(&positions, &log_probs);

            let info = ProgressInfo {
                step: step + 1,
                total: n_steps,
                acceptance_rate: chain.mean_acceptance_fraction(),
                mean_log_prob: log_probs.iter().sum::<f64>() / log_probs.len() as f64,
            };
            if info.step % report_every == 0 {
                debug!(
                    step = info.step,
                    total = info.total,
                    acceptance = info.acceptance_rate,
                    mean_log_prob = info.mean_log_prob,
                    "sampler progress"
                );
            }
            if progress(&info).is_break() {
                info!(completed = info.step, requested = n_steps, "sampling cancelled");
                break;
            }
        }

        let fractions = chain.acceptance_fraction();
        let frozen = fractions.iter().filter(|&&f| f == 0.0).count();
        if frozen > 0 && chain.n_steps() > 0 {
            warn!(walkers = frozen, "walkers never accepted a move");
        }
        info!(
            steps = chain.n_steps(),
            acceptance = chain.mean_acceptance_fraction(),
            "ensemble sampling finished"
        );
        Ok(chain)
    }

    fn evaluate(&self, positions: &DMatrix<f64>) -> Vec<f64> {
        let rows: Vec<Vec<f64>> = (0..positions.nrows())
            .map(|i| positions.row(i).iter().copied().collect())
            .collect();
        rows.par_iter().map(|theta| self.target.log_posterior(theta)).collect()
    }

    /// Move the walkers in `active` using partners from `partners`, reading
    /// `current` and returning the next snapshot.
    fn half_step(
        &self,
        current: &DMatrix<f64>,
        current_lp: &[f64],
        active: Range<usize>,
        partners: Range<usize>,
        rng: &mut StdRng,
        chain: &mut Chain,
    ) -> (DMatrix<f64>, Vec<f64>) {
        let dim = current.ncols();

        let draws: Vec<(usize, f64, f64)> = active
            .clone()
            .map(|_| {
                let j = rng.gen_range(partners.clone());
                let z = self.stretch.sample_z(rng);
                let ln_u = rng.r#gen::<f64>().ln();
                (j, z, ln_u)
            })
            .collect();

        let proposals: Vec<Vec<f64>> = active
            .clone()
            .zip(&draws)
            .map(|(k, &(j, z, _))| {
                let x: Vec<f64> = current.row(k).iter().copied().collect();
                let c: Vec<f64> = current.row(j).iter().copied().collect();
                let mut out = vec![0.0; dim];
                self.stretch.propose_into(&x, &c, z, &mut out);
                out
            })
            .collect();

        let proposal_lp: Vec<f64> = proposals
            .par_iter()
            .map(|theta| self.target.log_posterior(theta))
            .collect();

        let mut next = current.clone();
        let mut next_lp = current_lp.to_vec();
        for (i, k) in active.enumerate() {
            let (_, z, ln_u) = draws[i];
            if self.stretch.accepts(z, dim, current_lp[k], proposal_lp[i], ln_u) {
                for (d, &v) in proposals[i].iter().enumerate() {
                    next[(k, d)] = v;
                }
                next_lp[k] = proposal_lp[i];
                chain.record_accept(k);
            }
        }
        (next, next_lp)
    }
}

impl<'a> EnsembleSampler<'a, Model> {
    /// Sampler for a [`Model`], named after its parameters.
    pub fn for_model(model: &'a Model, n_walkers: usize) -> Result<Self, AppError> {
        Self::new(model, model.param_names(), n_walkers)
    }
}
