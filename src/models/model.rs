//! Model definition and log-posterior evaluation.
//!
//! A `Model` is an ordered list of parameters, one prior per parameter (the
//! order defines the parameter-vector layout) and a pluggable log-likelihood.
//! Models are validated once at construction and never mutated afterwards.
//!
//! The sampler only needs [`LogPosterior`], so hand-built targets in tests and
//! the cosmological models go through the same seam.

use std::collections::HashSet;
use std::sync::Arc;

use crate::domain::Parameter;
use crate::error::AppError;
use crate::models::prior::PriorSpec;

/// Pluggable log-likelihood of a parameter vector.
///
/// Must be deterministic and side-effect free: the sampler evaluates it
/// concurrently for different walkers.
pub type LikelihoodFn = Arc<dyn Fn(&[f64]) -> f64 + Send + Sync>;

/// Anything the ensemble sampler can explore.
pub trait LogPosterior: Sync {
    /// Dimension of the parameter vector.
    fn dim(&self) -> usize;

    /// Unnormalised log-posterior; `-inf` means zero probability.
    fn log_posterior(&self, theta: &[f64]) -> f64;
}

#[derive(Clone)]
pub struct Model {
    name: String,
    parameters: Vec<Parameter>,
    priors: Vec<PriorSpec>,
    likelihood: LikelihoodFn,
    init_cluster: Option<Vec<(f64, f64)>>,
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .field("priors", &self.priors)
            .field("init_cluster", &self.init_cluster)
            .finish_non_exhaustive()
    }
}

impl Model {
    /// Build a model from ordered `(parameter, prior)` pairs and a likelihood.
    ///
    /// Rejects an empty parameter list, duplicate names and malformed priors.
    pub fn new(
        name: impl Into<String>,
        params: Vec<(Parameter, PriorSpec)>,
        likelihood: LikelihoodFn,
    ) -> Result<Self, AppError> {
        let name = name.into();
        if params.is_empty() {
            return Err(AppError::invalid(format!("Model '{name}' has no parameters.")));
        }

        let mut seen = HashSet::new();
        for (param, prior) in &params {
            if !seen.insert(param.name.as_str()) {
                return Err(AppError::invalid(format!(
                    "Model '{name}' declares parameter '{}' twice.",
                    param.name
                )));
            }
            prior.validate().map_err(|e| {
                AppError::invalid(format!("Model '{name}', parameter '{}': {}", param.name, e.message()))
            })?;
        }

        let (parameters, priors) = params.into_iter().unzip();
        Ok(Self {
            name,
            parameters,
            priors,
            likelihood,
            init_cluster: None,
        })
    }

    /// Model whose likelihood is identically zero (posterior = prior).
    pub fn prior_only(name: impl Into<String>, params: Vec<(Parameter, PriorSpec)>) -> Result<Self, AppError> {
        Self::new(name, params, Arc::new(|_: &[f64]| 0.0))
    }

    /// Attach a narrow per-parameter `[lo, hi]` box used to initialise walkers.
    pub fn with_init_cluster(mut self, bounds: Vec<(f64, f64)>) -> Result<Self, AppError> {
        if bounds.len() != self.dim() {
            return Err(AppError::invalid(format!(
                "Model '{}': init cluster has {} bounds, expected {}.",
                self.name,
                bounds.len(),
                self.dim()
            )));
        }
        for (i, &(lo, hi)) in bounds.iter().enumerate() {
            if !(lo.is_finite() && hi.is_finite() && lo <= hi) {
                return Err(AppError::invalid(format!(
                    "Model '{}': invalid init bounds for '{}': [{lo}, {hi}].",
                    self.name, self.parameters[i].name
                )));
            }
        }
        self.init_cluster = Some(bounds);
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn param_names(&self) -> Vec<String> {
        self.parameters.iter().map(|p| p.name.clone()).collect()
    }

    pub fn priors(&self) -> &[PriorSpec] {
        &self.priors
    }

    pub fn init_cluster(&self) -> Option<&[(f64, f64)]> {
        self.init_cluster.as_deref()
    }

    /// Sum of prior log densities; stops at the first `-inf`.
    pub fn log_prior(&self, theta: &[f64]) -> f64 {
        let mut total = 0.0;
        for (prior, &value) in self.priors.iter().zip(theta) {
            let lp = prior.log_density(value);
            if lp == f64::NEG_INFINITY {
                return f64::NEG_INFINITY;
            }
            total += lp;
        }
        total
    }

    pub fn log_likelihood(&self, theta: &[f64]) -> f64 {
        (self.likelihood)(theta)
    }
}

impl LogPosterior for Model {
    fn dim(&self) -> usize {
        self.parameters.len()
    }

    /// Log prior plus log likelihood. The likelihood is never evaluated outside
    /// the prior support.
    fn log_posterior(&self, theta: &[f64]) -> f64 {
        if theta.len() != self.dim() {
            debug_assert!(false, "parameter vector length {} != {}", theta.len(), self.dim());
            return f64::NAN;
        }
        let lp = self.log_prior(theta);
        if !lp.is_finite() {
            return f64::NEG_INFINITY;
        }
        lp + self.log_likelihood(theta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn two_params() -> Vec<(Parameter, PriorSpec)> {
        vec![
            (Parameter::new("a", ""), PriorSpec::uniform(0.0, 1.0)),
            (Parameter::new("b", "Gyr"), PriorSpec::gaussian(0.0, 1.0)),
        ]
    }

    #[test]
    fn posterior_is_prior_plus_likelihood() {
        let model = Model::new("m", two_params(), Arc::new(|t: &[f64]| -t[1] * 10.0)).unwrap();
        let theta = [0.5, 0.25];
        let expected = model.log_prior(&theta) + -2.5;
        assert!((model.log_posterior(&theta) - expected).abs() < 1e-12);
        assert_eq!(model.dim(), 2);
        assert_eq!(model.param_names(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn likelihood_is_skipped_outside_prior_support() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let model = Model::new(
            "m",
            two_params(),
            Arc::new(move |_: &[f64]| {
                counter.fetch_add(1, Ordering::SeqCst);
                0.0
            }),
        )
        .unwrap();

        assert_eq!(model.log_posterior(&[1.5, 0.0]), f64::NEG_INFINITY);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(model.log_posterior(&[0.5, 0.0]).is_finite());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn construction_rejects_bad_definitions() {
        let dup = vec![
            (Parameter::new("a", ""), PriorSpec::uniform(0.0, 1.0)),
            (Parameter::new("a", ""), PriorSpec::uniform(0.0, 1.0)),
        ];
        assert!(Model::prior_only("dup", dup).is_err());
        assert!(Model::prior_only("empty", vec![]).is_err());

        let bad_prior = vec![(Parameter::new("s", ""), PriorSpec::gaussian(0.0, 0.0))];
        let err = Model::prior_only("bad", bad_prior).unwrap_err();
        assert_eq!(err.exit_code(), 2);

        let model = Model::prior_only("ok", two_params()).unwrap();
        assert!(model.clone().with_init_cluster(vec![(0.0, 1.0)]).is_err());
        assert!(model.with_init_cluster(vec![(0.2, 0.3), (1.0, 0.0)]).is_err());
    }
}
