//! Observational dataset: name-keyed numeric series.
//!
//! Two series shapes cover every likelihood term used here:
//!
//! - `Samples`: repeated point-estimate measurements of one quantity
//! - `Binned`: `(x, y, sigma)` triples, e.g. redshift-binned measurements
//!
//! Validation happens when a series enters the dataset, so likelihoods built
//! from a `Dataset` can index without re-checking shapes.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Local H0 measurement samples (km/s/Mpc).
pub const H0_SAMPLES: &str = "H0_samples";
/// S8 measurement samples.
pub const S8_SAMPLES: &str = "S8_samples";
/// Dark-energy equation of state, binned in redshift: `(z, w, sigma_w)`.
pub const W_MEASUREMENTS: &str = "w_measurements";

/// One named series of measurements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Series {
    Samples { values: Vec<f64> },
    Binned { x: Vec<f64>, y: Vec<f64>, sigma: Vec<f64> },
}

impl Series {
    fn validate(&self, name: &str) -> Result<(), AppError> {
        match self {
            Series::Samples { values } => {
                if values.is_empty() {
                    return Err(AppError::invalid(format!("Series '{name}' is empty.")));
                }
                if values.iter().any(|v| !v.is_finite()) {
                    return Err(AppError::invalid(format!(
                        "Series '{name}' contains non-finite values."
                    )));
                }
            }
            Series::Binned { x, y, sigma } => {
                if x.is_empty() {
                    return Err(AppError::invalid(format!("Series '{name}' is empty.")));
                }
                if x.len() != y.len() || x.len() != sigma.len() {
                    return Err(AppError::invalid(format!(
                        "Series '{name}' has mismatched lengths: x={}, y={}, sigma={}.",
                        x.len(),
                        y.len(),
                        sigma.len()
                    )));
                }
                if x.iter().chain(y).chain(sigma).any(|v| !v.is_finite()) {
                    return Err(AppError::invalid(format!(
                        "Series '{name}' contains non-finite values."
                    )));
                }
                if sigma.iter().any(|s| *s <= 0.0) {
                    return Err(AppError::invalid(format!(
                        "Series '{name}' has non-positive uncertainties."
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Borrowed view of a binned series.
#[derive(Debug, Clone, Copy)]
pub struct Binned<'a> {
    pub x: &'a [f64],
    pub y: &'a [f64],
    pub sigma: &'a [f64],
}

/// Named collection of validated series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dataset {
    series: BTreeMap<String, Series>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert (or replace) a series after validating its shape.
    pub fn insert(&mut self, name: impl Into<String>, series: Series) -> Result<(), AppError> {
        let name = name.into();
        series.validate(&name)?;
        self.series.insert(name, series);
        Ok(())
    }

    /// Builder-style [`Dataset::insert`].
    pub fn with_series(mut self, name: impl Into<String>, series: Series) -> Result<Self, AppError> {
        self.insert(name, series)?;
        Ok(self)
    }

    /// Sample values of a `Samples` series.
    ///
    /// Returns `Ok(None)` if the series is absent and an error if it exists with
    /// the wrong shape.
    pub fn samples(&self, name: &str) -> Result<Option<&[f64]>, AppError> {
        match self.series.get(name) {
            None => Ok(None),
            Some(Series::Samples { values }) => Ok(Some(values)),
            Some(Series::Binned { .. }) => Err(AppError::invalid(format!(
                "Series '{name}' must be a sample set, found binned data."
            ))),
        }
    }

    /// View of a `Binned` series; see [`Dataset::samples`] for the contract.
    pub fn binned(&self, name: &str) -> Result<Option<Binned<'_>>, AppError> {
        match self.series.get(name) {
            None => Ok(None),
            Some(Series::Binned { x, y, sigma }) => Ok(Some(Binned { x, y, sigma })),
            Some(Series::Samples { .. }) => Err(AppError::invalid(format!(
                "Series '{name}' must be binned (x, y, sigma), found a sample set."
            ))),
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Re-validate every series (used after deserialization).
    pub fn validate(&self) -> Result<(), AppError> {
        for (name, series) in &self.series {
            series.validate(name)?;
        }
        Ok(())
    }
}

/// Load a dataset from JSON: an object mapping series names to
/// `{"kind": "samples", "values": [...]}` or
/// `{"kind": "binned", "x": [...], "y": [...], "sigma": [...]}`.
pub fn load_dataset_json(path: &Path) -> Result<Dataset, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::invalid(format!("Failed to open dataset '{}': {e}", path.display())))?;
    let dataset: Dataset = serde_json::from_reader(BufReader::new(file))
        .map_err(|e| AppError::invalid(format!("Invalid dataset JSON '{}': {e}", path.display())))?;
    dataset.validate()?;
    if dataset.is_empty() {
        return Err(AppError::invalid(format!(
            "Dataset '{}' contains no series.",
            path.display()
        )));
    }
    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_mismatched_binned_lengths() {
        let err = Dataset::new()
            .with_series(
                W_MEASUREMENTS,
                Series::Binned {
                    x: vec![0.0, 1.0],
                    y: vec![-1.0],
                    sigma: vec![0.1, 0.1],
                },
            )
            .unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn rejects_non_positive_sigma_and_empty_samples() {
        let mut ds = Dataset::new();
        let bad_sigma = Series::Binned {
            x: vec![0.0],
            y: vec![-1.0],
            sigma: vec![0.0],
        };
        assert!(ds.insert(W_MEASUREMENTS, bad_sigma).is_err());
        assert!(ds.insert(H0_SAMPLES, Series::Samples { values: vec![] }).is_err());
        assert!(ds.is_empty());
    }

    #[test]
    fn typed_lookup_distinguishes_shapes() {
        let ds = Dataset::new()
            .with_series(H0_SAMPLES, Series::Samples { values: vec![67.0, 68.0] })
            .unwrap();
        assert_eq!(ds.samples(H0_SAMPLES).unwrap().unwrap(), &[67.0, 68.0]);
        assert!(ds.samples(S8_SAMPLES).unwrap().is_none());
        assert!(ds.binned(H0_SAMPLES).is_err());
    }

    #[test]
    fn json_shape_is_name_keyed() {
        let text = r#"{
            "H0_samples": {"kind": "samples", "values": [67.1, 67.9]},
            "w_measurements": {"kind": "binned", "x": [0.0, 1.0], "y": [-1.0, -0.99], "sigma": [0.05, 0.05]}
        }"#;
        let ds: Dataset = serde_json::from_str(text).unwrap();
        ds.validate().unwrap();
        assert_eq!(ds.names().collect::<Vec<_>>(), vec![H0_SAMPLES, W_MEASUREMENTS]);
        let w = ds.binned(W_MEASUREMENTS).unwrap().unwrap();
        assert_eq!(w.y, &[-1.0, -0.99]);
    }
}
