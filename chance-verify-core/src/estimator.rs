//! Reference forecast uncertainty and the estimator that produces it.

use std::collections::BTreeMap;
use std::error::Error as StdError;

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;

use crate::{ControlDocument, DocumentEdit};

/// Posterior forecast standard deviations keyed by lower-cased forecast name.
///
/// Built once per run and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceUncertainty {
    std_devs: BTreeMap<String, f64>,
}

impl ReferenceUncertainty {
    /// Validate and wrap standard deviations.
    ///
    /// # Errors
    /// Returns [`EstimateError::InvalidStdDev`] for negative or non-finite values.
    pub fn from_std_devs<I, S>(std_devs: I) -> Result<Self, EstimateError>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let mut validated = BTreeMap::new();
        for (name, value) in std_devs {
            let key = name.into().to_lowercase();
            if !value.is_finite() || value < 0.0 {
                return Err(EstimateError::InvalidStdDev { name: key, value });
            }
            validated.insert(key, value);
        }
        Ok(Self {
            std_devs: validated,
        })
    }

    /// Convert posterior variances into standard deviations.
    ///
    /// # Errors
    /// Returns [`EstimateError::NegativeVariance`] when a variance is negative
    /// or not finite.
    pub fn from_posterior_variances<I, S>(variances: I) -> Result<Self, EstimateError>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let mut std_devs = Vec::new();
        for (name, variance) in variances {
            let key = name.into();
            if !variance.is_finite() || variance < 0.0 {
                return Err(EstimateError::NegativeVariance {
                    name: key.to_lowercase(),
                    variance,
                });
            }
            std_devs.push((key, variance.sqrt()));
        }
        Self::from_std_devs(std_devs)
    }

    /// Standard deviation for `name`, if estimated.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<f64> {
        self.std_devs.get(&name.to_lowercase()).copied()
    }

    /// All estimates keyed by name.
    #[must_use]
    pub const fn as_map(&self) -> &BTreeMap<String, f64> {
        &self.std_devs
    }

    /// Forecast names in key order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.std_devs.keys().map(String::as_str)
    }

    /// Number of forecasts estimated.
    #[must_use]
    pub fn len(&self) -> usize {
        self.std_devs.len()
    }

    /// Whether no forecasts were estimated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.std_devs.is_empty()
    }

    /// Edit assigning each standard deviation as its forecast's weight.
    #[must_use]
    pub fn as_weight_edit(&self) -> DocumentEdit {
        DocumentEdit::AssignWeights(self.std_devs.clone())
    }
}

/// Errors raised while producing a reference estimate.
#[derive(Debug, Error)]
pub enum EstimateError {
    /// A standard deviation was negative or not finite.
    #[error("forecast {name:?} has invalid standard deviation {value}")]
    InvalidStdDev {
        /// Forecast name.
        name: String,
        /// Rejected value.
        value: f64,
    },
    /// A posterior variance was negative or not finite.
    #[error("forecast {name:?} has invalid posterior variance {variance}")]
    NegativeVariance {
        /// Forecast name.
        name: String,
        /// Rejected variance.
        variance: f64,
    },
    /// A requested forecast was not produced by the estimator.
    #[error("estimator produced no value for forecast {name:?}")]
    MissingForecast {
        /// Forecast name.
        name: String,
    },
    /// A requested forecast is not an observation of the document.
    #[error("forecast {name:?} is not an observation of the control document")]
    UnknownForecast {
        /// Forecast name.
        name: String,
    },
    /// The sensitivity-matrix artefact could not be found.
    #[error("sensitivity matrix {path} is missing or not a file")]
    MissingJacobian {
        /// Expected artefact path.
        path: Utf8PathBuf,
    },
    /// The estimator's own inputs could not be read or decoded.
    #[error("failed to read estimator input {path}: {source}")]
    Input {
        /// Input path.
        path: Utf8PathBuf,
        /// Underlying failure.
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

/// Computes posterior forecast standard deviations from a linear sensitivity
/// model. Its output is treated as ground truth.
pub trait UncertaintyEstimator {
    /// Estimate the standard deviation of each forecast in `forecasts`.
    ///
    /// Implementations must return a value for every requested forecast or
    /// fail with [`EstimateError::MissingForecast`].
    fn forecast_std(
        &self,
        document: &ControlDocument,
        jacobian: &Utf8Path,
        forecasts: &[String],
    ) -> Result<ReferenceUncertainty, EstimateError>;
}
