//! Reference forecast uncertainty read from a linear-analysis summary.

use std::collections::BTreeMap;
use std::io::BufReader;

use camino::{Utf8Path, Utf8PathBuf};
use chance_verify_core::{
    ControlDocument, EstimateError, ReferenceUncertainty, UncertaintyEstimator,
};
use log::info;
use serde::Deserialize;

/// Default file name of the forecast summary beside the sensitivity matrix.
pub const DEFAULT_FORECAST_SUMMARY: &str = "forecast_summary.json";

/// One forecast's prior and posterior variance.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ForecastVariance {
    /// Variance before conditioning on observations.
    pub prior_var: f64,
    /// Variance after conditioning on observations.
    pub post_var: f64,
}

/// Reads posterior forecast variances produced by an external first-order
/// second-moment analysis of the sensitivity matrix.
///
/// The summary is a JSON object mapping forecast names to
/// `{ "prior_var": f64, "post_var": f64 }`. A relative summary path is
/// resolved beside the sensitivity matrix, so a summary shipped in the
/// template directory travels with each working copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForecastSummaryEstimator {
    summary: Utf8PathBuf,
}

impl Default for ForecastSummaryEstimator {
    fn default() -> Self {
        Self::new(DEFAULT_FORECAST_SUMMARY)
    }
}

impl ForecastSummaryEstimator {
    /// Estimator reading `summary`.
    #[must_use]
    pub fn new(summary: impl Into<Utf8PathBuf>) -> Self {
        Self {
            summary: summary.into(),
        }
    }

    fn summary_path(&self, jacobian: &Utf8Path) -> Utf8PathBuf {
        if self.summary.is_absolute() {
            return self.summary.clone();
        }
        jacobian
            .parent()
            .map_or_else(|| self.summary.clone(), |dir| dir.join(&self.summary))
    }

    fn read_summary(path: &Utf8Path) -> Result<BTreeMap<String, ForecastVariance>, EstimateError> {
        let file = chance_verify_fs::open_utf8_file(path).map_err(|err| EstimateError::Input {
            path: path.to_path_buf(),
            source: Box::new(err),
        })?;
        let raw: BTreeMap<String, ForecastVariance> = serde_json::from_reader(BufReader::new(file))
            .map_err(|err| EstimateError::Input {
                path: path.to_path_buf(),
                source: Box::new(err),
            })?;
        Ok(raw
            .into_iter()
            .map(|(name, variance)| (name.to_lowercase(), variance))
            .collect())
    }
}

impl UncertaintyEstimator for ForecastSummaryEstimator {
    fn forecast_std(
        &self,
        document: &ControlDocument,
        jacobian: &Utf8Path,
        forecasts: &[String],
    ) -> Result<ReferenceUncertainty, EstimateError> {
        if !chance_verify_fs::file_exists(jacobian) {
            return Err(EstimateError::MissingJacobian {
                path: jacobian.to_path_buf(),
            });
        }
        for name in forecasts {
            if document.observation(name).is_none() {
                return Err(EstimateError::UnknownForecast { name: name.clone() });
            }
        }
        let path = self.summary_path(jacobian);
        let summary = Self::read_summary(&path)?;
        let mut variances = Vec::with_capacity(forecasts.len());
        for name in forecasts {
            let variance = summary
                .get(&name.to_lowercase())
                .ok_or_else(|| EstimateError::MissingForecast { name: name.clone() })?;
            variances.push((name.clone(), variance.post_var));
        }
        let reference = ReferenceUncertainty::from_posterior_variances(variances)?;
        info!(
            "reference estimate for {} forecast(s) from {path}",
            reference.len()
        );
        Ok(reference)
    }
}
