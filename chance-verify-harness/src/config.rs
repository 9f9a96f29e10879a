//! Scenario settings with defaults matching the benchmark layouts.

use std::num::NonZeroUsize;

use camino::Utf8PathBuf;
use chance_verify_core::{DEFAULT_POOL_PORT, FORECAST_STD_TOLERANCE, ForecastSelector};
use chance_verify_report::{FOSM_CHANCE_TAG, OBJECTIVE_PHRASE};
use serde::{Deserialize, Serialize};

/// Default decision-variable parameter group.
pub const DEFAULT_DECISION_GROUP: &str = "q";

/// Default chance-constraint risk level.
pub const DEFAULT_RISK: f64 = 0.1;

/// Default number of pool workers.
pub const DEFAULT_WORKERS: NonZeroUsize = match NonZeroUsize::new(10) {
    Some(workers) => workers,
    None => NonZeroUsize::MIN,
};

/// Settings for the reference-versus-solver uncertainty check.
///
/// Relative file names are resolved inside `working_dir`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StdWeightsConfig {
    /// Pristine directory copied to `working_dir` before each run.
    pub template_dir: Utf8PathBuf,
    /// Scratch directory the solver runs in.
    pub working_dir: Utf8PathBuf,
    /// Base control document inside the template.
    pub base_config: String,
    /// Sensitivity-matrix artefact inside the template.
    pub jacobian: String,
    /// Control document written for each solver run.
    pub output_config: String,
    /// Parameter group holding the decision variables.
    pub decision_group: String,
    /// Chance-constraint risk level in `[0, 1]`.
    pub risk: f64,
    /// Selection of forecast observations.
    pub forecasts: ForecastSelector,
    /// Tag line opening the uncertainty table in the report.
    pub report_tag: String,
    /// Absolute tolerance for each standard deviation.
    pub tolerance: f64,
}

impl Default for StdWeightsConfig {
    fn default() -> Self {
        Self {
            template_dir: Utf8PathBuf::from("opt_dewater_chance/template"),
            working_dir: Utf8PathBuf::from("opt_dewater_chance/test_std_weights2"),
            base_config: "dewater_pest.base.pst".to_owned(),
            jacobian: "dewater_pest.full.jcb".to_owned(),
            output_config: "test.pst".to_owned(),
            decision_group: DEFAULT_DECISION_GROUP.to_owned(),
            risk: DEFAULT_RISK,
            forecasts: ForecastSelector::default(),
            report_tag: FOSM_CHANCE_TAG.to_owned(),
            tolerance: FORECAST_STD_TOLERANCE,
        }
    }
}

/// Settings for the distributed convergence check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvergenceConfig {
    /// Pristine directory copied to the master and each worker.
    pub template_dir: Utf8PathBuf,
    /// Directory the master runs in.
    pub master_dir: Utf8PathBuf,
    /// Parent of the per-worker directories.
    pub worker_root: Utf8PathBuf,
    /// Control document inside the template.
    pub config_file: String,
    /// Number of workers.
    pub workers: NonZeroUsize,
    /// Port the master listens on.
    pub port: u16,
    /// Phrase marking the objective line in the master report.
    pub objective_phrase: String,
}

impl Default for ConvergenceConfig {
    fn default() -> Self {
        Self {
            template_dir: Utf8PathBuf::from("opt_supply2_chance/template"),
            master_dir: Utf8PathBuf::from("opt_supply2_chance/master"),
            worker_root: Utf8PathBuf::from("opt_supply2_chance"),
            config_file: "supply2_pest.base.pst".to_owned(),
            workers: DEFAULT_WORKERS,
            port: DEFAULT_POOL_PORT,
            objective_phrase: OBJECTIVE_PHRASE.to_owned(),
        }
    }
}
