//! Test helpers: benchmark trees on disk and scripted collaborators.

use std::cell::RefCell;
use std::collections::VecDeque;

use camino::{Utf8Path, Utf8PathBuf};
use chance_verify_core::test_support::sample_document;
use chance_verify_core::{
    DocumentStore, PoolError, PoolJob, PoolOutcome, RunError, RunSummary, SolverRunner,
    WorkerPool,
};
use chance_verify_harness::{ForecastSummaryEstimator, JsonDocumentStore};
use chance_verify_report::{FOSM_CHANCE_TAG, report_path_for};
use tempfile::TempDir;

use crate::CliError;
use crate::converge::{ConvergeBuilder, ConvergeCommandConfig};
use crate::std_weights::{StdWeightsBuilder, StdWeightsCommandConfig};

pub(super) fn write_utf8(path: &Utf8Path, contents: &[u8]) {
    chance_verify_fs::write_utf8_file(path, contents).expect("write test file");
}

pub(super) fn utf8_tempdir() -> (TempDir, Utf8PathBuf) {
    let tmp = TempDir::new().expect("tempdir");
    let root = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf-8 workspace");
    (tmp, root)
}

/// Dewatering template holding the sample document, a jacobian and a
/// forecast summary whose deviations are 0.45 and 1.2.
pub(super) fn write_dewater_template(template: &Utf8Path) {
    JsonDocumentStore
        .write(&sample_document(), &template.join("dewater_pest.base.pst"))
        .expect("write base document");
    write_utf8(&template.join("dewater_pest.full.jcb"), b"jacobian");
    write_utf8(
        &template.join("forecast_summary.json"),
        br#"{
            "l_forecast1": {"prior_var": 1.0, "post_var": 0.2025},
            "less_forecast2": {"prior_var": 4.0, "post_var": 1.44}
        }"#,
    );
}

/// Render a chance-constraint table as the solver would write it.
pub(super) fn fosm_report(rows: &[(&str, f64)]) -> String {
    let mut text = String::from("run record\n");
    text.push_str(FOSM_CHANCE_TAG);
    text.push_str("\nname  value  prior_mean  post_mean  post_stdev\n");
    for (name, value) in rows {
        text.push_str(&format!("{}  1.0  2.0  3.0  {value}\n", name.to_uppercase()));
    }
    text.push('\n');
    text
}

/// Solver writing one queued report per run.
pub(super) struct ScriptedSolver {
    reports: RefCell<VecDeque<String>>,
}

impl SolverRunner for ScriptedSolver {
    fn run(&self, working_dir: &Utf8Path, config_file: &str) -> Result<RunSummary, RunError> {
        if let Some(report) = self.reports.borrow_mut().pop_front() {
            write_utf8(
                &report_path_for(&working_dir.join(config_file)),
                report.as_bytes(),
            );
        }
        Ok(RunSummary { exit_code: Some(0) })
    }
}

/// Reads the real forecast summary but runs a scripted solver.
#[derive(Debug, Default)]
pub(super) struct StubStdWeightsBuilder {
    pub(super) reports: Vec<String>,
}

impl StdWeightsBuilder for StubStdWeightsBuilder {
    type Estimator = ForecastSummaryEstimator;
    type Solver = ScriptedSolver;

    fn estimator(&self, config: &StdWeightsCommandConfig) -> Self::Estimator {
        ForecastSummaryEstimator::new(config.forecast_summary.clone())
    }

    fn solver(&self, _config: &StdWeightsCommandConfig) -> Result<Self::Solver, CliError> {
        Ok(ScriptedSolver {
            reports: RefCell::new(self.reports.iter().cloned().collect()),
        })
    }
}

/// Pool writing a fixed master report, or failing to start any worker.
#[derive(Debug, Clone)]
pub(super) enum StubPool {
    Reports(String),
    NoWorkers,
}

impl WorkerPool for StubPool {
    fn run(&self, job: &PoolJob) -> Result<PoolOutcome, PoolError> {
        match self {
            Self::Reports(report) => {
                write_utf8(
                    &report_path_for(&job.master_dir.join(&job.config_file)),
                    report.as_bytes(),
                );
                Ok(PoolOutcome {
                    master_dir: job.master_dir.clone(),
                    workers_launched: job.workers.get(),
                    master_exit_code: Some(0),
                })
            }
            Self::NoWorkers => Err(PoolError::NoWorkers {
                requested: job.workers.get(),
            }),
        }
    }
}

#[derive(Debug)]
pub(super) struct StubConvergeBuilder {
    pub(super) pool: StubPool,
}

impl ConvergeBuilder for StubConvergeBuilder {
    type Pool = StubPool;

    fn executable(&self, _config: &ConvergeCommandConfig) -> Result<Utf8PathBuf, CliError> {
        Ok(Utf8PathBuf::from("pestpp-opt"))
    }

    fn pool(&self, _config: &ConvergeCommandConfig) -> Self::Pool {
        self.pool.clone()
    }
}
