//! Shared fixtures for harness integration tests.

use std::cell::RefCell;
use std::collections::VecDeque;

use camino::{Utf8Path, Utf8PathBuf};
use chance_verify_core::test_support::{FixedEstimator, sample_document};
use chance_verify_core::{
    DocumentStore, PoolError, PoolJob, PoolOutcome, ReferenceUncertainty, RunError, RunSummary,
    SolverRunner, WorkerPool,
};
use chance_verify_harness::{JsonDocumentStore, StdWeightsConfig};
use chance_verify_report::FOSM_CHANCE_TAG;
use tempfile::TempDir;

/// Scratch tree holding a dewatering template.
pub struct Bench {
    _dir: TempDir,
    pub root: Utf8PathBuf,
}

impl Bench {
    #[expect(clippy::expect_used, reason = "test helpers should fail fast")]
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf8 temp path");
        let template = root.join("opt_dewater_chance").join("template");
        JsonDocumentStore
            .write(&sample_document(), &template.join("dewater_pest.base.pst"))
            .expect("write base document");
        std::fs::write(template.join("dewater_pest.full.jcb"), b"jacobian").expect("jacobian");
        Self { _dir: dir, root }
    }

    pub fn config(&self) -> StdWeightsConfig {
        StdWeightsConfig {
            template_dir: self.root.join("opt_dewater_chance").join("template"),
            working_dir: self.root.join("opt_dewater_chance").join("test_std_weights2"),
            ..StdWeightsConfig::default()
        }
    }
}

/// Estimator returning 0.45 and 1.2 for the two sample forecasts.
#[expect(clippy::expect_used, reason = "test helpers should fail fast")]
pub fn reference_estimator() -> FixedEstimator {
    FixedEstimator::new(
        ReferenceUncertainty::from_std_devs([("l_forecast1", 0.45), ("less_forecast2", 1.2)])
            .expect("valid deviations"),
    )
}

/// Render a chance-constraint table as the solver would write it.
pub fn fosm_report(rows: &[(&str, f64)]) -> String {
    let mut text = String::from("run record\n");
    text.push_str(FOSM_CHANCE_TAG);
    text.push_str("\nname  value  prior_mean  post_mean  post_stdev\n");
    for (name, value) in rows {
        text.push_str(&format!("{}  1.0  2.0  3.0  {value}\n", name.to_uppercase()));
    }
    text.push('\n');
    text
}

/// Solver writing one queued report per run and recording the standardised
/// weights flag of each document it was given.
#[derive(Default)]
pub struct ScriptedSolver {
    reports: RefCell<VecDeque<String>>,
    pub flags: RefCell<Vec<Option<bool>>>,
}

impl ScriptedSolver {
    pub fn with_reports<I: IntoIterator<Item = String>>(reports: I) -> Self {
        Self {
            reports: RefCell::new(reports.into_iter().collect()),
            flags: RefCell::new(Vec::new()),
        }
    }
}

impl SolverRunner for ScriptedSolver {
    fn run(&self, working_dir: &Utf8Path, config_file: &str) -> Result<RunSummary, RunError> {
        let config_path = working_dir.join(config_file);
        let flag = JsonDocumentStore
            .load(&config_path)
            .ok()
            .and_then(|document| document.options().flag("opt_std_weights"));
        self.flags.borrow_mut().push(flag);
        if let Some(report) = self.reports.borrow_mut().pop_front() {
            std::fs::write(config_path.with_extension("rec"), report).map_err(|source| {
                RunError::Wait {
                    program: Utf8PathBuf::from("scripted"),
                    source,
                }
            })?;
        }
        Ok(RunSummary { exit_code: Some(0) })
    }
}

/// Pool writing a fixed master report instead of launching processes.
pub struct ScriptedPool {
    pub report: Option<String>,
    pub jobs: RefCell<Vec<PoolJob>>,
}

impl ScriptedPool {
    pub fn new(report: Option<String>) -> Self {
        Self {
            report,
            jobs: RefCell::new(Vec::new()),
        }
    }
}

impl WorkerPool for ScriptedPool {
    fn run(&self, job: &PoolJob) -> Result<PoolOutcome, PoolError> {
        self.jobs.borrow_mut().push(job.clone());
        let prepare = |source| PoolError::PrepareDir {
            path: job.master_dir.clone(),
            source,
        };
        std::fs::create_dir_all(&job.master_dir).map_err(prepare)?;
        if let Some(report) = &self.report {
            let path = job.master_dir.join(&job.config_file).with_extension("rec");
            std::fs::write(path, report).map_err(prepare)?;
        }
        Ok(PoolOutcome {
            master_dir: job.master_dir.clone(),
            workers_launched: job.workers.get(),
            master_exit_code: Some(0),
        })
    }
}
