//! Distributed convergence check: run the solver across a worker pool and
//! confirm the master reports a first-iteration objective value.

use std::fmt;

use camino::Utf8PathBuf;
use chance_verify_core::{PoolJob, WorkerPool};
use chance_verify_report::{ObjectiveValue, report_path_for, scrape_objective_file};
use log::info;

use crate::{ConvergenceConfig, HarnessError};

/// Progress of a [`ConvergenceScenario`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConvergenceState {
    /// Not yet started.
    #[default]
    Idle,
    /// Building the pool job.
    Launching,
    /// Master and workers are running.
    RunningWorkers,
    /// Reading the master report.
    Collecting,
    /// An objective value was found.
    Done,
}

impl fmt::Display for ConvergenceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Launching => "launching",
            Self::RunningWorkers => "running workers",
            Self::Collecting => "collecting",
            Self::Done => "done",
        })
    }
}

/// A successful convergence check.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvergenceOutcome {
    /// Objective value reported by the master.
    pub objective: ObjectiveValue,
    /// Master report it was read from.
    pub report_path: Utf8PathBuf,
    /// Workers the pool started.
    pub workers_launched: usize,
    /// Master exit code, for diagnostics.
    pub master_exit_code: Option<i32>,
}

/// Drives the convergence check through a [`WorkerPool`].
///
/// A failed run leaves [`ConvergenceScenario::state`] at the stage that
/// failed.
#[derive(Debug)]
pub struct ConvergenceScenario<P> {
    config: ConvergenceConfig,
    executable: Utf8PathBuf,
    pool: P,
    state: ConvergenceState,
}

impl<P: WorkerPool> ConvergenceScenario<P> {
    /// Assemble a scenario running `executable` through `pool`.
    #[must_use]
    pub const fn new(config: ConvergenceConfig, executable: Utf8PathBuf, pool: P) -> Self {
        Self {
            config,
            executable,
            pool,
            state: ConvergenceState::Idle,
        }
    }

    /// Current stage.
    #[must_use]
    pub const fn state(&self) -> ConvergenceState {
        self.state
    }

    /// Scenario settings.
    #[must_use]
    pub const fn config(&self) -> &ConvergenceConfig {
        &self.config
    }

    /// Worker pool the scenario launches.
    #[must_use]
    pub const fn pool(&self) -> &P {
        &self.pool
    }

    fn advance(&mut self, next: ConvergenceState) {
        info!("convergence check: {} -> {next}", self.state);
        self.state = next;
    }

    /// Launch the pool, wait for the master and read its objective value.
    ///
    /// # Errors
    /// Returns [`HarnessError::Pool`] when the pool cannot run,
    /// [`HarnessError::Scrape`] when the master report cannot be read and
    /// [`HarnessError::MissingObjective`] when it carries no objective line.
    pub fn run(&mut self) -> Result<ConvergenceOutcome, HarnessError> {
        self.advance(ConvergenceState::Launching);
        let job = PoolJob {
            template_dir: self.config.template_dir.clone(),
            executable: self.executable.clone(),
            config_file: self.config.config_file.clone(),
            master_dir: self.config.master_dir.clone(),
            worker_root: self.config.worker_root.clone(),
            workers: self.config.workers,
            port: self.config.port,
        };

        self.advance(ConvergenceState::RunningWorkers);
        let pool_outcome = self.pool.run(&job)?;

        self.advance(ConvergenceState::Collecting);
        let report_path = report_path_for(&pool_outcome.master_dir.join(&job.config_file));
        let objective = scrape_objective_file(&report_path, &self.config.objective_phrase)
            .map_err(|source| HarnessError::Scrape {
                path: report_path.clone(),
                source,
            })?
            .ok_or_else(|| HarnessError::MissingObjective {
                path: report_path.clone(),
            })?;
        info!(
            "objective function value {} on line {} of {report_path}",
            objective.value, objective.line_number
        );

        self.advance(ConvergenceState::Done);
        Ok(ConvergenceOutcome {
            objective,
            report_path,
            workers_launched: pool_outcome.workers_launched,
            master_exit_code: pool_outcome.master_exit_code,
        })
    }
}
