//! Boundary for launching a supervised pool of solver workers.

use std::io;
use std::num::NonZeroUsize;

use camino::Utf8PathBuf;
use thiserror::Error;

/// Default port the pool master listens on.
pub const DEFAULT_POOL_PORT: u16 = 4004;

/// Everything needed to run one distributed solve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolJob {
    /// Directory copied to the master and to every worker.
    pub template_dir: Utf8PathBuf,
    /// Solver executable.
    pub executable: Utf8PathBuf,
    /// Control file name inside the template.
    pub config_file: String,
    /// Directory the master runs in; its report lands here.
    pub master_dir: Utf8PathBuf,
    /// Parent directory for per-worker copies.
    pub worker_root: Utf8PathBuf,
    /// Number of workers.
    pub workers: NonZeroUsize,
    /// Port the master listens on.
    pub port: u16,
}

/// Summary of a completed pool run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolOutcome {
    /// Directory holding the master's report.
    pub master_dir: Utf8PathBuf,
    /// Workers successfully started.
    pub workers_launched: usize,
    /// Master exit code, or `None` when terminated by a signal.
    pub master_exit_code: Option<i32>,
}

/// Errors raised while running a worker pool.
#[derive(Debug, Error)]
pub enum PoolError {
    /// A master or worker directory could not be prepared.
    #[error("failed to prepare {path} from template: {source}")]
    PrepareDir {
        /// Directory being prepared.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// A pool process could not be started.
    #[error("failed to start {role} in {working_dir}: {source}")]
    Spawn {
        /// `master` or `worker <n>`.
        role: String,
        /// Working directory of the process.
        working_dir: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// No worker could be started, so the master can never finish.
    #[error("none of the {requested} requested workers started")]
    NoWorkers {
        /// Workers requested.
        requested: usize,
    },
    /// Waiting for the master failed.
    #[error("failed waiting for the pool master: {source}")]
    Wait {
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

/// Launches a master and its workers, and blocks until the run completes.
///
/// Work distribution, worker retries and result aggregation belong to the
/// implementation; callers only see the master directory afterwards.
pub trait WorkerPool {
    /// Run `job` to completion.
    fn run(&self, job: &PoolJob) -> Result<PoolOutcome, PoolError>;
}
