use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;

/// Outcome of a completed solver process.
///
/// The exit code is recorded for diagnostics only; verification consults the
/// report file the solver writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    /// Process exit code, or `None` when terminated by a signal.
    pub exit_code: Option<i32>,
}

/// Errors raised while invoking the solver.
#[derive(Debug, Error)]
pub enum RunError {
    /// The solver process could not be started.
    #[error("failed to start {program} in {working_dir}: {source}")]
    Spawn {
        /// Executable path.
        program: Utf8PathBuf,
        /// Working directory.
        working_dir: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// Waiting for the solver process failed.
    #[error("failed waiting for {program}: {source}")]
    Wait {
        /// Executable path.
        program: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

/// Runs the external solver synchronously against a control file.
///
/// Implementations block until the solver exits. There is no timeout.
///
/// # Examples
/// ```rust
/// use camino::Utf8Path;
/// use chance_verify_core::{RunError, RunSummary, SolverRunner};
///
/// struct NoopSolver;
///
/// impl SolverRunner for NoopSolver {
///     fn run(&self, _working_dir: &Utf8Path, _config_file: &str) -> Result<RunSummary, RunError> {
///         Ok(RunSummary { exit_code: Some(0) })
///     }
/// }
///
/// let summary = NoopSolver.run(Utf8Path::new("."), "test.pst").expect("noop run");
/// assert_eq!(summary.exit_code, Some(0));
/// ```
pub trait SolverRunner {
    /// Run `<solver> <config_file>` with `working_dir` as the current directory.
    fn run(&self, working_dir: &Utf8Path, config_file: &str) -> Result<RunSummary, RunError>;
}
