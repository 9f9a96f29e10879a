//! Synchronous solver invocation as a child process.

use std::process::Command;

use camino::{Utf8Path, Utf8PathBuf};
use chance_verify_core::{RunError, RunSummary, SolverRunner};
use log::{info, warn};

/// Runs `<executable> <config_file>` with the working directory set.
///
/// The executable path should be absolute (see
/// [`crate::ExecutableResolver::resolve`]) because relative programs are
/// looked up differently once the working directory changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSolver {
    executable: Utf8PathBuf,
}

impl ProcessSolver {
    /// Solver launching `executable`.
    #[must_use]
    pub fn new(executable: impl Into<Utf8PathBuf>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    /// Executable this solver launches.
    #[must_use]
    pub fn executable(&self) -> &Utf8Path {
        &self.executable
    }
}

impl SolverRunner for ProcessSolver {
    fn run(&self, working_dir: &Utf8Path, config_file: &str) -> Result<RunSummary, RunError> {
        info!("running {} {config_file} in {working_dir}", self.executable);
        let mut child = Command::new(self.executable.as_std_path())
            .arg(config_file)
            .current_dir(working_dir.as_std_path())
            .spawn()
            .map_err(|source| RunError::Spawn {
                program: self.executable.clone(),
                working_dir: working_dir.to_path_buf(),
                source,
            })?;
        let status = child.wait().map_err(|source| RunError::Wait {
            program: self.executable.clone(),
            source,
        })?;
        if !status.success() {
            warn!("{} exited with {status}", self.executable);
        }
        Ok(RunSummary {
            exit_code: status.code(),
        })
    }
}
