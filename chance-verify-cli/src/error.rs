//! Error types emitted by the chance-verify CLI.
//!
//! Keep this error type reasonably small, as many CLI helpers return
//! `Result<_, CliError>` and the workspace enables `clippy::result_large_err`.

use std::sync::Arc;

use camino::Utf8PathBuf;
use chance_verify_harness::{ConvergenceState, HarnessError};
use chance_verify_runner::ResolveError;
use thiserror::Error;

/// Errors emitted by the chance-verify CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        /// Flag name.
        field: &'static str,
        /// Environment variable that can supply it.
        env: &'static str,
    },
    /// A numeric option is outside its accepted range.
    #[error("{field} {value} is outside {expected}")]
    OutOfRange {
        /// Flag name.
        field: &'static str,
        /// Rejected value.
        value: f64,
        /// Accepted range, for the message.
        expected: &'static str,
    },
    /// A referenced input path does not exist on disk.
    #[error("{field} path {path:?} does not exist")]
    MissingSourceFile {
        /// Flag name.
        field: &'static str,
        /// Missing path.
        path: Utf8PathBuf,
    },
    /// A referenced input path exists but is not a file.
    #[error("{field} path {path:?} exists but is not a file")]
    SourcePathNotFile {
        /// Flag name.
        field: &'static str,
        /// Offending path.
        path: Utf8PathBuf,
    },
    /// A referenced input path could not be inspected due to an IO error.
    #[error("failed to inspect {field} path {path:?}: {source}")]
    InspectSourcePath {
        /// Flag name.
        field: &'static str,
        /// Path being inspected.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// No solver build was found for the running platform.
    #[error(transparent)]
    ResolveSolver(#[from] ResolveError),
    /// The uncertainty check could not be carried out or did not pass.
    #[error(transparent)]
    Harness(#[from] HarnessError),
    /// The convergence check stopped before reading an objective value.
    #[error("convergence check failed while {state}: {source}")]
    Convergence {
        /// Stage the check reached.
        state: ConvergenceState,
        /// Why it stopped.
        #[source]
        source: HarnessError,
    },
    /// A report could not be read.
    #[error("failed to read report {path:?}: {source}")]
    ReadReport {
        /// Report path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// Writing command output failed.
    #[error("failed to write output: {0}")]
    WriteOutput(#[source] std::io::Error),
}
