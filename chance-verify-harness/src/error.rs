//! Error types for the scenario drivers.

use std::io;

use camino::Utf8PathBuf;
use chance_verify_core::{EditError, EstimateError, PoolError, RunError, StoreError};
use thiserror::Error;

use crate::WeightMode;

/// Errors raised while driving a verification scenario.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// The working directory could not be reset from the template.
    #[error("failed to prepare {path} from {template}: {source}")]
    Prepare {
        /// Directory being prepared.
        path: Utf8PathBuf,
        /// Template it was copied from.
        template: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The control document could not be loaded or written.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// An edit was rejected.
    #[error("failed to edit control document: {0}")]
    Edit(#[from] EditError),
    /// The reference estimate could not be produced.
    #[error("reference estimate failed: {0}")]
    Estimate(#[from] EstimateError),
    /// The solver could not be run.
    #[error(transparent)]
    Run(#[from] RunError),
    /// The worker pool could not be run.
    #[error(transparent)]
    Pool(#[from] PoolError),
    /// No forecast observations matched the configured groups.
    #[error("no weighted observations belong to the forecast groups {prefixes:?}")]
    NoForecasts {
        /// Group prefixes searched.
        prefixes: Vec<String>,
    },
    /// A report file could not be read.
    #[error("failed to read report {path}: {source}")]
    Scrape {
        /// Report path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The master report carried no objective function value.
    #[error("no objective function value in {path}")]
    MissingObjective {
        /// Report searched.
        path: Utf8PathBuf,
    },
    /// At least one weighting mode disagreed with the reference estimate.
    #[error("solver uncertainty disagrees with the reference in {} mode", join_modes(.modes))]
    ModesFailed {
        /// Failing modes.
        modes: Vec<WeightMode>,
    },
}

fn join_modes(modes: &[WeightMode]) -> String {
    modes
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" and ")
}
