//! Scenario drivers for verifying a chance-constrained solver.
//!
//! [`StdWeightsScenario`] checks the solver's first-iteration forecast
//! uncertainty against a reference estimate in both weighting modes.
//! [`ConvergenceScenario`] runs the solver across a worker pool and checks
//! that the master reports an objective value. Both reach the solver, the
//! estimator and document persistence only through the collaborator traits
//! in `chance_verify_core`.

#![forbid(unsafe_code)]

mod config;
mod convergence;
mod error;
mod estimator;
mod std_weights;
mod store;

pub use config::{
    ConvergenceConfig, DEFAULT_DECISION_GROUP, DEFAULT_RISK, DEFAULT_WORKERS, StdWeightsConfig,
};
pub use convergence::{ConvergenceOutcome, ConvergenceScenario, ConvergenceState};
pub use error::HarnessError;
pub use estimator::{DEFAULT_FORECAST_SUMMARY, ForecastSummaryEstimator, ForecastVariance};
pub use std_weights::{ModeOutcome, StdWeightsOutcome, StdWeightsScenario, WeightMode};
pub use store::JsonDocumentStore;
