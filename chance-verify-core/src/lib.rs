//! Core domain types for the chance-constraint verification harness.
//!
//! The crate models the solver configuration document, the ordered edits
//! applied to it between solver runs, and the tolerance comparison that
//! decides whether a run agrees with the reference estimate. External
//! collaborators (the reference estimator, document persistence, the solver
//! and the worker pool) are reached through the traits defined here so the
//! verification logic never depends on a concrete process or file format.

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod compare;
mod document;
mod edit;
mod estimator;
mod pool;
mod solver;
mod store;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use compare::{
    ComparedPair, ComparisonError, ComparisonReport, FORECAST_STD_TOLERANCE, MissingKey,
    MissingSide, compare_within_tolerance,
};
pub use document::{
    BASE_JACOBIAN, ControlDocument, DocumentError, OPT_RISK, OPT_STD_WEIGHTS, Observation,
    OptionValue, Parameter, ParseTransformError, SolverOptions, Transform,
};
pub use edit::{DocumentEdit, EditError, EditPlan, ForecastSelector};
pub use estimator::{EstimateError, ReferenceUncertainty, UncertaintyEstimator};
pub use pool::{DEFAULT_POOL_PORT, PoolError, PoolJob, PoolOutcome, WorkerPool};
pub use solver::{RunError, RunSummary, SolverRunner};
pub use store::{DocumentStore, StoreError};
