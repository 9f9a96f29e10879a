//! Facade crate for the chance-constraint verification harness.
//!
//! This crate re-exports the core domain types and the report scrapers, and
//! exposes the process-backed collaborators and the scenario drivers behind
//! feature flags.

#![forbid(unsafe_code)]

pub use chance_verify_core::{
    ComparedPair, ComparisonError, ComparisonReport, ControlDocument, DocumentEdit,
    DocumentStore, EditPlan, FORECAST_STD_TOLERANCE, ForecastSelector, PoolJob, PoolOutcome,
    ReferenceUncertainty, SolverRunner, Transform, UncertaintyEstimator, WorkerPool,
    compare_within_tolerance,
};

pub use chance_verify_report::{
    FOSM_CHANCE_TAG, OBJECTIVE_PHRASE, ObjectiveValue, ReportLayout, ScrapedResults, SectionEnd,
    report_path_for, scrape_objective, scrape_tagged_section,
};

#[cfg(feature = "test-support")]
pub use chance_verify_core::test_support;

#[cfg(feature = "process")]
pub use chance_verify_runner::{ExecutableResolver, PlatformFamily, ProcessSolver, ProcessWorkerPool};

#[cfg(feature = "scenarios")]
pub use chance_verify_harness::{
    ConvergenceConfig, ConvergenceScenario, ForecastSummaryEstimator, HarnessError,
    JsonDocumentStore, StdWeightsConfig, StdWeightsOutcome, StdWeightsScenario, WeightMode,
};
