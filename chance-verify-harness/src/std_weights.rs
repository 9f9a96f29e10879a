//! Reference-versus-solver forecast uncertainty check.
//!
//! The base control document is prepared once: fixed parameters become
//! log-transformed, the forecasts are selected, every weight is zeroed and
//! the reference estimator computes each forecast's posterior standard
//! deviation. Those deviations become the forecast weights and the solver is
//! run twice, once with standardised weights and once without. Each run's
//! reported deviations must match the reference within tolerance.

use std::fmt;

use camino::{Utf8Path, Utf8PathBuf};
use chance_verify_core::{
    BASE_JACOBIAN, ComparisonError, ComparisonReport, ControlDocument, DocumentEdit,
    DocumentStore, EditPlan, OptionValue, ReferenceUncertainty, SolverRunner, Transform,
    UncertaintyEstimator, compare_within_tolerance,
};
use chance_verify_report::{ReportLayout, SectionEnd, report_path_for, scrape_tagged_file};
use log::{info, warn};

use crate::{HarnessError, StdWeightsConfig};

/// Interpretation of observation weights for one solver run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightMode {
    /// Weights are standard deviations (`opt_std_weights = true`).
    Standardised,
    /// Weights are inverse standard deviations (`opt_std_weights = false`).
    Classical,
}

impl WeightMode {
    /// Value of the standardised-weights flag for this mode.
    #[must_use]
    pub const fn flag(self) -> bool {
        matches!(self, Self::Standardised)
    }
}

impl fmt::Display for WeightMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Standardised => "standardised",
            Self::Classical => "classical",
        })
    }
}

/// Result of one solver run.
#[derive(Debug, Clone, PartialEq)]
pub struct ModeOutcome {
    /// Weighting mode the solver ran in.
    pub mode: WeightMode,
    /// Solver exit code, for diagnostics.
    pub exit_code: Option<i32>,
    /// Report the values were scraped from.
    pub report_path: Utf8PathBuf,
    /// Why the report scan stopped.
    pub section_end: SectionEnd,
    /// Comparison against the reference estimate.
    pub comparison: Result<ComparisonReport, ComparisonError>,
}

impl ModeOutcome {
    /// Whether the run agreed with the reference.
    #[must_use]
    pub const fn passed(&self) -> bool {
        self.comparison.is_ok()
    }
}

/// Both runs of the check, reported independently.
#[derive(Debug, Clone, PartialEq)]
pub struct StdWeightsOutcome {
    /// Reference standard deviations the runs were compared against.
    pub reference: ReferenceUncertainty,
    /// Run with `opt_std_weights = true`.
    pub standardised: ModeOutcome,
    /// Run with `opt_std_weights = false`.
    pub classical: ModeOutcome,
}

impl StdWeightsOutcome {
    /// Both runs in execution order.
    #[must_use]
    pub const fn modes(&self) -> [&ModeOutcome; 2] {
        [&self.standardised, &self.classical]
    }

    /// Modes whose comparison failed.
    #[must_use]
    pub fn failed_modes(&self) -> Vec<WeightMode> {
        self.modes()
            .into_iter()
            .filter(|outcome| !outcome.passed())
            .map(|outcome| outcome.mode)
            .collect()
    }

    /// Whether both runs agreed with the reference.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.modes().iter().all(|outcome| outcome.passed())
    }

    /// Fail when either run disagreed with the reference.
    ///
    /// # Errors
    /// Returns [`HarnessError::ModesFailed`] naming every failing mode.
    pub fn ensure_passed(&self) -> Result<(), HarnessError> {
        let modes = self.failed_modes();
        if modes.is_empty() {
            Ok(())
        } else {
            Err(HarnessError::ModesFailed { modes })
        }
    }
}

/// Drives the uncertainty check against a solver and its collaborators.
#[derive(Debug)]
pub struct StdWeightsScenario<D, E, S> {
    config: StdWeightsConfig,
    store: D,
    estimator: E,
    solver: S,
}

impl<D, E, S> StdWeightsScenario<D, E, S>
where
    D: DocumentStore,
    E: UncertaintyEstimator,
    S: SolverRunner,
{
    /// Assemble a scenario.
    #[must_use]
    pub const fn new(config: StdWeightsConfig, store: D, estimator: E, solver: S) -> Self {
        Self {
            config,
            store,
            estimator,
            solver,
        }
    }

    /// Scenario settings.
    #[must_use]
    pub const fn config(&self) -> &StdWeightsConfig {
        &self.config
    }

    /// Document store used for loading and writing control documents.
    #[must_use]
    pub const fn store(&self) -> &D {
        &self.store
    }

    /// Reference estimator.
    #[must_use]
    pub const fn estimator(&self) -> &E {
        &self.estimator
    }

    /// Solver invoked for each weighting mode.
    #[must_use]
    pub const fn solver(&self) -> &S {
        &self.solver
    }

    /// Run the check in both weighting modes.
    ///
    /// Infrastructure failures abort the scenario. Comparison failures do
    /// not: both modes always run and are reported in the outcome; use
    /// [`StdWeightsOutcome::ensure_passed`] for a single verdict.
    ///
    /// # Errors
    /// Returns [`HarnessError`] when the working directory, document,
    /// estimator, solver or report cannot be processed.
    pub fn run(&self) -> Result<StdWeightsOutcome, HarnessError> {
        let working_dir = &self.config.working_dir;
        chance_verify_fs::reset_dir_from_template(&self.config.template_dir, working_dir)
            .map_err(|source| HarnessError::Prepare {
                path: working_dir.clone(),
                template: self.config.template_dir.clone(),
                source,
            })?;
        info!("reset {working_dir} from {}", self.config.template_dir);

        let mut document = self.store.load(&working_dir.join(&self.config.base_config))?;
        let (reference, forecasts) = self.prepare_reference(&mut document)?;
        self.weight_forecasts(&mut document, &reference)?;

        let standardised =
            self.run_mode(&mut document, WeightMode::Standardised, &reference, &forecasts)?;
        let classical =
            self.run_mode(&mut document, WeightMode::Classical, &reference, &forecasts)?;
        Ok(StdWeightsOutcome {
            reference,
            standardised,
            classical,
        })
    }

    fn prepare_reference(
        &self,
        document: &mut ControlDocument,
    ) -> Result<(ReferenceUncertainty, Vec<String>), HarnessError> {
        EditPlan::new()
            .then(DocumentEdit::PromoteTransform {
                from: Transform::Fixed,
                to: Transform::Log,
            })
            .then(DocumentEdit::SetGroupTransform {
                group: self.config.decision_group.clone(),
                transform: Transform::Fixed,
            })
            .apply(document)?;

        let forecasts = self.config.forecasts.select(document);
        if forecasts.is_empty() {
            return Err(HarnessError::NoForecasts {
                prefixes: self.config.forecasts.group_prefixes.clone(),
            });
        }
        info!("selected {} forecast(s): {forecasts:?}", forecasts.len());
        DocumentEdit::ZeroObservationWeights.apply(document)?;

        let jacobian = self.config.working_dir.join(&self.config.jacobian);
        let reference = self
            .estimator
            .forecast_std(document, &jacobian, &forecasts)?;
        Ok((reference, forecasts))
    }

    fn weight_forecasts(
        &self,
        document: &mut ControlDocument,
        reference: &ReferenceUncertainty,
    ) -> Result<(), HarnessError> {
        let jacobian_name = Utf8Path::new(&self.config.jacobian)
            .file_name()
            .unwrap_or(self.config.jacobian.as_str())
            .to_owned();
        EditPlan::new()
            .then(reference.as_weight_edit())
            .then(DocumentEdit::SetRiskLevel(self.config.risk))
            .then(DocumentEdit::std_weights(true))
            .then(DocumentEdit::SetOption {
                key: BASE_JACOBIAN.to_owned(),
                value: OptionValue::Text(jacobian_name),
            })
            .then(DocumentEdit::SetGroupTransform {
                group: self.config.decision_group.clone(),
                transform: Transform::None,
            })
            .apply(document)?;
        Ok(())
    }

    fn run_mode(
        &self,
        document: &mut ControlDocument,
        mode: WeightMode,
        reference: &ReferenceUncertainty,
        forecasts: &[String],
    ) -> Result<ModeOutcome, HarnessError> {
        DocumentEdit::std_weights(mode.flag()).apply(document)?;
        let working_dir = &self.config.working_dir;
        let config_path = working_dir.join(&self.config.output_config);
        let report_path = report_path_for(&config_path);
        chance_verify_fs::remove_file_if_present(&report_path).map_err(|source| {
            HarnessError::Scrape {
                path: report_path.clone(),
                source,
            }
        })?;
        self.store.write(document, &config_path)?;

        info!("running solver in {mode} mode");
        let summary = self.solver.run(working_dir, &self.config.output_config)?;
        let scraped =
            scrape_tagged_file(&report_path, &self.config.report_tag, ReportLayout::FOSM_V1)
                .map_err(|source| HarnessError::Scrape {
                    path: report_path.clone(),
                    source,
                })?;
        info!("{mode}: scraped {} value(s) from {report_path}", scraped.len());
        let comparison = compare_within_tolerance(
            reference.as_map(),
            scraped.values(),
            forecasts,
            self.config.tolerance,
        );
        match &comparison {
            Ok(_) => info!("{mode}: all forecasts within {}", self.config.tolerance),
            Err(err) => warn!("{mode}: {err}"),
        }
        Ok(ModeOutcome {
            mode,
            exit_code: summary.exit_code,
            report_path,
            section_end: scraped.end().clone(),
            comparison,
        })
    }
}
