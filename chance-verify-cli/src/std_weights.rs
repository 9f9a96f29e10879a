//! `std-weights` command: reference-versus-solver forecast uncertainty.

use std::io::Write;

use camino::Utf8PathBuf;
use chance_verify_core::{ComparisonError, ForecastSelector, SolverRunner, UncertaintyEstimator};
use chance_verify_harness::{
    DEFAULT_FORECAST_SUMMARY, ForecastSummaryEstimator, JsonDocumentStore, ModeOutcome,
    StdWeightsConfig, StdWeightsOutcome, StdWeightsScenario,
};
use chance_verify_runner::ProcessSolver;
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::solver::SolverLocation;
use crate::{
    ARG_EXECUTABLE, ARG_FORECAST_PREFIX, ARG_FORECAST_SUMMARY, ARG_RISK, ARG_SOLVER_NAME,
    ARG_SOLVER_ROOT, ARG_TOLERANCE, CliError, ENV_STD_WEIGHTS_SOLVER_ROOT,
};

/// CLI arguments for the `std-weights` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "std-weights",
    long_about = "Reset a working copy of the benchmark template, compute the \
                 reference forecast standard deviations, then run the solver \
                 with standardised and with classical weights. Both runs \
                 must report the reference deviations within tolerance.",
    about = "Check solver forecast uncertainty against the reference estimate"
)]
#[ortho_config(prefix = "CHANCE_VERIFY")]
pub(crate) struct StdWeightsArgs {
    /// Pristine benchmark directory copied before the check.
    #[arg(long, value_name = "dir")]
    #[serde(default)]
    pub(crate) template_dir: Option<Utf8PathBuf>,
    /// Scratch directory the solver runs in.
    #[arg(long, value_name = "dir")]
    #[serde(default)]
    pub(crate) working_dir: Option<Utf8PathBuf>,
    /// Base control document inside the template.
    #[arg(long, value_name = "file")]
    #[serde(default)]
    pub(crate) base_config: Option<String>,
    /// Sensitivity-matrix artefact inside the template.
    #[arg(long, value_name = "file")]
    #[serde(default)]
    pub(crate) jacobian: Option<String>,
    /// Control document written for each solver run.
    #[arg(long, value_name = "file")]
    #[serde(default)]
    pub(crate) output_config: Option<String>,
    /// Parameter group holding the decision variables.
    #[arg(long, value_name = "group")]
    #[serde(default)]
    pub(crate) decision_group: Option<String>,
    /// Chance-constraint risk level in `[0, 1]`.
    #[arg(long = ARG_RISK, value_name = "level")]
    #[serde(default)]
    pub(crate) risk: Option<f64>,
    /// Observation group prefixes marking forecasts (comma separated).
    #[arg(long = ARG_FORECAST_PREFIX, value_name = "prefix", value_delimiter = ',')]
    #[serde(default)]
    pub(crate) forecast_prefixes: Option<Vec<String>>,
    /// Absolute tolerance for each standard deviation.
    #[arg(long = ARG_TOLERANCE, value_name = "value")]
    #[serde(default)]
    pub(crate) tolerance: Option<f64>,
    /// Forecast variance summary, resolved beside the jacobian when relative.
    #[arg(long = ARG_FORECAST_SUMMARY, value_name = "path")]
    #[serde(default)]
    pub(crate) forecast_summary: Option<Utf8PathBuf>,
    /// Explicit solver executable.
    #[arg(long = ARG_EXECUTABLE, value_name = "path")]
    #[serde(default)]
    pub(crate) executable: Option<Utf8PathBuf>,
    /// Solver distribution root holding per-platform builds.
    #[arg(long = ARG_SOLVER_ROOT, value_name = "dir")]
    #[serde(default)]
    pub(crate) solver_root: Option<Utf8PathBuf>,
    /// Solver name looked up under the distribution root.
    #[arg(long = ARG_SOLVER_NAME, value_name = "name")]
    #[serde(default)]
    pub(crate) solver_name: Option<String>,
}

impl StdWeightsArgs {
    pub(crate) fn into_config(self) -> Result<StdWeightsCommandConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        StdWeightsCommandConfig::try_from(merged)
    }
}

/// Resolved `std-weights` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct StdWeightsCommandConfig {
    /// Scenario settings.
    pub(crate) scenario: StdWeightsConfig,
    /// Forecast variance summary read by the reference estimator.
    pub(crate) forecast_summary: Utf8PathBuf,
    /// Solver executable source.
    pub(crate) solver: SolverLocation,
}

impl TryFrom<StdWeightsArgs> for StdWeightsCommandConfig {
    type Error = CliError;

    fn try_from(args: StdWeightsArgs) -> Result<Self, Self::Error> {
        let solver = SolverLocation::from_settings(
            args.executable,
            args.solver_root,
            args.solver_name,
            ENV_STD_WEIGHTS_SOLVER_ROOT,
        )?;
        let defaults = StdWeightsConfig::default();

        let risk = args.risk.unwrap_or(defaults.risk);
        if !(0.0..=1.0).contains(&risk) {
            return Err(CliError::OutOfRange {
                field: ARG_RISK,
                value: risk,
                expected: "[0, 1]",
            });
        }
        let tolerance = args.tolerance.unwrap_or(defaults.tolerance);
        if !is_positive_finite(tolerance) {
            return Err(CliError::OutOfRange {
                field: ARG_TOLERANCE,
                value: tolerance,
                expected: "(0, inf)",
            });
        }

        let scenario = StdWeightsConfig {
            template_dir: args.template_dir.unwrap_or(defaults.template_dir),
            working_dir: args.working_dir.unwrap_or(defaults.working_dir),
            base_config: args.base_config.unwrap_or(defaults.base_config),
            jacobian: args.jacobian.unwrap_or(defaults.jacobian),
            output_config: args.output_config.unwrap_or(defaults.output_config),
            decision_group: args.decision_group.unwrap_or(defaults.decision_group),
            risk,
            forecasts: args
                .forecast_prefixes
                .map_or(defaults.forecasts, |group_prefixes| ForecastSelector {
                    group_prefixes,
                }),
            report_tag: defaults.report_tag,
            tolerance,
        };
        Ok(Self {
            scenario,
            forecast_summary: args
                .forecast_summary
                .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_FORECAST_SUMMARY)),
            solver,
        })
    }
}

const fn is_positive_finite(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

/// Builds the collaborators for one `std-weights` invocation.
pub(crate) trait StdWeightsBuilder {
    /// Reference estimator type.
    type Estimator: UncertaintyEstimator;
    /// Solver type.
    type Solver: SolverRunner;

    fn estimator(&self, config: &StdWeightsCommandConfig) -> Self::Estimator;

    fn solver(&self, config: &StdWeightsCommandConfig) -> Result<Self::Solver, CliError>;
}

pub(crate) struct DefaultStdWeightsBuilder;

impl StdWeightsBuilder for DefaultStdWeightsBuilder {
    type Estimator = ForecastSummaryEstimator;
    type Solver = ProcessSolver;

    fn estimator(&self, config: &StdWeightsCommandConfig) -> Self::Estimator {
        ForecastSummaryEstimator::new(config.forecast_summary.clone())
    }

    fn solver(&self, config: &StdWeightsCommandConfig) -> Result<Self::Solver, CliError> {
        Ok(ProcessSolver::new(config.solver.locate()?))
    }
}

pub(super) fn run_std_weights(args: StdWeightsArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_std_weights_with(args, &DefaultStdWeightsBuilder, &mut stdout)
}

/// Run the check and print both modes, failing when either disagreed.
pub(crate) fn run_std_weights_with<B: StdWeightsBuilder>(
    args: StdWeightsArgs,
    builder: &B,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let config = args.into_config()?;
    let solver = builder.solver(&config)?;
    let estimator = builder.estimator(&config);
    let scenario = StdWeightsScenario::new(config.scenario, JsonDocumentStore, estimator, solver);
    let outcome = scenario.run()?;
    write_outcome(writer, &outcome).map_err(CliError::WriteOutput)?;
    outcome.ensure_passed()?;
    Ok(())
}

fn write_outcome(writer: &mut dyn Write, outcome: &StdWeightsOutcome) -> std::io::Result<()> {
    writeln!(
        writer,
        "reference estimate for {} forecast(s)",
        outcome.reference.len()
    )?;
    for mode in outcome.modes() {
        write_mode(writer, mode)?;
    }
    Ok(())
}

fn write_mode(writer: &mut dyn Write, outcome: &ModeOutcome) -> std::io::Result<()> {
    let verdict = if outcome.passed() { "pass" } else { "FAIL" };
    let exit_code = outcome
        .exit_code
        .map_or_else(|| "none".to_owned(), |code| code.to_string());
    writeln!(
        writer,
        "[{}] {verdict}: exit code {exit_code}, {} ({})",
        outcome.mode, outcome.report_path, outcome.section_end
    )?;
    match &outcome.comparison {
        Ok(report) | Err(ComparisonError::ToleranceExceeded { report, .. }) => {
            write!(writer, "{report}")
        }
        Err(ComparisonError::MissingKeys { missing }) => {
            for key in missing {
                writeln!(writer, "{:<24} missing from {} values", key.name, key.side)?;
            }
            Ok(())
        }
    }
}
