//! `converge` command: distributed run with an objective value check.

use std::io::Write;
use std::num::NonZeroUsize;

use camino::Utf8PathBuf;
use chance_verify_core::WorkerPool;
use chance_verify_harness::{ConvergenceConfig, ConvergenceOutcome, ConvergenceScenario};
use chance_verify_runner::{DEFAULT_MASTER_HOST, ProcessWorkerPool};
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::solver::SolverLocation;
use crate::{
    ARG_EXECUTABLE, ARG_SOLVER_NAME, ARG_SOLVER_ROOT, CliError, ENV_CONVERGE_SOLVER_ROOT,
};

/// CLI arguments for the `converge` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "converge",
    long_about = "Copy the benchmark template to a master directory and one \
                 directory per worker, run the solver as a master with the \
                 workers attached, then read the first-iteration objective \
                 function value from the master report.",
    about = "Run the solver across a worker pool and read its objective value"
)]
#[ortho_config(prefix = "CHANCE_VERIFY")]
pub(crate) struct ConvergeArgs {
    /// Pristine benchmark directory copied for the master and each worker.
    #[arg(long, value_name = "dir")]
    #[serde(default)]
    pub(crate) template_dir: Option<Utf8PathBuf>,
    /// Directory the master runs in.
    #[arg(long, value_name = "dir")]
    #[serde(default)]
    pub(crate) master_dir: Option<Utf8PathBuf>,
    /// Parent of the per-worker directories.
    #[arg(long, value_name = "dir")]
    #[serde(default)]
    pub(crate) worker_root: Option<Utf8PathBuf>,
    /// Control document inside the template.
    #[arg(long, value_name = "file")]
    #[serde(default)]
    pub(crate) config_file: Option<String>,
    /// Number of workers to attach.
    #[arg(long, value_name = "count")]
    #[serde(default)]
    pub(crate) workers: Option<NonZeroUsize>,
    /// Port the master listens on.
    #[arg(long, value_name = "port")]
    #[serde(default)]
    pub(crate) port: Option<u16>,
    /// Host the workers connect to.
    #[arg(long, value_name = "host")]
    #[serde(default)]
    pub(crate) host: Option<String>,
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

impl ConvergeArgs {
    pub(crate) fn into_config(self) -> Result<ConvergeCommandConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        ConvergeCommandConfig::try_from(merged)
    }
}

/// Resolved `converge` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ConvergeCommandConfig {
    /// Scenario settings.
    pub(crate) scenario: ConvergenceConfig,
    /// Host the workers connect to.
    pub(crate) host: String,
    /// Solver executable source.
    pub(crate) solver: SolverLocation,
}

impl TryFrom<ConvergeArgs> for ConvergeCommandConfig {
    type Error = CliError;

    fn try_from(args: ConvergeArgs) -> Result<Self, Self::Error> {
        let solver = SolverLocation::from_settings(
            args.executable,
            args.solver_root,
            args.solver_name,
            ENV_CONVERGE_SOLVER_ROOT,
        )?;
        let defaults = ConvergenceConfig::default();
        let scenario = ConvergenceConfig {
            template_dir: args.template_dir.unwrap_or(defaults.template_dir),
            master_dir: args.master_dir.unwrap_or(defaults.master_dir),
            worker_root: args.worker_root.unwrap_or(defaults.worker_root),
            config_file: args.config_file.unwrap_or(defaults.config_file),
            workers: args.workers.unwrap_or(defaults.workers),
            port: args.port.unwrap_or(defaults.port),
            objective_phrase: defaults.objective_phrase,
        };
        Ok(Self {
            scenario,
            host: args
                .host
                .unwrap_or_else(|| DEFAULT_MASTER_HOST.to_owned()),
            solver,
        })
    }
}

/// Builds the collaborators for one `converge` invocation.
pub(crate) trait ConvergeBuilder {
    /// Worker pool type.
    type Pool: WorkerPool;

    fn executable(&self, config: &ConvergeCommandConfig) -> Result<Utf8PathBuf, CliError>;

    fn pool(&self, config: &ConvergeCommandConfig) -> Self::Pool;
}

pub(crate) struct DefaultConvergeBuilder;

impl ConvergeBuilder for DefaultConvergeBuilder {
    type Pool = ProcessWorkerPool;

    fn executable(&self, config: &ConvergeCommandConfig) -> Result<Utf8PathBuf, CliError> {
        config.solver.locate()
    }

    fn pool(&self, config: &ConvergeCommandConfig) -> Self::Pool {
        ProcessWorkerPool::new(config.host.clone())
    }
}

pub(super) fn run_converge(args: ConvergeArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_converge_with(args, &DefaultConvergeBuilder, &mut stdout)
}

/// Run the pool and print the objective value the master reported.
pub(crate) fn run_converge_with<B: ConvergeBuilder>(
    args: ConvergeArgs,
    builder: &B,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let config = args.into_config()?;
    let executable = builder.executable(&config)?;
    let pool = builder.pool(&config);
    let mut scenario = ConvergenceScenario::new(config.scenario, executable, pool);
    let outcome = scenario
        .run()
        .map_err(|source| CliError::Convergence {
            state: scenario.state(),
            source,
        })?;
    write_outcome(writer, &outcome).map_err(CliError::WriteOutput)
}

fn write_outcome(writer: &mut dyn Write, outcome: &ConvergenceOutcome) -> std::io::Result<()> {
    let exit_code = outcome
        .master_exit_code
        .map_or_else(|| "none".to_owned(), |code| code.to_string());
    writeln!(
        writer,
        "objective function value {} (line {} of {})",
        outcome.objective.value, outcome.objective.line_number, outcome.report_path
    )?;
    writeln!(
        writer,
        "{} worker(s) launched, master exit code {exit_code}",
        outcome.workers_launched
    )
}
