//! Command-line interface for the chance-constraint verification checks.
//!
//! Every subcommand layers its settings with `ortho_config`: command-line
//! flags override `CHANCE_VERIFY_CMDS_<SUBCOMMAND>_*` environment variables,
//! which override configuration files.
#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};

mod converge;
mod error;
mod scrape;
mod solver;
mod std_weights;

pub use error::CliError;

const ARG_EXECUTABLE: &str = "executable";
const ARG_SOLVER_ROOT: &str = "solver-root";
const ARG_SOLVER_NAME: &str = "solver-name";
const ARG_REPORT: &str = "report";
const ARG_RISK: &str = "risk";
const ARG_TOLERANCE: &str = "tolerance";
const ARG_FORECAST_PREFIX: &str = "forecast-prefix";
const ARG_FORECAST_SUMMARY: &str = "forecast-summary";
const ENV_STD_WEIGHTS_SOLVER_ROOT: &str = "CHANCE_VERIFY_CMDS_STD_WEIGHTS_SOLVER_ROOT";
const ENV_CONVERGE_SOLVER_ROOT: &str = "CHANCE_VERIFY_CMDS_CONVERGE_SOLVER_ROOT";
const ENV_SCRAPE_REPORT: &str = "CHANCE_VERIFY_CMDS_SCRAPE_REPORT";

/// Solver name looked up in a distribution root when no executable is given.
const DEFAULT_SOLVER_NAME: &str = "pestpp-opt";

/// Run the CLI with the current process arguments and environment.
///
/// # Errors
/// Returns [`CliError`] when arguments or configuration are invalid, when a
/// check cannot be carried out, or when a check fails.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    match cli.command {
        Command::StdWeights(args) => std_weights::run_std_weights(args),
        Command::Converge(args) => converge::run_converge(args),
        Command::Scrape(args) => scrape::run_scrape(args),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "chance-verify",
    about = "Correctness checks for a chance-constrained optimisation solver",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Compare solver forecast uncertainty with the reference estimate.
    StdWeights(std_weights::StdWeightsArgs),
    /// Run the solver across a worker pool and read its objective value.
    Converge(converge::ConvergeArgs),
    /// Print the values a report yields, for diagnosing a failed check.
    Scrape(scrape::ScrapeArgs),
}

#[cfg(test)]
mod tests;
