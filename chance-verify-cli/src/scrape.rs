//! `scrape` command: print what a solver report yields.

use std::io::Write;

use camino::Utf8PathBuf;
use chance_verify_report::{
    FOSM_CHANCE_TAG, OBJECTIVE_PHRASE, ObjectiveValue, ReportLayout, ScrapedResults,
    scrape_objective_file, scrape_tagged_file,
};
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::solver::require_existing;
use crate::{ARG_REPORT, CliError, ENV_SCRAPE_REPORT};

/// CLI arguments for the `scrape` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "scrape",
    long_about = "Read a solver report the way the checks do: print the \
                 values of the tagged chance-constraint section, why the \
                 section ended and the objective function value, if any.",
    about = "Print the values a report yields"
)]
#[ortho_config(prefix = "CHANCE_VERIFY")]
pub(crate) struct ScrapeArgs {
    /// Path to the solver report.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) report: Option<Utf8PathBuf>,
    /// Tag line opening the section to read.
    #[arg(long, value_name = "text")]
    #[serde(default)]
    pub(crate) tag: Option<String>,
    /// Phrase marking the objective function line.
    #[arg(long, value_name = "text")]
    #[serde(default)]
    pub(crate) objective_phrase: Option<String>,
}

impl ScrapeArgs {
    pub(crate) fn into_config(self) -> Result<ScrapeConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        ScrapeConfig::try_from(merged)
    }
}

/// Resolved `scrape` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ScrapeConfig {
    pub(crate) report: Utf8PathBuf,
    pub(crate) tag: String,
    pub(crate) objective_phrase: String,
}

impl TryFrom<ScrapeArgs> for ScrapeConfig {
    type Error = CliError;

    fn try_from(args: ScrapeArgs) -> Result<Self, Self::Error> {
        let report = args.report.ok_or(CliError::MissingArgument {
            field: ARG_REPORT,
            env: ENV_SCRAPE_REPORT,
        })?;
        Ok(Self {
            report,
            tag: args.tag.unwrap_or_else(|| FOSM_CHANCE_TAG.to_owned()),
            objective_phrase: args
                .objective_phrase
                .unwrap_or_else(|| OBJECTIVE_PHRASE.to_owned()),
        })
    }
}

pub(super) fn run_scrape(args: ScrapeArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_scrape_with(args, &mut stdout)
}

/// Scrape the report and print the section values and objective value.
pub(crate) fn run_scrape_with(args: ScrapeArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let config = args.into_config()?;
    require_existing(&config.report, ARG_REPORT)?;
    let read_error = |source| CliError::ReadReport {
        path: config.report.clone(),
        source,
    };
    let section = scrape_tagged_file(&config.report, &config.tag, ReportLayout::FOSM_V1)
        .map_err(read_error)?;
    let objective =
        scrape_objective_file(&config.report, &config.objective_phrase).map_err(read_error)?;
    write_scrape(writer, &section, objective.as_ref()).map_err(CliError::WriteOutput)
}

fn write_scrape(
    writer: &mut dyn Write,
    section: &ScrapedResults,
    objective: Option<&ObjectiveValue>,
) -> std::io::Result<()> {
    writeln!(
        writer,
        "{} value(s), section end: {}",
        section.len(),
        section.end()
    )?;
    for (name, value) in section.values() {
        writeln!(writer, "{name:<24} {value:>16.8e}")?;
    }
    match objective {
        Some(found) => writeln!(
            writer,
            "objective function value {} (line {})",
            found.value, found.line_number
        ),
        None => writeln!(writer, "objective function value not found"),
    }
}
