//! Scrapers for the text reports written by the chance-constrained solver.
//!
//! Two report shapes are understood: a tagged table of per-forecast values
//! ([`scrape_tagged_section`]) and a single objective function line
//! ([`scrape_objective`]). Both are fail-soft: malformed content ends or
//! skips a match instead of raising an error, so only read failures
//! propagate.

#![forbid(unsafe_code)]

use camino::{Utf8Path, Utf8PathBuf};

mod objective;
mod section;

pub use objective::{OBJECTIVE_PHRASE, ObjectiveValue, scrape_objective, scrape_objective_file};
pub use section::{
    FOSM_CHANCE_TAG, ReportLayout, RowProblem, ScrapedResults, SectionEnd, scrape_tagged_file,
    scrape_tagged_section,
};

/// Extension of the run record the solver writes beside its control file.
pub const REPORT_EXTENSION: &str = "rec";

/// Path of the report the solver writes for `config_path`.
///
/// ```
/// use camino::Utf8Path;
/// use chance_verify_report::report_path_for;
///
/// assert_eq!(report_path_for(Utf8Path::new("run/test.pst")), "run/test.rec");
/// ```
#[must_use]
pub fn report_path_for(config_path: &Utf8Path) -> Utf8PathBuf {
    config_path.with_extension(REPORT_EXTENSION)
}
