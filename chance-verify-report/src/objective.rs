//! Objective function line scraping.

use std::io::{self, BufRead};

use camino::Utf8Path;
use log::{debug, warn};

/// Phrase preceding the first-iteration objective value in a master report.
pub const OBJECTIVE_PHRASE: &str = "iteration 1 objective function value:";

/// An objective value and the line it was read from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectiveValue {
    /// Parsed objective function value.
    pub value: f64,
    /// One-based line number of the matching line.
    pub line_number: usize,
}

/// Find the objective value on lines containing `phrase`.
///
/// The value is the second-to-last whitespace token of a matching line. When
/// several lines match, the last parsable one wins. Matching lines whose
/// token does not parse are logged and skipped.
///
/// # Errors
/// Returns read errors from `reader`.
///
/// # Examples
/// ```
/// use chance_verify_report::{OBJECTIVE_PHRASE, scrape_objective};
///
/// let report = "iteration 1 objective function value: 123.45 (other)\n";
/// let objective = scrape_objective(report.as_bytes(), OBJECTIVE_PHRASE)
///     .expect("in-memory read")
///     .expect("objective present");
/// assert_eq!(objective.value, 123.45);
/// ```
pub fn scrape_objective<R: BufRead>(reader: R, phrase: &str) -> io::Result<Option<ObjectiveValue>> {
    let mut found = None;
    for (index, line) in reader.lines().enumerate() {
        let text = line?;
        if !text.contains(phrase) {
            continue;
        }
        let line_number = index.saturating_add(1);
        let token = text.split_whitespace().rev().nth(1);
        match token.map(str::parse::<f64>) {
            Some(Ok(value)) => {
                debug!("objective {value} on line {line_number}");
                found = Some(ObjectiveValue { value, line_number });
            }
            Some(Err(_)) | None => {
                warn!("line {line_number} mentions the objective but carries no numeric value");
            }
        }
    }
    Ok(found)
}

/// Scrape the objective value from the report at `path`.
///
/// # Errors
/// Returns an error when the file cannot be opened or read.
pub fn scrape_objective_file(path: &Utf8Path, phrase: &str) -> io::Result<Option<ObjectiveValue>> {
    let file = chance_verify_fs::open_utf8_file(path)?;
    scrape_objective(io::BufReader::new(file), phrase)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn scrape(text: &str) -> Option<ObjectiveValue> {
        scrape_objective(text.as_bytes(), OBJECTIVE_PHRASE).expect("in-memory read")
    }

    #[rstest]
    fn reads_second_to_last_token() {
        let objective = scrape("noise\niteration 1 objective function value: 123.45 (other)\n")
            .expect("objective present");
        assert_eq!(objective.value, 123.45);
        assert_eq!(objective.line_number, 2);
    }

    #[rstest]
    #[case("")]
    #[case("iteration 2 objective function value: 5.0 (x)\n")]
    fn absent_phrase_yields_none(#[case] text: &str) {
        assert_eq!(scrape(text), None);
    }

    #[rstest]
    fn last_parsable_line_wins() {
        let text = "\
iteration 1 objective function value: 1.5 (a)
iteration 1 objective function value: 2.5 (b)
iteration 1 objective function value: pending (c)
";
        let objective = scrape(text).expect("objective present");
        assert_eq!(objective.value, 2.5);
        assert_eq!(objective.line_number, 2);
    }

    #[rstest]
    fn unparsable_only_line_yields_none() {
        assert_eq!(scrape("iteration 1 objective function value: n/a (x)\n"), None);
    }
}
