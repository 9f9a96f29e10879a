//! Tagged-section scanning for solver report tables.

use std::collections::BTreeMap;
use std::fmt;
use std::io::{self, BufRead};

use camino::Utf8Path;
use log::debug;

/// Tag line opening the first-iteration chance-constraint table.
pub const FOSM_CHANCE_TAG: &str =
    "FOSM-based chance constraint information at start of iteration 1";

/// Column positions of a tabular report section.
///
/// Layouts are versioned because the solver's table format is an external
/// contract that can change between solver releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportLayout {
    /// Column holding the result name.
    pub name_column: usize,
    /// Column holding the numeric value.
    pub value_column: usize,
    /// Rows with fewer columns end the section.
    pub min_columns: usize,
}

impl ReportLayout {
    /// Chance-constraint table: name in column 0, standard deviation in
    /// column 4.
    pub const FOSM_V1: Self = Self::new(0, 4);

    /// Layout requiring enough columns to reach both positions.
    #[must_use]
    pub const fn new(name_column: usize, value_column: usize) -> Self {
        let last = if name_column > value_column {
            name_column
        } else {
            value_column
        };
        Self {
            name_column,
            value_column,
            min_columns: last.saturating_add(1),
        }
    }
}

impl Default for ReportLayout {
    fn default() -> Self {
        Self::FOSM_V1
    }
}

/// What was wrong with the row that ended a section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowProblem {
    /// The row had fewer columns than the layout requires.
    TooFewColumns {
        /// Columns present.
        found: usize,
        /// Columns required.
        required: usize,
    },
    /// The value column did not parse as a number.
    InvalidValue {
        /// Offending token.
        token: String,
    },
}

impl fmt::Display for RowProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooFewColumns { found, required } => {
                write!(f, "{found} column(s), {required} required")
            }
            Self::InvalidValue { token } => write!(f, "value {token:?} is not a number"),
        }
    }
}

/// Why scanning a section stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionEnd {
    /// The tag line never appeared.
    TagNotFound,
    /// The input ended inside the section.
    EndOfStream,
    /// A blank line closed the section.
    BlankLine {
        /// One-based line number.
        line_number: usize,
    },
    /// A row failed the layout and closed the section.
    MalformedRow {
        /// One-based line number.
        line_number: usize,
        /// What was wrong with it.
        problem: RowProblem,
    },
}

impl fmt::Display for SectionEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TagNotFound => f.write_str("tag not found"),
            Self::EndOfStream => f.write_str("end of report"),
            Self::BlankLine { line_number } => write!(f, "blank line {line_number}"),
            Self::MalformedRow {
                line_number,
                problem,
            } => write!(f, "line {line_number}: {problem}"),
        }
    }
}

/// Values scraped from one report section, keyed by lower-cased name.
///
/// Built fresh for each read; never merged with another scrape.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrapedResults {
    values: BTreeMap<String, f64>,
    end: SectionEnd,
}

impl ScrapedResults {
    /// Value for `name`, compared case-insensitively.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(&name.to_lowercase()).copied()
    }

    /// All scraped values.
    #[must_use]
    pub const fn values(&self) -> &BTreeMap<String, f64> {
        &self.values
    }

    /// Consume the scrape, keeping only the values.
    #[must_use]
    pub fn into_values(self) -> BTreeMap<String, f64> {
        self.values
    }

    /// Why the scan stopped.
    #[must_use]
    pub const fn end(&self) -> &SectionEnd {
        &self.end
    }

    /// Number of scraped rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether nothing was scraped.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

enum Row {
    Value(String, f64),
    End(SectionEnd),
}

fn parse_row(line: &str, line_number: usize, layout: ReportLayout) -> Row {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.is_empty() {
        return Row::End(SectionEnd::BlankLine { line_number });
    }
    if tokens.len() < layout.min_columns {
        return Row::End(SectionEnd::MalformedRow {
            line_number,
            problem: RowProblem::TooFewColumns {
                found: tokens.len(),
                required: layout.min_columns,
            },
        });
    }
    let (Some(name), Some(raw_value)) = (
        tokens.get(layout.name_column),
        tokens.get(layout.value_column),
    ) else {
        return Row::End(SectionEnd::MalformedRow {
            line_number,
            problem: RowProblem::TooFewColumns {
                found: tokens.len(),
                required: layout.min_columns,
            },
        });
    };
    match raw_value.parse::<f64>() {
        Ok(value) => Row::Value(name.to_lowercase(), value),
        Err(_) => Row::End(SectionEnd::MalformedRow {
            line_number,
            problem: RowProblem::InvalidValue {
                token: (*raw_value).to_owned(),
            },
        }),
    }
}

/// Scrape the table following the first line containing `tag`.
///
/// The line after the tag is a header and is skipped. Rows are read until
/// the first blank or malformed row, or the end of input. Parse failures
/// end the section rather than failing the scrape; a missing tag yields an
/// empty result. Later rows overwrite earlier rows with the same name.
///
/// # Errors
/// Returns read errors from `reader`.
///
/// # Examples
/// ```
/// use chance_verify_report::{ReportLayout, SectionEnd, scrape_tagged_section};
///
/// let report = "\
/// TABLE
/// name a b c std
/// L_FORE1 0 0 0 0.45
///
/// trailing text
/// ";
/// let scraped = scrape_tagged_section(report.as_bytes(), "TABLE", ReportLayout::FOSM_V1)
///     .expect("in-memory read");
/// assert_eq!(scraped.get("l_fore1"), Some(0.45));
/// assert_eq!(scraped.end(), &SectionEnd::BlankLine { line_number: 4 });
/// ```
pub fn scrape_tagged_section<R: BufRead>(
    reader: R,
    tag: &str,
    layout: ReportLayout,
) -> io::Result<ScrapedResults> {
    let mut values = BTreeMap::new();
    let mut lines = reader.lines().enumerate();

    let mut found = false;
    for (_, line) in lines.by_ref() {
        if line?.contains(tag) {
            found = true;
            break;
        }
    }
    if !found {
        debug!("tag {tag:?} not found");
        return Ok(ScrapedResults {
            values,
            end: SectionEnd::TagNotFound,
        });
    }

    // Header row.
    if let Some((_, header)) = lines.next() {
        header?;
    }

    let mut end = SectionEnd::EndOfStream;
    for (index, line) in lines {
        match parse_row(&line?, index.saturating_add(1), layout) {
            Row::Value(name, value) => {
                values.insert(name, value);
            }
            Row::End(reason) => {
                end = reason;
                break;
            }
        }
    }
    debug!("section {tag:?} ended ({end:?}) after {} value(s)", values.len());
    Ok(ScrapedResults { values, end })
}

/// Scrape a tagged section from the report at `path`.
///
/// # Errors
/// Returns an error when the file cannot be opened or read.
pub fn scrape_tagged_file(
    path: &Utf8Path,
    tag: &str,
    layout: ReportLayout,
) -> io::Result<ScrapedResults> {
    let file = chance_verify_fs::open_utf8_file(path)?;
    scrape_tagged_section(io::BufReader::new(file), tag, layout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const REPORT: &str = "\
preamble
FOSM-based chance constraint information at start of iteration 1
name  value  prior_mean  post_mean  post_stdev  group
L_FORECAST1  1.0  2.0  3.0  0.45  l_head
less_forecast2  1.0  2.0  3.0  1.2  less_flux

FOSM-based chance constraint information at start of iteration 1
header
l_forecast1  0  0  0  99.0
";

    fn scrape(text: &str) -> ScrapedResults {
        scrape_tagged_section(text.as_bytes(), FOSM_CHANCE_TAG, ReportLayout::FOSM_V1)
            .expect("in-memory read")
    }

    #[rstest]
    fn reads_rows_until_blank_line() {
        let scraped = scrape(REPORT);
        assert_eq!(
            scraped.values(),
            &BTreeMap::from([
                ("l_forecast1".to_owned(), 0.45),
                ("less_forecast2".to_owned(), 1.2),
            ])
        );
        assert_eq!(scraped.end(), &SectionEnd::BlankLine { line_number: 6 });
    }

    #[rstest]
    fn missing_tag_yields_empty_results() {
        let scraped = scrape("nothing\nto see\n");
        assert!(scraped.is_empty());
        assert_eq!(scraped.end(), &SectionEnd::TagNotFound);
    }

    #[rstest]
    #[case("tag\nheader\nname 1 2 3\n", RowProblem::TooFewColumns { found: 4, required: 5 })]
    #[case("tag\nheader\nname 1 2 3 n/a\n", RowProblem::InvalidValue { token: "n/a".to_owned() })]
    fn malformed_row_ends_section(#[case] text: &str, #[case] problem: RowProblem) {
        let scraped = scrape_tagged_section(text.as_bytes(), "tag", ReportLayout::FOSM_V1)
            .expect("in-memory read");
        assert!(scraped.is_empty());
        assert_eq!(
            scraped.end(),
            &SectionEnd::MalformedRow {
                line_number: 3,
                problem
            }
        );
    }

    #[rstest]
    fn header_is_skipped_even_when_numeric() {
        let text = "tag\nskip 0 0 0 7.0\nkeep 0 0 0 8.0\n";
        let scraped = scrape_tagged_section(text.as_bytes(), "tag", ReportLayout::FOSM_V1)
            .expect("in-memory read");
        assert_eq!(scraped.get("skip"), None);
        assert_eq!(scraped.get("KEEP"), Some(8.0));
        assert_eq!(scraped.end(), &SectionEnd::EndOfStream);
    }

    #[rstest]
    fn later_duplicates_overwrite_earlier_rows() {
        let text = "tag\nheader\nf 0 0 0 1.0\nF 0 0 0 2.0\n";
        let scraped = scrape_tagged_section(text.as_bytes(), "tag", ReportLayout::FOSM_V1)
            .expect("in-memory read");
        assert_eq!(scraped.len(), 1);
        assert_eq!(scraped.get("f"), Some(2.0));
    }

    #[rstest]
    fn custom_layout_reads_other_columns() {
        let layout = ReportLayout::new(1, 0);
        assert_eq!(layout.min_columns, 2);
        let text = "tag\nheader\n3.5 Name\n";
        let scraped =
            scrape_tagged_section(text.as_bytes(), "tag", layout).expect("in-memory read");
        assert_eq!(scraped.get("name"), Some(3.5));
    }

    #[rstest]
    fn scrapes_report_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = camino::Utf8PathBuf::from_path_buf(dir.path().join("test.rec"))
            .expect("utf8 path");
        std::fs::write(&path, REPORT).expect("write report");
        let scraped =
            scrape_tagged_file(&path, FOSM_CHANCE_TAG, ReportLayout::FOSM_V1).expect("scrape");
        assert_eq!(scraped.len(), 2);
    }

    #[rstest]
    fn missing_report_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = camino::Utf8PathBuf::from_path_buf(dir.path().join("absent.rec"))
            .expect("utf8 path");
        let err = scrape_tagged_file(&path, FOSM_CHANCE_TAG, ReportLayout::FOSM_V1)
            .expect_err("missing file");
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
