//! Tolerance comparison between reference values and solver-reported values.

use std::collections::BTreeMap;
use std::fmt;

use log::{info, warn};
use thiserror::Error;

/// Absolute tolerance for forecast standard deviations reported by the solver.
pub const FORECAST_STD_TOLERANCE: f64 = 1.0e-4;

/// One compared name with both values and their absolute difference.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparedPair {
    /// Lower-cased result name.
    pub name: String,
    /// Value from the reference estimator.
    pub reference: f64,
    /// Value scraped from the solver report.
    pub scraped: f64,
    /// `|reference - scraped|`.
    pub difference: f64,
}

impl ComparedPair {
    #[expect(
        clippy::float_arithmetic,
        reason = "absolute difference of two reported values"
    )]
    fn new(name: String, reference: f64, scraped: f64) -> Self {
        Self {
            name,
            reference,
            scraped,
            difference: (reference - scraped).abs(),
        }
    }

    /// Whether the difference is strictly below `tolerance`.
    ///
    /// A `NaN` difference is never within tolerance.
    #[must_use]
    pub fn within(&self, tolerance: f64) -> bool {
        self.difference < tolerance
    }
}

/// Every pair compared in one check, in the caller's key order.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonReport {
    /// Tolerance the pairs were checked against.
    pub tolerance: f64,
    /// Compared pairs.
    pub pairs: Vec<ComparedPair>,
}

impl ComparisonReport {
    /// Whether every pair is within tolerance.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.pairs.iter().all(|pair| pair.within(self.tolerance))
    }

    /// Pairs whose difference reached or exceeded the tolerance.
    pub fn failures(&self) -> impl Iterator<Item = &ComparedPair> {
        self.pairs
            .iter()
            .filter(move |pair| !pair.within(self.tolerance))
    }

    /// Largest observed difference, if any pair was compared.
    #[must_use]
    pub fn max_difference(&self) -> Option<f64> {
        self.pairs
            .iter()
            .map(|pair| pair.difference)
            .reduce(f64::max)
    }
}

impl fmt::Display for ComparisonReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for pair in &self.pairs {
            let verdict = if pair.within(self.tolerance) {
                "ok"
            } else {
                "FAIL"
            };
            writeln!(
                f,
                "{:<24} {:>16.8e} {:>16.8e} {:>12.4e} {verdict}",
                pair.name, pair.reference, pair.scraped, pair.difference
            )?;
        }
        Ok(())
    }
}

/// Which input lacked a compared key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingSide {
    /// Absent from the reference values.
    Reference,
    /// Absent from the scraped values.
    Scraped,
    /// Absent from both.
    Both,
}

impl fmt::Display for MissingSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Reference => "reference",
            Self::Scraped => "scraped",
            Self::Both => "reference and scraped",
        })
    }
}

/// A compared key that could not be found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingKey {
    /// Lower-cased key.
    pub name: String,
    /// Input(s) lacking the key.
    pub side: MissingSide,
}

/// Why a comparison failed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ComparisonError {
    /// At least one compared key was absent from an input.
    #[error(
        "{} compared key(s) missing, first {:?} from {} values",
        .missing.len(),
        first_missing_name(.missing),
        first_missing_side(.missing)
    )]
    MissingKeys {
        /// Every missing key.
        missing: Vec<MissingKey>,
    },
    /// At least one difference reached the tolerance.
    #[error(
        "{failures} of {} value(s) differ by at least {}",
        .report.pairs.len(),
        .report.tolerance
    )]
    ToleranceExceeded {
        /// Number of failing pairs.
        failures: usize,
        /// Complete comparison, including passing pairs.
        report: ComparisonReport,
    },
}

fn first_missing_name(missing: &[MissingKey]) -> &str {
    missing.first().map_or("", |key| key.name.as_str())
}

fn first_missing_side(missing: &[MissingKey]) -> MissingSide {
    missing.first().map_or(MissingSide::Both, |key| key.side)
}

/// Compare `reference` and `scraped` on `keys`.
///
/// Every key must be present in both maps. The check passes when every
/// absolute difference is strictly below `tolerance`. Every pair is logged
/// before any failure is returned.
///
/// # Errors
/// Returns [`ComparisonError::MissingKeys`] when a key is absent from either
/// map and [`ComparisonError::ToleranceExceeded`] when any difference is at
/// least `tolerance`.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
/// use chance_verify_core::{FORECAST_STD_TOLERANCE, compare_within_tolerance};
///
/// let reference = BTreeMap::from([("l_forecast1".to_owned(), 0.45)]);
/// let scraped = BTreeMap::from([("l_forecast1".to_owned(), 0.450_05)]);
/// let keys = ["l_forecast1".to_owned()];
/// let report = compare_within_tolerance(&reference, &scraped, &keys, FORECAST_STD_TOLERANCE)
///     .expect("within tolerance");
/// assert!(report.passed());
/// ```
pub fn compare_within_tolerance(
    reference: &BTreeMap<String, f64>,
    scraped: &BTreeMap<String, f64>,
    keys: &[String],
    tolerance: f64,
) -> Result<ComparisonReport, ComparisonError> {
    let mut pairs = Vec::with_capacity(keys.len());
    let mut missing = Vec::new();
    for key in keys {
        let name = key.to_lowercase();
        match (reference.get(&name), scraped.get(&name)) {
            (Some(expected), Some(actual)) => {
                let pair = ComparedPair::new(name, *expected, *actual);
                info!(
                    "{} reference={} scraped={} difference={}",
                    pair.name, pair.reference, pair.scraped, pair.difference
                );
                pairs.push(pair);
            }
            (expected, actual) => {
                let side = match (expected, actual) {
                    (None, None) => MissingSide::Both,
                    (None, Some(_)) => MissingSide::Reference,
                    _ => MissingSide::Scraped,
                };
                warn!("{name} missing from {side} values");
                missing.push(MissingKey { name, side });
            }
        }
    }

    if !missing.is_empty() {
        return Err(ComparisonError::MissingKeys { missing });
    }
    let report = ComparisonReport { tolerance, pairs };
    let failures = report.failures().count();
    if failures > 0 {
        return Err(ComparisonError::ToleranceExceeded { failures, report });
    }
    Ok(report)
}
