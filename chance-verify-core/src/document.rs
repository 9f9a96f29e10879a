//! Solver configuration document: parameters, observations and options.
//!
//! The document mirrors the parts of a solver control file the harness
//! touches. Names are stored lower-cased because the solver reports them
//! that way, so lookups and comparisons never depend on the spelling used in
//! the source file.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Option key holding the chance-constraint risk level.
pub const OPT_RISK: &str = "opt_risk";
/// Option key toggling the standardised-weights interpretation.
pub const OPT_STD_WEIGHTS: &str = "opt_std_weights";
/// Option key naming a precomputed sensitivity-matrix artefact.
pub const BASE_JACOBIAN: &str = "base_jacobian";

/// How the solver transforms a parameter before estimation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum Transform {
    /// Used untransformed.
    None,
    /// Estimated in log space.
    Log,
    /// Held fixed; excluded from estimation and from the decision space.
    Fixed,
}

impl Transform {
    /// Lower-case keyword used in control files.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Log => "log",
            Self::Fixed => "fixed",
        }
    }
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown transform keyword.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown parameter transform {keyword:?}")]
pub struct ParseTransformError {
    /// Keyword that failed to parse.
    pub keyword: String,
}

impl FromStr for Transform {
    type Err = ParseTransformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "log" => Ok(Self::Log),
            "fixed" => Ok(Self::Fixed),
            _ => Err(ParseTransformError {
                keyword: s.to_owned(),
            }),
        }
    }
}

/// A single adjustable model parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(from = "ParameterRecord")
)]
pub struct Parameter {
    /// Lower-cased parameter name, unique within a document.
    pub name: String,
    /// Lower-cased parameter group.
    pub group: String,
    /// Current transform mode.
    pub transform: Transform,
}

impl Parameter {
    /// Construct a parameter, lower-casing its name and group.
    pub fn new(name: impl Into<String>, group: impl Into<String>, transform: Transform) -> Self {
        Self {
            name: name.into().to_lowercase(),
            group: group.into().to_lowercase(),
            transform,
        }
    }
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct ParameterRecord {
    name: String,
    group: String,
    transform: Transform,
}

#[cfg(feature = "serde")]
impl From<ParameterRecord> for Parameter {
    fn from(record: ParameterRecord) -> Self {
        Self::new(record.name, record.group, record.transform)
    }
}

/// A single observation with its weight.
///
/// The weight is private so the non-negative invariant cannot be bypassed.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "ObservationRecord")
)]
pub struct Observation {
    /// Lower-cased observation name, unique within a document.
    pub name: String,
    /// Lower-cased observation group.
    pub group: String,
    weight: f64,
}

impl Observation {
    /// Validate and construct an observation.
    ///
    /// # Errors
    /// Returns [`DocumentError::InvalidWeight`] when `weight` is negative or
    /// not finite.
    pub fn new(
        name: impl Into<String>,
        group: impl Into<String>,
        weight: f64,
    ) -> Result<Self, DocumentError> {
        let name_lower = name.into().to_lowercase();
        check_weight(&name_lower, weight)?;
        Ok(Self {
            name: name_lower,
            group: group.into().to_lowercase(),
            weight,
        })
    }

    /// Current weight; always finite and non-negative.
    #[must_use]
    pub const fn weight(&self) -> f64 {
        self.weight
    }

    /// Whether the observation contributes to the objective.
    #[must_use]
    pub fn is_weighted(&self) -> bool {
        self.weight > 0.0
    }

    pub(crate) fn set_weight(&mut self, weight: f64) -> Result<(), DocumentError> {
        check_weight(&self.name, weight)?;
        self.weight = weight;
        Ok(())
    }
}

pub(crate) fn check_weight(name: &str, weight: f64) -> Result<(), DocumentError> {
    if weight.is_finite() && weight >= 0.0 {
        Ok(())
    } else {
        Err(DocumentError::InvalidWeight {
            name: name.to_owned(),
            weight,
        })
    }
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct ObservationRecord {
    name: String,
    group: String,
    weight: f64,
}

#[cfg(feature = "serde")]
impl TryFrom<ObservationRecord> for Observation {
    type Error = DocumentError;

    fn try_from(record: ObservationRecord) -> Result<Self, Self::Error> {
        Self::new(record.name, record.group, record.weight)
    }
}

/// Value stored against a solver option key.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(untagged)
)]
pub enum OptionValue {
    /// Boolean feature flag.
    Flag(bool),
    /// Numeric setting such as a risk level.
    Number(f64),
    /// Free-form text such as a file name.
    Text(String),
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flag(flag) => write!(f, "{flag}"),
            Self::Number(number) => write!(f, "{number}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

impl From<f64> for OptionValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Solver options keyed by lower-cased option name.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(
        from = "BTreeMap<String, OptionValue>",
        into = "BTreeMap<String, OptionValue>"
    )
)]
pub struct SolverOptions {
    entries: BTreeMap<String, OptionValue>,
}

impl SolverOptions {
    /// Create an empty option map.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Look up an option by case-insensitive key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.entries.get(&key.to_lowercase())
    }

    /// Look up a boolean flag, returning `None` when unset or not a flag.
    #[must_use]
    pub fn flag(&self, key: &str) -> Option<bool> {
        match self.get(key) {
            Some(OptionValue::Flag(flag)) => Some(*flag),
            _ => None,
        }
    }

    /// Insert or replace an option, returning the previous value.
    pub fn set(&mut self, key: &str, value: impl Into<OptionValue>) -> Option<OptionValue> {
        self.entries.insert(key.to_lowercase(), value.into())
    }

    /// Remove an option, returning the previous value.
    pub fn remove(&mut self, key: &str) -> Option<OptionValue> {
        self.entries.remove(&key.to_lowercase())
    }

    /// Iterate options in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Number of options set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no options are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<BTreeMap<String, OptionValue>> for SolverOptions {
    fn from(raw: BTreeMap<String, OptionValue>) -> Self {
        Self {
            entries: raw
                .into_iter()
                .map(|(key, value)| (key.to_lowercase(), value))
                .collect(),
        }
    }
}

impl From<SolverOptions> for BTreeMap<String, OptionValue> {
    fn from(options: SolverOptions) -> Self {
        options.entries
    }
}

/// Errors raised while constructing or mutating a [`ControlDocument`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DocumentError {
    /// Two parameters share a name.
    #[error("duplicate parameter name {name:?}")]
    DuplicateParameter {
        /// Offending name.
        name: String,
    },
    /// Two observations share a name.
    #[error("duplicate observation name {name:?}")]
    DuplicateObservation {
        /// Offending name.
        name: String,
    },
    /// An observation weight was negative or not finite.
    #[error("observation {name:?} has invalid weight {weight}")]
    InvalidWeight {
        /// Observation name.
        name: String,
        /// Rejected weight.
        weight: f64,
    },
    /// A parameter or observation had an empty name.
    #[error("parameter and observation names must not be empty")]
    EmptyName,
}

/// Solver inputs mutated in place between solver invocations.
///
/// # Examples
///
/// ```
/// use chance_verify_core::{ControlDocument, Observation, Parameter, SolverOptions, Transform};
///
/// # fn main() -> Result<(), chance_verify_core::DocumentError> {
/// let document = ControlDocument::new(
///     vec![Parameter::new("HK1", "hk", Transform::Log)],
///     vec![Observation::new("L_Forecast1", "l_head", 1.0)?],
///     SolverOptions::new(),
/// )?;
/// assert!(document.observation("l_forecast1").is_some());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "RawControlDocument")
)]
pub struct ControlDocument {
    parameters: Vec<Parameter>,
    observations: Vec<Observation>,
    options: SolverOptions,
}

impl ControlDocument {
    /// Validate name uniqueness and construct a document.
    ///
    /// # Errors
    /// Returns [`DocumentError`] when names are empty or duplicated, or when
    /// an observation weight is invalid.
    pub fn new(
        parameters: Vec<Parameter>,
        observations: Vec<Observation>,
        options: SolverOptions,
    ) -> Result<Self, DocumentError> {
        let mut seen = HashSet::new();
        for parameter in &parameters {
            if parameter.name.is_empty() {
                return Err(DocumentError::EmptyName);
            }
            if !seen.insert(parameter.name.as_str()) {
                return Err(DocumentError::DuplicateParameter {
                    name: parameter.name.clone(),
                });
            }
        }
        seen.clear();
        for observation in &observations {
            if observation.name.is_empty() {
                return Err(DocumentError::EmptyName);
            }
            check_weight(&observation.name, observation.weight)?;
            if !seen.insert(observation.name.as_str()) {
                return Err(DocumentError::DuplicateObservation {
                    name: observation.name.clone(),
                });
            }
        }
        drop(seen);
        Ok(Self {
            parameters,
            observations,
            options,
        })
    }

    /// Parameters in document order.
    #[must_use]
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// Observations in document order.
    #[must_use]
    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// Solver options.
    #[must_use]
    pub const fn options(&self) -> &SolverOptions {
        &self.options
    }

    /// Mutable access to solver options.
    pub const fn options_mut(&mut self) -> &mut SolverOptions {
        &mut self.options
    }

    /// Look up a parameter by case-insensitive name.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        let key = name.to_lowercase();
        self.parameters.iter().find(|parameter| parameter.name == key)
    }

    /// Look up an observation by case-insensitive name.
    #[must_use]
    pub fn observation(&self, name: &str) -> Option<&Observation> {
        let key = name.to_lowercase();
        self.observations
            .iter()
            .find(|observation| observation.name == key)
    }

    /// Names of observations with a non-zero weight, in document order.
    pub fn weighted_observation_names(&self) -> impl Iterator<Item = &str> {
        self.observations
            .iter()
            .filter(|observation| observation.is_weighted())
            .map(|observation| observation.name.as_str())
    }

    pub(crate) fn parameters_mut(&mut self) -> impl Iterator<Item = &mut Parameter> {
        self.parameters.iter_mut()
    }

    pub(crate) fn observations_mut(&mut self) -> impl Iterator<Item = &mut Observation> {
        self.observations.iter_mut()
    }
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawControlDocument {
    parameters: Vec<Parameter>,
    observations: Vec<Observation>,
    #[serde(default)]
    options: SolverOptions,
}

#[cfg(feature = "serde")]
impl TryFrom<RawControlDocument> for ControlDocument {
    type Error = DocumentError;

    fn try_from(raw: RawControlDocument) -> Result<Self, Self::Error> {
        Self::new(raw.parameters, raw.observations, raw.options)
    }
}
