//! Ordered, targeted edits applied to a [`ControlDocument`] in place.
//!
//! Each [`DocumentEdit`] is a function of the document and its own
//! parameters. An [`EditPlan`] fixes the order in which edits run; the only
//! ordering the harness depends on (weights are zeroed before forecast
//! weights are assigned) is checked by [`EditPlan::validate`].

use std::collections::BTreeMap;

use log::debug;
use thiserror::Error;

use crate::document::{
    ControlDocument, DocumentError, OPT_RISK, OPT_STD_WEIGHTS, OptionValue, Parameter, Transform,
    check_weight,
};

/// A single mutation of a [`ControlDocument`].
///
/// Applying the same edit twice leaves the document as applying it once.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentEdit {
    /// Move every parameter currently in `from` to `to`.
    PromoteTransform {
        /// Transform to match.
        from: Transform,
        /// Transform to assign.
        to: Transform,
    },
    /// Set the transform of every parameter in `group`.
    SetGroupTransform {
        /// Parameter group to match (case-insensitive).
        group: String,
        /// Transform to assign.
        transform: Transform,
    },
    /// Set every observation weight to zero.
    ZeroObservationWeights,
    /// Set the weights of the named observations.
    AssignWeights(BTreeMap<String, f64>),
    /// Set the chance-constraint risk level, which must lie in `[0, 1]`.
    SetRiskLevel(f64),
    /// Set a boolean solver flag.
    SetFlag {
        /// Option key.
        key: String,
        /// Flag value.
        value: bool,
    },
    /// Set an arbitrary solver option.
    SetOption {
        /// Option key.
        key: String,
        /// Option value.
        value: OptionValue,
    },
    /// Remove a solver option.
    ClearOption {
        /// Option key.
        key: String,
    },
}

/// Errors raised while validating or applying edits.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EditError {
    /// A weight assignment named an observation absent from the document.
    #[error("cannot assign weight to unknown observation {name:?}")]
    UnknownObservation {
        /// Missing observation name.
        name: String,
    },
    /// The requested risk level was outside `[0, 1]`.
    #[error("risk level {risk} must lie within [0, 1]")]
    RiskOutOfRange {
        /// Rejected risk level.
        risk: f64,
    },
    /// Weights were zeroed after a selective assignment, discarding it.
    #[error("edit {zero_at} zeroes observation weights after they were assigned by edit {assign_at}")]
    ZeroAfterAssign {
        /// Position of the earlier weight assignment.
        assign_at: usize,
        /// Position of the offending zeroing edit.
        zero_at: usize,
    },
    /// The document rejected a value.
    #[error(transparent)]
    Document(#[from] DocumentError),
}

impl DocumentEdit {
    /// Toggle the standardised-weights interpretation.
    #[must_use]
    pub fn std_weights(enabled: bool) -> Self {
        Self::SetFlag {
            key: OPT_STD_WEIGHTS.to_owned(),
            value: enabled,
        }
    }

    /// Apply the edit, returning how many items it touched.
    ///
    /// # Errors
    /// Returns [`EditError`] when the edit is invalid for this document. A
    /// failed edit leaves the document unchanged.
    pub fn apply(&self, document: &mut ControlDocument) -> Result<usize, EditError> {
        match self {
            Self::PromoteTransform { from, to } => Ok(retransform(document, *to, |parameter| {
                parameter.transform == *from
            })),
            Self::SetGroupTransform { group, transform } => {
                let key = group.to_lowercase();
                let touched = retransform(document, *transform, |parameter| parameter.group == key);
                if touched == 0 {
                    debug!("no parameters in group {key:?}; transform edit had no effect");
                }
                Ok(touched)
            }
            Self::ZeroObservationWeights => {
                let mut touched = 0_usize;
                for observation in document.observations_mut() {
                    observation.set_weight(0.0)?;
                    touched += 1;
                }
                Ok(touched)
            }
            Self::AssignWeights(weights) => assign_weights(document, weights),
            Self::SetRiskLevel(risk) => {
                if !(0.0..=1.0).contains(risk) {
                    return Err(EditError::RiskOutOfRange { risk: *risk });
                }
                document.options_mut().set(OPT_RISK, *risk);
                Ok(1)
            }
            Self::SetFlag { key, value } => {
                document.options_mut().set(key, *value);
                Ok(1)
            }
            Self::SetOption { key, value } => {
                document.options_mut().set(key, value.clone());
                Ok(1)
            }
            Self::ClearOption { key } => Ok(usize::from(document.options_mut().remove(key).is_some())),
        }
    }
}

fn retransform(
    document: &mut ControlDocument,
    transform: Transform,
    matches: impl Fn(&Parameter) -> bool,
) -> usize {
    let mut touched = 0_usize;
    for parameter in document.parameters_mut() {
        if matches(&*parameter) {
            parameter.transform = transform;
            touched += 1;
        }
    }
    touched
}

fn assign_weights(
    document: &mut ControlDocument,
    weights: &BTreeMap<String, f64>,
) -> Result<usize, EditError> {
    let lowered: BTreeMap<String, f64> = weights
        .iter()
        .map(|(name, weight)| (name.to_lowercase(), *weight))
        .collect();
    // Validate everything first so a rejected assignment changes nothing.
    for (name, weight) in &lowered {
        if document.observation(name).is_none() {
            return Err(EditError::UnknownObservation { name: name.clone() });
        }
        check_weight(name, *weight)?;
    }
    let mut touched = 0_usize;
    for observation in document.observations_mut() {
        if let Some(weight) = lowered.get(&observation.name) {
            observation.set_weight(*weight)?;
            touched += 1;
        }
    }
    Ok(touched)
}

/// An ordered sequence of [`DocumentEdit`]s.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
/// use chance_verify_core::{
///     ControlDocument, DocumentEdit, EditPlan, Observation, SolverOptions,
/// };
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut document = ControlDocument::new(
///     Vec::new(),
///     vec![Observation::new("l_fore", "l_h", 3.0)?, Observation::new("h1", "head", 1.0)?],
///     SolverOptions::new(),
/// )?;
/// let plan = EditPlan::new()
///     .then(DocumentEdit::ZeroObservationWeights)
///     .then(DocumentEdit::AssignWeights(BTreeMap::from([("l_fore".to_owned(), 0.2)])));
/// plan.apply(&mut document)?;
/// assert_eq!(document.observation("h1").map(Observation::weight), Some(0.0));
/// assert_eq!(document.observation("l_fore").map(Observation::weight), Some(0.2));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EditPlan {
    edits: Vec<DocumentEdit>,
}

impl EditPlan {
    /// Create an empty plan.
    #[must_use]
    pub const fn new() -> Self {
        Self { edits: Vec::new() }
    }

    /// Append an edit, returning the extended plan.
    #[must_use]
    pub fn then(mut self, edit: DocumentEdit) -> Self {
        self.edits.push(edit);
        self
    }

    /// Edits in application order.
    #[must_use]
    pub fn edits(&self) -> &[DocumentEdit] {
        &self.edits
    }

    /// Check ordering constraints without touching a document.
    ///
    /// # Errors
    /// Returns [`EditError::ZeroAfterAssign`] when weights are zeroed after a
    /// selective assignment.
    pub fn validate(&self) -> Result<(), EditError> {
        let mut assigned_at = None;
        for (position, edit) in self.edits.iter().enumerate() {
            match edit {
                DocumentEdit::AssignWeights(_) => {
                    assigned_at.get_or_insert(position);
                }
                DocumentEdit::ZeroObservationWeights => {
                    if let Some(assign_at) = assigned_at {
                        return Err(EditError::ZeroAfterAssign {
                            assign_at,
                            zero_at: position,
                        });
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Validate and apply every edit in order.
    ///
    /// # Errors
    /// Returns the first [`EditError`]; edits before it remain applied.
    pub fn apply(&self, document: &mut ControlDocument) -> Result<(), EditError> {
        self.validate()?;
        for edit in &self.edits {
            let touched = edit.apply(document)?;
            debug!("applied {edit:?} to {touched} item(s)");
        }
        Ok(())
    }
}

/// Selects forecast observations by group prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ForecastSelector {
    /// Lower-cased group prefixes identifying forecast observations.
    pub group_prefixes: Vec<String>,
}

impl Default for ForecastSelector {
    fn default() -> Self {
        Self {
            group_prefixes: vec!["l_".to_owned(), "less_".to_owned()],
        }
    }
}

impl ForecastSelector {
    /// Names of weighted observations whose group starts with any prefix, in
    /// document order.
    #[must_use]
    pub fn select(&self, document: &ControlDocument) -> Vec<String> {
        let prefixes: Vec<String> = self
            .group_prefixes
            .iter()
            .map(|prefix| prefix.to_lowercase())
            .collect();
        document
            .observations()
            .iter()
            .filter(|observation| observation.is_weighted())
            .filter(|observation| {
                prefixes
                    .iter()
                    .any(|prefix| observation.group.starts_with(prefix.as_str()))
            })
            .map(|observation| observation.name.clone())
            .collect()
    }
}
