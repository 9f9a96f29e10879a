//! Test-only, in-memory collaborators used by unit and behaviour tests.

use std::cell::RefCell;
use std::collections::BTreeMap;

use camino::{Utf8Path, Utf8PathBuf};

use crate::{
    ControlDocument, DocumentStore, EstimateError, Observation, Parameter, ReferenceUncertainty,
    SolverOptions, StoreError, Transform, UncertaintyEstimator,
};

/// In-memory [`DocumentStore`] that keeps every written document.
///
/// Documents written to a path become loadable from it, and
/// [`MemoryDocumentStore::writes`] exposes the write history in order.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    documents: RefCell<BTreeMap<Utf8PathBuf, ControlDocument>>,
    writes: RefCell<Vec<(Utf8PathBuf, ControlDocument)>>,
}

impl MemoryDocumentStore {
    /// Create a store holding `document` at `path`.
    #[must_use]
    pub fn with_document(path: &Utf8Path, document: ControlDocument) -> Self {
        let store = Self::default();
        store
            .documents
            .borrow_mut()
            .insert(path.to_path_buf(), document);
        store
    }

    /// Every `(path, document)` written so far.
    #[must_use]
    pub fn writes(&self) -> Vec<(Utf8PathBuf, ControlDocument)> {
        self.writes.borrow().clone()
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn load(&self, path: &Utf8Path) -> Result<ControlDocument, StoreError> {
        self.documents
            .borrow()
            .get(path)
            .cloned()
            .ok_or_else(|| StoreError::Open {
                path: path.to_path_buf(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            })
    }

    fn write(&self, document: &ControlDocument, path: &Utf8Path) -> Result<(), StoreError> {
        self.documents
            .borrow_mut()
            .insert(path.to_path_buf(), document.clone());
        self.writes
            .borrow_mut()
            .push((path.to_path_buf(), document.clone()));
        Ok(())
    }
}

/// [`UncertaintyEstimator`] returning preset standard deviations.
#[derive(Debug, Clone)]
pub struct FixedEstimator {
    reference: ReferenceUncertainty,
    calls: RefCell<usize>,
}

impl FixedEstimator {
    /// Estimator answering from `reference`.
    #[must_use]
    pub const fn new(reference: ReferenceUncertainty) -> Self {
        Self {
            reference,
            calls: RefCell::new(0),
        }
    }

    /// How many times the estimator was consulted.
    #[must_use]
    pub fn calls(&self) -> usize {
        *self.calls.borrow()
    }
}

impl UncertaintyEstimator for FixedEstimator {
    fn forecast_std(
        &self,
        document: &ControlDocument,
        _jacobian: &Utf8Path,
        forecasts: &[String],
    ) -> Result<ReferenceUncertainty, EstimateError> {
        *self.calls.borrow_mut() += 1;
        let mut selected = Vec::with_capacity(forecasts.len());
        for name in forecasts {
            if document.observation(name).is_none() {
                return Err(EstimateError::UnknownForecast { name: name.clone() });
            }
            let value = self
                .reference
                .get(name)
                .ok_or_else(|| EstimateError::MissingForecast { name: name.clone() })?;
            selected.push((name.clone(), value));
        }
        ReferenceUncertainty::from_std_devs(selected)
    }
}

/// A small dewatering-style problem with two forecasts and a pumping group.
///
/// Parameters `q1`/`q2` form the `q` decision group; `hk1` starts fixed.
/// Observations `l_forecast1` and `less_forecast2` are the weighted
/// forecasts; `head1` is an ordinary calibration observation.
///
/// # Panics
/// Never in practice; the fixture data is valid by construction.
#[must_use]
#[expect(clippy::expect_used, reason = "fixture data is valid by construction")]
pub fn sample_document() -> ControlDocument {
    let mut options = SolverOptions::new();
    options.set("opt_dec_var_groups", "q");
    ControlDocument::new(
        vec![
            Parameter::new("q1", "q", Transform::None),
            Parameter::new("q2", "q", Transform::None),
            Parameter::new("hk1", "hk", Transform::Fixed),
            Parameter::new("rch1", "rch", Transform::Log),
        ],
        vec![
            Observation::new("head1", "head", 2.0).expect("valid weight"),
            Observation::new("l_forecast1", "l_head", 1.0).expect("valid weight"),
            Observation::new("less_forecast2", "less_flux", 1.0).expect("valid weight"),
            Observation::new("l_unweighted", "l_head", 0.0).expect("valid weight"),
        ],
        options,
    )
    .expect("sample document is valid")
}
