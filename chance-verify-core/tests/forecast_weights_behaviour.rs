//! Behaviour tests for forecast weight edits and the tolerance comparison.

use std::cell::RefCell;
use std::collections::BTreeMap;

use chance_verify_core::{
    ComparisonError, ComparisonReport, ControlDocument, DocumentEdit, EditError, EditPlan,
    FORECAST_STD_TOLERANCE, Observation, Parameter, SolverOptions, Transform,
    compare_within_tolerance,
};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

#[fixture]
fn document() -> RefCell<Option<ControlDocument>> {
    RefCell::new(None)
}

#[fixture]
fn original() -> RefCell<Option<ControlDocument>> {
    RefCell::new(None)
}

#[fixture]
fn plan_result() -> RefCell<Option<Result<(), EditError>>> {
    RefCell::new(None)
}

#[fixture]
fn reference() -> RefCell<BTreeMap<String, f64>> {
    RefCell::new(BTreeMap::new())
}

#[fixture]
fn comparison() -> RefCell<Option<Result<ComparisonReport, ComparisonError>>> {
    RefCell::new(None)
}

fn forecast_weights(first: f64, second: f64) -> DocumentEdit {
    DocumentEdit::AssignWeights(BTreeMap::from([
        ("l_fore1".to_owned(), first),
        ("less_fore2".to_owned(), second),
    ]))
}

fn forecast_values(first: f64, second: f64) -> BTreeMap<String, f64> {
    BTreeMap::from([
        ("l_fore1".to_owned(), first),
        ("less_fore2".to_owned(), second),
    ])
}

#[given("a control document with a calibration observation and two forecasts")]
#[expect(clippy::expect_used, reason = "test fixture data is valid")]
fn given_document(
    #[from(document)] document: &RefCell<Option<ControlDocument>>,
    #[from(original)] original: &RefCell<Option<ControlDocument>>,
) {
    let built = ControlDocument::new(
        vec![Parameter::new("q1", "q", Transform::None)],
        vec![
            Observation::new("h1", "head", 5.0).expect("valid weight"),
            Observation::new("l_fore1", "l_head", 1.0).expect("valid weight"),
            Observation::new("less_fore2", "less_flux", 1.0).expect("valid weight"),
        ],
        SolverOptions::new(),
    )
    .expect("valid document");
    *original.borrow_mut() = Some(built.clone());
    *document.borrow_mut() = Some(built);
}

#[when("weights are zeroed and the forecasts are weighted 0.45 and 1.2")]
fn when_zero_then_assign(
    #[from(document)] document: &RefCell<Option<ControlDocument>>,
    #[from(plan_result)] plan_result: &RefCell<Option<Result<(), EditError>>>,
) {
    let plan = EditPlan::new()
        .then(DocumentEdit::ZeroObservationWeights)
        .then(forecast_weights(0.45, 1.2));
    let mut guard = document.borrow_mut();
    let Some(doc) = guard.as_mut() else {
        panic!("document not initialised");
    };
    *plan_result.borrow_mut() = Some(plan.apply(doc));
}

#[when("the forecasts are weighted before all weights are zeroed")]
fn when_assign_then_zero(
    #[from(document)] document: &RefCell<Option<ControlDocument>>,
    #[from(plan_result)] plan_result: &RefCell<Option<Result<(), EditError>>>,
) {
    let plan = EditPlan::new()
        .then(forecast_weights(0.45, 1.2))
        .then(DocumentEdit::ZeroObservationWeights);
    let mut guard = document.borrow_mut();
    let Some(doc) = guard.as_mut() else {
        panic!("document not initialised");
    };
    *plan_result.borrow_mut() = Some(plan.apply(doc));
}

#[then("only the forecasts carry weight")]
fn then_only_forecasts_weighted(
    #[from(document)] document: &RefCell<Option<ControlDocument>>,
    #[from(plan_result)] plan_result: &RefCell<Option<Result<(), EditError>>>,
) {
    assert!(matches!(plan_result.borrow().as_ref(), Some(Ok(()))));
    let guard = document.borrow();
    let Some(doc) = guard.as_ref() else {
        panic!("document not initialised");
    };
    assert_eq!(
        doc.weighted_observation_names().collect::<Vec<_>>(),
        ["l_fore1", "less_fore2"]
    );
    assert_eq!(doc.observation("h1").map(Observation::weight), Some(0.0));
    assert_eq!(
        doc.observation("less_fore2").map(Observation::weight),
        Some(1.2)
    );
}

#[then("the edit plan is rejected for its ordering")]
fn then_plan_rejected(#[from(plan_result)] plan_result: &RefCell<Option<Result<(), EditError>>>) {
    match plan_result.borrow().as_ref() {
        Some(Err(EditError::ZeroAfterAssign { assign_at, zero_at })) => {
            assert_eq!((*assign_at, *zero_at), (0, 1));
        }
        other => panic!("expected ordering rejection, got {other:?}"),
    }
}

#[then("the control document is unchanged")]
fn then_document_unchanged(
    #[from(document)] document: &RefCell<Option<ControlDocument>>,
    #[from(original)] original: &RefCell<Option<ControlDocument>>,
) {
    assert_eq!(*document.borrow(), *original.borrow());
}

#[given("reference deviations 0.45 and 1.2")]
fn given_reference(#[from(reference)] reference: &RefCell<BTreeMap<String, f64>>) {
    *reference.borrow_mut() = forecast_values(0.45, 1.2);
}

#[when("the solver reports 0.45005 and 1.20009")]
fn when_close_report(
    #[from(reference)] reference: &RefCell<BTreeMap<String, f64>>,
    #[from(comparison)] comparison: &RefCell<
        Option<Result<ComparisonReport, ComparisonError>>,
    >,
) {
    compare_into(reference, comparison, forecast_values(0.450_05, 1.200_09));
}

#[when("the solver reports 0.45005 and 1.21")]
fn when_drifted_report(
    #[from(reference)] reference: &RefCell<BTreeMap<String, f64>>,
    #[from(comparison)] comparison: &RefCell<
        Option<Result<ComparisonReport, ComparisonError>>,
    >,
) {
    compare_into(reference, comparison, forecast_values(0.450_05, 1.21));
}

fn compare_into(
    reference: &RefCell<BTreeMap<String, f64>>,
    comparison: &RefCell<Option<Result<ComparisonReport, ComparisonError>>>,
    scraped: BTreeMap<String, f64>,
) {
    let expected = reference.borrow();
    let keys: Vec<String> = expected.keys().cloned().collect();
    *comparison.borrow_mut() = Some(compare_within_tolerance(
        &expected,
        &scraped,
        &keys,
        FORECAST_STD_TOLERANCE,
    ));
}

#[then("the comparison passes")]
fn then_comparison_passes(
    #[from(comparison)] comparison: &RefCell<
        Option<Result<ComparisonReport, ComparisonError>>,
    >,
) {
    match comparison.borrow().as_ref() {
        Some(Ok(report)) => {
            assert!(report.passed());
            assert_eq!(report.pairs.len(), 2);
        }
        other => panic!("expected a passing comparison, got {other:?}"),
    }
}

#[then("the comparison fails for \"{name}\"")]
fn then_comparison_fails(
    name: String,
    #[from(comparison)] comparison: &RefCell<
        Option<Result<ComparisonReport, ComparisonError>>,
    >,
) {
    match comparison.borrow().as_ref() {
        Some(Err(ComparisonError::ToleranceExceeded { failures, report })) => {
            assert_eq!(*failures, 1);
            let failed: Vec<&str> = report.failures().map(|pair| pair.name.as_str()).collect();
            assert_eq!(failed, [name.as_str()]);
        }
        other => panic!("expected a tolerance failure, got {other:?}"),
    }
}

#[scenario(path = "tests/features/forecast_weights.feature", index = 0)]
fn forecast_weights_replace_others(
    document: RefCell<Option<ControlDocument>>,
    original: RefCell<Option<ControlDocument>>,
    plan_result: RefCell<Option<Result<(), EditError>>>,
) {
    let _ = (document, original, plan_result);
}

#[scenario(path = "tests/features/forecast_weights.feature", index = 1)]
fn zeroing_after_assignment_rejected(
    document: RefCell<Option<ControlDocument>>,
    original: RefCell<Option<ControlDocument>>,
    plan_result: RefCell<Option<Result<(), EditError>>>,
) {
    let _ = (document, original, plan_result);
}

#[scenario(path = "tests/features/forecast_weights.feature", index = 2)]
fn close_deviations_pass(
    reference: RefCell<BTreeMap<String, f64>>,
    comparison: RefCell<Option<Result<ComparisonReport, ComparisonError>>>,
) {
    let _ = (reference, comparison);
}

#[scenario(path = "tests/features/forecast_weights.feature", index = 3)]
fn drifted_deviation_fails(
    reference: RefCell<BTreeMap<String, f64>>,
    comparison: RefCell<Option<Result<ComparisonReport, ComparisonError>>>,
) {
    let _ = (reference, comparison);
}
