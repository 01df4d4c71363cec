//! Behavioural coverage for dataset validation.

use std::cell::RefCell;

use headway_core::{BusType, Dataset, Route, Shift, ValidationError};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

#[fixture]
fn routes() -> RefCell<Vec<Route>> {
    RefCell::new(Vec::new())
}

#[fixture]
fn validation() -> RefCell<Option<Result<Dataset, ValidationError>>> {
    RefCell::new(None)
}

#[given("a route whose shift shares sum to {total}")]
fn route_with_shares(total: f64, routes: &RefCell<Vec<Route>>) {
    let peak = 0.6;
    routes
        .borrow_mut()
        .push(Route::with_shares("R1", 4126.0, vec![peak, total - peak]));
}

#[given("two routes sharing the identifier {id}")]
fn duplicate_routes(id: String, routes: &RefCell<Vec<Route>>) {
    let mut routes = routes.borrow_mut();
    routes.push(Route::with_shares(id.clone(), 1000.0, vec![0.5, 0.5]));
    routes.push(Route::with_shift_demand(id, vec![10.0, 20.0]));
}

#[when("I validate the dataset")]
fn validate(
    routes: &RefCell<Vec<Route>>,
    validation: &RefCell<Option<Result<Dataset, ValidationError>>>,
) {
    let result = Dataset::new(
        routes.borrow().clone(),
        vec![Shift::new("peak", 195), Shift::new("off-peak", 360)],
        vec![BusType::new("Type-I", 60, 600), BusType::new("Type-II", 90, 90)],
    );
    *validation.borrow_mut() = Some(result);
}

#[then("validation fails because the shares do not sum to one")]
fn fails_on_shares(validation: &RefCell<Option<Result<Dataset, ValidationError>>>) {
    let binding = validation.borrow();
    match binding.as_ref() {
        Some(Err(ValidationError::SharesDoNotSumToOne { route, sum })) => {
            assert_eq!(route, "R1");
            assert!((sum - 0.9).abs() < 1e-9);
        }
        other => panic!("expected a share error, got {other:?}"),
    }
}

#[then("validation fails because of a duplicate identifier")]
fn fails_on_duplicate(validation: &RefCell<Option<Result<Dataset, ValidationError>>>) {
    let binding = validation.borrow();
    assert!(
        matches!(
            binding.as_ref(),
            Some(Err(ValidationError::DuplicateId { kind: "route", .. }))
        ),
        "unexpected validation result {binding:?}"
    );
}

#[then("validation succeeds")]
fn succeeds(validation: &RefCell<Option<Result<Dataset, ValidationError>>>) {
    let binding = validation.borrow();
    assert!(
        matches!(binding.as_ref(), Some(Ok(_))),
        "unexpected validation result {binding:?}"
    );
}

#[scenario(path = "tests/features/dataset_validation.feature", index = 0)]
fn shares_must_sum_to_one(
    routes: RefCell<Vec<Route>>,
    validation: RefCell<Option<Result<Dataset, ValidationError>>>,
) {
    let _ = (routes, validation);
}

#[scenario(path = "tests/features/dataset_validation.feature", index = 1)]
fn identifiers_must_be_unique(
    routes: RefCell<Vec<Route>>,
    validation: RefCell<Option<Result<Dataset, ValidationError>>>,
) {
    let _ = (routes, validation);
}

#[scenario(path = "tests/features/dataset_validation.feature", index = 2)]
fn well_formed_datasets_are_accepted(
    routes: RefCell<Vec<Route>>,
    validation: RefCell<Option<Result<Dataset, ValidationError>>>,
) {
    let _ = (routes, validation);
}
