//! Property-based tests for the `microlp` adapters.
//!
//! # Invariants tested
//!
//! - **Constraint satisfaction:** feasible solutions satisfy every row and
//!   variable bound of the model that produced them.
//! - **Fleet bound:** trips per bus type never exceed its fleet size.
//! - **Monotonic relaxation:** a model feasible at `b` stays feasible at any
//!   larger buffer.
//! - **Idempotence:** solving the same model twice yields the same status and
//!   objective.
//! - **Minimality:** the accepted buffer is feasible and the buffer one
//!   tolerance below it is not.

use headway_core::{
    BusType, Dataset, FeasibilityRepair, ModelBuilder, Route, SearchConfig, SearchOutcome, Shift,
    SolveStatus, SolverAdapter, SolverBackend, extract,
};
use headway_solver_lp::adapter_for;
use proptest::prelude::*;

const FEASIBILITY_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone)]
struct Network {
    demands: Vec<f64>,
    capacities: (u32, u32),
    fleets: (u32, u32),
}

impl Network {
    fn dataset(&self) -> Dataset {
        let routes = self
            .demands
            .iter()
            .enumerate()
            .map(|(i, demand)| Route::with_shares(format!("R{i}"), *demand, vec![0.6, 0.4]))
            .collect();
        Dataset::new(
            routes,
            vec![Shift::new("peak", 195), Shift::new("off-peak", 360)],
            vec![
                BusType::new("Type-I", self.capacities.0, self.fleets.0),
                BusType::new("Type-II", self.capacities.1, self.fleets.1),
            ],
        )
        .unwrap_or_else(|err| panic!("generated dataset must be valid: {err}"))
    }
}

fn network_strategy() -> impl Strategy<Value = Network> {
    (
        prop::collection::vec(10.0_f64..2_000.0, 1..=3),
        (20_u32..=80, 60_u32..=120),
        (4_u32..=20, 2_u32..=8),
    )
        .prop_map(|(demands, capacities, fleets)| Network {
            demands,
            capacities,
            fleets,
        })
}

fn backend_strategy() -> impl Strategy<Value = SolverBackend> {
    prop_oneof![Just(SolverBackend::Lp), Just(SolverBackend::Integer)]
}

fn is_feasible(solver: &dyn SolverAdapter, dataset: &Dataset, buffer: f64) -> bool {
    let built = ModelBuilder::new(dataset)
        .build(buffer)
        .unwrap_or_else(|err| panic!("model: {err}"));
    let result = solver.solve(&built.model);
    assert_ne!(result.status, SolveStatus::Error, "{:?}", result.message);
    result.status.is_feasible()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn solutions_satisfy_every_constraint(
        network in network_strategy(),
        backend in backend_strategy(),
        buffer in 0.0_f64..2_000.0,
    ) {
        let dataset = network.dataset();
        let built = ModelBuilder::new(&dataset).build(buffer).expect("model");
        let result = adapter_for(backend).solve(&built.model);
        prop_assume!(result.status.is_feasible());
        let violations = built.model.violations(&result.values, FEASIBILITY_TOLERANCE);
        prop_assert!(violations.is_empty(), "violated: {violations:?}");

        let report = extract(&dataset, &built, &result).expect("report");
        for entry in &report.fleet {
            prop_assert!(entry.trips_used <= f64::from(entry.fleet_size) + FEASIBILITY_TOLERANCE);
        }
    }

    #[test]
    fn feasibility_is_monotone_in_the_buffer(
        network in network_strategy(),
        backend in backend_strategy(),
        low in 0.0_f64..1_500.0,
        extra in 0.0_f64..1_500.0,
    ) {
        let dataset = network.dataset();
        let solver = adapter_for(backend);
        if is_feasible(solver.as_ref(), &dataset, low) {
            prop_assert!(is_feasible(solver.as_ref(), &dataset, low + extra));
        }
    }

    #[test]
    fn solving_is_idempotent(
        network in network_strategy(),
        backend in backend_strategy(),
        buffer in 0.0_f64..2_000.0,
    ) {
        let dataset = network.dataset();
        let built = ModelBuilder::new(&dataset).build(buffer).expect("model");
        let solver = adapter_for(backend);
        let first = solver.solve(&built.model);
        let second = solver.solve(&built.model);
        prop_assert_eq!(first.status, second.status);
        match (first.objective, second.objective) {
            (Some(lhs), Some(rhs)) => prop_assert!((lhs - rhs).abs() <= FEASIBILITY_TOLERANCE),
            (lhs, rhs) => prop_assert_eq!(lhs, rhs),
        }
    }

    #[test]
    fn accepted_buffer_is_minimal(
        network in network_strategy(),
        backend in backend_strategy(),
    ) {
        let dataset = network.dataset();
        let solver = adapter_for(backend);
        let config = SearchConfig { tolerance: 1.0, ..SearchConfig::default() };
        let outcome = FeasibilityRepair::new(ModelBuilder::new(&dataset), solver.as_ref(), &config)
            .run()
            .expect("search");
        let SearchOutcome::Resolved(resolution) = outcome else {
            // Coverage floors can exceed the fleet even with all demand relaxed.
            return Ok(());
        };
        prop_assert!(is_feasible(solver.as_ref(), &dataset, resolution.buffer));
        let below = resolution.buffer - config.tolerance;
        if below >= 0.0 {
            prop_assert!(!is_feasible(solver.as_ref(), &dataset, below));
        }
    }
}
