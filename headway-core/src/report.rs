//! Convert solver values back into domain terms.

use thiserror::Error;

use crate::builder::{AssignmentKey, BuiltModel};
use crate::dataset::Dataset;
use crate::solver::{SolveResult, SolveStatus};

/// Trips run on one route, in one shift, by one bus type.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TripAssignment {
    /// Route identifier.
    pub route_id: String,
    /// Shift identifier.
    pub shift_id: String,
    /// Bus type identifier.
    pub bus_type_id: String,
    /// Assigned trips.
    pub trips: f64,
}

/// How much of one bus type's fleet the assignment uses.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FleetUtilisation {
    /// Bus type identifier.
    pub bus_type_id: String,
    /// Trips assigned across all routes and shifts.
    pub trips_used: f64,
    /// Available fleet.
    pub fleet_size: u32,
    /// `trips_used / fleet_size`, zero for an empty fleet.
    pub utilisation: f64,
}

/// Demand against delivered capacity for one route in one shift.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ShiftCoverage {
    /// Shift identifier.
    pub shift_id: String,
    /// Passengers expected.
    pub required: f64,
    /// Passengers the assigned trips can carry.
    pub delivered: f64,
    /// Trips across all bus types.
    pub trips: f64,
}

impl ShiftCoverage {
    /// Demand left unserved in this shift.
    #[must_use]
    pub fn shortfall(&self) -> f64 {
        (self.required - self.delivered).max(0.0)
    }
}

/// Demand against delivered capacity for one route over the day.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RouteCoverage {
    /// Route identifier.
    pub route_id: String,
    /// Daily passengers expected.
    pub required: f64,
    /// Daily passengers the assigned trips can carry.
    pub delivered: f64,
    /// `delivered / required`, one when nothing is required.
    pub coverage: f64,
    /// Demand the buffer left unserved, summed over shifts.
    pub buffer_consumed: f64,
    /// Per-shift breakdown.
    pub shifts: Vec<ShiftCoverage>,
}

/// Domain view of one feasible solution.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AssignmentReport {
    /// Solver status the report was built from.
    pub status: SolveStatus,
    /// Objective value reported by the solver.
    pub objective: Option<f64>,
    /// Buffer the model was built with.
    pub buffer: f64,
    /// Trips across the whole network.
    pub total_trips: f64,
    /// Trips per route, shift and bus type, in model order.
    pub assignments: Vec<TripAssignment>,
    /// Utilisation per bus type.
    pub fleet: Vec<FleetUtilisation>,
    /// Coverage per route.
    pub routes: Vec<RouteCoverage>,
}

/// Reasons a solution cannot be turned into a report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReportError {
    /// The result carries no usable assignment.
    #[error("cannot report on a {0} solve")]
    NotSolved(SolveStatus),
    /// The result does not match the model it claims to solve.
    #[error("expected {expected} solved values, found {found}")]
    ValueCountMismatch {
        /// Variables in the model.
        expected: usize,
        /// Values in the result.
        found: usize,
    },
}

/// Build an [`AssignmentReport`] for `result`, a solution of `built`.
pub fn extract(
    dataset: &Dataset,
    built: &BuiltModel,
    result: &SolveResult,
) -> Result<AssignmentReport, ReportError> {
    if !result.status.is_feasible() {
        return Err(ReportError::NotSolved(result.status));
    }
    if result.values.len() != built.index.len() {
        return Err(ReportError::ValueCountMismatch {
            expected: built.index.len(),
            found: result.values.len(),
        });
    }

    let trips = |route: usize, shift: usize, bus_type: usize| {
        built
            .index
            .value(
                &result.values,
                AssignmentKey {
                    route,
                    shift,
                    bus_type,
                },
            )
            .unwrap_or(0.0)
    };

    let assignments = built
        .index
        .keys()
        .filter_map(|key| {
            Some(TripAssignment {
                route_id: dataset.routes().get(key.route)?.id.clone(),
                shift_id: dataset.shifts().get(key.shift)?.id.clone(),
                bus_type_id: dataset.bus_types().get(key.bus_type)?.id.clone(),
                trips: trips(key.route, key.shift, key.bus_type),
            })
        })
        .collect();

    let fleet = dataset
        .bus_types()
        .iter()
        .enumerate()
        .map(|(k, bus)| {
            let trips_used: f64 = (0..dataset.routes().len())
                .flat_map(|r| (0..dataset.shifts().len()).map(move |s| (r, s)))
                .map(|(r, s)| trips(r, s, k))
                .sum();
            let utilisation = if bus.fleet_size == 0 {
                0.0
            } else {
                trips_used / f64::from(bus.fleet_size)
            };
            FleetUtilisation {
                bus_type_id: bus.id.clone(),
                trips_used,
                fleet_size: bus.fleet_size,
                utilisation,
            }
        })
        .collect();

    let routes = dataset
        .routes()
        .iter()
        .enumerate()
        .map(|(r, route)| {
            let shifts: Vec<ShiftCoverage> = dataset
                .shifts()
                .iter()
                .enumerate()
                .map(|(s, shift)| {
                    let (delivered, shift_trips) = dataset.bus_types().iter().enumerate().fold(
                        (0.0, 0.0),
                        |(delivered, count), (k, bus)| {
                            let value = trips(r, s, k);
                            (
                                delivered + value * dataset.passengers_per_trip(route, bus),
                                count + value,
                            )
                        },
                    );
                    ShiftCoverage {
                        shift_id: shift.id.clone(),
                        required: route.shift_demand(s),
                        delivered,
                        trips: shift_trips,
                    }
                })
                .collect();
            let required = route.daily_demand();
            let delivered: f64 = shifts.iter().map(|shift| shift.delivered).sum();
            let coverage = if required > 0.0 {
                delivered / required
            } else {
                1.0
            };
            RouteCoverage {
                route_id: route.id.clone(),
                required,
                delivered,
                coverage,
                buffer_consumed: shifts.iter().map(ShiftCoverage::shortfall).sum(),
                shifts,
            }
        })
        .collect();

    Ok(AssignmentReport {
        status: result.status,
        objective: result.objective,
        buffer: built.buffer,
        total_trips: result.values.iter().sum(),
        assignments,
        fleet,
        routes,
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::builder::ModelBuilder;
    use crate::dataset::{BusType, Route, Shift};
    use rstest::{fixture, rstest};

    #[fixture]
    fn dataset() -> Dataset {
        Dataset::new(
            vec![
                Route::with_shares("R1", 100.0, vec![0.5, 0.5]),
                Route::with_shift_demand("R2", vec![0.0, 0.0]),
            ],
            vec![Shift::new("peak", 195), Shift::new("late", 90)],
            vec![BusType::new("Type-I", 40, 4), BusType::new("Type-II", 90, 0)],
        )
        .expect("valid dataset")
    }

    fn solved(built: &BuiltModel, values: Vec<f64>) -> SolveResult {
        SolveResult::solved(&built.model, SolveStatus::Optimal, values, Duration::ZERO)
    }

    #[rstest]
    fn reports_trips_coverage_and_utilisation(dataset: Dataset) {
        let built = ModelBuilder::new(&dataset).build(20.0).expect("model");
        // R1: 2 Type-I trips at peak, 1 at late.
        let values = vec![2.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        let report = extract(&dataset, &built, &solved(&built, values)).expect("report");

        assert_eq!(report.total_trips, 3.0);
        assert_eq!(report.buffer, 20.0);
        assert_eq!(report.assignments.len(), 8);
        let first = report.assignments.first().expect("assignment");
        assert_eq!(
            (first.route_id.as_str(), first.shift_id.as_str(), first.bus_type_id.as_str()),
            ("R1", "peak", "Type-I")
        );
        assert_eq!(first.trips, 2.0);

        let fleet: Vec<(f64, f64)> = report
            .fleet
            .iter()
            .map(|entry| (entry.trips_used, entry.utilisation))
            .collect();
        assert_eq!(fleet, vec![(3.0, 0.75), (0.0, 0.0)]);

        let r1 = report.routes.first().expect("R1");
        assert_eq!(r1.required, 100.0);
        assert_eq!(r1.delivered, 120.0);
        assert!((r1.coverage - 1.2).abs() < 1e-12);
        // Late shift carries 40 of 50 passengers.
        assert_eq!(r1.buffer_consumed, 10.0);
        let late = r1.shifts.get(1).expect("late shift");
        assert_eq!((late.trips, late.shortfall()), (1.0, 10.0));

        let r2 = report.routes.get(1).expect("R2");
        assert_eq!(r2.coverage, 1.0);
        assert_eq!(r2.buffer_consumed, 0.0);
    }

    #[rstest]
    #[case(SolveStatus::Infeasible)]
    #[case(SolveStatus::Error)]
    fn rejects_results_without_solution(dataset: Dataset, #[case] status: SolveStatus) {
        let built = ModelBuilder::new(&dataset).build(0.0).expect("model");
        let result = SolveResult::without_solution(status, Duration::ZERO);
        assert_eq!(
            extract(&dataset, &built, &result),
            Err(ReportError::NotSolved(status))
        );
    }

    #[rstest]
    fn rejects_mismatched_value_counts(dataset: Dataset) {
        let built = ModelBuilder::new(&dataset).build(0.0).expect("model");
        let result = solved(&built, vec![1.0; 3]);
        assert_eq!(
            extract(&dataset, &built, &result),
            Err(ReportError::ValueCountMismatch {
                expected: 8,
                found: 3
            })
        );
    }
}
