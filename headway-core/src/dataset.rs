//! Validated routes, shifts and bus types.
//!
//! A [`Dataset`] can only be obtained through validation, either with
//! [`Dataset::new`] or by deserialising JSON, so downstream components never
//! see negative demand, zero capacities or shift shares that do not add up.

use std::collections::HashSet;

use thiserror::Error;

/// Allowed deviation of a route's shift shares from exactly one.
pub const SHARE_TOLERANCE: f64 = 1e-6;

/// Load factor applied to routes that do not declare their own trip factor.
pub const DEFAULT_LOAD_FACTOR: f64 = 1.0;

/// A class of bus available to the operator.
///
/// # Examples
///
/// ```
/// use headway_core::BusType;
///
/// let articulated = BusType::new("Type-II", 90, 12).with_cost_per_trip(1.5);
/// assert_eq!(articulated.capacity, 90);
/// assert_eq!(articulated.fleet_size, 12);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BusType {
    /// Identifier such as `Type-I`.
    pub id: String,
    /// Seated plus standing passengers per vehicle.
    pub capacity: u32,
    /// Vehicles of this type available across the day.
    pub fleet_size: u32,
    /// Objective weight of one trip operated with this type.
    #[cfg_attr(feature = "serde", serde(default = "default_cost_per_trip"))]
    pub cost_per_trip: f64,
}

impl BusType {
    /// Create a bus type with unit trip cost.
    pub fn new(id: impl Into<String>, capacity: u32, fleet_size: u32) -> Self {
        Self {
            id: id.into(),
            capacity,
            fleet_size,
            cost_per_trip: default_cost_per_trip(),
        }
    }

    /// Override the objective weight of one trip.
    #[must_use]
    pub const fn with_cost_per_trip(mut self, cost_per_trip: f64) -> Self {
        self.cost_per_trip = cost_per_trip;
        self
    }
}

const fn default_cost_per_trip() -> f64 {
    1.0
}

/// An operating window of the service day.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Shift {
    /// Identifier such as `morning-peak`.
    pub id: String,
    /// Length of the window in minutes. Only used for reporting.
    #[cfg_attr(feature = "serde", serde(default))]
    pub duration_minutes: u32,
    /// Fewest trips a route operating in this shift must receive.
    ///
    /// Values below one are treated as one.
    #[cfg_attr(feature = "serde", serde(default = "default_min_trips"))]
    pub min_trips: u32,
}

impl Shift {
    /// Create a shift that requires a single trip on every operating route.
    pub fn new(id: impl Into<String>, duration_minutes: u32) -> Self {
        Self {
            id: id.into(),
            duration_minutes,
            min_trips: default_min_trips(),
        }
    }

    /// Raise the minimum number of trips per operating route.
    #[must_use]
    pub const fn with_min_trips(mut self, min_trips: u32) -> Self {
        self.min_trips = min_trips;
        self
    }

    /// Coverage floor actually enforced by the model.
    #[must_use]
    pub fn coverage_floor(&self) -> u32 {
        self.min_trips.max(1)
    }
}

const fn default_min_trips() -> u32 {
    1
}

/// How a route's daily demand is spread over the shifts.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ShiftDemand {
    /// Daily demand split by fractions that sum to one.
    Shares {
        /// Passengers per day.
        daily: f64,
        /// One fraction per shift, in shift order.
        shares: Vec<f64>,
    },
    /// Passengers per shift, in shift order.
    Explicit(Vec<f64>),
}

/// A bus route and its passenger demand.
///
/// # Examples
///
/// ```
/// use headway_core::Route;
///
/// let route = Route::with_shares("R1", 1000.0, vec![0.4, 0.6]);
/// assert_eq!(route.daily_demand(), 1000.0);
/// assert_eq!(route.shift_demand(1), 600.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Route {
    /// Route identifier.
    pub id: String,
    /// Demand per shift.
    pub demand: ShiftDemand,
    /// Load factor for this route; the dataset default applies when absent.
    #[cfg_attr(feature = "serde", serde(default))]
    pub trip_factor: Option<f64>,
    /// Share of each fleet this route may draw on, in `[0, 1]`.
    #[cfg_attr(feature = "serde", serde(default))]
    pub trip_share: Option<f64>,
    /// Round trips one bus can complete on this route in each shift.
    #[cfg_attr(feature = "serde", serde(default))]
    pub trips_per_shift: Option<Vec<f64>>,
}

impl Route {
    /// Create a route whose daily demand is split by shift shares.
    pub fn with_shares(id: impl Into<String>, daily: f64, shares: Vec<f64>) -> Self {
        Self {
            id: id.into(),
            demand: ShiftDemand::Shares { daily, shares },
            trip_factor: None,
            trip_share: None,
            trips_per_shift: None,
        }
    }

    /// Create a route with an explicit passenger count per shift.
    pub fn with_shift_demand(id: impl Into<String>, per_shift: Vec<f64>) -> Self {
        Self {
            id: id.into(),
            demand: ShiftDemand::Explicit(per_shift),
            trip_factor: None,
            trip_share: None,
            trips_per_shift: None,
        }
    }

    /// Set the route's own load factor.
    #[must_use]
    pub const fn with_trip_factor(mut self, trip_factor: f64) -> Self {
        self.trip_factor = Some(trip_factor);
        self
    }

    /// Set the share of each fleet available to this route.
    #[must_use]
    pub const fn with_trip_share(mut self, share: f64) -> Self {
        self.trip_share = Some(share);
        self
    }

    /// Set the round trips one bus completes per shift on this route.
    #[must_use]
    pub fn with_trips_per_shift(mut self, trips: Vec<f64>) -> Self {
        self.trips_per_shift = Some(trips);
        self
    }

    /// Most trips a fleet of `fleet_size` buses can run on this route in
    /// `shift`, or `None` when the route carries no share or trip rate.
    #[must_use]
    pub fn trip_cap(&self, shift: usize, fleet_size: u32) -> Option<f64> {
        let share = self.trip_share?;
        let trips = self.trips_per_shift.as_ref()?.get(shift).copied()?;
        Some((f64::from(fleet_size) * share * trips).ceil())
    }

    /// Passengers per day across all shifts.
    #[must_use]
    pub fn daily_demand(&self) -> f64 {
        match &self.demand {
            ShiftDemand::Shares { daily, .. } => *daily,
            ShiftDemand::Explicit(per_shift) => per_shift.iter().sum(),
        }
    }

    /// Passengers to carry in `shift`; zero for an unknown shift index.
    #[must_use]
    pub fn shift_demand(&self, shift: usize) -> f64 {
        match &self.demand {
            ShiftDemand::Shares { daily, shares } => {
                shares.get(shift).map_or(0.0, |share| daily * share)
            }
            ShiftDemand::Explicit(per_shift) => per_shift.get(shift).copied().unwrap_or(0.0),
        }
    }

    fn validate(&self, shift_count: usize) -> Result<(), ValidationError> {
        let per_shift = match &self.demand {
            ShiftDemand::Shares { daily, shares } => {
                if !daily.is_finite() || *daily < 0.0 {
                    return Err(ValidationError::InvalidDemand {
                        route: self.id.clone(),
                        value: *daily,
                    });
                }
                shares
            }
            ShiftDemand::Explicit(per_shift) => per_shift,
        };
        if per_shift.len() != shift_count {
            return Err(ValidationError::ShiftCountMismatch {
                route: self.id.clone(),
                expected: shift_count,
                found: per_shift.len(),
            });
        }
        if let Some(value) = per_shift
            .iter()
            .copied()
            .find(|value| !value.is_finite() || *value < 0.0)
        {
            return Err(ValidationError::InvalidDemand {
                route: self.id.clone(),
                value,
            });
        }
        if let ShiftDemand::Shares { shares, .. } = &self.demand {
            let sum: f64 = shares.iter().sum();
            if (sum - 1.0).abs() > SHARE_TOLERANCE {
                return Err(ValidationError::SharesDoNotSumToOne {
                    route: self.id.clone(),
                    sum,
                });
            }
        }
        if let Some(factor) = self.trip_factor
            && (!factor.is_finite() || factor <= 0.0)
        {
            return Err(ValidationError::InvalidTripFactor {
                route: self.id.clone(),
                value: factor,
            });
        }
        if let Some(share) = self.trip_share
            && !(0.0..=1.0).contains(&share)
        {
            return Err(ValidationError::InvalidTripShare {
                route: self.id.clone(),
                value: share,
            });
        }
        if let Some(trips) = &self.trips_per_shift {
            if trips.len() != shift_count {
                return Err(ValidationError::ShiftCountMismatch {
                    route: self.id.clone(),
                    expected: shift_count,
                    found: trips.len(),
                });
            }
            if let Some(value) = trips
                .iter()
                .copied()
                .find(|value| !value.is_finite() || *value < 0.0)
            {
                return Err(ValidationError::InvalidTripsPerShift {
                    route: self.id.clone(),
                    value,
                });
            }
        }
        Ok(())
    }
}

/// Reasons a dataset is rejected before any model is built.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// The dataset lists no routes.
    #[error("dataset must contain at least one route")]
    NoRoutes,
    /// The dataset lists no shifts.
    #[error("dataset must contain at least one shift")]
    NoShifts,
    /// The dataset lists no bus types.
    #[error("dataset must contain at least one bus type")]
    MissingBusTypes,
    /// Two entries of the same kind share an identifier.
    #[error("duplicate {kind} identifier {id:?}")]
    DuplicateId {
        /// Entity kind: `route`, `shift` or `bus type`.
        kind: &'static str,
        /// Repeated identifier.
        id: String,
    },
    /// A demand figure is negative or not finite.
    #[error("route {route:?} has invalid demand {value}")]
    InvalidDemand {
        /// Offending route.
        route: String,
        /// Rejected value.
        value: f64,
    },
    /// A route describes a different number of shifts than the dataset.
    #[error("route {route:?} describes {found} shifts but the dataset has {expected}")]
    ShiftCountMismatch {
        /// Offending route.
        route: String,
        /// Shifts in the dataset.
        expected: usize,
        /// Entries supplied by the route.
        found: usize,
    },
    /// Shift shares do not sum to one within [`SHARE_TOLERANCE`].
    #[error("shift shares of route {route:?} sum to {sum}, expected 1")]
    SharesDoNotSumToOne {
        /// Offending route.
        route: String,
        /// Actual sum of the shares.
        sum: f64,
    },
    /// A route's trip factor is not a positive finite number.
    #[error("route {route:?} has invalid trip factor {value}")]
    InvalidTripFactor {
        /// Offending route.
        route: String,
        /// Rejected value.
        value: f64,
    },
    /// A route's fleet share lies outside `[0, 1]`.
    #[error("route {route:?} has trip share {value}, expected a value in [0, 1]")]
    InvalidTripShare {
        /// Offending route.
        route: String,
        /// Rejected value.
        value: f64,
    },
    /// A route's trips per shift include a negative or non-finite entry.
    #[error("route {route:?} has invalid trips per shift {value}")]
    InvalidTripsPerShift {
        /// Offending route.
        route: String,
        /// Rejected value.
        value: f64,
    },
    /// A bus type has zero capacity.
    #[error("bus type {bus_type:?} must have positive capacity")]
    ZeroCapacity {
        /// Offending bus type.
        bus_type: String,
    },
    /// A bus type's trip cost is not a positive finite number.
    #[error("bus type {bus_type:?} has invalid cost per trip {value}")]
    InvalidCost {
        /// Offending bus type.
        bus_type: String,
        /// Rejected value.
        value: f64,
    },
    /// The dataset-wide load factor is not a positive finite number.
    #[error("load factor {value} must be positive and finite")]
    InvalidLoadFactor {
        /// Rejected value.
        value: f64,
    },
}

/// Immutable, validated input of one allocation run.
///
/// # Examples
///
/// ```
/// use headway_core::{BusType, Dataset, Route, Shift};
///
/// # fn main() -> Result<(), headway_core::ValidationError> {
/// let dataset = Dataset::new(
///     vec![Route::with_shares("R1", 100.0, vec![1.0])],
///     vec![Shift::new("day", 600)],
///     vec![BusType::new("Type-I", 50, 5)],
/// )?;
/// assert_eq!(dataset.total_demand(), 100.0);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "DatasetDraft"))]
pub struct Dataset {
    routes: Vec<Route>,
    shifts: Vec<Shift>,
    bus_types: Vec<BusType>,
    load_factor: f64,
}

impl Dataset {
    /// Validate and construct a dataset using [`DEFAULT_LOAD_FACTOR`].
    pub fn new(
        routes: Vec<Route>,
        shifts: Vec<Shift>,
        bus_types: Vec<BusType>,
    ) -> Result<Self, ValidationError> {
        Self::with_load_factor(routes, shifts, bus_types, DEFAULT_LOAD_FACTOR)
    }

    /// Validate and construct a dataset with an explicit default load factor.
    pub fn with_load_factor(
        routes: Vec<Route>,
        shifts: Vec<Shift>,
        bus_types: Vec<BusType>,
        load_factor: f64,
    ) -> Result<Self, ValidationError> {
        if routes.is_empty() {
            return Err(ValidationError::NoRoutes);
        }
        if shifts.is_empty() {
            return Err(ValidationError::NoShifts);
        }
        if bus_types.is_empty() {
            return Err(ValidationError::MissingBusTypes);
        }
        if !load_factor.is_finite() || load_factor <= 0.0 {
            return Err(ValidationError::InvalidLoadFactor { value: load_factor });
        }
        ensure_unique("route", routes.iter().map(|route| route.id.as_str()))?;
        ensure_unique("shift", shifts.iter().map(|shift| shift.id.as_str()))?;
        ensure_unique("bus type", bus_types.iter().map(|bus| bus.id.as_str()))?;
        for bus in &bus_types {
            if bus.capacity == 0 {
                return Err(ValidationError::ZeroCapacity {
                    bus_type: bus.id.clone(),
                });
            }
            if !bus.cost_per_trip.is_finite() || bus.cost_per_trip <= 0.0 {
                return Err(ValidationError::InvalidCost {
                    bus_type: bus.id.clone(),
                    value: bus.cost_per_trip,
                });
            }
        }
        for route in &routes {
            route.validate(shifts.len())?;
        }
        Ok(Self {
            routes,
            shifts,
            bus_types,
            load_factor,
        })
    }

    /// Routes in input order.
    #[must_use]
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Shifts in input order.
    #[must_use]
    pub fn shifts(&self) -> &[Shift] {
        &self.shifts
    }

    /// Bus types in input order.
    #[must_use]
    pub fn bus_types(&self) -> &[BusType] {
        &self.bus_types
    }

    /// Load factor used by routes without their own trip factor.
    #[must_use]
    pub const fn load_factor(&self) -> f64 {
        self.load_factor
    }

    /// Effective trip factor of `route`.
    #[must_use]
    pub fn trip_factor(&self, route: &Route) -> f64 {
        route.trip_factor.unwrap_or(self.load_factor)
    }

    /// Passengers carried by one trip of `bus` on `route`.
    #[must_use]
    pub fn passengers_per_trip(&self, route: &Route, bus: &BusType) -> f64 {
        f64::from(bus.capacity) * self.trip_factor(route)
    }

    /// Passengers per day summed over every route.
    #[must_use]
    pub fn total_demand(&self) -> f64 {
        self.routes.iter().map(Route::daily_demand).sum()
    }
}

fn ensure_unique<'a>(
    kind: &'static str,
    ids: impl Iterator<Item = &'a str>,
) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(ValidationError::DuplicateId {
                kind,
                id: id.to_owned(),
            });
        }
    }
    Ok(())
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct DatasetDraft {
    routes: Vec<Route>,
    shifts: Vec<Shift>,
    bus_types: Vec<BusType>,
    #[serde(default = "default_load_factor")]
    load_factor: f64,
}

#[cfg(feature = "serde")]
const fn default_load_factor() -> f64 {
    DEFAULT_LOAD_FACTOR
}

#[cfg(feature = "serde")]
impl TryFrom<DatasetDraft> for Dataset {
    type Error = ValidationError;

    fn try_from(draft: DatasetDraft) -> Result<Self, Self::Error> {
        Self::with_load_factor(
            draft.routes,
            draft.shifts,
            draft.bus_types,
            draft.load_factor,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn shifts() -> Vec<Shift> {
        vec![Shift::new("peak", 195), Shift::new("off-peak", 360)]
    }

    #[fixture]
    fn bus_types() -> Vec<BusType> {
        vec![BusType::new("Type-I", 60, 600), BusType::new("Type-II", 90, 90)]
    }

    #[rstest]
    fn accepts_shares_summing_to_one(shifts: Vec<Shift>, bus_types: Vec<BusType>) {
        let routes = vec![Route::with_shares("R1", 4126.0, vec![0.4, 0.6])];
        let dataset = Dataset::new(routes, shifts, bus_types).expect("valid dataset");
        assert_eq!(dataset.routes().len(), 1);
        assert!((dataset.total_demand() - 4126.0).abs() < 1e-9);
    }

    #[rstest]
    #[case(vec![0.5, 0.4])]
    #[case(vec![0.7, 0.4])]
    fn rejects_shares_not_summing_to_one(
        shifts: Vec<Shift>,
        bus_types: Vec<BusType>,
        #[case] shares: Vec<f64>,
    ) {
        let routes = vec![Route::with_shares("R1", 100.0, shares)];
        let err = Dataset::new(routes, shifts, bus_types).expect_err("shares should be rejected");
        assert!(matches!(err, ValidationError::SharesDoNotSumToOne { .. }));
    }

    #[rstest]
    fn rejects_negative_daily_demand(shifts: Vec<Shift>, bus_types: Vec<BusType>) {
        let routes = vec![Route::with_shares("R1", -1.0, vec![0.5, 0.5])];
        let err = Dataset::new(routes, shifts, bus_types).expect_err("negative demand");
        assert_eq!(
            err,
            ValidationError::InvalidDemand {
                route: "R1".into(),
                value: -1.0
            }
        );
    }

    #[rstest]
    fn rejects_negative_explicit_demand(shifts: Vec<Shift>, bus_types: Vec<BusType>) {
        let routes = vec![Route::with_shift_demand("R1", vec![10.0, -3.0])];
        let err = Dataset::new(routes, shifts, bus_types).expect_err("negative demand");
        assert!(matches!(err, ValidationError::InvalidDemand { .. }));
    }

    #[rstest]
    fn rejects_mismatched_shift_count(shifts: Vec<Shift>, bus_types: Vec<BusType>) {
        let routes = vec![Route::with_shift_demand("R1", vec![10.0])];
        let err = Dataset::new(routes, shifts, bus_types).expect_err("one entry for two shifts");
        assert_eq!(
            err,
            ValidationError::ShiftCountMismatch {
                route: "R1".into(),
                expected: 2,
                found: 1
            }
        );
    }

    #[rstest]
    fn rejects_zero_capacity(shifts: Vec<Shift>) {
        let routes = vec![Route::with_shares("R1", 100.0, vec![0.5, 0.5])];
        let buses = vec![BusType::new("Type-0", 0, 10)];
        let err = Dataset::new(routes, shifts, buses).expect_err("zero capacity");
        assert!(matches!(err, ValidationError::ZeroCapacity { .. }));
    }

    #[rstest]
    fn rejects_missing_bus_types(shifts: Vec<Shift>) {
        let routes = vec![Route::with_shares("R1", 100.0, vec![0.5, 0.5])];
        let err = Dataset::new(routes, shifts, Vec::new()).expect_err("no bus types");
        assert_eq!(err, ValidationError::MissingBusTypes);
    }

    #[rstest]
    fn rejects_duplicate_route_ids(shifts: Vec<Shift>, bus_types: Vec<BusType>) {
        let routes = vec![
            Route::with_shares("R1", 100.0, vec![0.5, 0.5]),
            Route::with_shares("R1", 200.0, vec![0.5, 0.5]),
        ];
        let err = Dataset::new(routes, shifts, bus_types).expect_err("duplicate ids");
        assert_eq!(
            err,
            ValidationError::DuplicateId {
                kind: "route",
                id: "R1".into()
            }
        );
    }

    #[rstest]
    #[case(0.0)]
    #[case(f64::NAN)]
    fn rejects_invalid_trip_factor(
        shifts: Vec<Shift>,
        bus_types: Vec<BusType>,
        #[case] factor: f64,
    ) {
        let routes = vec![Route::with_shares("R1", 100.0, vec![0.5, 0.5]).with_trip_factor(factor)];
        let err = Dataset::new(routes, shifts, bus_types).expect_err("bad trip factor");
        assert!(matches!(err, ValidationError::InvalidTripFactor { .. }));
    }

    #[rstest]
    #[case(-0.1)]
    #[case(1.5)]
    #[case(f64::NAN)]
    fn rejects_trip_shares_outside_the_unit_range(
        shifts: Vec<Shift>,
        bus_types: Vec<BusType>,
        #[case] share: f64,
    ) {
        let routes = vec![Route::with_shares("R1", 100.0, vec![0.5, 0.5]).with_trip_share(share)];
        let err = Dataset::new(routes, shifts, bus_types).expect_err("bad trip share");
        assert!(matches!(err, ValidationError::InvalidTripShare { .. }));
    }

    #[rstest]
    fn rejects_trips_per_shift_of_the_wrong_length(shifts: Vec<Shift>, bus_types: Vec<BusType>) {
        let routes =
            vec![Route::with_shares("R1", 100.0, vec![0.5, 0.5]).with_trips_per_shift(vec![4.0])];
        let err = Dataset::new(routes, shifts, bus_types).expect_err("one rate for two shifts");
        assert_eq!(
            err,
            ValidationError::ShiftCountMismatch {
                route: "R1".into(),
                expected: 2,
                found: 1
            }
        );
    }

    #[rstest]
    fn rejects_negative_trips_per_shift(shifts: Vec<Shift>, bus_types: Vec<BusType>) {
        let routes = vec![
            Route::with_shares("R1", 100.0, vec![0.5, 0.5]).with_trips_per_shift(vec![4.0, -1.0]),
        ];
        let err = Dataset::new(routes, shifts, bus_types).expect_err("negative trip rate");
        assert_eq!(
            err,
            ValidationError::InvalidTripsPerShift {
                route: "R1".into(),
                value: -1.0
            }
        );
    }

    #[rstest]
    fn trip_caps_need_a_share_and_a_rate() {
        let uncapped = Route::with_shares("R1", 100.0, vec![0.5, 0.5]).with_trip_share(0.25);
        assert_eq!(uncapped.trip_cap(0, 600), None);
        let capped = uncapped.with_trips_per_shift(vec![3.0, 7.0]);
        assert_eq!(capped.trip_cap(0, 600), Some(450.0));
        assert_eq!(capped.trip_cap(1, 90), Some(158.0));
        assert_eq!(capped.trip_cap(2, 90), None);
    }

    #[rstest]
    fn passengers_per_trip_uses_route_factor(shifts: Vec<Shift>, bus_types: Vec<BusType>) {
        let routes = vec![
            Route::with_shares("R1", 100.0, vec![0.5, 0.5]).with_trip_factor(0.8),
            Route::with_shares("R2", 100.0, vec![0.5, 0.5]),
        ];
        let dataset = Dataset::with_load_factor(routes, shifts, bus_types, 0.5)
            .expect("valid dataset");
        let (Some(first), Some(second), Some(bus)) = (
            dataset.routes().first(),
            dataset.routes().get(1),
            dataset.bus_types().first(),
        ) else {
            panic!("fixture should contain two routes and a bus type");
        };
        assert!((dataset.passengers_per_trip(first, bus) - 48.0).abs() < 1e-9);
        assert!((dataset.passengers_per_trip(second, bus) - 30.0).abs() < 1e-9);
    }

    #[rstest]
    fn coverage_floor_is_at_least_one() {
        assert_eq!(Shift::new("late", 90).with_min_trips(0).coverage_floor(), 1);
        assert_eq!(Shift::new("late", 90).with_min_trips(3).coverage_floor(), 3);
    }

    #[cfg(feature = "serde")]
    #[rstest]
    fn deserialising_runs_validation() {
        let json = r#"{
            "routes": [{ "id": "R1", "demand": { "shares": { "daily": 100.0, "shares": [0.9] } } }],
            "shifts": [{ "id": "day" }],
            "bus_types": [{ "id": "Type-I", "capacity": 50, "fleet_size": 5 }]
        }"#;
        let err = serde_json::from_str::<Dataset>(json).expect_err("shares sum to 0.9");
        assert!(err.to_string().contains("sum to"));
    }

    #[cfg(feature = "serde")]
    #[rstest]
    fn deserialising_applies_defaults() {
        let json = r#"{
            "routes": [{ "id": "R1", "demand": { "explicit": [40.0, 60.0] } }],
            "shifts": [{ "id": "am", "duration_minutes": 195 }, { "id": "pm", "min_trips": 3 }],
            "bus_types": [{ "id": "Type-I", "capacity": 50, "fleet_size": 5 }]
        }"#;
        let dataset: Dataset = serde_json::from_str(json).expect("valid dataset");
        assert!((dataset.load_factor() - 1.0).abs() < f64::EPSILON);
        let bus = dataset.bus_types().first().expect("bus type");
        assert!((bus.cost_per_trip - 1.0).abs() < f64::EPSILON);
        let am = dataset.shifts().first().expect("am shift");
        assert_eq!(am.min_trips, 1);
        let pm = dataset.shifts().get(1).expect("pm shift");
        assert_eq!(pm.min_trips, 3);
        assert!((dataset.total_demand() - 100.0).abs() < 1e-9);
    }
}
