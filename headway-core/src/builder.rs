//! Translate a [`Dataset`] into a [`ConstraintModel`] for one buffer value.
//!
//! Each call to [`ModelBuilder::build`] produces a fresh model. The buffer
//! only enters the demand fulfilment rows, so raising it can only enlarge
//! the feasible region.

use thiserror::Error;

use crate::dataset::Dataset;
use crate::model::{
    Comparison, ConstraintKind, ConstraintModel, Direction, LinearConstraint, Variable, VariableId,
};

/// Range for each bus type's share of a route's daily trips.
///
/// # Examples
///
/// ```
/// use headway_core::AllocationRatioBounds;
///
/// let bounds = AllocationRatioBounds::new(0.2, 0.8).expect("valid range");
/// assert_eq!(bounds.min_share(), 0.2);
/// assert!(AllocationRatioBounds::new(0.9, 0.1).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "(f64, f64)", into = "(f64, f64)"))]
pub struct AllocationRatioBounds {
    min_share: f64,
    max_share: f64,
}

impl AllocationRatioBounds {
    /// Validate `0 <= min_share <= max_share <= 1`.
    pub fn new(min_share: f64, max_share: f64) -> Result<Self, PolicyError> {
        let in_unit = |value: f64| (0.0..=1.0).contains(&value);
        if !in_unit(min_share) || !in_unit(max_share) || min_share > max_share {
            return Err(PolicyError::InvalidRatioBounds {
                min_share,
                max_share,
            });
        }
        Ok(Self {
            min_share,
            max_share,
        })
    }

    /// Smallest share a bus type may take.
    #[must_use]
    pub const fn min_share(&self) -> f64 {
        self.min_share
    }

    /// Largest share a bus type may take.
    #[must_use]
    pub const fn max_share(&self) -> f64 {
        self.max_share
    }
}

impl TryFrom<(f64, f64)> for AllocationRatioBounds {
    type Error = PolicyError;

    fn try_from((min_share, max_share): (f64, f64)) -> Result<Self, Self::Error> {
        Self::new(min_share, max_share)
    }
}

impl From<AllocationRatioBounds> for (f64, f64) {
    fn from(bounds: AllocationRatioBounds) -> Self {
        (bounds.min_share, bounds.max_share)
    }
}

/// Errors raised by [`AllocationRatioBounds::new`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PolicyError {
    /// The share range is empty or leaves `[0, 1]`.
    #[error("allocation share range [{min_share}, {max_share}] must satisfy 0 <= min <= max <= 1")]
    InvalidRatioBounds {
        /// Requested lower share.
        min_share: f64,
        /// Requested upper share.
        max_share: f64,
    },
}

/// Optional fleet-mix and system-wide rules layered on the core model.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AllocationPolicy {
    /// Share range per bus type and route; ignored with a single bus type.
    pub ratio_bounds: Option<AllocationRatioBounds>,
    /// Cap on all trips operated in a day.
    pub max_total_trips: Option<u32>,
    /// Cap each route/shift/bus-type variable at
    /// `ceil(fleet_size × trip_share × trips_per_shift)` for routes that
    /// declare both figures.
    pub route_trip_caps: bool,
}

/// Errors raised by [`ModelBuilder::build`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuildError {
    /// The buffer is negative or not finite.
    #[error("buffer {0} must be a non-negative finite number")]
    InvalidBuffer(f64),
}

/// Identity of one assignment variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AssignmentKey {
    /// Route index in [`Dataset::routes`].
    pub route: usize,
    /// Shift index in [`Dataset::shifts`].
    pub shift: usize,
    /// Bus type index in [`Dataset::bus_types`].
    pub bus_type: usize,
}

/// Maps (route, shift, bus type) triples onto model variables.
///
/// Variables are laid out route-major, then shift, then bus type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssignmentIndex {
    routes: usize,
    shifts: usize,
    bus_types: usize,
}

impl AssignmentIndex {
    const fn new(routes: usize, shifts: usize, bus_types: usize) -> Self {
        Self {
            routes,
            shifts,
            bus_types,
        }
    }

    /// Number of assignment variables.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.routes * self.shifts * self.bus_types
    }

    /// Whether the index addresses no variables.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Position of `key` in the model's value vector, if in range.
    #[must_use]
    pub const fn position(&self, key: AssignmentKey) -> Option<usize> {
        if key.route >= self.routes || key.shift >= self.shifts || key.bus_type >= self.bus_types
        {
            return None;
        }
        Some((key.route * self.shifts + key.shift) * self.bus_types + key.bus_type)
    }

    /// Every key in layout order.
    pub fn keys(&self) -> impl Iterator<Item = AssignmentKey> + use<> {
        let (routes, shifts, bus_types) = (self.routes, self.shifts, self.bus_types);
        (0..routes).flat_map(move |route| {
            (0..shifts).flat_map(move |shift| {
                (0..bus_types).map(move |bus_type| AssignmentKey {
                    route,
                    shift,
                    bus_type,
                })
            })
        })
    }

    /// Solved value of `key`, or `None` when out of range.
    #[must_use]
    pub fn value(&self, values: &[f64], key: AssignmentKey) -> Option<f64> {
        self.position(key)
            .and_then(|position| values.get(position).copied())
    }
}

/// A model built for one buffer value, with the index needed to read it back.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltModel {
    /// Backend-neutral model.
    pub model: ConstraintModel,
    /// Variable layout.
    pub index: AssignmentIndex,
    /// Buffer subtracted from every demand row.
    pub buffer: f64,
}

/// Builds constraint models from a validated dataset and policy.
#[derive(Debug, Clone, Copy)]
pub struct ModelBuilder<'a> {
    dataset: &'a Dataset,
    policy: AllocationPolicy,
}

impl<'a> ModelBuilder<'a> {
    /// Create a builder with the default (empty) policy.
    #[must_use]
    pub fn new(dataset: &'a Dataset) -> Self {
        Self::with_policy(dataset, AllocationPolicy::default())
    }

    /// Create a builder applying `policy`.
    #[must_use]
    pub const fn with_policy(dataset: &'a Dataset, policy: AllocationPolicy) -> Self {
        Self { dataset, policy }
    }

    /// Dataset the builder reads from.
    #[must_use]
    pub const fn dataset(&self) -> &'a Dataset {
        self.dataset
    }

    /// Policy applied to every model.
    #[must_use]
    pub const fn policy(&self) -> &AllocationPolicy {
        &self.policy
    }

    /// Build the model for `buffer`.
    pub fn build(&self, buffer: f64) -> Result<BuiltModel, BuildError> {
        if !buffer.is_finite() || buffer < 0.0 {
            return Err(BuildError::InvalidBuffer(buffer));
        }
        let dataset = self.dataset;
        let index = AssignmentIndex::new(
            dataset.routes().len(),
            dataset.shifts().len(),
            dataset.bus_types().len(),
        );
        let mut model = ConstraintModel::new(Direction::Minimise);
        let ids = self.add_variables(&mut model, &index);
        let ctx = BuildContext {
            dataset,
            index,
            ids: &ids,
        };

        ctx.add_demand_rows(&mut model, buffer);
        ctx.add_fleet_rows(&mut model);
        ctx.add_coverage_rows(&mut model);
        if let Some(bounds) = self.policy.ratio_bounds
            && dataset.bus_types().len() > 1
        {
            ctx.add_ratio_rows(&mut model, bounds);
        }
        if self.policy.route_trip_caps {
            ctx.add_trip_cap_rows(&mut model);
        }
        if let Some(cap) = self.policy.max_total_trips {
            model.add_constraint(LinearConstraint {
                name: "total_trips".to_owned(),
                kind: ConstraintKind::TotalTrips,
                terms: ids.iter().map(|id| (*id, 1.0)).collect(),
                comparison: Comparison::LessOrEqual,
                rhs: f64::from(cap),
            });
        }
        log::debug!(
            "built model for buffer {buffer}: {} variables, {} constraints",
            model.variables().len(),
            model.constraints().len()
        );
        Ok(BuiltModel {
            model,
            index,
            buffer,
        })
    }

    fn add_variables(&self, model: &mut ConstraintModel, index: &AssignmentIndex) -> Vec<VariableId> {
        let dataset = self.dataset;
        index
            .keys()
            .filter_map(|key| {
                let route = dataset.routes().get(key.route)?;
                let shift = dataset.shifts().get(key.shift)?;
                let bus = dataset.bus_types().get(key.bus_type)?;
                let id = model.add_variable(Variable {
                    name: format!("x[{},{},{}]", route.id, shift.id, bus.id),
                    lower: 0.0,
                    upper: Some(f64::from(bus.fleet_size)),
                    integer: true,
                });
                model.add_objective_term(id, bus.cost_per_trip);
                Some(id)
            })
            .collect()
    }
}

struct BuildContext<'a> {
    dataset: &'a Dataset,
    index: AssignmentIndex,
    ids: &'a [VariableId],
}

impl BuildContext<'_> {
    fn id(&self, route: usize, shift: usize, bus_type: usize) -> Option<VariableId> {
        self.index
            .position(AssignmentKey {
                route,
                shift,
                bus_type,
            })
            .and_then(|position| self.ids.get(position).copied())
    }

    /// Trip variables of one route/shift pair, one per bus type.
    fn slot(&self, route: usize, shift: usize) -> impl Iterator<Item = (usize, VariableId)> + '_ {
        (0..self.dataset.bus_types().len())
            .filter_map(move |bus_type| Some((bus_type, self.id(route, shift, bus_type)?)))
    }

    fn operating_slots(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.dataset
            .routes()
            .iter()
            .enumerate()
            .flat_map(move |(r, route)| {
                (0..self.dataset.shifts().len())
                    .map(move |s| (r, s, route.shift_demand(s)))
                    .filter(|(_, _, demand)| *demand > 0.0)
            })
    }

    fn add_demand_rows(&self, model: &mut ConstraintModel, buffer: f64) {
        let routes = self.dataset.routes();
        let bus_types = self.dataset.bus_types();
        for (r, s, demand) in self.operating_slots() {
            let Some(route) = routes.get(r) else { continue };
            let terms = self
                .slot(r, s)
                .filter_map(|(k, id)| {
                    let bus = bus_types.get(k)?;
                    Some((id, self.dataset.passengers_per_trip(route, bus)))
                })
                .collect();
            model.add_constraint(LinearConstraint {
                name: format!("demand[{},{}]", route.id, self.shift_id(s)),
                kind: ConstraintKind::DemandFulfilment,
                terms,
                comparison: Comparison::GreaterOrEqual,
                rhs: demand - buffer,
            });
        }
    }

    fn add_fleet_rows(&self, model: &mut ConstraintModel) {
        let routes = self.dataset.routes().len();
        let shifts = self.dataset.shifts().len();
        for (k, bus) in self.dataset.bus_types().iter().enumerate() {
            let terms = (0..routes)
                .flat_map(|r| (0..shifts).filter_map(move |s| self.id(r, s, k)))
                .map(|id| (id, 1.0))
                .collect();
            model.add_constraint(LinearConstraint {
                name: format!("fleet[{}]", bus.id),
                kind: ConstraintKind::FleetAvailability,
                terms,
                comparison: Comparison::LessOrEqual,
                rhs: f64::from(bus.fleet_size),
            });
        }
    }

    fn add_coverage_rows(&self, model: &mut ConstraintModel) {
        let routes = self.dataset.routes();
        let shifts = self.dataset.shifts();
        for (r, s, _) in self.operating_slots() {
            let (Some(route), Some(shift)) = (routes.get(r), shifts.get(s)) else {
                continue;
            };
            model.add_constraint(LinearConstraint {
                name: format!("coverage[{},{}]", route.id, shift.id),
                kind: ConstraintKind::ShiftCoverage,
                terms: self.slot(r, s).map(|(_, id)| (id, 1.0)).collect(),
                comparison: Comparison::GreaterOrEqual,
                rhs: f64::from(shift.coverage_floor()),
            });
        }
    }

    /// `share × total(route) - trips(route, type)` bounded on both sides.
    fn add_ratio_rows(&self, model: &mut ConstraintModel, bounds: AllocationRatioBounds) {
        let shifts = self.dataset.shifts().len();
        for (r, route) in self.dataset.routes().iter().enumerate() {
            for (k, bus) in self.dataset.bus_types().iter().enumerate() {
                for (share, comparison, label) in [
                    (bounds.min_share(), Comparison::GreaterOrEqual, "min"),
                    (bounds.max_share(), Comparison::LessOrEqual, "max"),
                ] {
                    let terms = (0..shifts)
                        .flat_map(|s| self.slot(r, s))
                        .map(|(other, id)| {
                            let own = if other == k { 1.0 } else { 0.0 };
                            (id, own - share)
                        })
                        .collect();
                    model.add_constraint(LinearConstraint {
                        name: format!("ratio_{label}[{},{}]", route.id, bus.id),
                        kind: ConstraintKind::AllocationRatio,
                        terms,
                        comparison,
                        rhs: 0.0,
                    });
                }
            }
        }
    }

    /// `x[r,s,k] <= ceil(fleet_k × share_r × trips_rs)`; the buffer never
    /// loosens these rows.
    fn add_trip_cap_rows(&self, model: &mut ConstraintModel) {
        let shifts = self.dataset.shifts().len();
        for (r, route) in self.dataset.routes().iter().enumerate() {
            for s in 0..shifts {
                for (k, id) in self.slot(r, s) {
                    let Some(bus) = self.dataset.bus_types().get(k) else {
                        continue;
                    };
                    let Some(cap) = route.trip_cap(s, bus.fleet_size) else {
                        continue;
                    };
                    model.add_constraint(LinearConstraint {
                        name: format!("trip_cap[{},{},{}]", route.id, self.shift_id(s), bus.id),
                        kind: ConstraintKind::RouteTripCap,
                        terms: vec![(id, 1.0)],
                        comparison: Comparison::LessOrEqual,
                        rhs: cap,
                    });
                }
            }
        }
    }

    fn shift_id(&self, shift: usize) -> &str {
        self.dataset
            .shifts()
            .get(shift)
            .map_or("?", |shift| shift.id.as_str())
    }
}
