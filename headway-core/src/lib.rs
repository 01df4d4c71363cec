//! Core domain types and algorithms for the Headway bus allocator.
//!
//! A [`Dataset`] describes routes, shifts and bus types. A [`ModelBuilder`]
//! turns it into a backend-neutral [`ConstraintModel`] for a given demand
//! buffer, a [`SolverAdapter`] solves that model, and [`FeasibilityRepair`]
//! searches for the smallest buffer at which the model becomes feasible.
//! [`extract`] converts the accepted solution into an [`AssignmentReport`].
//!
//! Constructors validate their input and return `Result` so that invalid
//! data is rejected before any solver runs.

pub mod builder;
pub mod dataset;
pub mod model;
pub mod report;
pub mod search;
pub mod solver;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use builder::{
    AllocationPolicy, AllocationRatioBounds, AssignmentIndex, AssignmentKey, BuildError,
    BuiltModel, ModelBuilder, PolicyError,
};
pub use dataset::{
    BusType, DEFAULT_LOAD_FACTOR, Dataset, Route, SHARE_TOLERANCE, Shift, ShiftDemand,
    ValidationError,
};
pub use model::{
    Comparison, ConstraintKind, ConstraintModel, Direction, LinearConstraint, LinearObjective,
    Variable, VariableId,
};
pub use report::{
    AssignmentReport, FleetUtilisation, ReportError, RouteCoverage, ShiftCoverage,
    TripAssignment, extract,
};
pub use search::{
    ExhaustionReason, FeasibilityRepair, Probe, Resolution, SearchConfig, SearchConfigError,
    SearchError, SearchOutcome, SearchPhase, UnresolvedInfeasibility,
};
pub use solver::{SolveResult, SolveStatus, SolverAdapter, SolverBackend, UnknownBackend};
