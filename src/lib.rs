//! Facade crate for the Headway bus allocator.
//!
//! This crate re-exports the core domain types and, behind the `solver-lp`
//! feature, the `microlp` solver adapters.
//!
//! ```
//! # #[cfg(feature = "solver-lp")]
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use headway_engine::{
//!     BusType, Dataset, FeasibilityRepair, ModelBuilder, Route, SearchConfig, SearchOutcome,
//!     Shift, SolverBackend, adapter_for, extract,
//! };
//!
//! let dataset = Dataset::new(
//!     vec![Route::with_shares("R1", 120.0, vec![1.0])],
//!     vec![Shift::new("day", 600)],
//!     vec![BusType::new("Type-I", 60, 5)],
//! )?;
//! let solver = adapter_for(SolverBackend::Integer);
//! let config = SearchConfig::default();
//! let outcome = FeasibilityRepair::new(ModelBuilder::new(&dataset), solver.as_ref(), &config)
//!     .run()?;
//! if let SearchOutcome::Resolved(resolution) = outcome {
//!     let report = extract(&dataset, &resolution.model, &resolution.result)?;
//!     assert_eq!(report.total_trips, 2.0);
//! }
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "solver-lp"))]
//! # fn main() {}
//! ```

#![forbid(unsafe_code)]

pub use headway_core::{
    AllocationPolicy, AllocationRatioBounds, AssignmentReport, BuildError, BuiltModel, BusType,
    ConstraintModel, Dataset, ExhaustionReason, FeasibilityRepair, FleetUtilisation,
    ModelBuilder, Probe, ReportError, Resolution, Route, RouteCoverage, SearchConfig,
    SearchConfigError, SearchError, SearchOutcome, SearchPhase, Shift, ShiftCoverage,
    ShiftDemand, SolveResult, SolveStatus, SolverAdapter, SolverBackend, TripAssignment,
    UnresolvedInfeasibility, ValidationError, extract,
};

#[cfg(feature = "solver-lp")]
pub use headway_solver_lp::{
    DEFAULT_SOLVE_TIME_LIMIT, IntegerSolver, LpRelaxationSolver, adapter_for,
    adapter_with_time_limit,
};
