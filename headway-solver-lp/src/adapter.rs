//! The two [`SolverAdapter`] variants and the factory that selects one.

use std::time::Duration;

use headway_core::{ConstraintModel, SolveResult, SolverAdapter, SolverBackend};

use crate::backend::{self, Integrality};

/// Per-solve limit the CLI applies unless told otherwise.
pub const DEFAULT_SOLVE_TIME_LIMIT: Duration = Duration::from_secs(60);

/// Continuous relaxation: integrality flags are ignored and trip counts may
/// be fractional.
///
/// # Examples
///
/// ```
/// use headway_core::{BusType, Dataset, ModelBuilder, Route, Shift, SolveStatus, SolverAdapter};
/// use headway_solver_lp::LpRelaxationSolver;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let dataset = Dataset::new(
///     vec![Route::with_shares("R1", 90.0, vec![1.0])],
///     vec![Shift::new("day", 600)],
///     vec![BusType::new("Type-I", 60, 5)],
/// )?;
/// let built = ModelBuilder::new(&dataset).build(0.0)?;
/// let result = LpRelaxationSolver::new().solve(&built.model);
/// assert_eq!(result.status, SolveStatus::Optimal);
/// assert!((result.values[0] - 1.5).abs() < 1e-6);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LpRelaxationSolver {
    time_limit: Option<Duration>,
}

impl LpRelaxationSolver {
    /// Solver without a per-solve limit.
    #[must_use]
    pub const fn new() -> Self {
        Self { time_limit: None }
    }

    /// Solver that reports [`SolveStatus::Error`](headway_core::SolveStatus::Error)
    /// once a solve runs longer than `limit`.
    #[must_use]
    pub const fn with_time_limit(limit: Duration) -> Self {
        Self {
            time_limit: Some(limit),
        }
    }

    /// Configured per-solve limit.
    #[must_use]
    pub const fn time_limit(&self) -> Option<Duration> {
        self.time_limit
    }
}

impl SolverAdapter for LpRelaxationSolver {
    fn name(&self) -> &'static str {
        "lp"
    }

    fn solve(&self, model: &ConstraintModel) -> SolveResult {
        backend::solve(model, Integrality::Relaxed, self.time_limit)
    }

    fn solve_within(&self, model: &ConstraintModel, limit: Duration) -> SolveResult {
        backend::solve(model, Integrality::Relaxed, Some(tighter(self.time_limit, limit)))
    }
}

/// Integer trip counts via branch and bound.
///
/// Values of integer-flagged variables are rounded to the nearest integer
/// before they are returned. Branch and bound can run for a very long time on
/// some feasible models; give the solver a limit when the caller cannot wait.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IntegerSolver {
    time_limit: Option<Duration>,
}

impl IntegerSolver {
    /// Solver without a per-solve limit.
    #[must_use]
    pub const fn new() -> Self {
        Self { time_limit: None }
    }

    /// Solver that reports [`SolveStatus::Error`](headway_core::SolveStatus::Error)
    /// once a solve runs longer than `limit`.
    #[must_use]
    pub const fn with_time_limit(limit: Duration) -> Self {
        Self {
            time_limit: Some(limit),
        }
    }

    /// Configured per-solve limit.
    #[must_use]
    pub const fn time_limit(&self) -> Option<Duration> {
        self.time_limit
    }
}

impl SolverAdapter for IntegerSolver {
    fn name(&self) -> &'static str {
        "integer"
    }

    fn solve(&self, model: &ConstraintModel) -> SolveResult {
        backend::solve(model, Integrality::Enforced, self.time_limit)
    }

    fn solve_within(&self, model: &ConstraintModel, limit: Duration) -> SolveResult {
        backend::solve(model, Integrality::Enforced, Some(tighter(self.time_limit, limit)))
    }
}

fn tighter(own: Option<Duration>, limit: Duration) -> Duration {
    own.map_or(limit, |own_limit| own_limit.min(limit))
}

/// Instantiate the adapter selected by `backend`, without a per-solve limit.
#[must_use]
pub fn adapter_for(backend: SolverBackend) -> Box<dyn SolverAdapter> {
    match backend {
        SolverBackend::Lp => Box::new(LpRelaxationSolver::new()),
        SolverBackend::Integer => Box::new(IntegerSolver::new()),
    }
}

/// Instantiate the adapter selected by `backend`, bounding every solve by
/// `limit`.
#[must_use]
pub fn adapter_with_time_limit(backend: SolverBackend, limit: Duration) -> Box<dyn SolverAdapter> {
    match backend {
        SolverBackend::Lp => Box::new(LpRelaxationSolver::with_time_limit(limit)),
        SolverBackend::Integer => Box::new(IntegerSolver::with_time_limit(limit)),
    }
}
