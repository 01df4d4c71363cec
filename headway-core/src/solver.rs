use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::model::ConstraintModel;

/// Outcome category of one solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum SolveStatus {
    /// A proven optimum was found.
    Optimal,
    /// A solution satisfying every constraint was found without an
    /// optimality proof.
    Feasible,
    /// The backend proved that no solution exists.
    Infeasible,
    /// The objective can improve without limit.
    Unbounded,
    /// The backend faulted; nothing is known about feasibility.
    Error,
}

impl SolveStatus {
    /// Whether the result carries a usable assignment.
    #[must_use]
    pub const fn is_feasible(self) -> bool {
        matches!(self, Self::Optimal | Self::Feasible)
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Optimal => "OPTIMAL",
            Self::Feasible => "FEASIBLE",
            Self::Infeasible => "INFEASIBLE",
            Self::Unbounded => "UNBOUNDED",
            Self::Error => "ERROR",
        };
        f.write_str(label)
    }
}

/// Status and variable values returned by a [`SolverAdapter`].
///
/// `values` holds one entry per model variable, in
/// [`VariableId`](crate::VariableId) order, and is empty unless the status is
/// feasible.
#[derive(Debug, Clone, PartialEq)]
pub struct SolveResult {
    /// Outcome category.
    pub status: SolveStatus,
    /// Objective value of `values`, present when feasible.
    pub objective: Option<f64>,
    /// Solved variable values.
    pub values: Vec<f64>,
    /// Backend diagnostic, set for [`SolveStatus::Error`].
    pub message: Option<String>,
    /// Wall-clock time spent inside the backend.
    pub solve_time: Duration,
}

impl SolveResult {
    /// Build a feasible result, computing the objective from `model`.
    #[must_use]
    pub fn solved(
        model: &ConstraintModel,
        status: SolveStatus,
        values: Vec<f64>,
        solve_time: Duration,
    ) -> Self {
        Self {
            status,
            objective: Some(model.objective_value(&values)),
            values,
            message: None,
            solve_time,
        }
    }

    /// Build a result without values, e.g. for infeasible models.
    #[must_use]
    pub const fn without_solution(status: SolveStatus, solve_time: Duration) -> Self {
        Self {
            status,
            objective: None,
            values: Vec::new(),
            message: None,
            solve_time,
        }
    }

    /// Build an [`SolveStatus::Error`] result carrying `message`.
    #[must_use]
    pub fn error(message: impl Into<String>, solve_time: Duration) -> Self {
        Self {
            status: SolveStatus::Error,
            objective: None,
            values: Vec::new(),
            message: Some(message.into()),
            solve_time,
        }
    }
}

/// Executes a [`ConstraintModel`] on some optimisation backend.
///
/// Implementations must be callable repeatedly with fresh models and must
/// report backend faults as [`SolveStatus::Error`] rather than
/// [`SolveStatus::Infeasible`], so that the buffer search never relaxes a
/// model because of a crash.
/// Adapters must be `Send + Sync` to operate safely across threads.
///
/// # Examples
///
/// ```rust
/// use std::time::Duration;
/// use headway_core::{ConstraintModel, SolveResult, SolveStatus, SolverAdapter};
///
/// struct AllZero;
///
/// impl SolverAdapter for AllZero {
///     fn name(&self) -> &'static str {
///         "all-zero"
///     }
///
///     fn solve(&self, model: &ConstraintModel) -> SolveResult {
///         let values = vec![0.0; model.variables().len()];
///         if model.violations(&values, 1e-9).is_empty() {
///             SolveResult::solved(model, SolveStatus::Optimal, values, Duration::ZERO)
///         } else {
///             SolveResult::without_solution(SolveStatus::Infeasible, Duration::ZERO)
///         }
///     }
/// }
///
/// let result = AllZero.solve(&ConstraintModel::default());
/// assert_eq!(result.status, SolveStatus::Optimal);
/// ```
pub trait SolverAdapter: Send + Sync {
    /// Short backend name used in logs and reports.
    fn name(&self) -> &'static str;

    /// Solve `model` and report its status and values.
    fn solve(&self, model: &ConstraintModel) -> SolveResult;

    /// Solve `model`, giving up once `limit` has elapsed.
    ///
    /// A solve that runs out of time reports [`SolveStatus::Error`]. The
    /// default ignores the limit, which suits backends that always return
    /// promptly.
    fn solve_within(&self, model: &ConstraintModel, _limit: Duration) -> SolveResult {
        self.solve(model)
    }
}

impl<S: SolverAdapter + ?Sized> SolverAdapter for Box<S> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn solve(&self, model: &ConstraintModel) -> SolveResult {
        (**self).solve(model)
    }

    fn solve_within(&self, model: &ConstraintModel, limit: Duration) -> SolveResult {
        (**self).solve_within(model, limit)
    }
}

impl<S: SolverAdapter + ?Sized> SolverAdapter for &S {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn solve(&self, model: &ConstraintModel) -> SolveResult {
        (**self).solve(model)
    }

    fn solve_within(&self, model: &ConstraintModel, limit: Duration) -> SolveResult {
        (**self).solve_within(model, limit)
    }
}

/// Adapter variant selected by configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SolverBackend {
    /// Continuous relaxation: integrality is ignored.
    #[default]
    Lp,
    /// Integer trip counts.
    Integer,
}

impl fmt::Display for SolverBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Lp => "lp",
            Self::Integer => "integer",
        })
    }
}

/// Error returned when parsing an unknown [`SolverBackend`] name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown solver backend {0:?} (expected `lp` or `integer`)")]
pub struct UnknownBackend(pub String);

impl FromStr for SolverBackend {
    type Err = UnknownBackend;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "lp" => Ok(Self::Lp),
            "integer" | "int" | "cp" => Ok(Self::Integer),
            other => Err(UnknownBackend(other.to_owned())),
        }
    }
}
