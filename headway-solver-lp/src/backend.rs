//! Translation of a [`ConstraintModel`] into a `good_lp` problem solved by
//! the pure-Rust `microlp` backend.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use good_lp::{
    Expression, ProblemVariables, ResolutionError, Solution, SolverModel, Variable, constraint,
    microlp, variable,
};
use headway_core::{
    Comparison, ConstraintModel, Direction, SolveResult, SolveStatus, VariableId,
};

/// How integer-flagged variables are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Integrality {
    /// Every variable is continuous.
    Relaxed,
    /// Integer-flagged variables must take integer values.
    Enforced,
}

/// Solve `model`, waiting at most `limit` when one is given.
///
/// A limited solve runs on a worker thread. `microlp` cannot be interrupted,
/// so a worker that outlives its limit is detached and its late result is
/// dropped; the caller gets [`SolveStatus::Error`] as soon as the limit passes.
pub(crate) fn solve(
    model: &ConstraintModel,
    integrality: Integrality,
    limit: Option<Duration>,
) -> SolveResult {
    match limit {
        Some(limit) => solve_on_worker(model, integrality, limit),
        None => solve_blocking(model, integrality),
    }
}

fn solve_on_worker(model: &ConstraintModel, integrality: Integrality, limit: Duration) -> SolveResult {
    let started_at = Instant::now();
    let (reply, receiver) = mpsc::channel();
    let owned = model.clone();
    let spawned = thread::Builder::new()
        .name("headway-microlp".to_owned())
        .spawn(move || {
            let result = solve_blocking(&owned, integrality);
            if reply.send(result).is_err() {
                log::debug!("discarding a microlp result that arrived after its time limit");
            }
        });
    if let Err(err) = spawned {
        return SolveResult::error(
            format!("failed to start solver thread: {err}"),
            started_at.elapsed(),
        );
    }
    match receiver.recv_timeout(limit) {
        Ok(result) => result,
        Err(RecvTimeoutError::Timeout) => {
            log::warn!("microlp exceeded its time limit of {limit:?}; abandoning the solve");
            SolveResult::error(
                format!("time limit of {limit:?} exceeded"),
                started_at.elapsed(),
            )
        }
        Err(RecvTimeoutError::Disconnected) => SolveResult::error(
            "solver thread exited without a result",
            started_at.elapsed(),
        ),
    }
}

/// Solve `model` on the calling thread, mapping backend outcomes and panics
/// onto [`SolveResult`].
fn solve_blocking(model: &ConstraintModel, integrality: Integrality) -> SolveResult {
    let started_at = Instant::now();
    let outcome = catch_unwind(AssertUnwindSafe(|| run(model, integrality)));
    let elapsed = started_at.elapsed();
    match outcome {
        Ok(Ok(values)) => {
            let values = match integrality {
                Integrality::Relaxed => values,
                Integrality::Enforced => round_integers(model, values),
            };
            SolveResult::solved(model, SolveStatus::Optimal, values, elapsed)
        }
        Ok(Err(ResolutionError::Infeasible)) => {
            SolveResult::without_solution(SolveStatus::Infeasible, elapsed)
        }
        Ok(Err(ResolutionError::Unbounded)) => {
            SolveResult::without_solution(SolveStatus::Unbounded, elapsed)
        }
        Ok(Err(err)) => SolveResult::error(err.to_string(), elapsed),
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            log::warn!("microlp panicked: {message}");
            SolveResult::error(format!("backend panicked: {message}"), elapsed)
        }
    }
}

fn run(model: &ConstraintModel, integrality: Integrality) -> Result<Vec<f64>, ResolutionError> {
    let mut vars = ProblemVariables::new();
    let handles: Vec<Variable> = model
        .variables()
        .iter()
        .map(|definition| {
            let mut declared = variable().min(definition.lower).name(definition.name.clone());
            if let Some(upper) = definition.upper {
                declared = declared.max(upper);
            }
            if definition.integer && integrality == Integrality::Enforced {
                declared = declared.integer();
            }
            vars.add(declared)
        })
        .collect();

    let objective = linear(&handles, &model.objective().terms);
    let unsolved = match model.objective().direction {
        Direction::Minimise => vars.minimise(objective),
        Direction::Maximise => vars.maximise(objective),
    };
    let problem = model
        .constraints()
        .iter()
        .fold(unsolved.using(microlp), |problem, row| {
            let lhs = linear(&handles, &row.terms);
            let bound = match row.comparison {
                Comparison::LessOrEqual => constraint::leq(lhs, row.rhs),
                Comparison::GreaterOrEqual => constraint::geq(lhs, row.rhs),
                Comparison::Equal => constraint::eq(lhs, row.rhs),
            };
            problem.with(bound)
        });
    log::trace!(
        "solving {} variables and {} constraints with microlp",
        handles.len(),
        model.constraints().len()
    );

    let solution = problem.solve()?;
    Ok(handles.iter().map(|handle| solution.value(*handle)).collect())
}

fn linear(handles: &[Variable], terms: &[(VariableId, f64)]) -> Expression {
    terms
        .iter()
        .filter_map(|(id, coefficient)| Some((*handles.get(id.index())?, *coefficient)))
        .fold(Expression::from(0.0), |acc, (handle, coefficient)| {
            acc + coefficient * handle
        })
}

fn round_integers(model: &ConstraintModel, values: Vec<f64>) -> Vec<f64> {
    values
        .into_iter()
        .zip(model.variables())
        .map(|(value, definition)| {
            if definition.integer {
                value.round()
            } else {
                value
            }
        })
        .collect()
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|message| (*message).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_owned())
}
