//! Deterministic adapters and datasets for exercising the buffer search
//! without a real optimisation backend.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use crate::dataset::{BusType, Dataset, Route, Shift, ValidationError};
use crate::model::{ConstraintKind, ConstraintModel};
use crate::solver::{SolveResult, SolveStatus, SolverAdapter};

/// Oracle adapter: a model is feasible iff no demand row asks for more than
/// `ceiling` passengers.
///
/// Feasible results carry all-zero values, so they are only meaningful for
/// the search itself, not for extraction.
#[derive(Debug)]
pub struct DemandCeilingSolver {
    ceiling: f64,
    calls: AtomicUsize,
}

impl DemandCeilingSolver {
    /// Create an oracle that accepts demand rows up to `ceiling`.
    #[must_use]
    pub const fn new(ceiling: f64) -> Self {
        Self {
            ceiling,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of models solved so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

impl SolverAdapter for DemandCeilingSolver {
    fn name(&self) -> &'static str {
        "demand-ceiling"
    }

    fn solve(&self, model: &ConstraintModel) -> SolveResult {
        self.calls.fetch_add(1, Ordering::Relaxed);
        let feasible = model
            .constraints_of(ConstraintKind::DemandFulfilment)
            .all(|row| row.rhs <= self.ceiling);
        if feasible {
            let values = vec![0.0; model.variables().len()];
            SolveResult::solved(model, SolveStatus::Optimal, values, Duration::ZERO)
        } else {
            SolveResult::without_solution(SolveStatus::Infeasible, Duration::ZERO)
        }
    }
}

/// Oracle adapter that answers its first `prompt_calls` models at once and
/// stalls on every later one.
///
/// A stalled solve given a limit shorter than the stall sleeps for the limit
/// and reports a time-limit error. Every offered limit is recorded.
#[derive(Debug)]
pub struct StallingSolver {
    oracle: DemandCeilingSolver,
    prompt_calls: usize,
    stall: Duration,
    limits: Mutex<Vec<Duration>>,
}

impl StallingSolver {
    /// Create an oracle over `ceiling` that stalls for `stall` after
    /// `prompt_calls` prompt answers.
    #[must_use]
    pub const fn new(ceiling: f64, prompt_calls: usize, stall: Duration) -> Self {
        Self {
            oracle: DemandCeilingSolver::new(ceiling),
            prompt_calls,
            stall,
            limits: Mutex::new(Vec::new()),
        }
    }

    /// Limits offered through [`SolverAdapter::solve_within`], in call order.
    #[must_use]
    pub fn limits(&self) -> Vec<Duration> {
        self.limits
            .lock()
            .map(|limits| limits.clone())
            .unwrap_or_default()
    }
}

impl SolverAdapter for StallingSolver {
    fn name(&self) -> &'static str {
        "stalling"
    }

    fn solve(&self, model: &ConstraintModel) -> SolveResult {
        if self.oracle.calls() >= self.prompt_calls {
            thread::sleep(self.stall);
        }
        self.oracle.solve(model)
    }

    fn solve_within(&self, model: &ConstraintModel, limit: Duration) -> SolveResult {
        if let Ok(mut limits) = self.limits.lock() {
            limits.push(limit);
        }
        if self.oracle.calls() >= self.prompt_calls && limit < self.stall {
            thread::sleep(limit);
            return SolveResult::error("time limit exceeded", limit);
        }
        self.solve(model)
    }
}

/// Adapter that replays a fixed sequence of statuses, then reports errors.
#[derive(Debug, Default)]
pub struct ScriptedSolver {
    statuses: Mutex<Vec<SolveStatus>>,
}

impl ScriptedSolver {
    /// Replay `statuses` in order.
    #[must_use]
    pub fn new(mut statuses: Vec<SolveStatus>) -> Self {
        statuses.reverse();
        Self {
            statuses: Mutex::new(statuses),
        }
    }

    /// An adapter whose every call faults.
    #[must_use]
    pub fn faulty() -> Self {
        Self::default()
    }
}

impl SolverAdapter for ScriptedSolver {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn solve(&self, model: &ConstraintModel) -> SolveResult {
        let next = self
            .statuses
            .lock()
            .ok()
            .and_then(|mut statuses| statuses.pop());
        match next {
            Some(status) if status.is_feasible() => {
                let values = vec![0.0; model.variables().len()];
                SolveResult::solved(model, status, values, Duration::ZERO)
            }
            Some(SolveStatus::Error) | None => {
                SolveResult::error("scripted backend failure", Duration::ZERO)
            }
            Some(status) => SolveResult::without_solution(status, Duration::ZERO),
        }
    }
}

/// One route served in a single shift by a single bus type.
pub fn single_route(
    demand: f64,
    capacity: u32,
    fleet_size: u32,
) -> Result<Dataset, ValidationError> {
    Dataset::new(
        vec![Route::with_shares("R1", demand, vec![1.0])],
        vec![Shift::new("day", 600)],
        vec![BusType::new("Type-I", capacity, fleet_size)],
    )
}

const SHIFT_PLAN: [(&str, u32, u32, f64); 4] = [
    ("morning_peak", 195, 7, 0.4),
    ("midday", 360, 12, 0.2),
    ("evening_peak", 240, 8, 0.35),
    ("night", 90, 3, 0.05),
];

/// A city of `routes` routes sharing four shifts and two bus types.
///
/// The shift plan is modelled on a weekday timetable with two peaks. Daily
/// demand is a deterministic stand-in varying between 3,000 and 8,940
/// passengers per route, not a sampled distribution. Fleet sizes scale with
/// the route count so that mid-sized cities need a small buffer.
pub fn synthetic_city(routes: usize) -> Result<Dataset, ValidationError> {
    let shares: Vec<f64> = SHIFT_PLAN.iter().map(|(_, _, _, share)| *share).collect();
    let route_list = (0..routes)
        .map(|i| {
            let step = u32::try_from(i * 37 % 100).unwrap_or(0);
            let daily = 3_000.0 + f64::from(step) * 60.0;
            Route::with_shares(format!("R{}", i + 1), daily, shares.clone())
        })
        .collect();
    let shifts = SHIFT_PLAN
        .iter()
        .map(|(id, minutes, min_trips, _)| Shift::new(*id, *minutes).with_min_trips(*min_trips))
        .collect();
    let scale = u32::try_from(routes).unwrap_or(u32::MAX);
    let bus_types = vec![
        BusType::new("Type-I", 60, scale.saturating_mul(60)),
        BusType::new("Type-II", 90, scale.saturating_mul(10)).with_cost_per_trip(1.4),
    ];
    Dataset::new(route_list, shifts, bus_types)
}
