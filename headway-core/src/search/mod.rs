//! Feasibility-repair search over the demand buffer.
//!
//! Feasibility is monotone in the buffer: a model that is feasible at `b`
//! stays feasible at every larger buffer. The search first probes `b = 0`,
//! then brackets the threshold by growing the buffer geometrically (or by a
//! fixed step when the growth factor is one), and finally bisects the
//! bracket until it is narrower than the configured tolerance. Every probe is
//! a fresh build and solve; nothing is carried between solver calls except
//! the bracket bounds.

use std::time::{Duration, Instant};

use thiserror::Error;

use crate::builder::{BuildError, BuiltModel, ModelBuilder};
use crate::solver::{SolveResult, SolveStatus, SolverAdapter};

/// Tuning knobs of the buffer search.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SearchConfig {
    /// First non-zero buffer tried, and the increment when
    /// `buffer_growth_factor` is exactly one.
    pub buffer_step: f64,
    /// Multiplier applied to the buffer on each bracketing step.
    pub buffer_growth_factor: f64,
    /// Largest buffer tried; defaults to the dataset's total daily demand.
    pub buffer_max: Option<f64>,
    /// Bracket width at which bisection stops.
    pub tolerance: f64,
    /// Upper bound on solver calls, including the initial strict probe.
    pub max_search_iterations: u32,
    /// Wall-clock budget for the whole search.
    pub time_budget: Option<Duration>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            buffer_step: 1.0,
            buffer_growth_factor: 2.0,
            buffer_max: None,
            tolerance: 0.5,
            max_search_iterations: 64,
            time_budget: None,
        }
    }
}

impl SearchConfig {
    /// Check that the search terminates and progresses.
    pub fn validate(&self) -> Result<(), SearchConfigError> {
        if !self.buffer_step.is_finite() || self.buffer_step <= 0.0 {
            return Err(SearchConfigError::InvalidStep(self.buffer_step));
        }
        if !self.buffer_growth_factor.is_finite() || self.buffer_growth_factor < 1.0 {
            return Err(SearchConfigError::InvalidGrowthFactor(
                self.buffer_growth_factor,
            ));
        }
        if let Some(limit) = self.buffer_max
            && (!limit.is_finite() || limit < 0.0)
        {
            return Err(SearchConfigError::InvalidBufferMax(limit));
        }
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(SearchConfigError::InvalidTolerance(self.tolerance));
        }
        if self.max_search_iterations == 0 {
            return Err(SearchConfigError::ZeroIterations);
        }
        Ok(())
    }

    fn next_buffer(&self, lower: f64) -> f64 {
        if lower <= 0.0 {
            self.buffer_step
        } else if self.buffer_growth_factor > 1.0 {
            lower * self.buffer_growth_factor
        } else {
            lower + self.buffer_step
        }
    }
}

/// Rejected [`SearchConfig`] values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SearchConfigError {
    /// The buffer step is not a positive finite number.
    #[error("buffer step {0} must be positive and finite")]
    InvalidStep(f64),
    /// The growth factor is below one or not finite.
    #[error("buffer growth factor {0} must be finite and at least 1")]
    InvalidGrowthFactor(f64),
    /// The buffer limit is negative or not finite.
    #[error("buffer limit {0} must be non-negative and finite")]
    InvalidBufferMax(f64),
    /// The tolerance is not a positive finite number.
    #[error("tolerance {0} must be positive and finite")]
    InvalidTolerance(f64),
    /// No solver calls are allowed.
    #[error("the search needs at least one iteration")]
    ZeroIterations,
}

/// Stage of the search that issued a probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SearchPhase {
    /// The unrelaxed model at buffer zero.
    Initial,
    /// Growing the buffer until the model becomes feasible.
    Bracketing,
    /// Bisecting between the infeasible and feasible bounds.
    Refinement,
}

/// Record of one build-and-solve cycle.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Probe {
    /// Buffer the model was built with.
    pub buffer: f64,
    /// Stage that issued the probe.
    pub phase: SearchPhase,
    /// Solver outcome.
    pub status: SolveStatus,
    /// Objective value when feasible.
    pub objective: Option<f64>,
}

/// Why a search stopped without finding a feasible buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ExhaustionReason {
    /// The model stayed infeasible at the buffer limit.
    BufferLimit,
    /// The solver-call budget ran out.
    IterationBudget,
    /// The wall-clock budget ran out.
    TimeBudget,
}

/// The smallest feasible buffer found, with its model and solution.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// Accepted buffer.
    pub buffer: f64,
    /// Largest buffer proven infeasible; `None` when the strict model solved.
    pub largest_infeasible_buffer: Option<f64>,
    /// Whether the bracket was narrowed below the tolerance.
    pub converged: bool,
    /// Model built for `buffer`.
    pub model: BuiltModel,
    /// Solution of `model`.
    pub result: SolveResult,
    /// Every probe in issue order.
    pub probes: Vec<Probe>,
}

/// A search that ended without a feasible model.
///
/// This is a legitimate result rather than an error: infeasibility at full
/// relaxation says the fleet or coverage rules cannot be met at all.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UnresolvedInfeasibility {
    /// Budget or bound that stopped the search.
    pub reason: ExhaustionReason,
    /// Largest buffer proven infeasible.
    pub largest_infeasible_buffer: f64,
    /// Buffer limit the search worked against.
    pub buffer_max: f64,
    /// Every probe in issue order.
    pub probes: Vec<Probe>,
}

/// Terminal result of [`FeasibilityRepair::run`].
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// A feasible buffer was found.
    Resolved(Resolution),
    /// No feasible buffer was found within the configured limits.
    Unresolved(UnresolvedInfeasibility),
}

impl SearchOutcome {
    /// Probes issued by the search.
    #[must_use]
    pub fn probes(&self) -> &[Probe] {
        match self {
            Self::Resolved(resolution) => &resolution.probes,
            Self::Unresolved(unresolved) => &unresolved.probes,
        }
    }

    /// The resolution, when the search succeeded.
    #[must_use]
    pub const fn resolution(&self) -> Option<&Resolution> {
        match self {
            Self::Resolved(resolution) => Some(resolution),
            Self::Unresolved(_) => None,
        }
    }
}

/// Failures that abort the search.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SearchError {
    /// The configuration was rejected before any solve.
    #[error("invalid search configuration: {0}")]
    Config(#[from] SearchConfigError),
    /// A model could not be built.
    #[error("failed to build model: {0}")]
    Build(#[from] BuildError),
    /// The backend faulted; the search never retries.
    #[error("solver {backend} failed at buffer {buffer}: {message}")]
    Solver {
        /// Adapter name.
        backend: &'static str,
        /// Buffer of the failing probe.
        buffer: f64,
        /// Backend diagnostic.
        message: String,
    },
    /// The backend reported an unbounded objective for a model that
    /// minimises non-negative trip costs.
    #[error("solver {backend} reported an unbounded model at buffer {buffer}")]
    Unbounded {
        /// Adapter name.
        backend: &'static str,
        /// Buffer of the failing probe.
        buffer: f64,
    },
}

struct SearchState {
    started_at: Instant,
    probes: Vec<Probe>,
}

/// Drives repeated build-and-solve cycles to find the smallest feasible buffer.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use headway_core::{
///     BusType, ConstraintKind, ConstraintModel, Dataset, FeasibilityRepair, ModelBuilder,
///     Route, SearchConfig, SearchOutcome, Shift, SolveResult, SolveStatus, SolverAdapter,
/// };
///
/// /// Feasible once no demand row asks for more than 400 passengers.
/// struct Ceiling;
///
/// impl SolverAdapter for Ceiling {
///     fn name(&self) -> &'static str {
///         "ceiling"
///     }
///
///     fn solve(&self, model: &ConstraintModel) -> SolveResult {
///         let ok = model
///             .constraints_of(ConstraintKind::DemandFulfilment)
///             .all(|row| row.rhs <= 400.0);
///         if ok {
///             let values = vec![0.0; model.variables().len()];
///             SolveResult::solved(model, SolveStatus::Optimal, values, Duration::ZERO)
///         } else {
///             SolveResult::without_solution(SolveStatus::Infeasible, Duration::ZERO)
///         }
///     }
/// }
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let dataset = Dataset::new(
///     vec![Route::with_shares("R1", 1000.0, vec![1.0])],
///     vec![Shift::new("day", 600)],
///     vec![BusType::new("Type-I", 40, 10)],
/// )?;
/// let config = SearchConfig::default();
/// let search = FeasibilityRepair::new(ModelBuilder::new(&dataset), &Ceiling, &config);
/// let SearchOutcome::Resolved(resolution) = search.run()? else {
///     panic!("expected a feasible buffer");
/// };
/// assert!(resolution.buffer >= 600.0 && resolution.buffer <= 600.0 + config.tolerance);
/// # Ok(())
/// # }
/// ```
pub struct FeasibilityRepair<'a, S: SolverAdapter + ?Sized> {
    builder: ModelBuilder<'a>,
    solver: &'a S,
    config: &'a SearchConfig,
}

impl<'a, S: SolverAdapter + ?Sized> FeasibilityRepair<'a, S> {
    /// Create a search over models produced by `builder`.
    pub const fn new(builder: ModelBuilder<'a>, solver: &'a S, config: &'a SearchConfig) -> Self {
        Self {
            builder,
            solver,
            config,
        }
    }

    /// Buffer above which the search gives up.
    #[must_use]
    pub fn buffer_limit(&self) -> f64 {
        self.config
            .buffer_max
            .unwrap_or_else(|| self.builder.dataset().total_demand())
    }

    /// Run the search to completion.
    ///
    /// With a time budget, every solve is handed the budget still remaining
    /// so that a single slow solve cannot hold the search past it.
    pub fn run(&self) -> Result<SearchOutcome, SearchError> {
        self.config.validate()?;
        let limit = self.buffer_limit();
        let mut state = SearchState {
            started_at: Instant::now(),
            probes: Vec::new(),
        };

        match self.probe(&mut state, 0.0, SearchPhase::Initial)? {
            Verdict::Feasible(model, result) => {
                log::info!("strict model is feasible; no buffer needed");
                return Ok(SearchOutcome::Resolved(Resolution {
                    buffer: 0.0,
                    largest_infeasible_buffer: None,
                    converged: true,
                    model,
                    result,
                    probes: state.probes,
                }));
            }
            Verdict::OutOfTime => {
                return Ok(Self::unresolved(state, ExhaustionReason::TimeBudget, 0.0, limit));
            }
            Verdict::Infeasible => {}
        }

        let mut lower = 0.0_f64;
        let (mut upper, mut best) = loop {
            let reason = if lower >= limit {
                Some(ExhaustionReason::BufferLimit)
            } else {
                self.exhausted(&state)
            };
            if let Some(reason) = reason {
                return Ok(Self::unresolved(state, reason, lower, limit));
            }
            let candidate = self.config.next_buffer(lower).min(limit);
            match self.probe(&mut state, candidate, SearchPhase::Bracketing)? {
                Verdict::Feasible(model, result) => break (candidate, (model, result)),
                Verdict::Infeasible => lower = candidate,
                Verdict::OutOfTime => {
                    return Ok(Self::unresolved(state, ExhaustionReason::TimeBudget, lower, limit));
                }
            }
        };

        let mut converged = true;
        while upper - lower > self.config.tolerance {
            if let Some(reason) = self.exhausted(&state) {
                log::warn!(
                    "bisection stopped early ({reason:?}); bracket ({lower}, {upper}] is wider than {}",
                    self.config.tolerance
                );
                converged = false;
                break;
            }
            let midpoint = lower + (upper - lower) / 2.0;
            match self.probe(&mut state, midpoint, SearchPhase::Refinement)? {
                Verdict::Feasible(model, result) => {
                    upper = midpoint;
                    best = (model, result);
                }
                Verdict::Infeasible => lower = midpoint,
                Verdict::OutOfTime => {
                    log::warn!(
                        "bisection stopped early (TimeBudget); bracket ({lower}, {upper}] is wider than {}",
                        self.config.tolerance
                    );
                    converged = false;
                    break;
                }
            }
        }

        log::info!(
            "feasibility restored at buffer {upper} after {} probes",
            state.probes.len()
        );
        let (model, result) = best;
        Ok(SearchOutcome::Resolved(Resolution {
            buffer: upper,
            largest_infeasible_buffer: Some(lower),
            converged,
            model,
            result,
            probes: state.probes,
        }))
    }

    fn unresolved(
        state: SearchState,
        reason: ExhaustionReason,
        lower: f64,
        limit: f64,
    ) -> SearchOutcome {
        log::warn!(
            "buffer search stopped ({reason:?}); largest infeasible buffer {lower}, limit {limit}"
        );
        SearchOutcome::Unresolved(UnresolvedInfeasibility {
            reason,
            largest_infeasible_buffer: lower,
            buffer_max: limit,
            probes: state.probes,
        })
    }

    fn exhausted(&self, state: &SearchState) -> Option<ExhaustionReason> {
        let calls = u32::try_from(state.probes.len()).unwrap_or(u32::MAX);
        if calls >= self.config.max_search_iterations {
            return Some(ExhaustionReason::IterationBudget);
        }
        self.out_of_time(state).then_some(ExhaustionReason::TimeBudget)
    }

    fn out_of_time(&self, state: &SearchState) -> bool {
        self.config
            .time_budget
            .is_some_and(|budget| state.started_at.elapsed() >= budget)
    }

    /// Build and solve at `buffer`.
    ///
    /// A backend error raised once the time budget has run out is a timeout,
    /// not a fault.
    fn probe(
        &self,
        state: &mut SearchState,
        buffer: f64,
        phase: SearchPhase,
    ) -> Result<Verdict, SearchError> {
        let built = self.builder.build(buffer)?;
        let remaining = self
            .config
            .time_budget
            .map(|budget| budget.saturating_sub(state.started_at.elapsed()));
        let result = match remaining {
            Some(remaining) => self.solver.solve_within(&built.model, remaining),
            None => self.solver.solve(&built.model),
        };
        log::debug!(
            "{phase:?} probe at buffer {buffer}: {} via {} in {:?}",
            result.status,
            self.solver.name(),
            result.solve_time
        );
        state.probes.push(Probe {
            buffer,
            phase,
            status: result.status,
            objective: result.objective,
        });
        match result.status {
            SolveStatus::Optimal | SolveStatus::Feasible => Ok(Verdict::Feasible(built, result)),
            SolveStatus::Infeasible => Ok(Verdict::Infeasible),
            SolveStatus::Unbounded => Err(SearchError::Unbounded {
                backend: self.solver.name(),
                buffer,
            }),
            SolveStatus::Error if self.out_of_time(state) => {
                log::warn!(
                    "{} ran out of time at buffer {buffer}: {}",
                    self.solver.name(),
                    result.message.as_deref().unwrap_or("no diagnostic")
                );
                Ok(Verdict::OutOfTime)
            }
            SolveStatus::Error => Err(SearchError::Solver {
                backend: self.solver.name(),
                buffer,
                message: result
                    .message
                    .unwrap_or_else(|| "unspecified backend failure".to_owned()),
            }),
        }
    }
}

/// What one build-and-solve established about its buffer.
enum Verdict {
    Feasible(BuiltModel, SolveResult),
    Infeasible,
    OutOfTime,
}
