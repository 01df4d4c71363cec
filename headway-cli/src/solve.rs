//! Solve command implementation for the Headway CLI.

use std::io::Write;
use std::time::Duration;

use camino::Utf8PathBuf;
use clap::Parser;
use headway_core::{
    AssignmentReport, ExhaustionReason, FeasibilityRepair, ModelBuilder, Probe, SearchConfig,
    SearchOutcome, SolverBackend, extract,
};
use headway_solver_lp::{DEFAULT_SOLVE_TIME_LIMIT, adapter_with_time_limit};
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::input::{load_dataset_file, require_existing};
use crate::output::emit;
use crate::{
    ARG_BACKEND, ARG_BUFFER_MAX, ARG_BUFFER_STEP, ARG_GROWTH_FACTOR, ARG_MAX_ITERATIONS,
    ARG_OUTPUT, ARG_SOLVE_DATASET, ARG_SOLVE_TIME_LIMIT_SECS, ARG_TIME_BUDGET_SECS, ARG_TOLERANCE,
    CliError, ENV_SOLVE_DATASET,
};

/// CLI arguments for the `solve` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Allocate buses to routes and shifts. When the fleet cannot \
                 cover every demand row, the demand buffer is widened by \
                 bracketing and then bisected until the smallest feasible \
                 buffer is found within the tolerance.",
    about = "Search for the smallest feasible demand buffer"
)]
#[ortho_config(prefix = "HEADWAY")]
pub(crate) struct SolveArgs {
    /// Path to a JSON dataset document.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) dataset_path: Option<Utf8PathBuf>,
    /// Solver backend: `lp` or `integer`.
    #[arg(long = ARG_BACKEND, value_name = "name")]
    #[serde(default)]
    pub(crate) backend: Option<String>,
    /// First non-zero buffer, in passengers.
    #[arg(long = ARG_BUFFER_STEP, value_name = "passengers")]
    #[serde(default)]
    pub(crate) buffer_step: Option<f64>,
    /// Multiplier applied while bracketing; 1 scans linearly.
    #[arg(long = ARG_GROWTH_FACTOR, value_name = "factor")]
    #[serde(default)]
    pub(crate) growth_factor: Option<f64>,
    /// Largest buffer tried; defaults to the total daily demand.
    #[arg(long = ARG_BUFFER_MAX, value_name = "passengers")]
    #[serde(default)]
    pub(crate) buffer_max: Option<f64>,
    /// Bracket width at which bisection stops.
    #[arg(long = ARG_TOLERANCE, value_name = "passengers")]
    #[serde(default)]
    pub(crate) tolerance: Option<f64>,
    /// Maximum number of solver calls.
    #[arg(long = ARG_MAX_ITERATIONS, value_name = "count")]
    #[serde(default)]
    pub(crate) max_iterations: Option<u32>,
    /// Wall-clock budget for the whole search.
    #[arg(long = ARG_TIME_BUDGET_SECS, value_name = "seconds")]
    #[serde(default)]
    pub(crate) time_budget_secs: Option<f64>,
    /// Wall-clock limit for each solver call; defaults to 60 seconds.
    #[arg(long = ARG_SOLVE_TIME_LIMIT_SECS, value_name = "seconds")]
    #[serde(default)]
    pub(crate) solve_time_limit_secs: Option<f64>,
    /// Write the JSON output here instead of stdout.
    #[arg(long = ARG_OUTPUT, value_name = "path")]
    #[serde(default)]
    pub(crate) output: Option<Utf8PathBuf>,
}

impl SolveArgs {
    pub(crate) fn into_config(self) -> Result<SolveConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        SolveConfig::try_from(merged)
    }
}

/// Resolved `solve` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SolveConfig {
    pub(crate) dataset_path: Utf8PathBuf,
    pub(crate) backend: SolverBackend,
    pub(crate) search: SearchConfig,
    pub(crate) solve_time_limit: Duration,
    pub(crate) output: Option<Utf8PathBuf>,
}

impl TryFrom<SolveArgs> for SolveConfig {
    type Error = CliError;

    fn try_from(args: SolveArgs) -> Result<Self, Self::Error> {
        let dataset_path = args.dataset_path.ok_or(CliError::MissingArgument {
            field: ARG_SOLVE_DATASET,
            env: ENV_SOLVE_DATASET,
        })?;
        let backend = match args.backend {
            Some(name) => name.parse()?,
            None => SolverBackend::default(),
        };

        let defaults = SearchConfig::default();
        let time_budget = args
            .time_budget_secs
            .map(|secs| seconds(ARG_TIME_BUDGET_SECS, secs))
            .transpose()?;
        let solve_time_limit = args
            .solve_time_limit_secs
            .map_or(Ok(DEFAULT_SOLVE_TIME_LIMIT), |secs| {
                seconds(ARG_SOLVE_TIME_LIMIT_SECS, secs)
            })?;
        let search = SearchConfig {
            buffer_step: args.buffer_step.unwrap_or(defaults.buffer_step),
            buffer_growth_factor: args.growth_factor.unwrap_or(defaults.buffer_growth_factor),
            buffer_max: args.buffer_max,
            tolerance: args.tolerance.unwrap_or(defaults.tolerance),
            max_search_iterations: args.max_iterations.unwrap_or(defaults.max_search_iterations),
            time_budget,
        };
        search.validate()?;

        Ok(Self {
            dataset_path,
            backend,
            search,
            solve_time_limit,
            output: args.output,
        })
    }
}

fn seconds(field: &'static str, secs: f64) -> Result<Duration, CliError> {
    Duration::try_from_secs_f64(secs).map_err(|_| CliError::InvalidOption {
        field,
        expected: "a non-negative number of seconds",
        value: secs,
    })
}

/// How the search ended, without the solved model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub(crate) enum OutcomeSummary {
    Resolved {
        buffer: f64,
        largest_infeasible_buffer: Option<f64>,
        converged: bool,
    },
    Unresolved {
        reason: ExhaustionReason,
        largest_infeasible_buffer: f64,
        buffer_max: f64,
    },
}

/// JSON document printed by `solve`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct SolveOutput {
    pub(crate) backend: SolverBackend,
    pub(crate) outcome: OutcomeSummary,
    pub(crate) probes: Vec<Probe>,
    pub(crate) report: Option<AssignmentReport>,
}

pub(super) fn run_solve(args: SolveArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_solve_with(args, &mut stdout)
}

pub(super) fn run_solve_with(args: SolveArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let config = resolve_solve_config(args)?;
    let output = execute_solve(&config)?;
    emit(config.output.as_deref(), writer, &output)
}

fn resolve_solve_config(args: SolveArgs) -> Result<SolveConfig, CliError> {
    let config = args.into_config()?;
    require_existing(&config.dataset_path, ARG_SOLVE_DATASET)?;
    Ok(config)
}

pub(crate) fn execute_solve(config: &SolveConfig) -> Result<SolveOutput, CliError> {
    let file = load_dataset_file(&config.dataset_path)?;
    let builder = ModelBuilder::with_policy(&file.dataset, file.policy);
    let solver = adapter_with_time_limit(config.backend, config.solve_time_limit);
    let outcome = FeasibilityRepair::new(builder, solver.as_ref(), &config.search).run()?;

    let output = match outcome {
        SearchOutcome::Resolved(resolution) => {
            let report = extract(&file.dataset, &resolution.model, &resolution.result)?;
            SolveOutput {
                backend: config.backend,
                outcome: OutcomeSummary::Resolved {
                    buffer: resolution.buffer,
                    largest_infeasible_buffer: resolution.largest_infeasible_buffer,
                    converged: resolution.converged,
                },
                probes: resolution.probes,
                report: Some(report),
            }
        }
        SearchOutcome::Unresolved(unresolved) => SolveOutput {
            backend: config.backend,
            outcome: OutcomeSummary::Unresolved {
                reason: unresolved.reason,
                largest_infeasible_buffer: unresolved.largest_infeasible_buffer,
                buffer_max: unresolved.buffer_max,
            },
            probes: unresolved.probes,
            report: None,
        },
    };
    Ok(output)
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<SolveConfig, CliError> {
    let merged = SolveArgs::merge_from_layers(layers).map_err(CliError::from)?;
    SolveConfig::try_from(merged)
}
