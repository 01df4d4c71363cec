//! Command-line interface for the Headway bus allocator.
//!
//! `headway solve` runs the feasibility-repair search over a dataset and
//! prints the outcome, every probe and the assignment report as JSON.
//! `headway probe` solves the model once at a fixed buffer. Options layer
//! over configuration files and `HEADWAY_*` environment variables.
#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};

mod error;
mod input;
mod output;
mod probe;
mod solve;

pub use error::CliError;

use probe::{ProbeArgs, run_probe};
use solve::{SolveArgs, run_solve};

pub(crate) const ARG_SOLVE_DATASET: &str = "dataset";
pub(crate) const ARG_PROBE_DATASET: &str = "dataset";
pub(crate) const ARG_BACKEND: &str = "backend";
pub(crate) const ARG_BUFFER: &str = "buffer";
pub(crate) const ARG_BUFFER_STEP: &str = "buffer-step";
pub(crate) const ARG_GROWTH_FACTOR: &str = "growth-factor";
pub(crate) const ARG_BUFFER_MAX: &str = "buffer-max";
pub(crate) const ARG_TOLERANCE: &str = "tolerance";
pub(crate) const ARG_MAX_ITERATIONS: &str = "max-iterations";
pub(crate) const ARG_TIME_BUDGET_SECS: &str = "time-budget-secs";
pub(crate) const ARG_SOLVE_TIME_LIMIT_SECS: &str = "solve-time-limit-secs";
pub(crate) const ARG_OUTPUT: &str = "output";
pub(crate) const ENV_SOLVE_DATASET: &str = "HEADWAY_CMDS_SOLVE_DATASET_PATH";
pub(crate) const ENV_PROBE_DATASET: &str = "HEADWAY_CMDS_PROBE_DATASET_PATH";
pub(crate) const ENV_PROBE_BUFFER: &str = "HEADWAY_CMDS_PROBE_BUFFER";

/// Run the Headway CLI with the current process arguments and environment.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    match cli.command {
        Command::Solve(args) => run_solve(args),
        Command::Probe(args) => run_probe(args),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "headway",
    about = "Allocate a bus fleet to routes and shifts",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Find the smallest demand buffer that makes the allocation feasible.
    Solve(SolveArgs),
    /// Solve the allocation once at a given buffer.
    Probe(ProbeArgs),
}

#[cfg(test)]
mod tests;
