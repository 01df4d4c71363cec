//! Probe command: build and solve one model at a fixed buffer.

use std::io::Write;

use camino::Utf8PathBuf;
use clap::Parser;
use headway_core::{AssignmentReport, ModelBuilder, SolveStatus, SolverBackend, extract};
use headway_solver_lp::adapter_for;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::input::{load_dataset_file, require_existing};
use crate::output::emit;
use crate::{
    ARG_BACKEND, ARG_BUFFER, ARG_OUTPUT, ARG_PROBE_DATASET, CliError, ENV_PROBE_BUFFER,
    ENV_PROBE_DATASET,
};

/// CLI arguments for the `probe` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Build the allocation model for one buffer value and solve \
                 it once. Prints the solver status and, when the model is \
                 feasible, the assignment report.",
    about = "Solve the model once at a fixed buffer"
)]
#[ortho_config(prefix = "HEADWAY")]
pub(crate) struct ProbeArgs {
    /// Path to a JSON dataset document.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) dataset_path: Option<Utf8PathBuf>,
    /// Solver backend: `lp` or `integer`.
    #[arg(long = ARG_BACKEND, value_name = "name")]
    #[serde(default)]
    pub(crate) backend: Option<String>,
    /// Demand buffer subtracted from every route and shift.
    #[arg(long = ARG_BUFFER, value_name = "passengers")]
    #[serde(default)]
    pub(crate) buffer: Option<f64>,
    /// Write the JSON output here instead of stdout.
    #[arg(long = ARG_OUTPUT, value_name = "path")]
    #[serde(default)]
    pub(crate) output: Option<Utf8PathBuf>,
}

impl ProbeArgs {
    pub(crate) fn into_config(self) -> Result<ProbeConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        ProbeConfig::try_from(merged)
    }
}

/// Resolved `probe` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ProbeConfig {
    pub(crate) dataset_path: Utf8PathBuf,
    pub(crate) backend: SolverBackend,
    pub(crate) buffer: f64,
    pub(crate) output: Option<Utf8PathBuf>,
}

impl TryFrom<ProbeArgs> for ProbeConfig {
    type Error = CliError;

    fn try_from(args: ProbeArgs) -> Result<Self, Self::Error> {
        let dataset_path = args.dataset_path.ok_or(CliError::MissingArgument {
            field: ARG_PROBE_DATASET,
            env: ENV_PROBE_DATASET,
        })?;
        let buffer = args.buffer.ok_or(CliError::MissingArgument {
            field: ARG_BUFFER,
            env: ENV_PROBE_BUFFER,
        })?;
        let backend = match args.backend {
            Some(name) => name.parse()?,
            None => SolverBackend::default(),
        };
        Ok(Self {
            dataset_path,
            backend,
            buffer,
            output: args.output,
        })
    }
}

/// JSON document printed by `probe`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct ProbeOutput {
    pub(crate) backend: SolverBackend,
    pub(crate) buffer: f64,
    pub(crate) status: SolveStatus,
    pub(crate) objective: Option<f64>,
    pub(crate) solve_time_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) message: Option<String>,
    pub(crate) report: Option<AssignmentReport>,
}

pub(super) fn run_probe(args: ProbeArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_probe_with(args, &mut stdout)
}

pub(super) fn run_probe_with(args: ProbeArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    let config = args.into_config()?;
    require_existing(&config.dataset_path, ARG_PROBE_DATASET)?;
    let output = execute_probe(&config)?;
    emit(config.output.as_deref(), writer, &output)
}

pub(crate) fn execute_probe(config: &ProbeConfig) -> Result<ProbeOutput, CliError> {
    let file = load_dataset_file(&config.dataset_path)?;
    let built = ModelBuilder::with_policy(&file.dataset, file.policy).build(config.buffer)?;
    let solver = adapter_for(config.backend);
    let result = solver.solve(&built.model);
    log::info!(
        "probe with {} at buffer {}: {:?}",
        solver.name(),
        config.buffer,
        result.status
    );

    let report = if result.status.is_feasible() {
        Some(extract(&file.dataset, &built, &result)?)
    } else {
        None
    };
    Ok(ProbeOutput {
        backend: config.backend,
        buffer: config.buffer,
        status: result.status,
        objective: result.objective,
        solve_time_ms: u64::try_from(result.solve_time.as_millis()).unwrap_or(u64::MAX),
        message: result.message,
        report,
    })
}
