//! Error types emitted by the Headway CLI.
//!
//! Keep this error type reasonably small, as many CLI helpers return
//! `Result<_, CliError>` and the workspace enables `clippy::result_large_err`.

use std::sync::Arc;

use camino::Utf8PathBuf;
use headway_core::{
    BuildError, ReportError, SearchConfigError, SearchError, UnknownBackend,
};
use thiserror::Error;

/// Errors emitted by the Headway CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        field: &'static str,
        env: &'static str,
    },
    /// The backend name matched no solver adapter.
    #[error(transparent)]
    UnknownBackend(#[from] UnknownBackend),
    /// A numeric option was outside its accepted range.
    #[error("{field} must be {expected}, got {value}")]
    InvalidOption {
        field: &'static str,
        expected: &'static str,
        value: f64,
    },
    /// Search settings were rejected before solving.
    #[error(transparent)]
    SearchConfig(#[from] SearchConfigError),
    /// A referenced input path does not exist on disk or is not a file.
    #[error("{field} path {path:?} does not exist or is not a file")]
    MissingSourceFile {
        field: &'static str,
        path: Utf8PathBuf,
    },
    /// A referenced input path could not be inspected due to an IO error.
    #[error("failed to inspect {field} path {path:?}: {source}")]
    InspectSourcePath {
        field: &'static str,
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Reading the dataset file failed.
    #[error("failed to read dataset at {path:?}: {source}")]
    ReadDataset {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Dataset JSON could not be decoded or failed validation.
    #[error("failed to parse dataset JSON at {path:?}: {source}")]
    ParseDataset {
        path: Utf8PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// A single probe could not build its model.
    #[error("failed to build model: {0}")]
    Build(#[from] BuildError),
    /// The buffer search aborted.
    #[error("search failed: {0}")]
    Search(#[from] SearchError),
    /// The accepted solution could not be turned into a report.
    #[error("failed to extract report: {0}")]
    Report(#[from] ReportError),
    /// Serialising the command output failed.
    #[error("failed to serialise output: {0}")]
    SerialiseOutput(#[source] serde_json::Error),
    /// Writing the command output to stdout failed.
    #[error("failed to write output: {0}")]
    WriteOutput(#[source] std::io::Error),
    /// Writing the command output to a file failed.
    #[error("failed to write output to {path:?}: {source}")]
    WriteOutputFile {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
}
