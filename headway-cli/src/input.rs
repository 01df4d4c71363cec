//! Loading dataset documents from disk.

use camino::Utf8Path;
use headway_core::{AllocationPolicy, Dataset};
use serde::{Deserialize, Serialize};

use crate::CliError;

/// JSON document read by the `solve` and `probe` commands.
///
/// The dataset is validated while it is decoded; the policy is optional.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub(crate) struct DatasetFile {
    pub(crate) dataset: Dataset,
    #[serde(default)]
    pub(crate) policy: AllocationPolicy,
}

/// Ensure `path` names an existing regular file.
pub(crate) fn require_existing(path: &Utf8Path, field: &'static str) -> Result<(), CliError> {
    match headway_fs::is_regular_file(path) {
        Ok(true) => Ok(()),
        Ok(false) => Err(CliError::MissingSourceFile {
            field,
            path: path.to_path_buf(),
        }),
        Err(source) => Err(CliError::InspectSourcePath {
            field,
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Load and validate a [`DatasetFile`].
pub(crate) fn load_dataset_file(path: &Utf8Path) -> Result<DatasetFile, CliError> {
    let contents = headway_fs::read_utf8(path).map_err(|source| CliError::ReadDataset {
        path: path.to_path_buf(),
        source,
    })?;
    let file: DatasetFile =
        serde_json::from_str(&contents).map_err(|source| CliError::ParseDataset {
            path: path.to_path_buf(),
            source,
        })?;
    log::info!(
        "loaded dataset {path}: {} routes, {} shifts, {} bus types",
        file.dataset.routes().len(),
        file.dataset.shifts().len(),
        file.dataset.bus_types().len()
    );
    Ok(file)
}
