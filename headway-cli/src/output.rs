//! Writing command results as pretty JSON.

use std::io::Write;

use camino::Utf8Path;
use serde::Serialize;

use crate::CliError;

/// Serialise `value` and write it to `path`, or to `writer` when no path is
/// given.
pub(crate) fn emit<T: Serialize>(
    path: Option<&Utf8Path>,
    writer: &mut dyn Write,
    value: &T,
) -> Result<(), CliError> {
    let mut payload = serde_json::to_string_pretty(value).map_err(CliError::SerialiseOutput)?;
    payload.push('\n');
    match path {
        Some(target) => {
            headway_fs::write_utf8(target, &payload).map_err(|source| CliError::WriteOutputFile {
                path: target.to_path_buf(),
                source,
            })?;
            log::info!("wrote output to {target}");
            Ok(())
        }
        None => writer
            .write_all(payload.as_bytes())
            .map_err(CliError::WriteOutput),
    }
}
