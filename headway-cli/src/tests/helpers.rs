//! Test helpers for writing dataset documents into temporary workspaces.

use camino::{Utf8Path, Utf8PathBuf};
use serde_json::{Value, json};
use tempfile::TempDir;

/// Temporary directory holding dataset documents and command output.
pub(super) struct Workspace {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl Workspace {
    pub(super) fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 workspace");
        Self { _dir: dir, root }
    }

    pub(super) fn path(&self, name: &str) -> Utf8PathBuf {
        self.root.join(name)
    }

    /// Write `document` as `name` and return its path.
    pub(super) fn write_json(&self, name: &str, document: &Value) -> Utf8PathBuf {
        let path = self.path(name);
        let payload = serde_json::to_string_pretty(document).expect("serialise document");
        write_utf8(&path, payload.as_bytes());
        path
    }
}

pub(super) fn write_utf8(path: &Utf8Path, contents: &[u8]) {
    std::fs::write(path.as_std_path(), contents).expect("write test file");
}

/// One route over one 600-minute shift served by a single bus type.
pub(super) fn single_route_document(demand: f64, capacity: u32, fleet_size: u32) -> Value {
    json!({
        "dataset": {
            "routes": [
                { "id": "R1", "demand": { "shares": { "daily": demand, "shares": [1.0] } } }
            ],
            "shifts": [{ "id": "day", "duration_minutes": 600 }],
            "bus_types": [{ "id": "Type-I", "capacity": capacity, "fleet_size": fleet_size }]
        }
    })
}
