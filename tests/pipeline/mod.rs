mod artifacts;
mod end_to_end;

use serde_json::Value;
use std::path::PathBuf;
use tempfile::TempDir;

/// Write `artifact` as JSON into `dir` and return its path
pub fn write_artifact(dir: &TempDir, name: &str, artifact: &Value) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, serde_json::to_vec_pretty(artifact).unwrap()).unwrap();
    path
}
