//! Atomic project writes.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use minrand_model::Project;

use crate::error::{Result, StoreError};
use crate::io::hash::canonical_json;

/// Write `project` to `path` through a temp file, fsync and rename, so a
/// reader sees either the old document or the new one.
pub fn write_project(project: &Project, path: &Path) -> Result<()> {
    let bytes = canonical_json(project)?;
    let temp_path = path.with_extension("json.tmp");

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| StoreError::Io {
            operation: "create directory",
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    let mut file = File::create(&temp_path).map_err(|e| StoreError::Io {
        operation: "create",
        path: temp_path.clone(),
        source: e,
    })?;

    file.write_all(&bytes).map_err(|e| StoreError::Io {
        operation: "write",
        path: temp_path.clone(),
        source: e,
    })?;

    file.sync_all().map_err(|e| StoreError::Io {
        operation: "sync",
        path: temp_path.clone(),
        source: e,
    })?;

    fs::rename(&temp_path, path).map_err(|e| StoreError::AtomicWriteFailed {
        temp_path: temp_path.clone(),
        target_path: path.to_path_buf(),
        source: e,
    })?;

    tracing::debug!("Saved project to {}", path.display());
    Ok(())
}
