// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Write-temp-then-rename JSON persistence, grounded on the teacher's
//! breadcrumb writer: same temp-file-beside-target, same "remove the temp
//! file if rename fails" discipline, generalized to any serde type and to
//! tolerant reads.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("failed to serialize: {0}")]
    Serialize(serde_json::Error),
    #[error("failed to parse {path}: {source}")]
    Parse { path: String, source: serde_json::Error },
}

/// Serialize `value` as pretty JSON and write it to `path` atomically:
/// write to a sibling `.tmp` file, then rename over the target. Parent
/// directories are created on demand. On rename failure the temp file is
/// removed rather than left behind.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(value).map_err(StoreError::Serialize)?;
    let tmp_path = tmp_sibling(path);

    let write_result = std::fs::write(&tmp_path, json.as_bytes())
        .map_err(StoreError::from)
        .and_then(|()| inherit_permissions(path, &tmp_path).map_err(StoreError::from))
        .and_then(|()| std::fs::rename(&tmp_path, path).map_err(StoreError::from));

    if write_result.is_err() {
        let _ = std::fs::remove_file(&tmp_path);
    }
    write_result
}

/// Read and parse `path` as JSON. Returns `Ok(None)` if the file doesn't
/// exist (the "absent" signal callers should treat idempotently) rather
/// than surfacing `ENOENT` as an error.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let value = serde_json::from_str(&contents)
        .map_err(|source| StoreError::Parse { path: path.display().to_string(), source })?;
    Ok(Some(value))
}

fn tmp_sibling(path: &Path) -> std::path::PathBuf {
    let file_name = path.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
    path.with_file_name(format!("{file_name}.tmp"))
}

/// Best-effort: if the target already exists, copy its permission bits to
/// the temp file so the atomic rename doesn't silently change mode.
fn inherit_permissions(target: &Path, tmp: &Path) -> std::io::Result<()> {
    match std::fs::metadata(target) {
        Ok(meta) => std::fs::set_permissions(tmp, meta.permissions()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::tempdir;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Widget {
        name: String,
        count: u32,
    }

    #[test]
    fn write_then_read_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("widget.json");
        let widget = Widget { name: "gizmo".into(), count: 3 };
        write_json(&path, &widget).unwrap();
        let loaded: Widget = read_json(&path).unwrap().unwrap();
        assert_eq!(loaded, widget);
    }

    #[test]
    fn missing_file_reads_as_none() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent.json");
        let loaded: Option<Widget> = read_json(&path).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn write_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/deep/widget.json");
        write_json(&path, &Widget { name: "a".into(), count: 1 }).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn write_leaves_no_temp_file_behind_on_success() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("widget.json");
        write_json(&path, &Widget { name: "a".into(), count: 1 }).unwrap();
        assert!(!dir.path().join("widget.json.tmp").exists());
    }

    #[test]
    fn corrupt_json_is_a_distinguished_parse_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("widget.json");
        std::fs::write(&path, b"{not json").unwrap();
        let err = read_json::<Widget>(&path).unwrap_err();
        assert!(matches!(err, StoreError::Parse { .. }));
    }
}
