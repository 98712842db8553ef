// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Town-root discovery (§4.2).

use crate::error::WorkspaceError;
use std::path::{Path, PathBuf};

/// Walk up from `start` looking for the town root: the directory that
/// contains `mayor/town.json` (primary signal), or failing that,
/// `mayor/` alone (secondary fallback, e.g. a town mid-provisioning
/// before `town.json` is written).
pub fn find_town_root(start: &Path) -> Result<PathBuf, WorkspaceError> {
    let mut dir = if start.is_file() { start.parent() } else { Some(start) };

    let mut fallback: Option<PathBuf> = None;
    while let Some(d) = dir {
        if d.join("mayor").join("town.json").is_file() {
            return Ok(d.to_path_buf());
        }
        if fallback.is_none() && d.join("mayor").is_dir() {
            fallback = Some(d.to_path_buf());
        }
        dir = d.parent();
    }

    fallback.ok_or_else(|| WorkspaceError::NotInTown(start.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn finds_root_via_town_json() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("mayor")).unwrap();
        std::fs::write(dir.path().join("mayor/town.json"), "{}").unwrap();
        let nested = dir.path().join("gastown/crew/alice");
        std::fs::create_dir_all(&nested).unwrap();

        let root = find_town_root(&nested).unwrap();
        assert_eq!(root, dir.path());
    }

    #[test]
    fn falls_back_to_bare_mayor_dir() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("mayor")).unwrap();
        let nested = dir.path().join("gastown");
        std::fs::create_dir_all(&nested).unwrap();

        let root = find_town_root(&nested).unwrap();
        assert_eq!(root, dir.path());
    }

    #[test]
    fn prefers_town_json_over_closer_bare_mayor() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("mayor")).unwrap();
        std::fs::write(dir.path().join("mayor/town.json"), "{}").unwrap();
        let inner = dir.path().join("nested/mayor");
        std::fs::create_dir_all(&inner).unwrap();

        let root = find_town_root(&inner).unwrap();
        assert_eq!(root, dir.path());
    }

    #[test]
    fn errors_outside_any_town() {
        let dir = tempdir().unwrap();
        let err = find_town_root(dir.path());
        assert!(err.is_err());
    }
}
