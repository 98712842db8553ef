// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared `state.json` round-trip for crew/polecat/refinery workspaces
//! (§3 "State file invariants"): the on-disk directory name and path are
//! authoritative over whatever the file itself records. Implemented
//! once here and reused by every role-specific manager rather than
//! duplicated per role (SPEC_FULL §4.8).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::WorkersError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerState {
    #[serde(rename = "type", default = "worker_state_type_tag")]
    pub type_tag: String,
    #[serde(default = "worker_state_version")]
    pub version: u32,
    pub name: String,
    pub rig: String,
    pub path: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn worker_state_type_tag() -> String {
    WorkerState::TYPE_TAG.to_string()
}

fn worker_state_version() -> u32 {
    WorkerState::MAX_VERSION
}

impl WorkerState {
    pub const TYPE_TAG: &'static str = "worker_state";
    pub const MAX_VERSION: u32 = 1;

    pub fn new(name: impl Into<String>, rig: impl Into<String>, path: impl Into<PathBuf>, now: DateTime<Utc>) -> Self {
        Self {
            type_tag: Self::TYPE_TAG.to_string(),
            version: Self::MAX_VERSION,
            name: name.into(),
            rig: rig.into(),
            path: path.into(),
            branch: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn state_path(workspace: &Path) -> PathBuf {
        workspace.join("state.json")
    }

    /// Persist via the atomic write-temp-then-rename primitive.
    pub fn save(&self, workspace: &Path) -> Result<(), WorkersError> {
        gastown_store::write_json(&Self::state_path(workspace), self)?;
        Ok(())
    }

    /// Load `state.json` from `workspace`, then overwrite `name`/`path`
    /// with what the directory itself says — the on-disk layout is
    /// authoritative, the file only backfills truly-absent fields
    /// (branch, timestamps) if it's missing entirely.
    pub fn load(workspace: &Path, rig: &str) -> Result<Option<Self>, WorkersError> {
        let Some(mut state) = gastown_store::read_json::<Self>(&Self::state_path(workspace))? else {
            return Ok(None);
        };
        state.name = directory_name(workspace)?;
        state.path = workspace.to_path_buf();
        state.rig = rig.to_string();
        Ok(Some(state))
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}

fn directory_name(workspace: &Path) -> Result<String, WorkersError> {
    workspace
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or_else(|| WorkersError::Core(gastown_core::CoreError::invalid(format!("no directory name for {}", workspace.display()))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn now() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn round_trips_through_save_and_load() {
        let dir = tempdir().unwrap();
        let workspace = dir.path().join("alice");
        std::fs::create_dir_all(&workspace).unwrap();

        let state = WorkerState::new("alice", "gastown", &workspace, now());
        state.save(&workspace).unwrap();

        let loaded = WorkerState::load(&workspace, "gastown").unwrap().unwrap();
        assert_eq!(loaded.name, "alice");
        assert_eq!(loaded.path, workspace);
    }

    #[test]
    fn directory_name_overrides_stale_name_in_file() {
        let dir = tempdir().unwrap();
        let original = dir.path().join("alice");
        std::fs::create_dir_all(&original).unwrap();
        WorkerState::new("alice", "gastown", &original, now()).save(&original).unwrap();

        let renamed = dir.path().join("alicia");
        std::fs::rename(&original, &renamed).unwrap();

        let loaded = WorkerState::load(&renamed, "gastown").unwrap().unwrap();
        assert_eq!(loaded.name, "alicia");
        assert_eq!(loaded.path, renamed);
    }

    #[test]
    fn missing_state_file_is_none() {
        let dir = tempdir().unwrap();
        assert!(WorkerState::load(dir.path(), "gastown").unwrap().is_none());
    }
}
