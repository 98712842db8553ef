// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `PolecatManager` (§4.8): short-lived autonomous worker worktrees of a
//! rig's shared bare repo, under `polecats/<name>/<rig>/`. Same
//! Add/Remove/Rename/Freshen contract as [`crate::crew::CrewManager`],
//! specialized to `worktree_add`/`worktree_remove` instead of full
//! clones, and aware of the "new nested" vs "old flat" layout split.

use chrono::Utc;
use gastown_addressing::validate_crew_name;
use gastown_workspace::{is_nested_layout, WorkspaceResolver};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::crew::FreshenReport;
use crate::error::WorkersError;
use crate::git::Git;
use crate::redirect::{ensure_gitignore_patterns, write_redirect};
use crate::state::WorkerState;

pub struct PolecatManager<G: Git> {
    git: Arc<G>,
    resolver: WorkspaceResolver,
}

impl<G: Git> PolecatManager<G> {
    pub fn new(git: Arc<G>, resolver: WorkspaceResolver) -> Self {
        Self { git, resolver }
    }

    fn polecats_root(&self, rig: &str) -> PathBuf {
        self.resolver.polecats_root(rig)
    }

    fn workspace(&self, rig: &str, name: &str) -> PathBuf {
        self.resolver.polecat_workspace(rig, name)
    }

    fn bare_repo(&self, rig: &str) -> PathBuf {
        self.resolver.rig_root(rig).join(".repo.git")
    }

    /// Add a new polecat worktree. Always creates the new nested layout
    /// (`polecats/<name>/<rig>/`) regardless of whether an old flat
    /// layout exists elsewhere in the town (§4.2: path resolution must
    /// handle both transparently, but creation always targets new).
    pub fn add(&self, rig: &str, name: &str, branch: Option<&str>) -> Result<WorkerState, WorkersError> {
        validate_crew_name(name)?;

        let workspace = self.polecats_root(rig).join(name).join(rig);
        if workspace.exists() {
            return Err(WorkersError::AlreadyExists(workspace));
        }
        if let Some(parent) = workspace.parent() {
            std::fs::create_dir_all(parent).map_err(gastown_core::CoreError::Io)?;
        }

        let outcome = self.try_add(&workspace, rig, name, branch);
        if outcome.is_err() && workspace.exists() {
            let _ = std::fs::remove_dir_all(&workspace);
        }
        outcome
    }

    fn try_add(&self, workspace: &Path, rig: &str, name: &str, branch: Option<&str>) -> Result<WorkerState, WorkersError> {
        let bare_repo = self.bare_repo(rig);
        self.git.worktree_add(&bare_repo, workspace, branch)?;

        std::fs::create_dir_all(workspace.join("mail")).map_err(gastown_core::CoreError::Io)?;

        let canonical = self.resolver.canonical_beads(rig);
        if canonical.is_dir() {
            write_redirect(workspace, &canonical)?;
        }

        ensure_gitignore_patterns(workspace)?;

        let current_branch = self.git.current_branch(workspace)?;
        let now = Utc::now();
        let mut state = WorkerState::new(name, rig, workspace, now);
        state.branch = Some(current_branch);
        state.save(workspace)?;

        tracing::info!(
            rig,
            name,
            nested = is_nested_layout(&self.polecats_root(rig), workspace),
            "provisioned polecat worktree"
        );
        Ok(state)
    }

    pub fn get(&self, rig: &str, name: &str) -> Result<Option<WorkerState>, WorkersError> {
        WorkerState::load(&self.workspace(rig, name), rig)
    }

    pub fn remove(&self, rig: &str, name: &str, force: bool) -> Result<(), WorkersError> {
        let workspace = self.workspace(rig, name);
        if !workspace.exists() {
            return Err(WorkersError::Core(gastown_core::CoreError::not_found(format!(
                "polecat workspace {}",
                workspace.display()
            ))));
        }
        if !force && !self.git.status_is_clean(&workspace)? {
            return Err(WorkersError::UncommittedChanges(workspace));
        }
        let bare_repo = self.bare_repo(rig);
        self.git.worktree_remove(&bare_repo, &workspace)?;
        if workspace.exists() {
            std::fs::remove_dir_all(&workspace).map_err(gastown_core::CoreError::Io)?;
        }
        Ok(())
    }

    pub fn freshen(&self, rig: &str, name: &str, remote: &str) -> Result<FreshenReport, WorkersError> {
        let workspace = self.workspace(rig, name);
        let had_uncommitted_changes = !self.git.status_is_clean(&workspace)?;
        let branch = self.git.current_branch(&workspace)?;
        self.git.pull_rebase(&workspace, remote, &branch)?;
        Ok(FreshenReport { had_uncommitted_changes, pulled: true })
    }
}
