// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `RefineryManager` (§4.8): the per-rig singleton worktree under
//! `refinery/rig/`, backed by the same worktree machinery as
//! [`crate::polecat::PolecatManager`]. Additionally exposes read-only
//! queue/MR introspection over `type=merge_request` issue records —
//! merge decisions themselves are agent-driven and out of scope here
//! (see DESIGN.md).

use gastown_issues::{IssueStore, ListFilter};
use std::path::PathBuf;
use std::sync::Arc;

use crate::error::WorkersError;
use crate::git::Git;
use crate::redirect::write_redirect;
use crate::state::WorkerState;
use chrono::Utc;
use gastown_workspace::WorkspaceResolver;

pub const MERGE_REQUEST_TYPE: &str = "merge_request";

fn source_label(branch: &str) -> String {
    format!("source:{branch}")
}

fn target_label(branch: &str) -> String {
    format!("target:{branch}")
}

/// A queued merge request as surfaced to the refinery agent (read-only
/// projection of a `type=merge_request` issue record).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeRequestSummary {
    pub id: String,
    pub source_branch: String,
    pub target_branch: String,
    pub open: bool,
    /// Queue position, 0-indexed, ordered oldest-first among open MRs.
    pub queue_position: usize,
}

pub struct RefineryManager<G: Git> {
    git: Arc<G>,
    store: Arc<dyn IssueStore>,
    resolver: WorkspaceResolver,
}

impl<G: Git> RefineryManager<G> {
    pub fn new(git: Arc<G>, store: Arc<dyn IssueStore>, resolver: WorkspaceResolver) -> Self {
        Self { git, store, resolver }
    }

    fn workspace(&self, rig: &str) -> PathBuf {
        self.resolver.rig_root(rig).join("refinery").join("rig")
    }

    fn bare_repo(&self, rig: &str) -> PathBuf {
        self.resolver.rig_root(rig).join(".repo.git")
    }

    /// Provision the singleton refinery worktree. Idempotent: a second
    /// call against an existing workspace is a no-op success.
    pub fn ensure(&self, rig: &str) -> Result<WorkerState, WorkersError> {
        let workspace = self.workspace(rig);
        if let Some(state) = WorkerState::load(&workspace, rig)? {
            return Ok(state);
        }

        if let Some(parent) = workspace.parent() {
            std::fs::create_dir_all(parent).map_err(gastown_core::CoreError::Io)?;
        }
        let outcome = self.try_ensure(&workspace, rig);
        if outcome.is_err() && workspace.exists() {
            let _ = std::fs::remove_dir_all(&workspace);
        }
        outcome
    }

    fn try_ensure(&self, workspace: &std::path::Path, rig: &str) -> Result<WorkerState, WorkersError> {
        let bare_repo = self.bare_repo(rig);
        self.git.worktree_add(&bare_repo, workspace, None)?;
        std::fs::create_dir_all(workspace.join("mail")).map_err(gastown_core::CoreError::Io)?;

        let canonical = self.resolver.canonical_beads(rig);
        if canonical.is_dir() {
            write_redirect(workspace, &canonical)?;
        }

        let branch = self.git.current_branch(workspace)?;
        let now = Utc::now();
        let mut state = WorkerState::new("refinery", rig, workspace, now);
        state.branch = Some(branch);
        state.save(workspace)?;
        Ok(state)
    }

    /// Open merge requests targeting `rig`, oldest-first, with queue
    /// position assigned in that order. Never mutates the underlying
    /// records — transitions (merge, reject, requeue) are the agent's
    /// responsibility.
    pub fn pending_merge_requests(&self, rig: &str) -> Result<Vec<MergeRequestSummary>, WorkersError> {
        let filter = ListFilter::new()
            .issue_type(MERGE_REQUEST_TYPE)
            .status(gastown_issues::IssueStatus::Open)
            .sort(gastown_issues::SortOrder::OldestFirst);
        let records = self.store.list(&filter)?;

        let mut summaries: Vec<MergeRequestSummary> = records
            .into_iter()
            .filter(|r| r.assignee == format!("{rig}/refinery"))
            .map(|r| MergeRequestSummary {
                id: r.id.clone(),
                source_branch: r.label_values("source:").next().unwrap_or_default().to_string(),
                target_branch: r.label_values("target:").next().unwrap_or_default().to_string(),
                open: r.status == gastown_issues::IssueStatus::Open,
                queue_position: 0,
            })
            .collect();

        for (i, summary) in summaries.iter_mut().enumerate() {
            summary.queue_position = i;
        }
        Ok(summaries)
    }

    /// Convenience for test/health callers: the labels a caller creating
    /// a merge-request record against this refinery should attach.
    pub fn merge_request_labels(source_branch: &str, target_branch: &str) -> Vec<String> {
        vec![source_label(source_branch), target_label(target_branch)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake_git::FakeGit;
    use gastown_issues::{FakeIssueStore, NewIssue};
    use tempfile::tempdir;

    fn resolver(town_root: &std::path::Path) -> WorkspaceResolver {
        WorkspaceResolver::from_town_root(town_root)
    }

    #[test]
    fn ensure_is_idempotent() {
        let town = tempdir().unwrap();
        let git = Arc::new(FakeGit::new());
        let store = Arc::new(FakeIssueStore::new());
        let mgr = RefineryManager::new(git, store, resolver(town.path()));

        let first = mgr.ensure("gastown").unwrap();
        let second = mgr.ensure("gastown").unwrap();
        assert_eq!(first.path, second.path);
    }

    #[test]
    fn pending_merge_requests_are_ordered_oldest_first() {
        let town = tempdir().unwrap();
        let git = Arc::new(FakeGit::new());
        let store = Arc::new(FakeIssueStore::new());
        let mgr = RefineryManager::new(git, store.clone(), resolver(town.path()));

        for (source, target) in [("crew/alice", "main"), ("crew/bob", "main")] {
            store
                .create(NewIssue {
                    title: format!("merge {source} into {target}"),
                    issue_type: MERGE_REQUEST_TYPE.to_string(),
                    assignee: "gastown/refinery".to_string(),
                    body: String::new(),
                    priority: 2,
                    labels: RefineryManager::<FakeGit>::merge_request_labels(source, target),
                    actor: "gastown/alice".to_string(),
                    ephemeral: false,
                })
                .unwrap();
        }

        let pending = mgr.pending_merge_requests("gastown").unwrap();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].source_branch, "crew/alice");
        assert_eq!(pending[0].queue_position, 0);
        assert_eq!(pending[1].source_branch, "crew/bob");
        assert_eq!(pending[1].queue_position, 1);
    }

    #[test]
    fn ignores_merge_requests_assigned_to_a_different_rig() {
        let town = tempdir().unwrap();
        let git = Arc::new(FakeGit::new());
        let store = Arc::new(FakeIssueStore::new());
        let mgr = RefineryManager::new(git, store.clone(), resolver(town.path()));

        store
            .create(NewIssue {
                title: "merge".to_string(),
                issue_type: MERGE_REQUEST_TYPE.to_string(),
                assignee: "other-rig/refinery".to_string(),
                body: String::new(),
                priority: 2,
                labels: RefineryManager::<FakeGit>::merge_request_labels("crew/alice", "main"),
                actor: "other-rig/alice".to_string(),
                ephemeral: false,
            })
            .unwrap();

        assert!(mgr.pending_merge_requests("gastown").unwrap().is_empty());
    }
}
