// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory `Git` test double, grounded on `gastown-issues::FakeIssueStore`'s
//! `Arc<Mutex<State>>` convention — manager tests exercise the full
//! Add/Remove/Rename/Freshen contract without touching a real repo.

use crate::error::WorkersError;
use crate::git::Git;
use gastown_core::CoreError;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Default)]
struct State {
    repos: HashSet<PathBuf>,
    branches: HashMap<PathBuf, String>,
    dirty: HashSet<PathBuf>,
    config: HashMap<(PathBuf, String), String>,
    pull_failures: HashSet<PathBuf>,
}

#[derive(Clone, Default)]
pub struct FakeGit {
    state: Arc<Mutex<State>>,
}

impl FakeGit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_dirty(&self, repo: &Path) {
        self.state.lock().dirty.insert(repo.to_path_buf());
    }

    pub fn mark_clean(&self, repo: &Path) {
        self.state.lock().dirty.remove(repo);
    }

    pub fn fail_next_pull(&self, repo: &Path) {
        self.state.lock().pull_failures.insert(repo.to_path_buf());
    }

    pub fn exists(&self, repo: &Path) -> bool {
        self.state.lock().repos.contains(repo)
    }
}

impl Git for FakeGit {
    fn clone(&self, _url: &str, dest: &Path) -> Result<(), WorkersError> {
        std::fs::create_dir_all(dest).map_err(CoreError::Io)?;
        let mut state = self.state.lock();
        state.repos.insert(dest.to_path_buf());
        state.branches.insert(dest.to_path_buf(), "main".to_string());
        Ok(())
    }

    fn clone_with_reference(&self, url: &str, dest: &Path, _reference: &Path) -> Result<(), WorkersError> {
        self.clone(url, dest)
    }

    fn worktree_add(&self, _bare_repo: &Path, dest: &Path, branch: Option<&str>) -> Result<(), WorkersError> {
        std::fs::create_dir_all(dest).map_err(CoreError::Io)?;
        let mut state = self.state.lock();
        state.repos.insert(dest.to_path_buf());
        state.branches.insert(dest.to_path_buf(), branch.unwrap_or("main").to_string());
        Ok(())
    }

    fn worktree_remove(&self, _bare_repo: &Path, worktree: &Path) -> Result<(), WorkersError> {
        self.state.lock().repos.remove(worktree);
        Ok(())
    }

    fn checkout_branch(&self, repo: &Path, branch: &str, _create: bool) -> Result<(), WorkersError> {
        self.state.lock().branches.insert(repo.to_path_buf(), branch.to_string());
        Ok(())
    }

    fn status_is_clean(&self, repo: &Path) -> Result<bool, WorkersError> {
        Ok(!self.state.lock().dirty.contains(repo))
    }

    fn pull_rebase(&self, repo: &Path, _remote: &str, _branch: &str) -> Result<(), WorkersError> {
        let mut state = self.state.lock();
        if state.pull_failures.remove(repo) {
            return Err(WorkersError::Core(CoreError::external_tool("git", Some(1), "simulated pull failure")));
        }
        Ok(())
    }

    fn current_branch(&self, repo: &Path) -> Result<String, WorkersError> {
        self.state
            .lock()
            .branches
            .get(repo)
            .cloned()
            .ok_or_else(|| WorkersError::Core(CoreError::not_found(format!("repo {}", repo.display()))))
    }

    fn config_get(&self, repo: &Path, key: &str) -> Result<Option<String>, WorkersError> {
        Ok(self.state.lock().config.get(&(repo.to_path_buf(), key.to_string())).cloned())
    }

    fn config_set(&self, repo: &Path, key: &str, value: &str) -> Result<(), WorkersError> {
        self.state.lock().config.insert((repo.to_path_buf(), key.to_string()), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clone_creates_directory_and_records_branch() {
        let dir = tempfile::tempdir().unwrap();
        let git = FakeGit::new();
        let dest = dir.path().join("crew/alice");
        git.clone("https://example.test/repo.git", &dest).unwrap();
        assert!(dest.is_dir());
        assert_eq!(git.current_branch(&dest).unwrap(), "main");
    }

    #[test]
    fn dirty_status_blocks_clean_check() {
        let dir = tempfile::tempdir().unwrap();
        let git = FakeGit::new();
        let dest = dir.path().join("crew/alice");
        git.clone("u", &dest).unwrap();
        assert!(git.status_is_clean(&dest).unwrap());
        git.mark_dirty(&dest);
        assert!(!git.status_is_clean(&dest).unwrap());
    }

    #[test]
    fn pull_rebase_can_be_made_to_fail_once() {
        let dir = tempfile::tempdir().unwrap();
        let git = FakeGit::new();
        let dest = dir.path().join("crew/alice");
        git.clone("u", &dest).unwrap();
        git.fail_next_pull(&dest);
        assert!(git.pull_rebase(&dest, "origin", "main").is_err());
        assert!(git.pull_rebase(&dest, "origin", "main").is_ok());
    }
}
