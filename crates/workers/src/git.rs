// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `Git`: the adapter seam for every git operation a worker manager
//! needs (§4.8 "plus git"), grounded on the same shell-and-wait pattern
//! as `gastown-issues::ShellIssueStore` and `gastown-session::tmux`:
//! block on `std::process::Command`, poll with a timeout, never panic.

use crate::error::WorkersError;
use gastown_core::CoreError;
use std::path::Path;
use std::process::Command;
use std::time::Duration;

/// Default timeout for git operations (SPEC_FULL §4.3: "30s for git
/// clone/pull").
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub trait Git: Send + Sync {
    fn clone(&self, url: &str, dest: &Path) -> Result<(), WorkersError>;

    /// Clone using `reference` as a local object-database hint
    /// (`--reference`), falling back to a plain clone if the reference
    /// clone fails (§4.8 "preferring a local-reference clone... on
    /// reference failure fall back to plain clone").
    fn clone_with_reference(&self, url: &str, dest: &Path, reference: &Path) -> Result<(), WorkersError>;

    fn worktree_add(&self, bare_repo: &Path, dest: &Path, branch: Option<&str>) -> Result<(), WorkersError>;

    fn worktree_remove(&self, bare_repo: &Path, worktree: &Path) -> Result<(), WorkersError>;

    fn checkout_branch(&self, repo: &Path, branch: &str, create: bool) -> Result<(), WorkersError>;

    /// Whether `git status --porcelain` is empty (no uncommitted changes).
    fn status_is_clean(&self, repo: &Path) -> Result<bool, WorkersError>;

    fn pull_rebase(&self, repo: &Path, remote: &str, branch: &str) -> Result<(), WorkersError>;

    fn current_branch(&self, repo: &Path) -> Result<String, WorkersError>;

    fn config_get(&self, repo: &Path, key: &str) -> Result<Option<String>, WorkersError>;

    fn config_set(&self, repo: &Path, key: &str, value: &str) -> Result<(), WorkersError>;
}

pub struct SystemGit {
    timeout: Duration,
}

impl SystemGit {
    pub fn new() -> Self {
        Self { timeout: DEFAULT_TIMEOUT }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }

    fn run(&self, cwd: Option<&Path>, args: &[&str]) -> Result<(bool, String, String), WorkersError> {
        let mut cmd = Command::new("git");
        cmd.args(args);
        if let Some(cwd) = cwd {
            cmd.current_dir(cwd);
        }
        let mut child = cmd
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .spawn()
            .map_err(CoreError::Io)?;

        let start = std::time::Instant::now();
        loop {
            match child.try_wait().map_err(CoreError::Io)? {
                Some(status) => {
                    use std::io::Read;
                    let mut stdout = String::new();
                    let mut stderr = String::new();
                    if let Some(mut out) = child.stdout.take() {
                        let _ = out.read_to_string(&mut stdout);
                    }
                    if let Some(mut err) = child.stderr.take() {
                        let _ = err.read_to_string(&mut stderr);
                    }
                    return Ok((status.success(), stdout, stderr));
                }
                None => {
                    if start.elapsed() > self.timeout {
                        let _ = child.kill();
                        let _ = child.wait();
                        return Err(WorkersError::Core(CoreError::Timeout {
                            op: format!("git {}", args.join(" ")),
                            after: self.timeout,
                        }));
                    }
                    std::thread::sleep(Duration::from_millis(20));
                }
            }
        }
    }

    fn run_ok(&self, cwd: Option<&Path>, args: &[&str]) -> Result<(), WorkersError> {
        let (ok, _, stderr) = self.run(cwd, args)?;
        if !ok {
            return Err(WorkersError::Core(CoreError::external_tool("git", None, stderr)));
        }
        Ok(())
    }
}

impl Default for SystemGit {
    fn default() -> Self {
        Self::new()
    }
}

impl Git for SystemGit {
    fn clone(&self, url: &str, dest: &Path) -> Result<(), WorkersError> {
        self.run_ok(None, &["clone", url, &dest.display().to_string()])
    }

    fn clone_with_reference(&self, url: &str, dest: &Path, reference: &Path) -> Result<(), WorkersError> {
        let dest_str = dest.display().to_string();
        let reference_str = reference.display().to_string();
        match self.run_ok(None, &["clone", "--reference", &reference_str, url, &dest_str]) {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::warn!(error = %e, "reference clone failed, falling back to plain clone");
                self.clone(url, dest)
            }
        }
    }

    fn worktree_add(&self, bare_repo: &Path, dest: &Path, branch: Option<&str>) -> Result<(), WorkersError> {
        let dest_str = dest.display().to_string();
        match branch {
            Some(branch) => self.run_ok(Some(bare_repo), &["worktree", "add", &dest_str, branch]),
            None => self.run_ok(Some(bare_repo), &["worktree", "add", &dest_str]),
        }
    }

    fn worktree_remove(&self, bare_repo: &Path, worktree: &Path) -> Result<(), WorkersError> {
        let worktree_str = worktree.display().to_string();
        self.run_ok(Some(bare_repo), &["worktree", "remove", "--force", &worktree_str])
    }

    fn checkout_branch(&self, repo: &Path, branch: &str, create: bool) -> Result<(), WorkersError> {
        if create {
            self.run_ok(Some(repo), &["checkout", "-b", branch])
        } else {
            self.run_ok(Some(repo), &["checkout", branch])
        }
    }

    fn status_is_clean(&self, repo: &Path) -> Result<bool, WorkersError> {
        let (ok, stdout, stderr) = self.run(Some(repo), &["status", "--porcelain"])?;
        if !ok {
            return Err(WorkersError::Core(CoreError::external_tool("git", None, stderr)));
        }
        Ok(stdout.trim().is_empty())
    }

    fn pull_rebase(&self, repo: &Path, remote: &str, branch: &str) -> Result<(), WorkersError> {
        self.run_ok(Some(repo), &["pull", "--rebase", remote, branch])
    }

    fn current_branch(&self, repo: &Path) -> Result<String, WorkersError> {
        let (ok, stdout, stderr) = self.run(Some(repo), &["rev-parse", "--abbrev-ref", "HEAD"])?;
        if !ok {
            return Err(WorkersError::Core(CoreError::external_tool("git", None, stderr)));
        }
        Ok(stdout.trim().to_string())
    }

    fn config_get(&self, repo: &Path, key: &str) -> Result<Option<String>, WorkersError> {
        let (ok, stdout, _) = self.run(Some(repo), &["config", "--get", key])?;
        Ok(ok.then(|| stdout.trim().to_string()).filter(|s| !s.is_empty()))
    }

    fn config_set(&self, repo: &Path, key: &str, value: &str) -> Result<(), WorkersError> {
        self.run_ok(Some(repo), &["config", key, value])
    }
}
