// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shell-backed `IssueStore`, grounded on the teacher's `tmux` process
//! utilities (`oj-daemon::listener::tmux`) — build args, run, check exit
//! status — adapted to block on `wait()` with a poll-based timeout
//! instead of `tokio::process`, per §5's sync-only constraint.

use crate::error::IssuesError;
use crate::record::{IssueRecord, ListFilter, NewIssue, SortOrder};
use crate::store::{ChannelInfo, IssueStore};
use gastown_core::CoreError;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

/// Default timeout for a single store invocation (§5, SPEC_FULL §4.3).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Shells out to an external issue-tracker binary (named `bd` by
/// convention in this deployment, but configurable) once per operation.
/// `BEADS_DIR` pins the store location, `BD_ACTOR` carries the sender
/// identity, and `BEADS_NO_DAEMON=1` disables the store's own daemon
/// when invoked from inside an agent session (§6).
pub struct ShellIssueStore {
    binary: PathBuf,
    store_dir: PathBuf,
    actor: String,
    timeout: Duration,
}

impl ShellIssueStore {
    pub fn new(binary: impl Into<PathBuf>, store_dir: impl Into<PathBuf>, actor: impl Into<String>) -> Self {
        Self { binary: binary.into(), store_dir: store_dir.into(), actor: actor.into(), timeout: DEFAULT_TIMEOUT }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.args(args)
            .env("BEADS_DIR", &self.store_dir)
            .env("BD_ACTOR", &self.actor)
            .env("BEADS_NO_DAEMON", "1")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }

    fn run(&self, args: &[&str]) -> Result<String, IssuesError> {
        let mut cmd = self.command(args);
        let child = cmd.spawn().map_err(|e| IssuesError(CoreError::Io(e)))?;
        let output = wait_with_timeout(child, self.timeout, &args.join(" "))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(IssuesError(not_found_or_tool_error(&self.binary, output.status.code(), stderr)));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn run_json<T: serde::de::DeserializeOwned>(&self, args: &[&str]) -> Result<T, IssuesError> {
        let raw = self.run(args)?;
        serde_json::from_str(&raw)
            .map_err(|e| IssuesError(CoreError::invalid(format!("bad JSON from {}: {e}", self.binary.display()))))
    }
}

fn not_found_or_tool_error(binary: &std::path::Path, status: Option<i32>, stderr: String) -> CoreError {
    if stderr.to_ascii_lowercase().contains("not found") {
        CoreError::NotFound(stderr)
    } else {
        CoreError::external_tool(binary.display().to_string(), status, stderr)
    }
}

/// Poll `child` until it exits or `timeout` elapses, then collect
/// stdout/stderr. Killed on timeout and mapped to `CoreError::Timeout`.
fn wait_with_timeout(
    mut child: Child,
    timeout: Duration,
    op: &str,
) -> Result<std::process::Output, IssuesError> {
    let start = Instant::now();
    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                let mut stdout = Vec::new();
                let mut stderr = Vec::new();
                if let Some(mut out) = child.stdout.take() {
                    use std::io::Read;
                    let _ = out.read_to_end(&mut stdout);
                }
                if let Some(mut err) = child.stderr.take() {
                    use std::io::Read;
                    let _ = err.read_to_end(&mut stderr);
                }
                return Ok(std::process::Output { status, stdout, stderr });
            }
            Ok(None) => {
                if start.elapsed() > timeout {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(IssuesError(CoreError::Timeout { op: op.to_string(), after: timeout }));
                }
                std::thread::sleep(Duration::from_millis(20));
            }
            Err(e) => return Err(IssuesError(CoreError::Io(e))),
        }
    }
}

impl IssueStore for ShellIssueStore {
    fn create(&self, issue: NewIssue) -> Result<String, IssuesError> {
        let mut args = vec![
            "create".to_string(),
            "--title".to_string(),
            issue.title,
            "--type".to_string(),
            issue.issue_type,
            "--assignee".to_string(),
            issue.assignee,
            "--body".to_string(),
            issue.body,
            "--priority".to_string(),
            issue.priority.to_string(),
            "--actor".to_string(),
            issue.actor,
        ];
        for label in &issue.labels {
            args.push("--label".to_string());
            args.push(label.clone());
        }
        if issue.ephemeral {
            args.push("--ephemeral".to_string());
        }
        let refs: Vec<&str> = args.iter().map(String::as_str).collect();
        self.run(&refs)
    }

    fn show(&self, id: &str) -> Result<IssueRecord, IssuesError> {
        self.run_json(&["show", id, "--json"])
    }

    fn list(&self, filter: &ListFilter) -> Result<Vec<IssueRecord>, IssuesError> {
        let mut args = vec!["list".to_string(), "--json".to_string()];
        if let Some(t) = &filter.issue_type {
            args.push("--type".into());
            args.push(t.clone());
        }
        if let Some(a) = &filter.assignee {
            args.push("--assignee".into());
            args.push(a.clone());
        }
        if let Some(l) = &filter.label {
            args.push("--label".into());
            args.push(l.clone());
        }
        if let Some(s) = &filter.status {
            args.push("--status".into());
            args.push(s.to_string());
        }
        if let Some(limit) = filter.limit {
            args.push("--limit".into());
            args.push(limit.to_string());
        }
        if let Some(sort) = filter.sort {
            args.push("--sort".into());
            args.push(match sort {
                SortOrder::NewestFirst => "newest".to_string(),
                SortOrder::OldestFirst => "oldest".to_string(),
            });
        }
        let refs: Vec<&str> = args.iter().map(String::as_str).collect();
        self.run_json(&refs)
    }

    fn close(&self, id: &str, session: Option<&str>) -> Result<(), IssuesError> {
        match session {
            Some(s) => self.run(&["close", id, "--session", s]).map(|_| ()),
            None => self.run(&["close", id]).map(|_| ()),
        }
    }

    fn reopen(&self, id: &str) -> Result<(), IssuesError> {
        self.run(&["reopen", id]).map(|_| ())
    }

    fn label_add(&self, id: &str, label: &str) -> Result<(), IssuesError> {
        self.run(&["label", "add", id, label]).map(|_| ())
    }

    fn label_remove(&self, id: &str, label: &str) -> Result<(), IssuesError> {
        match self.run(&["label", "remove", id, label]) {
            Ok(_) => Ok(()),
            Err(e) if e.0.is_not_found() => Ok(()),
            Err(e) => Err(e),
        }
    }

    fn thread(&self, id: &str) -> Result<Vec<IssueRecord>, IssuesError> {
        self.run_json(&["thread", id, "--json"])
    }

    fn config_get(&self, key: &str) -> Result<Option<String>, IssuesError> {
        match self.run(&["config", "get", key]) {
            Ok(v) => Ok(Some(v)),
            Err(e) if e.0.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn config_set(&self, key: &str, value: &str) -> Result<(), IssuesError> {
        self.run(&["config", "set", key, value]).map(|_| ())
    }

    fn init(&self, prefix: &str) -> Result<(), IssuesError> {
        self.run(&["init", "--prefix", prefix]).map(|_| ())
    }

    fn import(&self) -> Result<(), IssuesError> {
        self.run(&["import"]).map(|_| ())
    }

    fn rename_prefix(&self, new_prefix: &str) -> Result<(), IssuesError> {
        self.run(&["rename-prefix", new_prefix]).map(|_| ())
    }

    fn channel_get(&self, name: &str) -> Result<Option<ChannelInfo>, IssuesError> {
        #[derive(serde::Deserialize)]
        struct Raw {
            subscribers: Vec<String>,
            closed: bool,
        }
        match self.run_json::<Raw>(&["channel", "get", name, "--json"]) {
            Ok(raw) => Ok(Some(ChannelInfo { subscribers: raw.subscribers, closed: raw.closed })),
            Err(e) if e.0.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn channel_enforce_retention(&self, name: &str) -> Result<(), IssuesError> {
        self.run(&["channel", "enforce-retention", name]).map(|_| ())
    }
}
