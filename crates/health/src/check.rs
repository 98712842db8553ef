// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `Check` trait (§4.9): a named, categorized diagnostic with a
//! `Run` and an optional `Fix`. Checks are data, not commands — the
//! [`crate::runner::Runner`] is what decides ordering and whether to
//! invoke `Fix`.

use std::collections::HashSet;
use std::path::PathBuf;

use crate::error::HealthError;

/// Where a check sits in the topology → data → runtime ordering
/// (§4.9 "Execution").
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Category {
    Topology,
    Data,
    Runtime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    Warning,
    Error,
    Skipped,
}

impl Status {
    pub fn is_ok(self) -> bool {
        matches!(self, Status::Ok)
    }
}

/// The caller-supplied flags a check may consult (§4.9 "Context").
#[derive(Debug, Clone, Default)]
pub struct Flags {
    pub restart_sessions: bool,
}

/// Scope a check runs against: a town, optionally narrowed to one rig.
pub struct Context {
    pub town_root: PathBuf,
    pub rig: Option<String>,
    pub flags: Flags,
}

impl Context {
    pub fn new(town_root: impl Into<PathBuf>) -> Self {
        Self { town_root: town_root.into(), rig: None, flags: Flags::default() }
    }

    pub fn with_rig(mut self, rig: impl Into<String>) -> Self {
        self.rig = Some(rig.into());
        self
    }

    pub fn with_flags(mut self, flags: Flags) -> Self {
        self.flags = flags;
        self
    }

    pub fn rig_root(&self) -> Option<PathBuf> {
        self.rig.as_ref().map(|r| self.town_root.join(r))
    }

    /// All rig directories under the town root: top-level directories
    /// that aren't `mayor` or `deacon` (§3 "Town" layout).
    pub fn rig_roots(&self) -> Vec<PathBuf> {
        if let Some(root) = self.rig_root() {
            return vec![root];
        }
        let reserved: HashSet<&str> = ["mayor", "deacon"].into_iter().collect();
        let Ok(entries) = std::fs::read_dir(&self.town_root) else {
            return Vec::new();
        };
        let mut rigs: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
            .filter(|e| e.file_name().to_str().map(|n| !reserved.contains(n)).unwrap_or(false))
            .map(|e| e.path())
            .collect();
        rigs.sort();
        rigs
    }
}

/// The outcome of `Check::run` (§4.9 "A `Result` carries a status, a
/// one-line message, an optional detail list, and an optional
/// remediation hint").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    pub status: Status,
    pub message: String,
    pub detail: Vec<String>,
    pub remediation_hint: Option<String>,
}

impl CheckResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self { status: Status::Ok, message: message.into(), detail: Vec::new(), remediation_hint: None }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self { status: Status::Warning, message: message.into(), detail: Vec::new(), remediation_hint: None }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { status: Status::Error, message: message.into(), detail: Vec::new(), remediation_hint: None }
    }

    pub fn skipped(message: impl Into<String>) -> Self {
        Self { status: Status::Skipped, message: message.into(), detail: Vec::new(), remediation_hint: None }
    }

    pub fn with_detail(mut self, detail: Vec<String>) -> Self {
        self.detail = detail;
        self
    }

    pub fn with_remediation_hint(mut self, hint: impl Into<String>) -> Self {
        self.remediation_hint = Some(hint.into());
        self
    }
}

pub trait Check: Send + Sync {
    fn name(&self) -> &str;
    fn category(&self) -> Category;
    fn description(&self) -> &str;

    fn run(&self, ctx: &Context) -> Result<CheckResult, HealthError>;

    /// Attempt a fix. `None` means this check has no automated remedy.
    /// Only invoked by the runner when `--fix` was requested and the
    /// prior `Run` was non-OK.
    fn fix(&self, _ctx: &Context) -> Option<Result<(), HealthError>> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn rig_roots_excludes_town_singletons() {
        let dir = tempdir().unwrap();
        for name in ["mayor", "deacon", "gastown", "sidecar"] {
            std::fs::create_dir_all(dir.path().join(name)).unwrap();
        }
        let ctx = Context::new(dir.path());
        let rigs: Vec<String> =
            ctx.rig_roots().into_iter().map(|p| p.file_name().unwrap().to_str().unwrap().to_string()).collect();
        assert_eq!(rigs, vec!["gastown".to_string(), "sidecar".to_string()]);
    }

    #[test]
    fn rig_roots_narrows_to_a_single_rig_when_given() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("gastown")).unwrap();
        let ctx = Context::new(dir.path()).with_rig("gastown");
        assert_eq!(ctx.rig_roots(), vec![dir.path().join("gastown")]);
    }
}
