// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared error taxonomy (§7).
//!
//! Every crate in the workspace composes its own `thiserror` enum for
//! crate-specific variants, but external-tool failures, not-found, and
//! timeout outcomes are represented the same way everywhere so callers
//! can branch on kind without string matching.

use std::fmt;
use std::time::Duration;

/// A distinguished, crate-agnostic failure kind.
///
/// Crate-specific error enums typically carry one variant per operation
/// and delegate the common cases to this type via `#[from]` or by storing
/// it directly.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("already running: {0}")]
    AlreadyRunning(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("{tool} failed (exit {status:?}): {stderr}")]
    ExternalTool { tool: String, status: Option<i32>, stderr: String },

    #[error("{op} timed out after {after:?}")]
    Timeout { op: String, after: Duration },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CoreError {
    pub fn not_found(what: impl fmt::Display) -> Self {
        CoreError::NotFound(what.to_string())
    }

    pub fn invalid(what: impl fmt::Display) -> Self {
        CoreError::InvalidInput(what.to_string())
    }

    pub fn external_tool(tool: impl Into<String>, status: Option<i32>, stderr: impl Into<String>) -> Self {
        CoreError::ExternalTool { tool: tool.into(), status, stderr: stderr.into() }
    }

    /// Whether this error represents a "not found" outcome — callers can
    /// treat these idempotently (e.g. Stop on an absent session).
    pub fn is_not_found(&self) -> bool {
        matches!(self, CoreError::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_distinguished() {
        let e = CoreError::not_found("session gt-r1-crew-bob");
        assert!(e.is_not_found());
        assert!(!CoreError::AlreadyRunning("x".into()).is_not_found());
    }

    #[test]
    fn external_tool_preserves_stderr_verbatim() {
        let e = CoreError::external_tool("bd", Some(1), "issue xyz not found\n");
        assert!(e.to_string().contains("issue xyz not found"));
    }
}
