// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `Multiplexer` trait (§4.7, §9 "thin polymorphic boundary"): the
//! narrow seam `SessionSupervisor` talks through. Deliberately
//! synchronous, unlike the teacher's `tokio::process`-based
//! `listener::tmux` module — per §5 the core has no async runtime.

use crate::error::SessionError;
use std::path::Path;

/// A terminal-multiplexer session handle, keyed by a deterministic id.
pub trait Multiplexer: Send + Sync {
    fn has_session(&self, id: &str) -> Result<bool, SessionError>;

    /// Create a session together with its initial command in one
    /// operation — never create-then-send-keys, which races the
    /// runtime's own startup (§4.7 step 5).
    fn new_session_with_command(
        &self,
        id: &str,
        cwd: &Path,
        command: &str,
        args: &[String],
    ) -> Result<(), SessionError>;

    fn kill_session(&self, id: &str) -> Result<(), SessionError>;

    /// Send literal keystrokes into a live session (used for best-effort
    /// notification and post-ready beacon nudges).
    fn send_keys(&self, id: &str, text: &str) -> Result<(), SessionError>;

    fn set_environment(&self, id: &str, key: &str, value: &str) -> Result<(), SessionError>;

    /// PID of the session's root process, if the session exists.
    fn root_pid(&self, id: &str) -> Result<Option<u32>, SessionError>;

    /// Whether a process matching `pattern` is running in the session's
    /// pane tree — one input to the agent-alive heuristic (§4.7).
    fn is_process_running(&self, id: &str, pattern: &str) -> Result<bool, SessionError>;

    /// Recent pane output, for readiness-prompt heuristics (§4.7).
    fn capture_pane(&self, id: &str) -> Result<String, SessionError>;

    /// Deterministic theming applied once on session creation.
    /// Non-fatal by contract — the default no-op is a valid
    /// implementation for multiplexers that don't support theming.
    fn apply_theme(&self, _id: &str) -> Result<(), SessionError> {
        Ok(())
    }

    /// Session-cycle keybindings (e.g. a key to jump between this
    /// town's live sessions). Non-fatal by contract.
    fn apply_keybindings(&self, _id: &str) -> Result<(), SessionError> {
        Ok(())
    }
}
