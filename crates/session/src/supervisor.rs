// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `SessionSupervisor`: the Start/Stop/Liveness contract of §4.7,
//! built on top of a `Multiplexer`. Deliberately stays out of
//! workspace/git concerns (§9's "thin polymorphic boundary") — callers
//! in the workers crate own provisioning, this crate only owns the
//! multiplexer session lifecycle.

use crate::beacon::{build_beacon, AgentCapabilities, Delivery};
use crate::error::SessionError;
use crate::identity::Role;
use crate::multiplexer::Multiplexer;
use crate::treekill;
use gastown_core::CoreError;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Inputs a caller supplies to start a session; everything the
/// supervisor itself needs beyond the role and multiplexer id.
pub struct StartSpec<'a> {
    pub cwd: &'a Path,
    pub command: &'a str,
    pub args: &'a [String],
    pub env: &'a [(String, String)],
    pub town_name: &'a str,
    pub local_minute_header: &'a str,
    pub capabilities: AgentCapabilities,
    /// Pattern used by the agent-alive heuristic (typically the agent
    /// CLI's process name).
    pub alive_pattern: &'a str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// A fresh session was created.
    Started,
    /// An existing session whose agent had died (zombie) was killed and
    /// recreated.
    RecreatedZombie,
}

pub struct SessionSupervisor<M: Multiplexer> {
    mux: M,
    kill_wait: Duration,
}

impl<M: Multiplexer> SessionSupervisor<M> {
    pub fn new(mux: M) -> Self {
        Self { mux, kill_wait: Duration::from_millis(200) }
    }

    pub fn with_kill_wait(mux: M, kill_wait: Duration) -> Self {
        Self { mux, kill_wait }
    }

    /// Start (or recover) the session for `role`. Refuses to clobber a
    /// live, non-zombie session — callers must `stop` first if they
    /// want a hard restart.
    pub fn start(&self, role: &Role, spec: &StartSpec<'_>) -> Result<StartOutcome, SessionError> {
        let id = role.session_id();
        let mut outcome = StartOutcome::Started;

        if self.mux.has_session(&id)? {
            if self.is_agent_alive(&id, spec.alive_pattern)? {
                return Err(SessionError::Core(CoreError::AlreadyRunning(id)));
            }
            warn!(session = %id, "zombie session detected, killing before recreate");
            self.mux.kill_session(&id)?;
            std::thread::sleep(self.kill_wait);
            outcome = StartOutcome::RecreatedZombie;
        }

        self.mux.new_session_with_command(&id, spec.cwd, spec.command, spec.args)?;

        for (key, value) in spec.env {
            if let Err(e) = self.mux.set_environment(&id, key, value) {
                warn!(session = %id, key = %key, error = %e, "environment injection failed, continuing");
            }
        }

        if let Err(e) = self.mux.apply_theme(&id) {
            debug!(session = %id, error = %e, "theming failed, continuing");
        }
        if let Err(e) = self.mux.apply_keybindings(&id) {
            debug!(session = %id, error = %e, "keybinding setup failed, continuing");
        }

        let beacon = build_beacon(role, spec.town_name, spec.local_minute_header, spec.capabilities);
        match beacon.delivery {
            Delivery::EmbeddedOnly => {}
            Delivery::NudgeOnly | Delivery::Both => {
                self.mux.send_keys(&id, &beacon.text)?;
            }
        }

        info!(session = %id, ?outcome, "session started");
        Ok(outcome)
    }

    /// Tear down a session: tree-kill its root process tree, then ask
    /// the multiplexer to forget the session itself.
    pub fn stop(&self, role: &Role) -> Result<(), SessionError> {
        let id = role.session_id();
        if let Some(pid) = self.mux.root_pid(&id)? {
            treekill::kill_tree(pid);
        }
        match self.mux.kill_session(&id) {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Whether a session exists at all.
    pub fn exists(&self, role: &Role) -> Result<bool, SessionError> {
        self.mux.has_session(&role.session_id())
    }

    /// Session exists AND its agent process looks alive.
    pub fn is_agent_alive(&self, session_id: &str, pattern: &str) -> Result<bool, SessionError> {
        if !self.mux.has_session(session_id)? {
            return Ok(false);
        }
        self.mux.is_process_running(session_id, pattern)
    }

    /// A session is a zombie if the multiplexer thinks it exists but the
    /// agent process inside it does not.
    pub fn is_zombie(&self, role: &Role, pattern: &str) -> Result<bool, SessionError> {
        let id = role.session_id();
        Ok(self.mux.has_session(&id)? && !self.mux.is_process_running(&id, pattern)?)
    }

    pub fn capture_pane(&self, role: &Role) -> Result<String, SessionError> {
        self.mux.capture_pane(&role.session_id())
    }

    pub fn send_keys(&self, role: &Role, text: &str) -> Result<(), SessionError> {
        self.mux.send_keys(&role.session_id(), text)
    }
}
