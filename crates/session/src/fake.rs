// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory `Multiplexer` test double, grounded on the teacher's
//! `NoOpSessionAdapter` shape but stateful enough to model zombie
//! sessions (§8 scenario S5): a session can be "alive" at the
//! multiplexer level while its agent process is not.

use crate::error::SessionError;
use crate::multiplexer::Multiplexer;
use gastown_core::CoreError;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct FakeSession {
    pub cwd: PathBuf,
    pub command: String,
    pub args: Vec<String>,
    pub env: HashMap<String, String>,
    pub agent_alive: bool,
    pub pane: String,
}

#[derive(Clone, Default)]
pub struct FakeMultiplexer {
    sessions: Arc<Mutex<HashMap<String, FakeSession>>>,
}

impl FakeMultiplexer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a session directly, bypassing `new_session_with_command` —
    /// used to simulate a pre-existing (possibly zombie) session.
    pub fn seed(&self, id: &str, agent_alive: bool) {
        self.sessions.lock().insert(
            id.to_string(),
            FakeSession {
                cwd: PathBuf::new(),
                command: String::new(),
                args: vec![],
                env: HashMap::new(),
                agent_alive,
                pane: String::new(),
            },
        );
    }

    pub fn get(&self, id: &str) -> Option<FakeSession> {
        self.sessions.lock().get(id).cloned()
    }

    pub fn set_agent_alive(&self, id: &str, alive: bool) {
        if let Some(s) = self.sessions.lock().get_mut(id) {
            s.agent_alive = alive;
        }
    }

    pub fn set_pane(&self, id: &str, pane: impl Into<String>) {
        if let Some(s) = self.sessions.lock().get_mut(id) {
            s.pane = pane.into();
        }
    }
}

impl Multiplexer for FakeMultiplexer {
    fn has_session(&self, id: &str) -> Result<bool, SessionError> {
        Ok(self.sessions.lock().contains_key(id))
    }

    fn new_session_with_command(
        &self,
        id: &str,
        cwd: &Path,
        command: &str,
        args: &[String],
    ) -> Result<(), SessionError> {
        self.sessions.lock().insert(
            id.to_string(),
            FakeSession {
                cwd: cwd.to_path_buf(),
                command: command.to_string(),
                args: args.to_vec(),
                env: HashMap::new(),
                agent_alive: true,
                pane: String::new(),
            },
        );
        Ok(())
    }

    fn kill_session(&self, id: &str) -> Result<(), SessionError> {
        self.sessions
            .lock()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| SessionError::Core(CoreError::not_found(format!("session {id}"))))
    }

    fn send_keys(&self, id: &str, text: &str) -> Result<(), SessionError> {
        let mut sessions = self.sessions.lock();
        let session = sessions
            .get_mut(id)
            .ok_or_else(|| SessionError::Core(CoreError::not_found(format!("session {id}"))))?;
        session.pane.push_str(text);
        session.pane.push('\n');
        Ok(())
    }

    fn set_environment(&self, id: &str, key: &str, value: &str) -> Result<(), SessionError> {
        let mut sessions = self.sessions.lock();
        let session = sessions
            .get_mut(id)
            .ok_or_else(|| SessionError::Core(CoreError::not_found(format!("session {id}"))))?;
        session.env.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn root_pid(&self, id: &str) -> Result<Option<u32>, SessionError> {
        Ok(self.sessions.lock().contains_key(id).then_some(std::process::id()))
    }

    fn is_process_running(&self, id: &str, pattern: &str) -> Result<bool, SessionError> {
        let sessions = self.sessions.lock();
        Ok(sessions.get(id).map(|s| s.agent_alive && s.pane.contains(pattern)).unwrap_or(false))
    }

    fn capture_pane(&self, id: &str) -> Result<String, SessionError> {
        Ok(self.sessions.lock().get(id).map(|s| s.pane.clone()).unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_zombie_is_alive_but_agent_not() {
        let mux = FakeMultiplexer::new();
        mux.seed("gt-r1-crew-bob", false);
        assert!(mux.has_session("gt-r1-crew-bob").unwrap());
        assert!(!mux.get("gt-r1-crew-bob").unwrap().agent_alive);
    }

    #[test]
    fn kill_removes_session() {
        let mux = FakeMultiplexer::new();
        mux.seed("x", true);
        mux.kill_session("x").unwrap();
        assert!(!mux.has_session("x").unwrap());
    }
}
