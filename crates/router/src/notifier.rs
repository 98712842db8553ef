// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Best-effort out-of-band notification into a live session (§4.6: "After
//! store creation, attempt a best-effort notification ... unless sender
//! and recipient are the same identity"). The router never fails a send
//! because notification failed — it only logs.

use gastown_session::Multiplexer;

/// Nudge a live session that new mail has arrived. Implementations MAY
/// be a no-op (e.g. in tests, or when the caller doesn't want
/// out-of-band delivery at all).
pub trait Notifier: Send + Sync {
    /// `identity` is the canonicalized recipient identity. Returning
    /// `Err` is logged by the caller and otherwise ignored — this never
    /// fails a send.
    fn notify(&self, identity: &str, text: &str) -> Result<(), String>;
}

/// Drops every notification. Used by callers with no live-session
/// concept (e.g. a one-shot CLI invocation against a queue-only flow).
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _identity: &str, _text: &str) -> Result<(), String> {
        Ok(())
    }
}

/// Resolves an identity to a multiplexer session id, then sends the
/// nudge text into that session if it's alive. The identity→session-id
/// mapping is workspace-specific (it needs to know role/rig shape), so
/// it's supplied by the caller rather than derived here.
pub struct SessionNotifier<M: Multiplexer, F: Fn(&str) -> Option<String> + Send + Sync> {
    mux: M,
    resolve: F,
}

impl<M: Multiplexer, F: Fn(&str) -> Option<String> + Send + Sync> SessionNotifier<M, F> {
    pub fn new(mux: M, resolve: F) -> Self {
        Self { mux, resolve }
    }
}

impl<M: Multiplexer, F: Fn(&str) -> Option<String> + Send + Sync> Notifier for SessionNotifier<M, F> {
    fn notify(&self, identity: &str, text: &str) -> Result<(), String> {
        let Some(session_id) = (self.resolve)(identity) else {
            return Ok(());
        };
        match self.mux.has_session(&session_id) {
            Ok(true) => self.mux.send_keys(&session_id, text).map_err(|e| e.to_string()),
            Ok(false) => Ok(()),
            Err(e) => Err(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gastown_session::FakeMultiplexer;

    #[test]
    fn notifies_live_session() {
        let mux = FakeMultiplexer::new();
        mux.seed("hq-mayor", true);
        let notifier = SessionNotifier::new(mux.clone(), |id| (id == "mayor/").then(|| "hq-mayor".to_string()));
        notifier.notify("mayor/", "new mail").unwrap();
        assert!(mux.get("hq-mayor").unwrap().pane.contains("new mail"));
    }

    #[test]
    fn skips_unresolved_identity() {
        let mux = FakeMultiplexer::new();
        let notifier = SessionNotifier::new(mux, |_: &str| None);
        notifier.notify("overseer", "hello").unwrap();
    }

    #[test]
    fn noop_notifier_always_succeeds() {
        NoopNotifier.notify("anyone", "text").unwrap();
    }
}
