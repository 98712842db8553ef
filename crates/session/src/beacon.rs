// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Startup beacon construction (§4.7): the text an agent sees (or is
//! nudged) on session start, carrying its identity, mailbox location,
//! and first-turn instructions.

use crate::identity::Role;

/// How an agent's CLI accepts its startup context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentCapabilities {
    /// The CLI runs a configured lifecycle/context-priming hook on its
    /// own before the first turn, so the beacon doesn't need to spell
    /// out "read your mailbox" instructions.
    pub has_lifecycle_hook: bool,
    /// The CLI accepts an initial-prompt argument, so the beacon can be
    /// embedded directly into the launch command instead of requiring a
    /// post-ready `send_keys` nudge.
    pub accepts_initial_prompt_arg: bool,
}

/// Where the beacon text must be delivered, derived from the
/// capability matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Embed in the launch command; no separate nudge required.
    EmbeddedOnly,
    /// No initial-prompt argument support; must be sent via `send_keys`
    /// once the session is ready.
    NudgeOnly,
    /// Embed what fits in the argument, and nudge once ready too —
    /// covers CLIs that accept an initial prompt but still need an
    /// explicit no-hook context-priming follow-up.
    Both,
}

impl AgentCapabilities {
    pub fn delivery(&self) -> Delivery {
        match (self.has_lifecycle_hook, self.accepts_initial_prompt_arg) {
            (true, true) => Delivery::EmbeddedOnly,
            (true, false) => Delivery::NudgeOnly,
            (false, true) => Delivery::Both,
            (false, false) => Delivery::NudgeOnly,
        }
    }
}

/// A constructed beacon: identity header plus body text, and where it
/// needs to go.
#[derive(Debug, Clone)]
pub struct Beacon {
    pub text: String,
    pub delivery: Delivery,
}

/// Build the beacon for a role starting up under `town_name`, with the
/// local-time-minute header used to make the nudge visually
/// distinguishable across session restarts.
pub fn build_beacon(role: &Role, town_name: &str, local_minute_header: &str, caps: AgentCapabilities) -> Beacon {
    let mut text = format!("[{local_minute_header}] gastown://{town_name}/{role}\n");

    if let Some(rig) = role.rig() {
        text.push_str(&format!("rig: {rig}\n"));
    }
    text.push_str(&format!("identity: {role}\n"));

    if !caps.has_lifecycle_hook {
        text.push_str(
            "Check your mailbox before starting work: `bd list --assignee <you> --status open`.\n",
        );
    }

    Beacon { text, delivery: caps.delivery() }
}
