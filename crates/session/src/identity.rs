// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deterministic session ids per agent identity (§4.7).

use std::fmt;

/// The role a session is running (parameterizes the supervisor, §4.7).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Role {
    Mayor,
    Deacon,
    Witness { rig: String },
    Refinery { rig: String },
    Crew { rig: String, name: String },
    Polecat { rig: String, name: String },
    /// The Boot watchdog itself — the one caller that additionally takes
    /// the advisory `AtomicLock` before spawning its own session (§4.7,
    /// §5).
    Boot,
}

impl Role {
    /// The deterministic multiplexer session id for this role
    /// (`gt-<rig>-crew-<name>`, `gt-<rig>-refinery`, `hq-mayor`,
    /// `hq-deacon`, `gt-boot`).
    pub fn session_id(&self) -> String {
        match self {
            Role::Mayor => "hq-mayor".to_string(),
            Role::Deacon => "hq-deacon".to_string(),
            Role::Witness { rig } => format!("gt-{rig}-witness"),
            Role::Refinery { rig } => format!("gt-{rig}-refinery"),
            Role::Crew { rig, name } => format!("gt-{rig}-crew-{name}"),
            Role::Polecat { rig, name } => format!("gt-{rig}-polecat-{name}"),
            Role::Boot => "gt-boot".to_string(),
        }
    }

    pub fn rig(&self) -> Option<&str> {
        match self {
            Role::Witness { rig } | Role::Refinery { rig } | Role::Crew { rig, .. } | Role::Polecat { rig, .. } => {
                Some(rig)
            }
            Role::Mayor | Role::Deacon | Role::Boot => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.session_id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yare::parameterized;

    #[parameterized(
        mayor = {Role::Mayor, "hq-mayor"},
        deacon = {Role::Deacon, "hq-deacon"},
        witness = {Role::Witness { rig: "gastown".into() }, "gt-gastown-witness"},
        refinery = {Role::Refinery { rig: "gastown".into() }, "gt-gastown-refinery"},
        crew = {Role::Crew { rig: "gastown".into(), name: "alice".into() }, "gt-gastown-crew-alice"},
        polecat = {Role::Polecat { rig: "gastown".into(), name: "fenix".into() }, "gt-gastown-polecat-fenix"},
        boot = {Role::Boot, "gt-boot"},
    )]
    fn computes_deterministic_session_id(role: Role, expected: &str) {
        assert_eq!(role.session_id(), expected);
    }
}
