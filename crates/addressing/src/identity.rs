// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent identity grammar and normalization (§3 "Agent identity", §4.4).
//!
//! `address_to_identity` and `identity_to_address` are the two named
//! entry points the spec calls for; both delegate to the same liberal
//! normalizer, which is what makes them idempotent and mutually inverse
//! (§8 invariants 3-4): whichever "direction" a caller is converting,
//! crew/polecats segments always collapse and trailing slashes always
//! follow the same town/overseer/rig rules.

use smol_str::SmolStr;
use std::fmt;

/// A normalized agent identity string (§3 grammar).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identity(SmolStr);

impl Identity {
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Town-level singleton (`mayor/`, `deacon/`).
    pub fn is_town_singleton(&self) -> bool {
        self.0 == "mayor/" || self.0 == "deacon/"
    }

    pub fn is_overseer(&self) -> bool {
        self.0 == "overseer"
    }

    /// Rig this identity is scoped to, if any (town singletons and
    /// `overseer` have none).
    pub fn rig(&self) -> Option<&str> {
        if self.is_town_singleton() || self.is_overseer() {
            return None;
        }
        self.0.split('/').next().filter(|s| !s.is_empty())
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Identity> for String {
    fn from(id: Identity) -> Self {
        id.0.to_string()
    }
}

/// Liberal normalization shared by both named conversions.
fn normalize(raw: &str) -> Identity {
    let s = raw.trim();

    if s == "mayor" || s == "mayor/" {
        return Identity(SmolStr::new("mayor/"));
    }
    if s == "deacon" || s == "deacon/" {
        return Identity(SmolStr::new("deacon/"));
    }
    if s == "overseer" || s == "overseer/" {
        return Identity(SmolStr::new("overseer"));
    }

    let once_trimmed = s.strip_suffix('/').unwrap_or(s);

    // Rig broadcast: "<rig>/" with no further segment collapses to "<rig>".
    if s.ends_with('/') && !once_trimmed.is_empty() && !once_trimmed.contains('/') {
        return Identity(SmolStr::new(once_trimmed));
    }

    // "<rig>/crew/<name>" and "<rig>/polecats/<name>" canonicalize to "<rig>/<name>".
    let parts: Vec<&str> = once_trimmed.splitn(3, '/').collect();
    if parts.len() == 3 && (parts[1] == "crew" || parts[1] == "polecats") && !parts[2].is_empty() {
        return Identity(SmolStr::new(format!("{}/{}", parts[0], parts[2])));
    }

    Identity(SmolStr::new(once_trimmed))
}

/// Normalize an arbitrary address-shaped string into its canonical identity.
pub fn address_to_identity(address: &str) -> Identity {
    normalize(address)
}

/// Normalize an identity into its canonical address representation.
///
/// Collapses the same way `address_to_identity` does (§8 invariant 4) —
/// there is exactly one canonical surface form per identity.
pub fn identity_to_address(identity: &str) -> Identity {
    normalize(identity)
}

/// Validate a crew/polecat name (§3): non-empty, not `.`/`..`, no path
/// separators, and none of the characters reserved for identity parsing
/// (`-`, `.`, space).
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum InvalidName {
    #[error("name must not be empty")]
    Empty,
    #[error("name must not be '.' or '..'")]
    DotSegment,
    #[error("name must not contain a path separator")]
    PathSeparator,
    #[error("name must not contain reserved character {0:?}")]
    ReservedChar(char),
}

pub fn validate_crew_name(name: &str) -> Result<(), InvalidName> {
    if name.is_empty() {
        return Err(InvalidName::Empty);
    }
    if name == "." || name == ".." {
        return Err(InvalidName::DotSegment);
    }
    if name.contains('/') || name.contains('\\') {
        return Err(InvalidName::PathSeparator);
    }
    for reserved in ['-', '.', ' '] {
        if name.contains(reserved) {
            return Err(InvalidName::ReservedChar(reserved));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use yare::parameterized;

    #[parameterized(
        mayor_bare = {"mayor", "mayor/"},
        mayor_slash = {"mayor/", "mayor/"},
        deacon_bare = {"deacon", "deacon/"},
        overseer_bare = {"overseer", "overseer"},
        overseer_slash = {"overseer/", "overseer"},
        rig_crew = {"gastown/crew/alice", "gastown/alice"},
        rig_polecats = {"gastown/polecats/fenix", "gastown/fenix"},
        rig_broadcast = {"gastown/", "gastown"},
        rig_singleton = {"gastown/witness", "gastown/witness"},
        already_canonical = {"gastown/alice", "gastown/alice"},
        trailing_slash_trimmed = {"gastown/alice/", "gastown/alice"},
    )]
    fn normalizes_per_grammar(input: &str, expected: &str) {
        assert_eq!(address_to_identity(input).as_str(), expected);
        assert_eq!(identity_to_address(input).as_str(), expected);
    }

    #[test]
    fn both_directions_are_idempotent_and_mutually_inverse() {
        for raw in ["mayor", "overseer/", "gastown/crew/alice", "gastown/", "gastown/witness"] {
            let a = address_to_identity(raw);
            let b = identity_to_address(raw);
            assert_eq!(a, b);
            assert_eq!(address_to_identity(a.as_str()), a);
            assert_eq!(identity_to_address(b.as_str()), b);
        }
    }

    #[test]
    fn rig_extraction_ignores_town_singletons_and_overseer() {
        assert_eq!(address_to_identity("gastown/alice").rig(), Some("gastown"));
        assert_eq!(address_to_identity("mayor").rig(), None);
        assert_eq!(address_to_identity("overseer").rig(), None);
    }

    #[parameterized(
        empty = {""},
        dot = {"."},
        dotdot = {".."},
        slash = {"foo/bar"},
        dash = {"foo-bar"},
        dotted = {"foo.bar"},
        spaced = {"foo bar"},
    )]
    fn rejects_invalid_crew_names(name: &str) {
        assert!(validate_crew_name(name).is_err());
    }

    #[test]
    fn accepts_valid_crew_name() {
        assert!(validate_crew_name("alice").is_ok());
    }
}
