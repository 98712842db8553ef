// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Outbound address mode (§3 "Address mode"), grounded on the teacher's
//! `RunTarget` — a tagged string with mutually exclusive prefixes, parsed
//! via `strip_prefix` chains rather than a general parser combinator.

use crate::group::{parse_group, GroupExpr};
use crate::identity::address_to_identity;
use std::fmt;

/// Exactly one of: a single identity, a `@group`, or a `list:`/`queue:`/
/// `announce:`/`channel:` prefixed name. The routing mode is determined
/// by prefix; modes are mutually exclusive by construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Address {
    Single(String),
    Group(GroupExpr),
    List(String),
    Queue(String),
    Announce(String),
    Channel(String),
}

/// Failure parsing an outbound address: an unrecognized `@group`
/// expression (§4.4 "null parse").
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("invalid group expression: {0}")]
pub struct InvalidGroup(pub String);

/// Parse an outbound address string.
///
/// `@...` prefixes that fail to parse as a known group are a
/// distinguished error rather than falling back to a single identity —
/// the grammar is liberal about identity shape but not about group shape.
pub fn parse_address(s: &str) -> Result<Address, InvalidGroup> {
    if s.starts_with('@') {
        return parse_group(s).map(Address::Group).ok_or_else(|| InvalidGroup(s.to_string()));
    }
    if let Some(name) = s.strip_prefix("list:") {
        return Ok(Address::List(name.to_string()));
    }
    if let Some(name) = s.strip_prefix("queue:") {
        return Ok(Address::Queue(name.to_string()));
    }
    if let Some(name) = s.strip_prefix("announce:") {
        return Ok(Address::Announce(name.to_string()));
    }
    if let Some(name) = s.strip_prefix("channel:") {
        return Ok(Address::Channel(name.to_string()));
    }
    Ok(Address::Single(address_to_identity(s).into()))
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Address::Single(id) => write!(f, "{id}"),
            Address::Group(g) => write!(f, "{g}"),
            Address::List(n) => write!(f, "list:{n}"),
            Address::Queue(n) => write!(f, "queue:{n}"),
            Address::Announce(n) => write!(f, "announce:{n}"),
            Address::Channel(n) => write!(f, "channel:{n}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_each_mode() {
        assert_eq!(parse_address("mayor/").unwrap(), Address::Single("mayor/".into()));
        assert_eq!(
            parse_address("@rig/gastown").unwrap(),
            Address::Group(GroupExpr::Rig("gastown".into()))
        );
        assert_eq!(parse_address("list:oncall").unwrap(), Address::List("oncall".into()));
        assert_eq!(parse_address("queue:work").unwrap(), Address::Queue("work".into()));
        assert_eq!(parse_address("announce:alerts").unwrap(), Address::Announce("alerts".into()));
        assert_eq!(parse_address("channel:general").unwrap(), Address::Channel("general".into()));
    }

    #[test]
    fn unknown_group_is_rejected() {
        assert!(parse_address("@spaceship").is_err());
    }

    #[test]
    fn single_identity_is_normalized() {
        assert_eq!(
            parse_address("gastown/crew/alice").unwrap(),
            Address::Single("gastown/alice".into())
        );
    }
}
