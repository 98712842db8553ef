// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Group expression parsing (§3 "Group expression").

use std::fmt;

/// A `@group` expression. Resolution to a concrete identity set happens
/// in the router (§4.6.6), which is the layer with access to the issue
/// store's agent records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupExpr {
    Overseer,
    Town,
    Witnesses,
    Dogs,
    Refineries,
    Deacons,
    Rig(String),
    Crew(String),
    Polecats(String),
}

impl fmt::Display for GroupExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupExpr::Overseer => write!(f, "@overseer"),
            GroupExpr::Town => write!(f, "@town"),
            GroupExpr::Witnesses => write!(f, "@witnesses"),
            GroupExpr::Dogs => write!(f, "@dogs"),
            GroupExpr::Refineries => write!(f, "@refineries"),
            GroupExpr::Deacons => write!(f, "@deacons"),
            GroupExpr::Rig(name) => write!(f, "@rig/{name}"),
            GroupExpr::Crew(rig) => write!(f, "@crew/{rig}"),
            GroupExpr::Polecats(rig) => write!(f, "@polecats/{rig}"),
        }
    }
}

/// Parse a `@...` group expression. Returns `None` — a "null parse" — on
/// an unknown prefix or a missing qualifier; the router rejects that as
/// "invalid group" rather than guessing.
pub fn parse_group(s: &str) -> Option<GroupExpr> {
    let body = s.strip_prefix('@')?;
    match body {
        "overseer" => Some(GroupExpr::Overseer),
        "town" => Some(GroupExpr::Town),
        "witnesses" => Some(GroupExpr::Witnesses),
        "dogs" => Some(GroupExpr::Dogs),
        "refineries" => Some(GroupExpr::Refineries),
        "deacons" => Some(GroupExpr::Deacons),
        other => {
            if let Some(name) = other.strip_prefix("rig/") {
                return non_empty(name).map(|n| GroupExpr::Rig(n.to_string()));
            }
            if let Some(rig) = other.strip_prefix("crew/") {
                return non_empty(rig).map(|r| GroupExpr::Crew(r.to_string()));
            }
            if let Some(rig) = other.strip_prefix("polecats/") {
                return non_empty(rig).map(|r| GroupExpr::Polecats(r.to_string()));
            }
            None
        }
    }
}

fn non_empty(s: &str) -> Option<&str> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yare::parameterized;

    #[parameterized(
        overseer = {"@overseer", GroupExpr::Overseer},
        town = {"@town", GroupExpr::Town},
        witnesses = {"@witnesses", GroupExpr::Witnesses},
        dogs = {"@dogs", GroupExpr::Dogs},
        refineries = {"@refineries", GroupExpr::Refineries},
        deacons = {"@deacons", GroupExpr::Deacons},
        rig = {"@rig/gastown", GroupExpr::Rig("gastown".to_string())},
        crew = {"@crew/gastown", GroupExpr::Crew("gastown".to_string())},
        polecats = {"@polecats/gastown", GroupExpr::Polecats("gastown".to_string())},
    )]
    fn parses_known_groups(input: &str, expected: GroupExpr) {
        assert_eq!(parse_group(input), Some(expected));
    }

    #[parameterized(
        no_at_sign = {"rig/gastown"},
        unknown_prefix = {"@spaceship"},
        missing_qualifier_rig = {"@rig/"},
        missing_qualifier_crew = {"@crew/"},
    )]
    fn rejects_invalid_groups_as_null_parse(input: &str) {
        assert_eq!(parse_group(input), None);
    }

    #[test]
    fn display_round_trips_through_parse() {
        for g in [
            GroupExpr::Overseer,
            GroupExpr::Rig("gastown".into()),
            GroupExpr::Crew("gastown".into()),
            GroupExpr::Polecats("gastown".into()),
        ] {
            let rendered = g.to_string();
            assert_eq!(parse_group(&rendered), Some(g));
        }
    }
}
