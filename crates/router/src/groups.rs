// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `@group` resolution to a concrete identity set (§4.6.6): "issuing
//! agent queries to the store (filter on role type and/or rig appearing
//! in the agent record"). Agent records are `type=agent` issues carrying
//! a `gt:role:<role>` label and, when rig-scoped, a `gt:rig:<rig>` label
//! (§3's expanded agent-record shape).

use gastown_addressing::GroupExpr;
use gastown_issues::{IssueStatus, IssueStore, ListFilter};

use crate::error::RouterError;

pub fn role_label(role: &str) -> String {
    format!("gt:role:{role}")
}

pub fn rig_label(rig: &str) -> String {
    format!("gt:rig:{rig}")
}

/// Roles (and optional rig filter) a group expression resolves to.
fn criteria(expr: &GroupExpr) -> (&'static [&'static str], Option<&str>) {
    match expr {
        GroupExpr::Overseer => (&[], None),
        GroupExpr::Town => (&["mayor", "deacon"], None),
        GroupExpr::Witnesses => (&["witness"], None),
        GroupExpr::Refineries => (&["refinery"], None),
        GroupExpr::Deacons => (&["deacon"], None),
        GroupExpr::Dogs => (&["crew", "polecat"], None),
        GroupExpr::Rig(rig) => (&[], Some(rig.as_str())),
        GroupExpr::Crew(rig) => (&["crew"], Some(rig.as_str())),
        GroupExpr::Polecats(rig) => (&["polecat"], Some(rig.as_str())),
    }
}

/// Resolve a group expression to the set of live (status `open`) agent
/// identities it currently names. `@overseer` is special-cased to the
/// human operator identity, which has no agent record in the store.
pub fn resolve(store: &dyn IssueStore, expr: &GroupExpr) -> Result<Vec<String>, RouterError> {
    if matches!(expr, GroupExpr::Overseer) {
        return Ok(vec!["overseer".to_string()]);
    }

    let (roles, rig) = criteria(expr);
    let records = store.list(&ListFilter::new().issue_type("agent").status(IssueStatus::Open))?;

    let mut identities: Vec<String> = records
        .into_iter()
        .filter(|r| roles.is_empty() || roles.iter().any(|role| r.has_label(&role_label(role))))
        .filter(|r| match rig {
            Some(rig) => r.has_label(&rig_label(rig)),
            None => true,
        })
        .map(|r| r.assignee)
        .collect();

    identities.sort();
    identities.dedup();

    if identities.is_empty() {
        return Err(RouterError::EmptyGroup(expr.to_string()));
    }
    Ok(identities)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gastown_issues::FakeIssueStore;
    use gastown_issues::NewIssue;

    fn seed_agent(store: &FakeIssueStore, identity: &str, role: &str, rig: Option<&str>) {
        let mut labels = vec![role_label(role)];
        if let Some(rig) = rig {
            labels.push(rig_label(rig));
        }
        store
            .create(NewIssue {
                title: format!("agent {identity}"),
                issue_type: "agent".into(),
                assignee: identity.into(),
                body: String::new(),
                priority: 2,
                labels,
                actor: "system".into(),
                ephemeral: false,
            })
            .unwrap();
    }

    #[test]
    fn overseer_bypasses_store() {
        let store = FakeIssueStore::new();
        let ids = resolve(&store, &GroupExpr::Overseer).unwrap();
        assert_eq!(ids, vec!["overseer".to_string()]);
    }

    #[test]
    fn witnesses_filters_by_role_across_rigs() {
        let store = FakeIssueStore::new();
        seed_agent(&store, "r1/witness", "witness", Some("r1"));
        seed_agent(&store, "r2/witness", "witness", Some("r2"));
        seed_agent(&store, "r1/alice", "crew", Some("r1"));
        let mut ids = resolve(&store, &GroupExpr::Witnesses).unwrap();
        ids.sort();
        assert_eq!(ids, vec!["r1/witness".to_string(), "r2/witness".to_string()]);
    }

    #[test]
    fn crew_filters_by_role_and_rig() {
        let store = FakeIssueStore::new();
        seed_agent(&store, "r1/alice", "crew", Some("r1"));
        seed_agent(&store, "r2/bob", "crew", Some("r2"));
        let ids = resolve(&store, &GroupExpr::Crew("r1".into())).unwrap();
        assert_eq!(ids, vec!["r1/alice".to_string()]);
    }

    #[test]
    fn rig_group_includes_every_role() {
        let store = FakeIssueStore::new();
        seed_agent(&store, "r1/witness", "witness", Some("r1"));
        seed_agent(&store, "r1/alice", "crew", Some("r1"));
        let mut ids = resolve(&store, &GroupExpr::Rig("r1".into())).unwrap();
        ids.sort();
        assert_eq!(ids, vec!["r1/alice".to_string(), "r1/witness".to_string()]);
    }

    #[test]
    fn empty_resolution_is_an_error() {
        let store = FakeIssueStore::new();
        let err = resolve(&store, &GroupExpr::Deacons).unwrap_err();
        assert!(matches!(err, RouterError::EmptyGroup(_)));
    }
}
