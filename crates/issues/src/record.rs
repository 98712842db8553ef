// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stored issue record shapes (§3 "Message (stored)", §4.3).
//!
//! The issue store returns heterogeneous JSON; callers narrow an
//! [`IssueRecord`] into a message/agent/merge-request view based on its
//! labels, never on a second round-trip through the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Open/closed status of a stored issue. "hooked" (claimed-but-open) is
/// represented as `Open` plus a `claimed-by` label, not a third status —
/// the store itself only knows open/closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueStatus {
    Open,
    Closed,
}

gastown_core::simple_display! {
    IssueStatus {
        Open => "open",
        Closed => "closed",
    }
}

/// A record as returned by `show`/`list`/`thread` (§4.3 table).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueRecord {
    pub id: String,
    pub issue_type: String,
    pub title: String,
    pub description: String,
    pub assignee: String,
    pub priority: i32,
    pub status: IssueStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub ephemeral: bool,
    #[serde(default)]
    pub pinned: bool,
}

impl IssueRecord {
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }

    /// Labels of the form `prefix:value`, returning only the value.
    pub fn label_values<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.labels.iter().filter_map(move |l| l.strip_prefix(prefix))
    }

    pub fn is_unread(&self) -> bool {
        self.status == IssueStatus::Open && !self.has_label("read")
    }
}

/// Input to `create` (§4.3). `ephemeral` is a request, not a guarantee —
/// the store is the final authority on whether a record is durably
/// exported.
#[derive(Debug, Clone)]
pub struct NewIssue {
    pub title: String,
    pub issue_type: String,
    pub assignee: String,
    pub body: String,
    pub priority: i32,
    pub labels: Vec<String>,
    pub actor: String,
    pub ephemeral: bool,
}

/// Filter for `list` (§4.3). All fields are optional; an absent field
/// means "don't filter on this".
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    pub issue_type: Option<String>,
    pub assignee: Option<String>,
    pub label: Option<String>,
    pub status: Option<IssueStatus>,
    pub limit: Option<usize>,
    pub sort: Option<SortOrder>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    NewestFirst,
    OldestFirst,
}

impl ListFilter {
    pub fn new() -> Self {
        Self::default()
    }

    gastown_core::setters! {
        option {
            issue_type: String,
            assignee: String,
            label: String,
            status: IssueStatus,
            limit: usize,
            sort: SortOrder,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(labels: &[&str]) -> IssueRecord {
        IssueRecord {
            id: "gt-1".into(),
            issue_type: "message".into(),
            title: "hi".into(),
            description: String::new(),
            assignee: "r1/alice".into(),
            priority: 2,
            status: IssueStatus::Open,
            created_at: Utc.timestamp_opt(0, 0).unwrap(),
            labels: labels.iter().map(|s| s.to_string()).collect(),
            ephemeral: false,
            pinned: false,
        }
    }

    #[test]
    fn unread_requires_open_and_no_read_label() {
        assert!(record(&[]).is_unread());
        assert!(!record(&["read"]).is_unread());
        let mut closed = record(&[]);
        closed.status = IssueStatus::Closed;
        assert!(!closed.is_unread());
    }

    #[test]
    fn label_values_extracts_by_prefix() {
        let r = record(&["cc:r1/bob", "cc:r1/carol", "thread:t1"]);
        let ccs: Vec<&str> = r.label_values("cc:").collect();
        assert_eq!(ccs, vec!["r1/bob", "r1/carol"]);
    }
}
