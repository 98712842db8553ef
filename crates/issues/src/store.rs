// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `IssueStore` adapter trait (§4.3) — the one seam through which all
//! durable mail and agent records flow. Deliberately synchronous: per §5,
//! the core has no long-lived runtime, so every implementation either
//! shells out and blocks on `wait()`, or (in tests) mutates an in-memory
//! map directly.

use crate::error::IssuesError;
use crate::record::{IssueRecord, ListFilter, NewIssue};

/// Opaque command-line gateway to the external issue tracker.
///
/// The adapter MUST NOT interpret store internals beyond this surface —
/// address-to-identity conversion and label construction live in the
/// caller layers (mailbox, router), not here.
pub trait IssueStore: Send + Sync {
    /// Create a new issue. Returns its id. Errors are surfaced verbatim.
    fn create(&self, issue: NewIssue) -> Result<String, IssuesError>;

    /// Fetch a single record by id. "not found" is a distinguished error.
    fn show(&self, id: &str) -> Result<IssueRecord, IssuesError>;

    /// List records matching a filter. An empty result is not an error;
    /// any non-parse failure from the underlying tool is returned.
    fn list(&self, filter: &ListFilter) -> Result<Vec<IssueRecord>, IssuesError>;

    /// Close an issue, optionally attributing the close to a session id.
    fn close(&self, id: &str, session: Option<&str>) -> Result<(), IssuesError>;

    /// Reopen a closed issue.
    fn reopen(&self, id: &str) -> Result<(), IssuesError>;

    /// Add a label. Idempotent in practice — adding an already-present
    /// label is not an error.
    fn label_add(&self, id: &str, label: &str) -> Result<(), IssuesError>;

    /// Remove a label. "does not have label" is tolerated, not an error.
    fn label_remove(&self, id: &str, label: &str) -> Result<(), IssuesError>;

    /// All records sharing a thread id, given the thread's root id.
    /// Empty is tolerated.
    fn thread(&self, id: &str) -> Result<Vec<IssueRecord>, IssuesError>;

    /// Read a store-level config value. Absent key is tolerated (`None`).
    fn config_get(&self, key: &str) -> Result<Option<String>, IssuesError>;

    /// Write a store-level config value.
    fn config_set(&self, key: &str, value: &str) -> Result<(), IssuesError>;

    /// Initialize a fresh store with the given issue-id prefix. May fail
    /// if the external tool is absent — callers may fall back to writing
    /// a minimal config themselves.
    fn init(&self, prefix: &str) -> Result<(), IssuesError>;

    /// Import data files into the store's database. Used only by
    /// health-fix when data files exist but the db is empty.
    fn import(&self) -> Result<(), IssuesError>;

    /// Rename the store's issue-id prefix in place. Treated opaquely.
    fn rename_prefix(&self, new_prefix: &str) -> Result<(), IssuesError>;

    /// Fetch a channel's subscriber/closed state. Treated opaquely.
    fn channel_get(&self, name: &str) -> Result<Option<ChannelInfo>, IssuesError>;

    /// Ask the store to enforce a channel's own retention policy.
    /// Treated opaquely — the core does not compute retention for
    /// channels itself (unlike announces, which it computes directly).
    fn channel_enforce_retention(&self, name: &str) -> Result<(), IssuesError>;
}

/// Channel subscriber/closed state as returned by `channel_get` (§4.3,
/// §4.6.5). Opaque beyond these two fields — the store owns everything
/// else about a channel.
#[derive(Debug, Clone)]
pub struct ChannelInfo {
    pub subscribers: Vec<String>,
    pub closed: bool,
}
