// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory `IssueStore` test double, mirroring the teacher's
//! `Clock`/`FakeClock` shape: an `Arc<Mutex<...>>` of state behind the
//! same trait surface as the production adapter, so every upstream crate
//! (mailbox, router, health) can be tested without a real `bd` binary.

use crate::error::IssuesError;
use crate::record::{IssueRecord, IssueStatus, ListFilter, NewIssue, SortOrder};
use crate::store::{ChannelInfo, IssueStore};
use chrono::Utc;
use gastown_core::CoreError;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Default)]
struct State {
    issues: HashMap<String, IssueRecord>,
    config: HashMap<String, String>,
    channels: HashMap<String, ChannelInfo>,
}

/// In-memory issue store. Ids are minted sequentially (`gt-fake-1`,
/// `gt-fake-2`, ...) — deterministic, not random, so test assertions can
/// reference them directly.
#[derive(Clone)]
pub struct FakeIssueStore {
    state: Arc<Mutex<State>>,
    next_id: Arc<AtomicU64>,
}

impl FakeIssueStore {
    pub fn new() -> Self {
        Self { state: Arc::new(Mutex::new(State::default())), next_id: Arc::new(AtomicU64::new(1)) }
    }

    /// Seed a channel directly (bypassing the opaque store-side creation
    /// the spec treats as out of scope for the core).
    pub fn seed_channel(&self, name: &str, subscribers: Vec<String>) {
        self.state.lock().channels.insert(name.to_string(), ChannelInfo { subscribers, closed: false });
    }

    pub fn close_channel(&self, name: &str) {
        if let Some(ch) = self.state.lock().channels.get_mut(name) {
            ch.closed = true;
        }
    }

    /// Direct read access for test assertions, bypassing the trait's
    /// list filtering.
    pub fn all(&self) -> Vec<IssueRecord> {
        self.state.lock().issues.values().cloned().collect()
    }
}

impl Default for FakeIssueStore {
    fn default() -> Self {
        Self::new()
    }
}

impl IssueStore for FakeIssueStore {
    fn create(&self, issue: NewIssue) -> Result<String, IssuesError> {
        let id = format!("gt-fake-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        let record = IssueRecord {
            id: id.clone(),
            issue_type: issue.issue_type,
            title: issue.title,
            description: issue.body,
            assignee: issue.assignee,
            priority: issue.priority,
            status: IssueStatus::Open,
            created_at: Utc::now(),
            labels: issue.labels,
            ephemeral: issue.ephemeral,
            pinned: false,
        };
        self.state.lock().issues.insert(id.clone(), record);
        Ok(id)
    }

    fn show(&self, id: &str) -> Result<IssueRecord, IssuesError> {
        self.state
            .lock()
            .issues
            .get(id)
            .cloned()
            .ok_or_else(|| IssuesError(CoreError::not_found(format!("issue {id}"))))
    }

    fn list(&self, filter: &ListFilter) -> Result<Vec<IssueRecord>, IssuesError> {
        let state = self.state.lock();
        let mut results: Vec<IssueRecord> = state
            .issues
            .values()
            .filter(|r| filter.issue_type.as_deref().map(|t| t == r.issue_type).unwrap_or(true))
            .filter(|r| filter.assignee.as_deref().map(|a| a == r.assignee).unwrap_or(true))
            .filter(|r| filter.label.as_deref().map(|l| r.has_label(l)).unwrap_or(true))
            .filter(|r| filter.status.map(|s| s == r.status).unwrap_or(true))
            .cloned()
            .collect();
        match filter.sort {
            Some(SortOrder::OldestFirst) => results.sort_by_key(|r| r.created_at),
            _ => results.sort_by_key(|r| std::cmp::Reverse(r.created_at)),
        }
        if let Some(limit) = filter.limit {
            results.truncate(limit);
        }
        Ok(results)
    }

    fn close(&self, id: &str, _session: Option<&str>) -> Result<(), IssuesError> {
        let mut state = self.state.lock();
        let record = state
            .issues
            .get_mut(id)
            .ok_or_else(|| IssuesError(CoreError::not_found(format!("issue {id}"))))?;
        record.status = IssueStatus::Closed;
        Ok(())
    }

    fn reopen(&self, id: &str) -> Result<(), IssuesError> {
        let mut state = self.state.lock();
        let record = state
            .issues
            .get_mut(id)
            .ok_or_else(|| IssuesError(CoreError::not_found(format!("issue {id}"))))?;
        record.status = IssueStatus::Open;
        Ok(())
    }

    fn label_add(&self, id: &str, label: &str) -> Result<(), IssuesError> {
        let mut state = self.state.lock();
        let record = state
            .issues
            .get_mut(id)
            .ok_or_else(|| IssuesError(CoreError::not_found(format!("issue {id}"))))?;
        if !record.labels.iter().any(|l| l == label) {
            record.labels.push(label.to_string());
        }
        Ok(())
    }

    fn label_remove(&self, id: &str, label: &str) -> Result<(), IssuesError> {
        let mut state = self.state.lock();
        if let Some(record) = state.issues.get_mut(id) {
            record.labels.retain(|l| l != label);
        }
        Ok(())
    }

    fn thread(&self, id: &str) -> Result<Vec<IssueRecord>, IssuesError> {
        let state = self.state.lock();
        let thread_id = match crate::labels::thread_of(&state.issues.get(id).map(|r| r.labels.clone()).unwrap_or_default()) {
            Some(t) => t.to_string(),
            None => return Ok(Vec::new()),
        };
        let mut results: Vec<IssueRecord> =
            state.issues.values().filter(|r| r.has_label(&format!("thread:{thread_id}"))).cloned().collect();
        results.sort_by_key(|r| r.created_at);
        Ok(results)
    }

    fn config_get(&self, key: &str) -> Result<Option<String>, IssuesError> {
        Ok(self.state.lock().config.get(key).cloned())
    }

    fn config_set(&self, key: &str, value: &str) -> Result<(), IssuesError> {
        self.state.lock().config.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn init(&self, prefix: &str) -> Result<(), IssuesError> {
        self.state.lock().config.insert("prefix".to_string(), prefix.to_string());
        Ok(())
    }

    fn import(&self) -> Result<(), IssuesError> {
        Ok(())
    }

    fn rename_prefix(&self, new_prefix: &str) -> Result<(), IssuesError> {
        self.state.lock().config.insert("prefix".to_string(), new_prefix.to_string());
        Ok(())
    }

    fn channel_get(&self, name: &str) -> Result<Option<ChannelInfo>, IssuesError> {
        Ok(self.state.lock().channels.get(name).cloned())
    }

    fn channel_enforce_retention(&self, _name: &str) -> Result<(), IssuesError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels;

    fn new_issue(assignee: &str, labels: Vec<String>) -> NewIssue {
        NewIssue {
            title: "hi".into(),
            issue_type: "message".into(),
            assignee: assignee.into(),
            body: "body".into(),
            priority: 2,
            labels,
            actor: "mayor/".into(),
            ephemeral: false,
        }
    }

    #[test]
    fn create_then_show_round_trips() {
        let store = FakeIssueStore::new();
        let id = store.create(new_issue("r1/alice", vec![])).unwrap();
        let record = store.show(&id).unwrap();
        assert_eq!(record.assignee, "r1/alice");
    }

    #[test]
    fn show_missing_is_not_found() {
        let store = FakeIssueStore::new();
        let err = store.show("gt-fake-999").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn close_then_list_open_excludes_it() {
        let store = FakeIssueStore::new();
        let id = store.create(new_issue("r1/alice", vec![])).unwrap();
        store.close(&id, None).unwrap();
        let open = store.list(&ListFilter::new().status(IssueStatus::Open)).unwrap();
        assert!(open.is_empty());
    }

    #[test]
    fn label_remove_on_missing_label_is_tolerated() {
        let store = FakeIssueStore::new();
        let id = store.create(new_issue("r1/alice", vec![])).unwrap();
        assert!(store.label_remove(&id, "nonexistent").is_ok());
    }

    #[test]
    fn thread_groups_by_thread_label() {
        let store = FakeIssueStore::new();
        let root = store.create(new_issue("r1/alice", vec![labels::thread_label("t1")])).unwrap();
        let _reply = store.create(new_issue("r1/alice", vec![labels::thread_label("t1")])).unwrap();
        let _unrelated = store.create(new_issue("r1/alice", vec![])).unwrap();
        let thread = store.thread(&root).unwrap();
        assert_eq!(thread.len(), 2);
    }
}
