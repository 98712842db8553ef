// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dispatch by outbound address mode (§4.6 "the hard part"). Each mode
//! has its own retention/ephemeral/notification semantics; the router
//! makes no cross-recipient atomicity guarantee — a partial fan-out is
//! an observable, accepted outcome.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use gastown_addressing::{address_to_identity, Address};
use gastown_core::config::MessagingConfig;
use gastown_core::message::{subject_forces_ephemeral, MessageType, Priority};
use gastown_issues::{labels, IssueRecord, IssueStatus, IssueStore, ListFilter, NewIssue};
use tracing::{debug, warn};

use crate::error::RouterError;
use crate::groups;
use crate::notifier::Notifier;

/// A message a caller hands to the router, independent of the chosen
/// outbound address (§3 "Message (logical)", §4.6).
#[derive(Debug, Clone)]
pub struct OutboundMessage {
    pub from: String,
    pub to: Address,
    pub subject: String,
    pub body: String,
    pub priority: Priority,
    pub msg_type: MessageType,
    pub thread_id: Option<String>,
    pub reply_to: Option<String>,
    pub cc: Vec<String>,
    /// `None` means "decide from the subject heuristic" (§4.6.1).
    pub ephemeral: Option<bool>,
}

impl OutboundMessage {
    pub fn new(from: impl Into<String>, to: Address, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to,
            subject: subject.into(),
            body: body.into(),
            priority: Priority::Normal,
            msg_type: MessageType::Task,
            thread_id: None,
            reply_to: None,
            cc: Vec::new(),
            ephemeral: None,
        }
    }

    fn is_ephemeral(&self) -> bool {
        self.ephemeral.unwrap_or_else(|| subject_forces_ephemeral(&self.subject))
    }

    fn retarget(&self, to: Address) -> Self {
        Self { to, ..self.clone() }
    }
}

/// Outcome of a send: how many recipients (for fan-out modes) actually
/// got a stored message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendReport {
    pub delivered_ids: Vec<String>,
}

impl SendReport {
    fn single(id: String) -> Self {
        Self { delivered_ids: vec![id] }
    }
}

pub struct Router<N: Notifier = crate::notifier::NoopNotifier> {
    store: Arc<dyn IssueStore>,
    town_root: PathBuf,
    notifier: N,
}

impl<N: Notifier> Router<N> {
    pub fn new(store: Arc<dyn IssueStore>, town_root: impl Into<PathBuf>, notifier: N) -> Self {
        Self { store, town_root: town_root.into(), notifier }
    }

    pub fn send(&self, msg: &OutboundMessage) -> Result<SendReport, RouterError> {
        match &msg.to {
            Address::Single(identity) => self.send_direct(msg, identity),
            Address::List(name) => self.send_list(msg, name),
            Address::Queue(name) => self.send_queue(msg, name),
            Address::Announce(name) => self.send_announce(msg, name),
            Address::Channel(name) => self.send_channel(msg, name),
            Address::Group(expr) => self.send_group(msg, expr),
        }
    }

    fn send_direct(&self, msg: &OutboundMessage, recipient: &str) -> Result<SendReport, RouterError> {
        let recipient = address_to_identity(recipient).to_string();
        let id = self.create_record(msg, &recipient, msg.is_ephemeral())?;

        let sender = address_to_identity(&msg.from).to_string();
        if sender != recipient {
            self.best_effort_notify(&recipient, msg);
        }

        Ok(SendReport::single(id))
    }

    fn send_list(&self, msg: &OutboundMessage, name: &str) -> Result<SendReport, RouterError> {
        let config = self.messaging_config()?;
        let members = config.lists.get(name).cloned().unwrap_or_default();
        if members.is_empty() {
            return Err(RouterError::EmptyList(name.to_string()));
        }

        let mut delivered = Vec::new();
        let mut last_err = None;
        for member in &members {
            let per_member = msg.retarget(Address::Single(member.clone()));
            match self.send(&per_member) {
                Ok(report) => delivered.extend(report.delivered_ids),
                Err(e) => {
                    warn!(recipient = %member, error = %e, "list fan-out delivery failed");
                    last_err = Some(e);
                }
            }
        }

        if delivered.is_empty() {
            return Err(last_err.unwrap_or_else(|| RouterError::EmptyList(name.to_string())));
        }
        Ok(SendReport { delivered_ids: delivered })
    }

    fn send_queue(&self, msg: &OutboundMessage, name: &str) -> Result<SendReport, RouterError> {
        let config = self.messaging_config()?;
        if !config.queues.contains_key(name) {
            return Err(RouterError::UnknownQueue(name.to_string()));
        }

        // Queue messages are never ephemeral regardless of subject/explicit flag.
        let id = self.create_record(msg, &format!("queue:{name}"), false)?;
        Ok(SendReport::single(id))
    }

    fn send_announce(&self, msg: &OutboundMessage, name: &str) -> Result<SendReport, RouterError> {
        let config = self.messaging_config()?;
        let announce = config.announces.get(name).ok_or_else(|| RouterError::UnknownAnnounce(name.to_string()))?;

        self.enforce_announce_retention(name, announce.retain_count);

        let id = self.create_record(msg, &format!("announce:{name}"), false)?;
        Ok(SendReport::single(id))
    }

    fn send_channel(&self, msg: &OutboundMessage, name: &str) -> Result<SendReport, RouterError> {
        let channel = self
            .store
            .channel_get(name)?
            .filter(|c| !c.closed)
            .ok_or_else(|| RouterError::UnavailableChannel(name.to_string()))?;

        let primary_id = self.create_record(msg, &format!("channel:{name}"), false)?;

        if let Err(e) = self.store.channel_enforce_retention(name) {
            warn!(channel = %name, error = %e, "channel retention enforcement failed");
        }

        let sender = address_to_identity(&msg.from).to_string();
        let mut delivered = vec![primary_id];
        for subscriber in &channel.subscribers {
            if address_to_identity(subscriber).to_string() == sender {
                continue;
            }
            let personalized = OutboundMessage {
                subject: format!("[channel:{name}] {}", msg.subject),
                ..msg.retarget(Address::Single(subscriber.clone()))
            };
            match self.send_direct(&personalized, subscriber) {
                Ok(report) => delivered.extend(report.delivered_ids),
                Err(e) => warn!(subscriber = %subscriber, error = %e, "channel fan-out delivery failed"),
            }
        }

        Ok(SendReport { delivered_ids: delivered })
    }

    fn send_group(&self, msg: &OutboundMessage, expr: &gastown_addressing::GroupExpr) -> Result<SendReport, RouterError> {
        let members = groups::resolve(self.store.as_ref(), expr)?;

        let mut delivered = Vec::new();
        let mut failures = Vec::new();
        for member in &members {
            let per_member = msg.retarget(Address::Single(member.clone()));
            match self.send(&per_member) {
                Ok(report) => delivered.extend(report.delivered_ids),
                Err(e) => failures.push(format!("{member}: {e}")),
            }
        }

        if delivered.is_empty() {
            return Err(RouterError::FanOutFailed(failures.join("; ")));
        }
        Ok(SendReport { delivered_ids: delivered })
    }

    fn create_record(&self, msg: &OutboundMessage, assignee: &str, ephemeral: bool) -> Result<String, RouterError> {
        let mut record_labels = vec![labels::from_label(&msg.from), labels::msg_type_label(&msg.msg_type.to_string())];
        if let Some(thread_id) = &msg.thread_id {
            record_labels.push(labels::thread_label(thread_id));
        }
        if let Some(reply_to) = &msg.reply_to {
            record_labels.push(labels::reply_to_label(reply_to));
        }
        for cc in &msg.cc {
            record_labels.push(labels::cc_label(&address_to_identity(cc).to_string()));
        }
        if let Some(queue) = assignee.strip_prefix("queue:") {
            record_labels.push(labels::queue_label(queue));
        }
        if let Some(announce) = assignee.strip_prefix("announce:") {
            record_labels.push(labels::announce_label(announce));
        }
        if let Some(channel) = assignee.strip_prefix("channel:") {
            record_labels.push(labels::channel_label(channel));
        }

        let id = self.store.create(NewIssue {
            title: msg.subject.clone(),
            issue_type: "message".to_string(),
            assignee: assignee.to_string(),
            body: msg.body.clone(),
            priority: msg.priority.as_store_int(),
            labels: record_labels,
            actor: msg.from.clone(),
            ephemeral,
        })?;
        Ok(id)
    }

    /// Close the oldest announce records until the post-create count would
    /// be at most `retain_count`, BEFORE the new message is created, so a
    /// crash between prune and create leaves the store under the limit
    /// rather than over it.
    fn enforce_announce_retention(&self, name: &str, retain_count: u32) {
        let existing = match self.store.list(
            &ListFilter::new()
                .label(labels::announce_label(name))
                .status(IssueStatus::Open)
                .sort(gastown_issues::SortOrder::OldestFirst),
        ) {
            Ok(records) => records,
            Err(e) => {
                warn!(announce = %name, error = %e, "failed to list announce history for retention pruning");
                return;
            }
        };

        let retain = retain_count as usize;
        if existing.len() < retain {
            return;
        }

        let excess = existing.len() - retain.saturating_sub(1);
        for stale in existing.iter().take(excess) {
            if let Err(e) = self.store.close(&stale.id, None) {
                warn!(id = %stale.id, announce = %name, error = %e, "retention pruning failed to close stale announce");
            }
        }
    }

    fn best_effort_notify(&self, recipient: &str, msg: &OutboundMessage) {
        let text = format!("[mail] {} <- {}: {}", recipient, msg.from, msg.subject);
        if let Err(e) = self.notifier.notify(recipient, &text) {
            debug!(recipient = %recipient, error = %e, "best-effort notification failed");
        }
    }

    fn messaging_config(&self) -> Result<MessagingConfig, RouterError> {
        let path = self.messaging_config_path();
        Ok(gastown_store::read_json(&path).map_err(|e| {
            RouterError::Core(gastown_core::CoreError::invalid(format!(
                "failed to read messaging config at {}: {e}",
                path.display()
            )))
        })?
        .unwrap_or_default())
    }

    fn messaging_config_path(&self) -> PathBuf {
        self.town_root.join("config").join("messaging.json")
    }
}

/// Fetch records sharing a thread id, oldest-first (§4.5 "Thread").
pub fn thread(store: &dyn IssueStore, id: &str) -> Result<Vec<IssueRecord>, RouterError> {
    Ok(store.thread(id)?)
}

pub fn town_root(p: impl AsRef<Path>) -> PathBuf {
    p.as_ref().to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;
    use gastown_addressing::GroupExpr;
    use gastown_issues::FakeIssueStore;
    use gastown_store::write_json;
    use tempfile::tempdir;

    fn router_with_config(store: Arc<dyn IssueStore>, dir: &Path, config: &MessagingConfig) -> Router {
        write_json(&dir.join("config").join("messaging.json"), config).unwrap();
        Router::new(store, dir.to_path_buf(), crate::notifier::NoopNotifier)
    }

    #[test]
    fn direct_send_creates_record() {
        let store: Arc<dyn IssueStore> = Arc::new(FakeIssueStore::new());
        let dir = tempdir().unwrap();
        let router = router_with_config(store, dir.path(), &MessagingConfig::default());

        let msg = OutboundMessage::new("mayor/", Address::Single("r1/alice".into()), "hello", "body");
        let report = router.send(&msg).unwrap();
        assert_eq!(report.delivered_ids.len(), 1);
    }

    #[test]
    fn direct_send_to_self_does_not_notify() {
        use crate::notifier::Notifier;
        use std::sync::atomic::{AtomicBool, Ordering};

        struct Flag(Arc<AtomicBool>);
        impl Notifier for Flag {
            fn notify(&self, _identity: &str, _text: &str) -> Result<(), String> {
                self.0.store(true, Ordering::SeqCst);
                Ok(())
            }
        }

        let flag = Arc::new(AtomicBool::new(false));
        let store: Arc<dyn IssueStore> = Arc::new(FakeIssueStore::new());
        let dir = tempdir().unwrap();
        write_json(&dir.path().join("config").join("messaging.json"), &MessagingConfig::default()).unwrap();
        let router = Router::new(store, dir.path().to_path_buf(), Flag(flag.clone()));

        let msg = OutboundMessage::new("mayor/", Address::Single("mayor".into()), "note to self", "body");
        router.send(&msg).unwrap();
        assert!(!flag.load(Ordering::SeqCst));
    }

    #[test]
    fn nudge_subject_forces_ephemeral() {
        let store: Arc<dyn IssueStore> = Arc::new(FakeIssueStore::new());
        let dir = tempdir().unwrap();
        let router = router_with_config(store.clone(), dir.path(), &MessagingConfig::default());

        let msg = OutboundMessage::new("r1/alice", Address::Single("r1/witness".into()), "nudge: checking in", "");
        let report = router.send(&msg).unwrap();
        let id = &report.delivered_ids[0];
        let record = store.show(id).unwrap();
        assert!(record.ephemeral);
    }

    #[test]
    fn list_fans_out_to_every_member() {
        let store: Arc<dyn IssueStore> = Arc::new(FakeIssueStore::new());
        let dir = tempdir().unwrap();
        let mut config = MessagingConfig::default();
        config.lists.insert("oncall".into(), vec!["r1/alice".into(), "r1/bob".into()]);
        let router = router_with_config(store, dir.path(), &config);

        let msg = OutboundMessage::new("mayor/", Address::List("oncall".into()), "ping", "body");
        let report = router.send(&msg).unwrap();
        assert_eq!(report.delivered_ids.len(), 2);
    }

    #[test]
    fn undefined_list_is_rejected() {
        let store: Arc<dyn IssueStore> = Arc::new(FakeIssueStore::new());
        let dir = tempdir().unwrap();
        let router = router_with_config(store, dir.path(), &MessagingConfig::default());

        let msg = OutboundMessage::new("mayor/", Address::List("ghost".into()), "ping", "body");
        assert!(matches!(router.send(&msg), Err(RouterError::EmptyList(_))));
    }

    #[test]
    fn queue_send_is_single_copy_and_never_ephemeral() {
        let store: Arc<dyn IssueStore> = Arc::new(FakeIssueStore::new());
        let dir = tempdir().unwrap();
        let mut config = MessagingConfig::default();
        config.queues.insert("work".into(), Default::default());
        let router = router_with_config(store.clone(), dir.path(), &config);

        let msg = OutboundMessage::new("mayor/", Address::Queue("work".into()), "nudge", "body");
        let report = router.send(&msg).unwrap();
        assert_eq!(report.delivered_ids.len(), 1);
        let record = store.show(&report.delivered_ids[0]).unwrap();
        assert!(!record.ephemeral);
        assert_eq!(record.assignee, "queue:work");
    }

    #[test]
    fn unknown_queue_is_rejected() {
        let store: Arc<dyn IssueStore> = Arc::new(FakeIssueStore::new());
        let dir = tempdir().unwrap();
        let router = router_with_config(store, dir.path(), &MessagingConfig::default());

        let msg = OutboundMessage::new("mayor/", Address::Queue("ghost".into()), "ping", "body");
        assert!(matches!(router.send(&msg), Err(RouterError::UnknownQueue(_))));
    }

    #[test]
    fn announce_prunes_before_create_to_stay_at_retain_count() {
        let store: Arc<dyn IssueStore> = Arc::new(FakeIssueStore::new());
        let dir = tempdir().unwrap();
        let mut config = MessagingConfig::default();
        config.announces.insert("alerts".into(), gastown_core::AnnounceConfig { retain_count: 2 });
        let router = router_with_config(store.clone(), dir.path(), &config);

        for i in 0..4 {
            let msg = OutboundMessage::new("mayor/", Address::Announce("alerts".into()), format!("alert {i}"), "body");
            router.send(&msg).unwrap();
        }

        let open = store
            .list(&ListFilter::new().label(labels::announce_label("alerts")).status(IssueStatus::Open))
            .unwrap();
        assert_eq!(open.len(), 2);
    }

    #[test]
    fn group_resolution_failure_is_reported() {
        let store: Arc<dyn IssueStore> = Arc::new(FakeIssueStore::new());
        let dir = tempdir().unwrap();
        let router = router_with_config(store, dir.path(), &MessagingConfig::default());

        let msg = OutboundMessage::new("mayor/", Address::Group(GroupExpr::Witnesses), "ping", "body");
        assert!(matches!(router.send(&msg), Err(RouterError::EmptyGroup(_))));
    }
}
