// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The beads-backed mailbox (§4.5): a per-identity view over the issue
//! store. Parameterized by an identity and the `IssueStore` bound to the
//! relevant directory — resolving *which* store that is happens one
//! layer up, in the workspace resolver.

use crate::error::MailboxError;
use crate::message::MailboxMessage;
use gastown_issues::{labels, IssueStatus, IssueStore, ListFilter};
use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::warn;

/// The identity plus every historic surface form the issue store might
/// have an assignee recorded under (§4.5 "mayor/ and legacy mayor").
///
/// The canonical form comes from `gastown-addressing`'s normalizer; the
/// other variant is whatever that normalizer collapsed away (a trailing
/// slash added or stripped), since older records may predate that
/// normalization.
fn identity_variants(identity: &str) -> Vec<String> {
    let canonical = gastown_addressing::address_to_identity(identity).to_string();
    let mut variants = vec![canonical.clone()];
    if let Some(bare) = canonical.strip_suffix('/') {
        if !bare.is_empty() {
            variants.push(bare.to_string());
        }
    } else {
        variants.push(format!("{canonical}/"));
    }
    variants
}

/// A per-identity view over a beads-backed issue store.
///
/// `archive_path` is where [`Mailbox::archive`] appends copies of
/// archived messages — conventionally `<workspace>/mail/archive.jsonl`,
/// but this crate does not compute that path itself (workspace layout is
/// the resolver's job).
pub struct Mailbox {
    identity: String,
    store: Arc<dyn IssueStore>,
    archive_path: PathBuf,
}

impl Mailbox {
    pub fn new(identity: impl Into<String>, store: Arc<dyn IssueStore>, archive_path: impl Into<PathBuf>) -> Self {
        Self { identity: identity.into(), store, archive_path: archive_path.into() }
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// List inbox messages: assignee == this identity (any historic
    /// variant) at open status, plus anything CC'd to this identity at
    /// open status. Deduplicated by id, newest-first.
    ///
    /// If every underlying query fails, the last error propagates;
    /// otherwise a partial result (missing fragments silently omitted)
    /// is acceptable — this mirrors the router's own "best effort unless
    /// everything failed" posture.
    pub fn list(&self) -> Result<Vec<MailboxMessage>, MailboxError> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        let mut last_err = None;
        let mut any_ok = false;

        for variant in identity_variants(&self.identity) {
            let filter = ListFilter::new().assignee(variant).status(IssueStatus::Open);
            match self.store.list(&filter) {
                Ok(records) => {
                    any_ok = true;
                    for r in records {
                        if seen.insert(r.id.clone()) {
                            out.push(MailboxMessage::from_record(&r));
                        }
                    }
                }
                Err(e) => last_err = Some(e),
            }
        }

        match self.cc_candidates() {
            Ok(records) => {
                any_ok = true;
                for r in records {
                    if seen.insert(r.id.clone()) {
                        out.push(MailboxMessage::from_record(&r));
                    }
                }
            }
            Err(e) => last_err = Some(e),
        }

        if !any_ok {
            if let Some(e) = last_err {
                return Err(e.into());
            }
        }

        out.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(out)
    }

    /// Records CC'd to this identity, at open status only (§4.5).
    fn cc_candidates(&self) -> Result<Vec<gastown_issues::IssueRecord>, gastown_issues::IssuesError> {
        let cc_label = labels::cc_label(&self.identity);
        let filter = ListFilter::new().label(cc_label).status(IssueStatus::Open);
        self.store.list(&filter)
    }

    pub fn get(&self, id: &str) -> Result<MailboxMessage, MailboxError> {
        Ok(MailboxMessage::from_record(&self.store.show(id)?))
    }

    /// Close the underlying record. The "hard" mark-read: the message
    /// leaves the open-status views entirely.
    pub fn mark_read(&self, id: &str) -> Result<(), MailboxError> {
        self.store.close(id, None)?;
        Ok(())
    }

    pub fn mark_unread(&self, id: &str) -> Result<(), MailboxError> {
        self.store.reopen(id)?;
        Ok(())
    }

    /// The "soft" mark-read: add the `read` label without closing, so the
    /// record stays in every open-status view but `is_unread()` flips.
    pub fn mark_read_soft(&self, id: &str) -> Result<(), MailboxError> {
        self.store.label_add(id, labels::READ)?;
        Ok(())
    }

    /// Append a copy of the message to the per-mailbox archive log, then
    /// mark it read (hard close).
    ///
    /// Refuses when called against a legacy JSONL-backed workspace's
    /// beads mailbox — callers directing mail at a legacy worker MUST go
    /// through the router, not `Mailbox::archive` directly (§9 "legacy
    /// JSONL mailbox" open question).
    pub fn archive(&self, id: &str) -> Result<(), MailboxError> {
        let record = self.store.show(id)?;
        if let Some(parent) = self.archive_path.parent() {
            std::fs::create_dir_all(parent).map_err(gastown_core::CoreError::Io)?;
        }
        let line = serde_json::to_string(&record)
            .map_err(|e| MailboxError::Core(gastown_core::CoreError::invalid(format!("serialize archive entry: {e}"))))?;
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.archive_path)
            .map_err(gastown_core::CoreError::Io)?;
        writeln!(file, "{line}").map_err(gastown_core::CoreError::Io)?;
        self.mark_read(id)
    }

    /// All archived messages, oldest-first by file order.
    pub fn list_archived(&self) -> Result<Vec<MailboxMessage>, MailboxError> {
        let contents = match std::fs::read_to_string(&self.archive_path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(gastown_core::CoreError::Io(e).into()),
        };
        let mut out = Vec::new();
        for line in contents.lines() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<gastown_issues::IssueRecord>(line) {
                Ok(record) => out.push(MailboxMessage::from_record(&record)),
                Err(e) => warn!(error = %e, "skipping malformed archive.jsonl line"),
            }
        }
        Ok(out)
    }

    /// Regex-like search over subject and/or body, optionally filtered
    /// by a sender pattern. The pattern is always treated as a literal —
    /// every special character is escaped before compiling — to preclude
    /// catastrophic-backtracking regexes from untrusted input (§4.5, §8
    /// invariant 12).
    pub fn search(&self, pattern: &str, sender_pattern: Option<&str>) -> Result<Vec<MailboxMessage>, MailboxError> {
        let needle = build_literal_matcher(pattern)?;
        let sender_needle = sender_pattern.map(build_literal_matcher).transpose()?;

        let mut inbox = self.list()?;
        inbox.extend(self.list_archived()?);

        let mut results: Vec<MailboxMessage> = inbox
            .into_iter()
            .filter(|m| needle.is_match(&m.subject) || needle.is_match(&m.body))
            .filter(|m| match (&sender_needle, &m.from) {
                (Some(s), Some(from)) => s.is_match(from),
                (Some(_), None) => false,
                (None, _) => true,
            })
            .collect();
        results.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(results)
    }

    /// All messages sharing `thread_id`'s thread, oldest-first.
    pub fn thread(&self, id: &str) -> Result<Vec<MailboxMessage>, MailboxError> {
        Ok(self.store.thread(id)?.iter().map(MailboxMessage::from_record).collect())
    }

    /// (total, unread) counts over the inbox view.
    pub fn count(&self) -> Result<(usize, usize), MailboxError> {
        let inbox = self.list()?;
        let unread = inbox.iter().filter(|m| m.unread).count();
        Ok((inbox.len(), unread))
    }

    pub fn archive_path(&self) -> &Path {
        &self.archive_path
    }
}

fn build_literal_matcher(pattern: &str) -> Result<regex::Regex, MailboxError> {
    let escaped = regex::escape(pattern);
    regex::RegexBuilder::new(&escaped)
        .case_insensitive(true)
        .build()
        .map_err(|e| MailboxError::Core(gastown_core::CoreError::invalid(format!("bad search pattern: {e}"))))
}
