// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Legacy JSONL-file mailbox (§4.5, §9): one line per message, for
//! worker types that pre-date the beads-backed mailbox. Offers the same
//! surface as [`crate::mailbox::Mailbox`]; archive/rewrite is done via
//! write-temp-then-rename, grounded on `gastown-store`'s atomic-write
//! primitive rather than raw `fs::write`.
//!
//! Two-mode coexistence is preserved for backward compatibility only
//! (§9 open question): the router refuses to write here directly, and
//! this mailbox's own [`LegacyMailbox::append`] refuses too, so every
//! write — legacy or not — goes through the router's single code path.

use crate::error::MailboxError;
use gastown_core::{Clock, CoreError, MessageType, Priority, SystemClock};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

/// A message as stored, one per line, in a legacy `mail/inbox.jsonl`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegacyMessage {
    pub id: String,
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub msg_type: MessageType,
    pub timestamp: String,
    #[serde(default)]
    pub read: bool,
    #[serde(default)]
    pub thread_id: Option<String>,
    #[serde(default)]
    pub reply_to: Option<String>,
    #[serde(default)]
    pub cc: Vec<String>,
}

/// A JSONL-backed mailbox rooted at a single file (conventionally
/// `<workspace>/mail/inbox.jsonl`).
///
/// Generic over its clock the way `gastown-core::Clock` callers
/// typically are (`SystemClock` in production, `FakeClock` in tests) —
/// `Clock` carries a `Clone` bound so it cannot be boxed as `dyn Clock`.
pub struct LegacyMailbox<C: Clock = SystemClock> {
    path: PathBuf,
    archive_path: PathBuf,
    clock: C,
    seq: AtomicU64,
}

impl LegacyMailbox<SystemClock> {
    pub fn new(path: impl Into<PathBuf>, archive_path: impl Into<PathBuf>) -> Self {
        Self::with_clock(path, archive_path, SystemClock)
    }
}

impl<C: Clock> LegacyMailbox<C> {
    pub fn with_clock(path: impl Into<PathBuf>, archive_path: impl Into<PathBuf>, clock: C) -> Self {
        Self { path: path.into(), archive_path: archive_path.into(), clock, seq: AtomicU64::new(0) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Refused: direct appends bypass the router's from/thread/cc
    /// bookkeeping. Use `gastown_router::Router::send` instead, which
    /// knows how to target a legacy mailbox (§9 open question).
    pub fn append(&self, _message: LegacyMessage) -> Result<(), MailboxError> {
        Err(MailboxError::Core(CoreError::invalid(
            "legacy mailbox does not accept direct writes; send through the router",
        )))
    }

    /// Internal: used only by the router's legacy-mailbox delivery path.
    #[doc(hidden)]
    pub fn router_append(&self, mut message: LegacyMessage) -> Result<String, MailboxError> {
        if message.id.is_empty() {
            message.id = format!("legacy-{}-{}", self.clock.epoch_ms(), self.seq.fetch_add(1, Ordering::SeqCst));
        }
        let id = message.id.clone();
        let mut lines = self.read_lines()?;
        lines.push(message);
        self.write_lines(&lines)?;
        Ok(id)
    }

    pub fn list(&self) -> Result<Vec<LegacyMessage>, MailboxError> {
        let mut lines = self.read_lines()?;
        lines.reverse();
        Ok(lines)
    }

    pub fn get(&self, id: &str) -> Result<LegacyMessage, MailboxError> {
        self.read_lines()?
            .into_iter()
            .find(|m| m.id == id)
            .ok_or_else(|| MailboxError::Core(CoreError::not_found(format!("legacy message {id}"))))
    }

    pub fn mark_read(&self, id: &str) -> Result<(), MailboxError> {
        self.update(id, |m| m.read = true)
    }

    pub fn mark_unread(&self, id: &str) -> Result<(), MailboxError> {
        self.update(id, |m| m.read = false)
    }

    /// Append a copy to `archive.jsonl`, remove it from the inbox, mark
    /// read on the archived copy. Both files are rewritten atomically.
    pub fn archive(&self, id: &str) -> Result<(), MailboxError> {
        let mut lines = self.read_lines()?;
        let idx = lines
            .iter()
            .position(|m| m.id == id)
            .ok_or_else(|| MailboxError::Core(CoreError::not_found(format!("legacy message {id}"))))?;
        let mut archived = lines.remove(idx);
        archived.read = true;

        let mut archive_lines = self.read_jsonl(&self.archive_path)?;
        archive_lines.push(archived);
        self.write_jsonl(&self.archive_path, &archive_lines)?;
        self.write_lines(&lines)
    }

    pub fn list_archived(&self) -> Result<Vec<LegacyMessage>, MailboxError> {
        let mut lines = self.read_jsonl(&self.archive_path)?;
        lines.reverse();
        Ok(lines)
    }

    pub fn search(&self, pattern: &str, sender_pattern: Option<&str>) -> Result<Vec<LegacyMessage>, MailboxError> {
        let needle = build_literal_matcher(pattern)?;
        let sender_needle = sender_pattern.map(build_literal_matcher).transpose()?;
        let mut all = self.list()?;
        all.extend(self.list_archived()?);
        let mut results: Vec<LegacyMessage> = all
            .into_iter()
            .filter(|m| needle.is_match(&m.subject) || needle.is_match(&m.body))
            .filter(|m| sender_needle.as_ref().map(|s| s.is_match(&m.from)).unwrap_or(true))
            .collect();
        results.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(results)
    }

    pub fn thread(&self, thread_id: &str) -> Result<Vec<LegacyMessage>, MailboxError> {
        let mut lines: Vec<LegacyMessage> =
            self.read_lines()?.into_iter().filter(|m| m.thread_id.as_deref() == Some(thread_id)).collect();
        lines.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        Ok(lines)
    }

    pub fn count(&self) -> Result<(usize, usize), MailboxError> {
        let lines = self.read_lines()?;
        let unread = lines.iter().filter(|m| !m.read).count();
        Ok((lines.len(), unread))
    }

    fn update(&self, id: &str, f: impl FnOnce(&mut LegacyMessage)) -> Result<(), MailboxError> {
        let mut lines = self.read_lines()?;
        let msg = lines
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| MailboxError::Core(CoreError::not_found(format!("legacy message {id}"))))?;
        f(msg);
        self.write_lines(&lines)
    }

    fn read_lines(&self) -> Result<Vec<LegacyMessage>, MailboxError> {
        self.read_jsonl(&self.path)
    }

    fn write_lines(&self, lines: &[LegacyMessage]) -> Result<(), MailboxError> {
        self.write_jsonl(&self.path, lines)
    }

    fn read_jsonl(&self, path: &Path) -> Result<Vec<LegacyMessage>, MailboxError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(CoreError::Io(e).into()),
        };
        let mut out = Vec::new();
        for line in contents.lines() {
            if line.trim().is_empty() {
                continue;
            }
            out.push(
                serde_json::from_str(line)
                    .map_err(|e| CoreError::invalid(format!("malformed legacy mailbox line: {e}")))?,
            );
        }
        Ok(out)
    }

    /// Rewrite the whole file via write-temp-then-rename, mirroring
    /// `gastown_store::write_json`'s commit discipline but for a
    /// newline-delimited body rather than a single JSON document.
    fn write_jsonl(&self, path: &Path, lines: &[LegacyMessage]) -> Result<(), MailboxError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(CoreError::Io)?;
        }
        let mut body = String::new();
        for line in lines {
            let encoded = serde_json::to_string(line)
                .map_err(|e| CoreError::invalid(format!("serialize legacy mailbox line: {e}")))?;
            body.push_str(&encoded);
            body.push('\n');
        }
        let tmp_path = path.with_extension("jsonl.tmp");
        let write_result = std::fs::write(&tmp_path, body.as_bytes())
            .map_err(CoreError::Io)
            .and_then(|()| std::fs::rename(&tmp_path, path).map_err(CoreError::Io));
        if write_result.is_err() {
            let _ = std::fs::remove_file(&tmp_path);
        }
        write_result.map_err(MailboxError::from)
    }
}

fn build_literal_matcher(pattern: &str) -> Result<regex::Regex, MailboxError> {
    let escaped = regex::escape(pattern);
    regex::RegexBuilder::new(&escaped)
        .case_insensitive(true)
        .build()
        .map_err(|e| MailboxError::Core(CoreError::invalid(format!("bad search pattern: {e}"))))
}
