// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The mailbox-facing view of a stored message (§3 "Message (stored)").
//!
//! [`MailboxMessage`] narrows an [`IssueRecord`] by its labels, the way
//! every caller in this workspace narrows the issue store's opaque JSON
//! (§9 "Dynamic typing of stored records") — never a second round-trip.

use chrono::{DateTime, Utc};
use gastown_core::{MessageType, Priority};
use gastown_issues::{labels, IssueRecord};

/// A message as seen through a mailbox: subject/body plus the metadata
/// the router encoded as labels on creation.
#[derive(Debug, Clone)]
pub struct MailboxMessage {
    pub id: String,
    pub from: Option<String>,
    pub to: String,
    pub subject: String,
    pub body: String,
    pub priority: Priority,
    pub msg_type: Option<MessageType>,
    pub thread_id: Option<String>,
    pub reply_to: Option<String>,
    pub cc: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub unread: bool,
    pub claimed_by: Option<String>,
    pub claimed_at: Option<String>,
}

impl MailboxMessage {
    pub fn from_record(record: &IssueRecord) -> Self {
        Self {
            id: record.id.clone(),
            from: labels::from_of(&record.labels).map(str::to_string),
            to: record.assignee.clone(),
            subject: record.title.clone(),
            body: record.description.clone(),
            priority: Priority::from_store_int(record.priority),
            msg_type: labels::msg_type_of(&record.labels).and_then(MessageType::parse),
            thread_id: labels::thread_of(&record.labels).map(str::to_string),
            reply_to: labels::reply_to_of(&record.labels).map(str::to_string),
            cc: labels::cc_of(&record.labels).into_iter().map(str::to_string).collect(),
            created_at: record.created_at,
            unread: record.is_unread(),
            claimed_by: labels::claimed_by_of(&record.labels).map(str::to_string),
            claimed_at: labels::claimed_at_of(&record.labels).map(str::to_string),
        }
    }
}
