// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Logical message model (§3 "Message (logical)").
//!
//! A [`LogicalMessage`] is what a caller builds and hands to the router.
//! It is validated once, at construction, so every downstream layer can
//! assume `to`/`queue`/`channel` are mutually exclusive.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Message priority. Serializes to the integer the issue store expects
/// (0=urgent .. 3=low), never the variant name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Priority {
    Urgent,
    High,
    #[default]
    Normal,
    Low,
}

impl Priority {
    /// The integer the issue store persists (0=urgent, 1=high, 2=normal, 3=low).
    pub fn as_store_int(&self) -> i32 {
        match self {
            Priority::Urgent => 0,
            Priority::High => 1,
            Priority::Normal => 2,
            Priority::Low => 3,
        }
    }

    pub fn from_store_int(v: i32) -> Self {
        match v {
            0 => Priority::Urgent,
            1 => Priority::High,
            3 => Priority::Low,
            _ => Priority::Normal,
        }
    }
}

crate::simple_display! {
    Priority {
        Urgent => "urgent",
        High => "high",
        Normal => "normal",
        Low => "low",
    }
}

impl Serialize for Priority {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Priority {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        match s.as_str() {
            "urgent" => Ok(Priority::Urgent),
            "high" => Ok(Priority::High),
            "normal" => Ok(Priority::Normal),
            "low" => Ok(Priority::Low),
            other => Err(serde::de::Error::custom(format!("invalid priority: {other}"))),
        }
    }
}

/// Message type (§3). Encoded as the `msg-type:<t>` label on the stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    #[default]
    Task,
    Scavenge,
    Notification,
    Reply,
}

crate::simple_display! {
    MessageType {
        Task => "task",
        Scavenge => "scavenge",
        Notification => "notification",
        Reply => "reply",
    }
}

impl MessageType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "task" => Some(MessageType::Task),
            "scavenge" => Some(MessageType::Scavenge),
            "notification" => Some(MessageType::Notification),
            "reply" => Some(MessageType::Reply),
            _ => None,
        }
    }
}

/// Lifecycle-nudge subjects are ephemeral even when the caller didn't ask
/// for ephemeral explicitly (§4.6.1). Case-insensitive.
const EPHEMERAL_SUBJECT_PREFIXES: &[&str] =
    &["polecat_started", "polecat_done", "start_work", "nudge"];

/// Whether `subject` matches one of the closed set of lifecycle-nudge
/// prefixes that force a direct message to be ephemeral.
pub fn subject_forces_ephemeral(subject: &str) -> bool {
    let lower = subject.to_ascii_lowercase();
    EPHEMERAL_SUBJECT_PREFIXES.iter().any(|p| lower.starts_with(p))
}

/// Error building a [`LogicalMessage`]: exactly one of to/queue/channel
/// must be set, and `claimed_*` only makes sense alongside `queue`.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MessageValidationError {
    #[error("message must target exactly one of to/queue/channel, got {0}")]
    AmbiguousTarget(usize),
    #[error("claimed_by/claimed_at are only valid when queue is set")]
    ClaimWithoutQueue,
}

/// A message a caller wants delivered. Built via [`LogicalMessageBuilder`]
/// so construction can validate the routing-target exclusivity once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogicalMessage {
    pub from: String,
    pub target: RoutingTarget,
    pub subject: String,
    pub body: String,
    pub priority: Priority,
    pub msg_type: MessageType,
    #[serde(default)]
    pub thread_id: Option<String>,
    #[serde(default)]
    pub reply_to: Option<String>,
    #[serde(default)]
    pub cc: Vec<String>,
    #[serde(default)]
    pub ephemeral: Option<bool>,
    #[serde(default)]
    pub claimed_by: Option<String>,
    #[serde(default)]
    pub claimed_at: Option<String>,
}

/// Exactly one outbound address mode (§3 "Address mode").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoutingTarget {
    To(String),
    Queue(String),
    Channel(String),
}

impl LogicalMessage {
    pub fn builder(from: impl Into<String>, target: RoutingTarget) -> LogicalMessageBuilder {
        LogicalMessageBuilder {
            from: from.into(),
            target,
            subject: String::new(),
            body: String::new(),
            priority: Priority::Normal,
            msg_type: MessageType::Task,
            thread_id: None,
            reply_to: None,
            cc: Vec::new(),
            ephemeral: None,
            claimed_by: None,
            claimed_at: None,
        }
    }

    /// Whether this message is ephemeral: explicitly set, or (for direct
    /// sends only) the subject matches a lifecycle-nudge prefix.
    pub fn is_ephemeral(&self) -> bool {
        if let Some(explicit) = self.ephemeral {
            return explicit;
        }
        matches!(&self.target, RoutingTarget::To(_)) && subject_forces_ephemeral(&self.subject)
    }
}

pub struct LogicalMessageBuilder {
    from: String,
    target: RoutingTarget,
    subject: String,
    body: String,
    priority: Priority,
    msg_type: MessageType,
    thread_id: Option<String>,
    reply_to: Option<String>,
    cc: Vec<String>,
    ephemeral: Option<bool>,
    claimed_by: Option<String>,
    claimed_at: Option<String>,
}

impl LogicalMessageBuilder {
    crate::setters! {
        into {
            subject: String,
            body: String,
        }
        set {
            priority: Priority,
            msg_type: MessageType,
        }
        option {
            thread_id: String,
            reply_to: String,
            claimed_by: String,
            claimed_at: String,
        }
    }

    pub fn cc(mut self, identity: impl Into<String>) -> Self {
        self.cc.push(identity.into());
        self
    }

    pub fn ephemeral(mut self, v: bool) -> Self {
        self.ephemeral = Some(v);
        self
    }

    pub fn build(self) -> Result<LogicalMessage, MessageValidationError> {
        if self.claimed_by.is_some() || self.claimed_at.is_some() {
            if !matches!(self.target, RoutingTarget::Queue(_)) {
                return Err(MessageValidationError::ClaimWithoutQueue);
            }
        }
        Ok(LogicalMessage {
            from: self.from,
            target: self.target,
            subject: self.subject,
            body: self.body,
            priority: self.priority,
            msg_type: self.msg_type,
            thread_id: self.thread_id,
            reply_to: self.reply_to,
            cc: self.cc,
            ephemeral: self.ephemeral,
            claimed_by: self.claimed_by,
            claimed_at: self.claimed_at,
        })
    }
}

impl fmt::Display for RoutingTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoutingTarget::To(s) => write!(f, "to:{s}"),
            RoutingTarget::Queue(s) => write!(f, "queue:{s}"),
            RoutingTarget::Channel(s) => write!(f, "channel:{s}"),
        }
    }
}
