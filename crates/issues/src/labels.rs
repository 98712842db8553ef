// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Label encoding for the metadata carried on a stored message (§3
//! "Message (stored)"). The issue store has no schema beyond a flat list
//! of label strings — everything this layer knows about a message lives
//! in these `prefix:value` encodings, or the handful of bare flags.

/// Build the `from:<identity>` label.
pub fn from_label(identity: &str) -> String {
    format!("from:{identity}")
}

/// Build the `thread:<id>` label.
pub fn thread_label(thread_id: &str) -> String {
    format!("thread:{thread_id}")
}

/// Build the `reply-to:<id>` label.
pub fn reply_to_label(id: &str) -> String {
    format!("reply-to:{id}")
}

/// Build the `msg-type:<t>` label.
pub fn msg_type_label(msg_type: &str) -> String {
    format!("msg-type:{msg_type}")
}

/// Build a `cc:<identity>` label. Repeatable — one per CC recipient.
pub fn cc_label(identity: &str) -> String {
    format!("cc:{identity}")
}

pub fn queue_label(name: &str) -> String {
    format!("queue:{name}")
}

pub fn announce_label(name: &str) -> String {
    format!("announce:{name}")
}

pub fn channel_label(name: &str) -> String {
    format!("channel:{name}")
}

pub fn claimed_by_label(identity: &str) -> String {
    format!("claimed-by:{identity}")
}

pub fn claimed_at_label(rfc3339: &str) -> String {
    format!("claimed-at:{rfc3339}")
}

/// Bare "mark-read without close" flag.
pub const READ: &str = "read";

/// Extract the value of the first label matching `from:`, if any.
pub fn from_of(labels: &[String]) -> Option<&str> {
    first_value(labels, "from:")
}

pub fn thread_of(labels: &[String]) -> Option<&str> {
    first_value(labels, "thread:")
}

pub fn reply_to_of(labels: &[String]) -> Option<&str> {
    first_value(labels, "reply-to:")
}

pub fn msg_type_of(labels: &[String]) -> Option<&str> {
    first_value(labels, "msg-type:")
}

pub fn claimed_by_of(labels: &[String]) -> Option<&str> {
    first_value(labels, "claimed-by:")
}

pub fn claimed_at_of(labels: &[String]) -> Option<&str> {
    first_value(labels, "claimed-at:")
}

/// All `cc:<identity>` values, in label order.
pub fn cc_of(labels: &[String]) -> Vec<&str> {
    labels.iter().filter_map(|l| l.strip_prefix("cc:")).collect()
}

pub fn has_read(labels: &[String]) -> bool {
    labels.iter().any(|l| l == READ)
}

fn first_value<'a>(labels: &'a [String], prefix: &str) -> Option<&'a str> {
    labels.iter().find_map(|l| l.strip_prefix(prefix))
}
