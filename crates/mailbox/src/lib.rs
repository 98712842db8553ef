// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Mailbox (§4.5): per-identity views over the issue store, plus the
//! legacy JSONL-file mailbox kept for backward compatibility.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod error;
pub mod legacy;
pub mod mailbox;
pub mod message;

pub use error::MailboxError;
pub use legacy::{LegacyMailbox, LegacyMessage};
pub use mailbox::Mailbox;
pub use message::MailboxMessage;
