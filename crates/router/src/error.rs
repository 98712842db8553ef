// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use gastown_addressing::InvalidGroup;
use gastown_core::{CoreError, MessageValidationError};
use gastown_issues::IssuesError;

#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error(transparent)]
    Issues(#[from] IssuesError),
    #[error(transparent)]
    InvalidGroup(#[from] InvalidGroup),
    #[error(transparent)]
    InvalidMessage(#[from] MessageValidationError),
    #[error("list {0:?} is undefined or empty")]
    EmptyList(String),
    #[error("queue {0:?} is not configured")]
    UnknownQueue(String),
    #[error("announce channel {0:?} is not configured")]
    UnknownAnnounce(String),
    #[error("channel {0:?} does not exist or is closed")]
    UnavailableChannel(String),
    #[error("group {0} resolved to no live agents")]
    EmptyGroup(String),
    #[error("every recipient in fan-out failed: {0}")]
    FanOutFailed(String),
}

impl RouterError {
    pub fn is_not_found(&self) -> bool {
        match self {
            RouterError::Core(e) => e.is_not_found(),
            RouterError::Issues(e) => e.is_not_found(),
            _ => false,
        }
    }
}
