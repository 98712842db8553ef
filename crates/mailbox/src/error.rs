// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use gastown_core::CoreError;

#[derive(Debug, thiserror::Error)]
pub enum MailboxError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error(transparent)]
    Issues(#[from] gastown_issues::IssuesError),
}

impl MailboxError {
    pub fn is_not_found(&self) -> bool {
        match self {
            MailboxError::Core(e) => e.is_not_found(),
            MailboxError::Issues(e) => e.is_not_found(),
        }
    }
}
