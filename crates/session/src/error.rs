// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use gastown_core::CoreError;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Core(#[from] CoreError),
}

impl SessionError {
    pub fn is_not_found(&self) -> bool {
        match self {
            SessionError::Core(e) => e.is_not_found(),
        }
    }

    pub fn is_already_running(&self) -> bool {
        matches!(self, SessionError::Core(CoreError::AlreadyRunning(_)))
    }
}
