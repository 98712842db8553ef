// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use gastown_addressing::InvalidName;
use gastown_core::CoreError;
use gastown_issues::IssuesError;
use gastown_session::SessionError;
use gastown_store::StoreError;
use gastown_workspace::WorkspaceError;

#[derive(Debug, thiserror::Error)]
pub enum WorkersError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error(transparent)]
    Issues(#[from] IssuesError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Workspace(#[from] WorkspaceError),
    #[error(transparent)]
    InvalidName(#[from] InvalidName),
    #[error("workspace already exists at {0}")]
    AlreadyExists(std::path::PathBuf),
    #[error("refusing to remove {0}: worktree has uncommitted changes (use force)")]
    UncommittedChanges(std::path::PathBuf),
}

impl WorkersError {
    pub fn is_not_found(&self) -> bool {
        match self {
            WorkersError::Core(e) => e.is_not_found(),
            WorkersError::Issues(e) => e.is_not_found(),
            WorkersError::Session(e) => e.is_not_found(),
            _ => false,
        }
    }
}
