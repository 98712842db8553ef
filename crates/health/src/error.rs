// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use gastown_core::CoreError;
use gastown_issues::IssuesError;
use gastown_workers::WorkersError;
use gastown_workspace::WorkspaceError;

#[derive(Debug, thiserror::Error)]
pub enum HealthError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error(transparent)]
    Issues(#[from] IssuesError),
    #[error(transparent)]
    Workers(#[from] WorkersError),
    #[error(transparent)]
    Workspace(#[from] WorkspaceError),
}
