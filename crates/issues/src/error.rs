// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use gastown_core::CoreError;

/// Errors from the issue-store adapter (§4.3). Thin wrapper over
/// [`CoreError`] — the adapter's failure policy is already expressed
/// entirely through `NotFound`/`ExternalTool`/`Timeout`, so there is
/// nothing issue-store-specific to add.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct IssuesError(#[from] pub CoreError);

impl IssuesError {
    pub fn is_not_found(&self) -> bool {
        self.0.is_not_found()
    }
}
