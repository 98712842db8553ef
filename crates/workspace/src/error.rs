// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use gastown_core::CoreError;

#[derive(Debug, thiserror::Error)]
pub enum WorkspaceError {
    #[error("not inside a town: no mayor/town.json or mayor/ found above {0}")]
    NotInTown(std::path::PathBuf),
    #[error(transparent)]
    Core(#[from] CoreError),
}
