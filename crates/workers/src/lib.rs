// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker managers (§4.8): per-role workspace creation/removal, rename,
//! and freshen-against-remote for crew, polecat, and refinery agents.
//!
//! `CrewManager` is the reference implementation over a full clone;
//! `PolecatManager` and `RefineryManager` specialize the same contract
//! to worktrees of a rig's shared bare repo. [`state::WorkerState`] and
//! [`redirect`] are the pieces shared across all three.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod crew;
pub mod error;
pub mod git;
pub mod polecat;
pub mod redirect;
pub mod refinery;
pub mod state;

#[cfg(any(test, feature = "test-support"))]
pub mod fake_git;

pub use crew::{CrewManager, FreshenReport};
pub use error::WorkersError;
pub use git::{Git, SystemGit};
pub use polecat::PolecatManager;
pub use refinery::{MergeRequestSummary, RefineryManager, MERGE_REQUEST_TYPE};
pub use state::WorkerState;

#[cfg(any(test, feature = "test-support"))]
pub use fake_git::FakeGit;
