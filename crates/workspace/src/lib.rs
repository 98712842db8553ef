// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace resolver (§4.2): town-root discovery and rig/workspace path
//! computation. Pure filesystem reads — no issue-store or git calls.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod beads;
pub mod error;
pub mod polecat;
pub mod resolver;
pub mod town;

pub use beads::{canonical_beads, expected_redirect, rig_beads};
pub use error::WorkspaceError;
pub use polecat::{is_nested_layout, polecat_workspace};
pub use resolver::WorkspaceResolver;
pub use town::find_town_root;
