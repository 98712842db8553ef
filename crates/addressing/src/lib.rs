// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Identity and address grammar for Gas Town agents (§3, §4.4).
//!
//! Everything here is pure string manipulation — no I/O, no issue-store
//! calls. Group resolution to a concrete identity set happens one layer
//! up, in the router, which has access to agent records.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod address;
pub mod group;
pub mod identity;

pub use address::{parse_address, Address, InvalidGroup};
pub use group::{parse_group, GroupExpr};
pub use identity::{
    address_to_identity, identity_to_address, validate_crew_name, Identity, InvalidName,
};
