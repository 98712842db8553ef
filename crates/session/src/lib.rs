// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent session lifecycle: deterministic session ids, the
//! `Multiplexer` seam, startup beacons, process-tree teardown, and the
//! `SessionSupervisor` that ties them into Start/Stop/Liveness.

pub mod beacon;
pub mod error;
pub mod identity;
pub mod multiplexer;
pub mod supervisor;
pub mod tmux;
pub mod treekill;

#[cfg(any(test, feature = "test-support"))]
pub mod fake;

pub use beacon::{build_beacon, AgentCapabilities, Beacon, Delivery};
pub use error::SessionError;
pub use identity::Role;
pub use multiplexer::Multiplexer;
pub use supervisor::{SessionSupervisor, StartOutcome, StartSpec};
pub use tmux::TmuxMultiplexer;

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeMultiplexer;
