// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The agent-side reconciliation engine: reactor, reconciler, supervisor
//! registry, and the trait contracts the surrounding agent wires up.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod desired_state;
mod error;
mod reactor;
mod reconciler;
mod registry;
mod supervisor;

pub use desired_state::{DesiredStateSource, Notifier};
pub use error::{DesiredStateError, ReconcileError};
pub use reactor::{Reactor, ReactorNotifier};
pub use reconciler::Reconciler;
pub use registry::SupervisorRegistry;
pub use supervisor::{Supervisor, SupervisorFactory};

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
