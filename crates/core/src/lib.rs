// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Data model shared by the agent-side reconciliation engine.
//!
//! This crate has no I/O and no async runtime dependency: it is the
//! vocabulary every other crate in the workspace speaks (`JobId`, `Job`,
//! `Goal`, `Task`, `Execution`, `SupervisorStatus`).

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod execution;
mod goal;
mod job;
#[macro_use]
mod macros;
mod port;
mod status;
mod task;

pub use execution::{Execution, ExecutionsMap};
pub use goal::Goal;
pub use job::{Job, JobId};
pub use port::PortMapping;
pub use status::{ObservedState, SupervisorStatus};
pub use task::{DesiredMap, Task};

#[cfg(any(test, feature = "test-support"))]
pub use job::test_support::job_fixture;
