// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lifecycle goal for a job.

use serde::{Deserialize, Serialize};

/// Desired lifecycle target for a job's supervisor (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Goal {
    /// Supervisor should be running.
    Start,
    /// Supervisor should be created and kept stopped.
    Stop,
    /// Supervisor should be stopped, then discarded; the execution retires.
    Undeploy,
}

impl Goal {
    pub fn is_undeploy(&self) -> bool {
        matches!(self, Goal::Undeploy)
    }
}

crate::simple_display! {
    Goal {
        Start => "start",
        Stop => "stop",
        Undeploy => "undeploy",
    }
}

#[cfg(test)]
#[path = "goal_tests.rs"]
mod tests;
