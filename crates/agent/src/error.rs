// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Errors the `fleet-agent` façade can raise, on top of those already
//! surfaced by `fleet-engine`/`fleet-storage` (§7).

use thiserror::Error;

use fleet_engine::ReconcileError;
use fleet_storage::StoreError;

/// Errors from [`crate::Agent::start`]/[`crate::Agent::stop`] and the
/// `fleetd` binary's environment resolution.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("failed to load persisted executions map: {0}")]
    Store(#[from] StoreError),

    /// A fatal error escaped the reactor (§7 kind 3/4): the agent has
    /// stopped itself and this must propagate to the process supervisor.
    #[error("reconciliation failed fatally: {0}")]
    Fatal(#[from] ReconcileError),

    #[error("could not resolve state directory: set FLEETD_STATE_DIR or HOME")]
    NoStateDir,

    #[error("invalid FLEETD_DYNAMIC_PORT_RANGE {0:?}: expected \"start-end\"")]
    InvalidPortRange(String),
}
