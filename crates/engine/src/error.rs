// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error taxonomy for a single reconciliation tick (§7).

use thiserror::Error;

/// Opaque error from a [`crate::DesiredStateSource`] read, surfaced by the
/// implementor (e.g. a file read or RPC failure).
#[derive(Debug, Error, Clone)]
#[error("{0}")]
pub struct DesiredStateError(pub String);

impl DesiredStateError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Errors that can escape a single [`crate::Reconciler::reconcile`] call.
///
/// Per-job failures (port conflicts, supervisor creation failures) are
/// logged and swallowed at the point they occur — they never reach this
/// type. Only the kinds the reactor must act on do.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Kind 2: transient I/O reading desired state. The reactor logs this
    /// and retries on the next tick; it is not fatal.
    #[error("failed to read desired state: {0}")]
    DesiredStateRead(#[from] DesiredStateError),

    /// Kind 3: failure to persist the executions map. Violates I3 — fatal.
    #[error("failed to persist executions map: {0}")]
    Store(#[from] fleet_storage::StoreError),

    /// Kind 4: an invariant the reconciler depends on did not hold
    /// (e.g. a supervisor missing for a jobId just inserted into the
    /// registry). Fatal.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}

impl ReconcileError {
    /// §7 propagation policy: fatal kinds must terminate the agent; the
    /// reactor logs and continues on anything else.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Store(_) | Self::InvariantViolation(_))
    }
}
