// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Supervisor contract (§4.3) and factory (§4.4).

use std::collections::BTreeMap;

use async_trait::async_trait;
use fleet_core::{Job, JobId, SupervisorStatus};

/// Owns one container instance. Implementations live outside the core —
/// the core only ever holds this behind a trait object (§9 "dynamic
/// dispatch over supervisor-ness").
///
/// `start`/`stop` are idempotent: calling either while already in the
/// requested direction is a no-op from the caller's perspective. `close`
/// is terminal and does **not** stop the underlying container.
#[async_trait]
pub trait Supervisor: Send + Sync {
    async fn start(&self);
    async fn stop(&self);
    async fn close(&self);
    fn status(&self) -> SupervisorStatus;
}

/// Creates a [`Supervisor`] for a committed execution. Called exactly once
/// per execution lifetime (§4.4).
pub trait SupervisorFactory: Send + Sync {
    fn create(
        &self,
        job_id: &JobId,
        job: &Job,
        ports: &BTreeMap<String, u16>,
    ) -> std::sync::Arc<dyn Supervisor>;
}
