// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-local `JobId -> Supervisor` table (§4.4).

use std::collections::BTreeMap;
use std::sync::Arc;

use fleet_core::{Job, JobId};

use crate::supervisor::{Supervisor, SupervisorFactory};

/// Owned exclusively by the [`crate::Reconciler`] during a tick; the
/// [`crate::Agent`] facade (in `fleet-agent`) reaches back in only after
/// the reactor has fully quiesced, to close every supervisor on shutdown.
pub struct SupervisorRegistry {
    factory: Arc<dyn SupervisorFactory>,
    supervisors: BTreeMap<JobId, Arc<dyn Supervisor>>,
}

impl SupervisorRegistry {
    pub fn new(factory: Arc<dyn SupervisorFactory>) -> Self {
        Self {
            factory,
            supervisors: BTreeMap::new(),
        }
    }

    pub fn contains(&self, job_id: &JobId) -> bool {
        self.supervisors.contains_key(job_id)
    }

    pub fn get(&self, job_id: &JobId) -> Option<Arc<dyn Supervisor>> {
        self.supervisors.get(job_id).cloned()
    }

    pub fn keys(&self) -> impl Iterator<Item = &JobId> {
        self.supervisors.keys()
    }

    /// Create a supervisor for `job_id` via the factory and insert it.
    /// Panics (debug-checked by the caller) if one already exists; the
    /// reconciler only calls this for jobIds it has already confirmed are
    /// absent from the registry.
    pub fn create(&mut self, job_id: JobId, job: &Job, ports: &BTreeMap<String, u16>) {
        let supervisor = self.factory.create(&job_id, job, ports);
        self.supervisors.insert(job_id, supervisor);
    }

    /// Remove and return a supervisor without closing it, so the caller
    /// can `close().await` it outside any lock held across the removal.
    pub fn take(&mut self, job_id: &JobId) -> Option<Arc<dyn Supervisor>> {
        self.supervisors.remove(job_id)
    }

    /// Remove every supervisor, for use on agent shutdown. The caller is
    /// responsible for calling `close` on each returned supervisor.
    pub fn take_all(&mut self) -> Vec<Arc<dyn Supervisor>> {
        std::mem::take(&mut self.supervisors).into_values().collect()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
