// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The reconciliation algorithm (§4.6) — the callback the [`crate::Reactor`]
//! drives.

use std::collections::HashSet;
use std::sync::Arc;

use fleet_core::{Execution, ExecutionsMap, Goal, JobId};
use fleet_ports::PortAllocator;
use fleet_storage::ExecutionsStore;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::desired_state::DesiredStateSource;
use crate::error::ReconcileError;
use crate::registry::SupervisorRegistry;

/// Computes the delta between desired tasks, the persisted executions map
/// and live supervisor statuses, and drives all three back into agreement.
///
/// Runs exclusively inside the Reactor's serialized callback (§5): every
/// field here is guarded only by uncontended locks, never real
/// contention, so the locking here is bookkeeping for `Send + Sync`, not a
/// concurrency mechanism.
pub struct Reconciler {
    desired_source: Box<dyn DesiredStateSource>,
    store: Arc<dyn ExecutionsStore>,
    allocator: Arc<dyn PortAllocator>,
    registry: Arc<Mutex<SupervisorRegistry>>,
    /// In-memory mirror of the persisted map, kept equal to it between
    /// ticks (§9 "tests supply an in-memory store" implies this cache
    /// exists precisely so `get()` isn't on the tick's hot path either).
    committed: Mutex<ExecutionsMap>,
}

impl Reconciler {
    pub fn new(
        desired_source: Box<dyn DesiredStateSource>,
        store: Arc<dyn ExecutionsStore>,
        allocator: Arc<dyn PortAllocator>,
        registry: Arc<Mutex<SupervisorRegistry>>,
    ) -> Self {
        let committed = store.get();
        Self {
            desired_source,
            store,
            allocator,
            registry,
            committed: Mutex::new(committed),
        }
    }

    pub fn registry(&self) -> Arc<Mutex<SupervisorRegistry>> {
        Arc::clone(&self.registry)
    }

    /// Register the reactor (or any `Notifier`) with the desired-state
    /// source, so external changes trigger a tick.
    pub fn watch_desired_state(&self, notifier: Arc<dyn crate::desired_state::Notifier>) {
        self.desired_source.add_listener(notifier);
    }

    /// One reconciliation pass (§4.6, steps 1-5).
    pub async fn reconcile(&self) -> Result<(), ReconcileError> {
        // 1. Snapshot inputs.
        let desired = self.desired_source.get_tasks()?;
        let mut new_map = self.committed.lock().clone();

        // 2a. Reap: UNDEPLOY rows whose supervisor has quiesced. Done
        // before Add so a jobId reaped this tick is recreated fresh in
        // the same tick rather than waiting for the next one (B2/S5).
        let reaped: Vec<JobId> = {
            let registry = self.registry.lock();
            new_map
                .iter()
                .filter(|(job_id, execution)| {
                    execution.goal == Goal::Undeploy
                        && registry
                            .get(job_id)
                            .map(|s| s.status().is_done)
                            .unwrap_or(true)
                })
                .map(|(job_id, _)| job_id.clone())
                .collect()
        };
        for job_id in &reaped {
            new_map.remove(job_id);
        }

        // 2b. Add: jobId in desired but not yet committed — including
        // jobIds just reaped above, except when the desired goal is
        // itself UNDEPLOY: such a row (e.g. one reaped this same tick
        // while still desired at UNDEPLOY) has nothing to start or stop,
        // so no execution is created for it until the desired goal
        // changes to START/STOP.
        for (job_id, task) in desired.iter() {
            if new_map.contains_key(job_id) || task.goal == Goal::Undeploy {
                continue;
            }
            let in_use = ports_in_use(&new_map);
            match self.allocator.allocate(&task.job.ports, &in_use) {
                Ok(ports) => {
                    debug!(%job_id, ?ports, "allocated ports for new execution");
                    new_map.insert(
                        job_id.clone(),
                        Execution::new(task.job.clone(), task.goal, ports),
                    );
                }
                Err(e) => {
                    warn!(%job_id, error = %e, "port allocation failed, will retry next tick");
                }
            }
        }

        // 2c. Goal update: jobId desired and committed, goal differs.
        // Job and Ports are carried forward unchanged (I4). A row still
        // sitting at UNDEPLOY is skipped here even if desired asks for
        // START/STOP again — the re-add is deferred until the row is
        // reaped (step 2a, on a later tick if its supervisor hasn't
        // quiesced yet), so the old supervisor/ports are never silently
        // revived (§4.6 edge case, B2/S5).
        for (job_id, task) in desired.iter() {
            if let Some(existing) = new_map.get(job_id) {
                if existing.goal == Goal::Undeploy {
                    continue;
                }
                if existing.goal != task.goal {
                    let updated = existing.with_goal(task.goal);
                    new_map.insert(job_id.clone(), updated);
                }
            }
        }

        // 2d. Retire: deliberately not implemented. See DESIGN.md — the
        // observed behavior (S3, S5) never auto-transitions a row dropped
        // from desired to UNDEPLOY; only an explicit UNDEPLOY goal does.

        // 3. Persist, write-ahead of any registry/supervisor mutation (I3).
        if *self.committed.lock() != new_map {
            self.store.set(&new_map)?;
            *self.committed.lock() = new_map.clone();
        }

        // 4. Reconcile the registry against the new map.
        //
        // Close reaped supervisors first, unconditionally — a reaped
        // jobId may have been re-added in step 2b, so its key is present
        // in both the old registry and the new map and would otherwise
        // pass the `stale`/`missing` diffs below untouched. The old
        // supervisor instance must never be reused across a reap; the
        // registry reconcile's `missing` pass then recreates it fresh.
        for job_id in &reaped {
            let supervisor = self.registry.lock().take(job_id);
            if let Some(supervisor) = supervisor {
                supervisor.close().await;
            }
        }

        let stale: Vec<JobId> = {
            let registry = self.registry.lock();
            registry
                .keys()
                .filter(|job_id| !new_map.contains_key(job_id))
                .cloned()
                .collect()
        };
        for job_id in &stale {
            let supervisor = self.registry.lock().take(job_id);
            if let Some(supervisor) = supervisor {
                supervisor.close().await;
            }
        }

        let missing: Vec<JobId> = {
            let registry = self.registry.lock();
            new_map
                .keys()
                .filter(|job_id| !registry.contains(job_id))
                .cloned()
                .collect()
        };
        for job_id in &missing {
            let execution = &new_map[job_id];
            self.registry
                .lock()
                .create(job_id.clone(), &execution.job, &execution.ports);
        }

        // 5. Drive goals (§4.6 table).
        for (job_id, execution) in new_map.iter() {
            let supervisor = self.registry.lock().get(job_id);
            let Some(supervisor) = supervisor else {
                return Err(ReconcileError::InvariantViolation(format!(
                    "no supervisor registered for committed execution {job_id}"
                )));
            };
            let status = supervisor.status();
            match execution.goal {
                Goal::Start => {
                    if !status.is_starting {
                        supervisor.start().await;
                    }
                }
                Goal::Stop => {
                    if !status.is_stopping {
                        supervisor.stop().await;
                    }
                }
                Goal::Undeploy => {
                    if !status.is_done && !status.is_stopping {
                        supervisor.stop().await;
                    }
                }
            }
        }

        if !reaped.is_empty() {
            info!(count = reaped.len(), "reaped undeployed executions");
        }

        Ok(())
    }
}

/// Pure helper: the set of external ports already committed anywhere in
/// `map`. Recomputed from the map each time it's needed rather than
/// maintained incrementally (§5 "not maintained separately").
fn ports_in_use(map: &ExecutionsMap) -> HashSet<u16> {
    map.values().flat_map(|e| e.ports.values().copied()).collect()
}

#[cfg(test)]
#[path = "reconciler_tests.rs"]
mod tests;
