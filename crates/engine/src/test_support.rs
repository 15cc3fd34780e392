// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fakes for exercising [`crate::Reconciler`] without a real runtime,
//! store, allocator, or desired-state transport.

use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use fleet_core::{DesiredMap, Job, JobId, ObservedState, PortMapping, SupervisorStatus};
use fleet_ports::PortConflict;
use parking_lot::Mutex;

use crate::desired_state::{DesiredStateSource, Notifier};
use crate::error::DesiredStateError;
use crate::supervisor::{Supervisor, SupervisorFactory};
use fleet_ports::PortAllocator;

/// Recorded call to a [`FakeSupervisor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorCall {
    Start,
    Stop,
    Close,
}

struct FakeSupervisorState {
    calls: Vec<SupervisorCall>,
    status: SupervisorStatus,
}

/// A supervisor whose status is set directly by the test and whose calls
/// are recorded for assertion.
#[derive(Clone)]
pub struct FakeSupervisor {
    inner: Arc<Mutex<FakeSupervisorState>>,
}

impl Default for FakeSupervisor {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeSupervisor {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeSupervisorState {
                calls: Vec::new(),
                status: SupervisorStatus::created(),
            })),
        }
    }

    pub fn calls(&self) -> Vec<SupervisorCall> {
        self.inner.lock().calls.clone()
    }

    pub fn call_count(&self, call: SupervisorCall) -> usize {
        self.inner.lock().calls.iter().filter(|c| **c == call).count()
    }

    pub fn set_status(&self, status: SupervisorStatus) {
        self.inner.lock().status = status;
    }
}

#[async_trait]
impl Supervisor for FakeSupervisor {
    async fn start(&self) {
        self.inner.lock().calls.push(SupervisorCall::Start);
    }

    async fn stop(&self) {
        self.inner.lock().calls.push(SupervisorCall::Stop);
    }

    async fn close(&self) {
        self.inner.lock().calls.push(SupervisorCall::Close);
    }

    fn status(&self) -> SupervisorStatus {
        self.inner.lock().status
    }
}

/// Hands out a fresh [`FakeSupervisor`] per `create` call and remembers
/// every one it made, keyed by jobId, so a test can reach back in and
/// drive statuses after a tick.
#[derive(Clone, Default)]
pub struct FakeSupervisorFactory {
    created: Arc<Mutex<BTreeMap<JobId, FakeSupervisor>>>,
}

impl FakeSupervisorFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, job_id: &JobId) -> Option<FakeSupervisor> {
        self.created.lock().get(job_id).cloned()
    }

    pub fn created_count(&self) -> usize {
        self.created.lock().len()
    }
}

impl SupervisorFactory for FakeSupervisorFactory {
    fn create(
        &self,
        job_id: &JobId,
        _job: &Job,
        _ports: &BTreeMap<String, u16>,
    ) -> Arc<dyn Supervisor> {
        let supervisor = FakeSupervisor::new();
        self.created.lock().insert(job_id.clone(), supervisor.clone());
        Arc::new(supervisor)
    }
}

struct FakeDesiredStateSourceState {
    tasks: DesiredMap,
    listeners: Vec<Arc<dyn Notifier>>,
}

/// An in-memory `DesiredStateSource` a test can mutate directly; every
/// mutation forwards to every registered listener, matching the real
/// contract (§6).
#[derive(Clone)]
pub struct FakeDesiredStateSource {
    inner: Arc<Mutex<FakeDesiredStateSourceState>>,
}

impl Default for FakeDesiredStateSource {
    fn default() -> Self {
        Self::new(DesiredMap::new())
    }
}

impl FakeDesiredStateSource {
    pub fn new(tasks: DesiredMap) -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeDesiredStateSourceState {
                tasks,
                listeners: Vec::new(),
            })),
        }
    }

    /// Replace the desired map and notify every listener.
    pub fn set_tasks(&self, tasks: DesiredMap) {
        let listeners = {
            let mut inner = self.inner.lock();
            inner.tasks = tasks;
            inner.listeners.clone()
        };
        for listener in listeners {
            listener.notify();
        }
    }
}

impl DesiredStateSource for FakeDesiredStateSource {
    fn get_tasks(&self) -> Result<DesiredMap, DesiredStateError> {
        Ok(self.inner.lock().tasks.clone())
    }

    fn add_listener(&self, notifier: Arc<dyn Notifier>) {
        self.inner.lock().listeners.push(notifier);
    }
}

/// A [`PortAllocator`] that returns pre-scripted responses in call order,
/// so tests can pin down exactly which ports a tick allocates (e.g. the
/// §8 scenario fixtures) without depending on randomness.
#[derive(Default)]
pub struct FakePortAllocator {
    responses: Mutex<VecDeque<Result<BTreeMap<String, u16>, PortConflict>>>,
    calls: std::sync::atomic::AtomicUsize,
}

impl FakePortAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_response(&self, response: Result<BTreeMap<String, u16>, PortConflict>) {
        self.responses.lock().push_back(response);
    }

    /// How many times `allocate` has been called, so a test can prove a
    /// recovery path never consulted the allocator at all.
    pub fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

impl PortAllocator for FakePortAllocator {
    fn allocate(
        &self,
        _requested: &BTreeMap<String, PortMapping>,
        _in_use: &HashSet<u16>,
    ) -> Result<BTreeMap<String, u16>, PortConflict> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(BTreeMap::new()))
    }
}

/// Convenience constructor for a [`SupervisorStatus`] in the given
/// observed state, with `isStarting`/`isStopping`/`isDone` set the way the
/// real adapters would report them for that state.
pub fn status_for(state: ObservedState) -> SupervisorStatus {
    use ObservedState::*;
    match state {
        Creating | Starting => SupervisorStatus::new(true, false, false, state),
        Running => SupervisorStatus::new(false, false, false, state),
        Stopping => SupervisorStatus::new(false, true, false, state),
        Stopped | Exited | Failed => SupervisorStatus::new(false, false, true, state),
    }
}
