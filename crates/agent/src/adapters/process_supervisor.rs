// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reference [`Supervisor`] (§12): one OS child process stands in for one
//! container instance. Not part of the reconciliation core, not exercised
//! by the §8 property tests — those run entirely against
//! `fleet_engine::test_support::FakeSupervisor`. Grounded in the teacher's
//! subprocess-adapter shape (`DockerAdapter` in
//! `daemon/src/adapters/agent/docker/mod.rs`), swapping a `docker run` for
//! a direct `tokio::process::Command` spawn.

use std::collections::BTreeMap;
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use fleet_core::{Job, JobId, ObservedState, SupervisorStatus};
use fleet_engine::{Supervisor, SupervisorFactory};
use parking_lot::Mutex;
use tokio::process::Child;
use tracing::{info, warn};

struct Inner {
    child: Option<Child>,
    /// Sticky terminal state: `try_wait` reaps the child on the call that
    /// observes its exit, so the resulting status must be remembered for
    /// every subsequent poll.
    terminal: Option<ObservedState>,
    closed: bool,
}

/// Runs `job.command` as a child process. `start` spawns if nothing is
/// currently running; `stop` kills and reaps whatever is running — there
/// is no OS-level pause/resume, so "stopped but not discarded" is
/// represented purely in the committed `Execution`'s goal, not in any
/// live process state (§12 "simpler: start spawns, stop kills and
/// waits"). `close` drops the handle without touching the process.
pub struct ProcessSupervisor {
    job_id: JobId,
    command: Vec<String>,
    inner: Mutex<Inner>,
}

impl ProcessSupervisor {
    pub fn new(job_id: JobId, job: &Job) -> Self {
        Self {
            job_id,
            command: job.command.clone(),
            inner: Mutex::new(Inner {
                child: None,
                terminal: None,
                closed: false,
            }),
        }
    }
}

#[async_trait]
impl Supervisor for ProcessSupervisor {
    async fn start(&self) {
        let already_running = self.inner.lock().child.is_some();
        if already_running {
            return;
        }
        let Some((program, args)) = self.command.split_first() else {
            warn!(job_id = %self.job_id, "empty command, nothing to spawn");
            return;
        };
        match tokio::process::Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
        {
            Ok(child) => {
                info!(job_id = %self.job_id, pid = ?child.id(), "spawned process");
                let mut inner = self.inner.lock();
                inner.child = Some(child);
                inner.terminal = None;
            }
            Err(e) => {
                warn!(job_id = %self.job_id, error = %e, "failed to spawn process");
                self.inner.lock().terminal = Some(ObservedState::Failed);
            }
        }
    }

    async fn stop(&self) {
        let child = self.inner.lock().child.take();
        let Some(mut child) = child else {
            return;
        };
        if let Err(e) = child.start_kill() {
            warn!(job_id = %self.job_id, error = %e, "failed to signal process");
        }
        let status = child.wait().await;
        info!(job_id = %self.job_id, "process stopped");
        self.inner.lock().terminal = Some(match status {
            Ok(_) => ObservedState::Stopped,
            Err(_) => ObservedState::Failed,
        });
    }

    async fn close(&self) {
        let mut inner = self.inner.lock();
        inner.closed = true;
        inner.child = None;
    }

    fn status(&self) -> SupervisorStatus {
        let mut inner = self.inner.lock();
        if inner.closed {
            return SupervisorStatus::new(false, false, true, ObservedState::Stopped);
        }
        if let Some(child) = inner.child.as_mut() {
            match child.try_wait() {
                Ok(None) => return SupervisorStatus::new(false, false, false, ObservedState::Running),
                Ok(Some(exit)) => {
                    let state = if exit.success() {
                        ObservedState::Exited
                    } else {
                        ObservedState::Failed
                    };
                    inner.terminal = Some(state);
                    inner.child = None;
                }
                Err(_) => {
                    inner.terminal = Some(ObservedState::Failed);
                    inner.child = None;
                }
            }
        }
        match inner.terminal {
            Some(state) => SupervisorStatus::new(false, false, true, state),
            None => SupervisorStatus::new(false, false, false, ObservedState::Creating),
        }
    }
}

/// Hands out a fresh [`ProcessSupervisor`] per execution.
#[derive(Default)]
pub struct ProcessSupervisorFactory;

impl ProcessSupervisorFactory {
    pub fn new() -> Self {
        Self
    }
}

impl SupervisorFactory for ProcessSupervisorFactory {
    fn create(&self, job_id: &JobId, job: &Job, _ports: &BTreeMap<String, u16>) -> Arc<dyn Supervisor> {
        Arc::new(ProcessSupervisor::new(job_id.clone(), job))
    }
}

#[cfg(test)]
#[path = "process_supervisor_tests.rs"]
mod tests;
