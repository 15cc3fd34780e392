// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The lifecycle façade (§4.7): recovers persisted executions, wires the
//! reactor to the reconciler, and owns the shutdown sequence.

use std::sync::Arc;

use fleet_engine::{
    DesiredStateSource, Reactor, ReactorNotifier, Reconciler, SupervisorFactory, SupervisorRegistry,
};
use fleet_ports::PortAllocator;
use fleet_storage::ExecutionsStore;
use tracing::{error, info};

use crate::config::AgentConfig;
use crate::error::AgentError;

/// Owns the reactor and reconciler for one node. Constructed once at
/// process start; `stop` is the only valid way to wind it down.
pub struct Agent {
    reactor: Arc<Reactor>,
    reconciler: Arc<Reconciler>,
}

impl Agent {
    /// §4.7 startup sequence:
    /// 1. Load the persisted executions map.
    /// 2. Recreate a supervisor per row using its **persisted** ports —
    ///    the allocator is never consulted on recovery (I2 across restarts).
    /// 3. Subscribe the reactor to the desired-state source.
    /// 4. Start the reactor with the reconciler as its callback.
    /// 5. Trigger an initial `update()`.
    pub fn start(
        store: Arc<dyn ExecutionsStore>,
        allocator: Arc<dyn PortAllocator>,
        desired_source: Box<dyn DesiredStateSource>,
        factory: Arc<dyn SupervisorFactory>,
        config: AgentConfig,
    ) -> Self {
        let recovered = store.get();
        let mut registry = SupervisorRegistry::new(factory);
        for (job_id, execution) in recovered.iter() {
            registry.create(job_id.clone(), &execution.job, &execution.ports);
        }
        info!(jobs = recovered.len(), "recovered executions from store");
        let registry = Arc::new(parking_lot::Mutex::new(registry));

        let reconciler = Arc::new(Reconciler::new(
            desired_source,
            Arc::clone(&store),
            allocator,
            registry,
        ));

        let reactor = Arc::new(Reactor::new());
        reconciler.watch_desired_state(Arc::new(ReactorNotifier(Arc::clone(&reactor))));

        let tick_reconciler = Arc::clone(&reconciler);
        reactor.start(config.reconcile_timeout, move || {
            let reconciler = Arc::clone(&tick_reconciler);
            async move { reconciler.reconcile().await }
        });

        info!("reactor started, triggering initial reconciliation");
        reactor.update();

        Self { reactor, reconciler }
    }

    /// §4.7 shutdown: stop the reactor (awaiting the in-flight tick, if
    /// any), then `close()` every supervisor still in the registry.
    /// **Never calls `stop()` on a supervisor here** — an agent restart
    /// must not kill a running container (S6).
    pub async fn stop(&self) -> Result<(), AgentError> {
        if let Some(fatal) = self.reactor.stop().await {
            error!(error = %fatal, "reactor had already stopped on a fatal error");
            return Err(fatal.into());
        }

        let supervisors = self.reconciler.registry().lock().take_all();
        info!(count = supervisors.len(), "closing supervisors on shutdown");
        for supervisor in supervisors {
            supervisor.close().await;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
