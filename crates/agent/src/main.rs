// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `fleetd`: the worker-node binary. Resolves configuration from the
//! environment (§11), wires the reference adapters (§12) behind the
//! core's trait contracts, starts the [`Agent`], and waits for a signal
//! to shut down cleanly.

use std::sync::Arc;

use fleet_agent::adapters::{FileDesiredStateSource, ProcessSupervisorFactory};
use fleet_agent::{env, Agent, AgentConfig};
use fleet_ports::DefaultPortAllocator;
use fleet_storage::FileExecutionsStore;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> std::process::ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match run().await {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "fleetd exiting on fatal error");
            std::process::ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), fleet_agent::AgentError> {
    let state_dir = env::state_dir()?;
    std::fs::create_dir_all(&state_dir).map_err(fleet_storage::StoreError::Io)?;

    let executions_path = state_dir.join("executions.json");
    let desired_state_path = state_dir.join("desired.json");

    info!(
        state_dir = %state_dir.display(),
        executions_path = %executions_path.display(),
        "starting fleetd"
    );

    let store = Arc::new(FileExecutionsStore::open(executions_path)?);
    let allocator = Arc::new(DefaultPortAllocator::new(env::dynamic_port_range()?));
    let desired_source = Arc::new(FileDesiredStateSource::new(desired_state_path));
    desired_source.watch();
    let factory = Arc::new(ProcessSupervisorFactory::new());

    let config = AgentConfig {
        reconcile_timeout: env::reconcile_timeout(),
    };

    let agent = Agent::start(store, allocator, Box::new(DesiredSourceHandle(desired_source)), factory, config);

    shutdown_signal().await;
    info!("shutdown signal received, stopping agent");
    agent.stop().await?;
    info!("fleetd stopped");
    Ok(())
}

/// `Agent::start` takes ownership of a boxed `DesiredStateSource`, but
/// `FileDesiredStateSource::watch` needs an `Arc` to hand its watcher
/// callback a clone of itself. This thin wrapper lets `main` keep the
/// `Arc` alive for the watch while still satisfying the trait.
struct DesiredSourceHandle(Arc<FileDesiredStateSource>);

impl fleet_engine::DesiredStateSource for DesiredSourceHandle {
    fn get_tasks(&self) -> Result<fleet_core::DesiredMap, fleet_engine::DesiredStateError> {
        self.0.get_tasks()
    }

    fn add_listener(&self, notifier: Arc<dyn fleet_engine::Notifier>) {
        self.0.add_listener(notifier)
    }
}

async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = sigterm.recv() => {}
            }
        }
        Err(e) => {
            error!(error = %e, "failed to install SIGTERM handler, waiting on Ctrl-C only");
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}
