// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Single-threaded, coalescing, edge-triggered work driver (§4.5).

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::desired_state::Notifier;
use crate::error::ReconcileError;

/// Drives a callback at most once concurrently, coalescing any `update()`
/// calls that arrive while one is in flight into a single extra run, and
/// falling back to a periodic tick so missed notifications self-heal.
///
/// Grounded in the daemon's own `tokio::select!` engine loop: a
/// `Notify`-guarded wait plus an `interval` branch, except here the work
/// is one coalesced callback instead of a WAL-backed event queue.
pub struct Reactor {
    notify: Arc<Notify>,
    shutdown: Arc<Notify>,
    handle: Mutex<Option<JoinHandle<Option<ReconcileError>>>>,
}

impl Default for Reactor {
    fn default() -> Self {
        Self::new()
    }
}

impl Reactor {
    pub fn new() -> Self {
        Self {
            notify: Arc::new(Notify::new()),
            shutdown: Arc::new(Notify::new()),
            handle: Mutex::new(None),
        }
    }

    /// Begin scheduling. `callback` runs to completion before another run
    /// is considered; `timeout` bounds the gap between runs absent any
    /// `update()` call. Per-tick errors are logged and swallowed unless
    /// `ReconcileError::is_fatal()`, in which case the reactor stops
    /// itself and the error is returned from the next `stop()`.
    pub fn start<F, Fut>(&self, timeout: Duration, mut callback: F)
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), ReconcileError>> + Send,
    {
        let notify = Arc::clone(&self.notify);
        let shutdown = Arc::clone(&self.shutdown);

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(timeout);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = shutdown.notified() => {
                        info!("reactor stopping, no further ticks will run");
                        return None;
                    }
                    _ = notify.notified() => {}
                    _ = interval.tick() => {
                        warn!("periodic reactor fallback fired");
                    }
                }

                match callback().await {
                    Ok(()) => {}
                    Err(e) if e.is_fatal() => {
                        error!(error = %e, "fatal reconciliation error, stopping reactor");
                        return Some(e);
                    }
                    Err(e) => {
                        warn!(error = %e, "reconciliation tick failed, will retry");
                    }
                }
            }
        });

        *self.handle.lock() = Some(handle);
    }

    /// Nonblocking, idempotent poke: schedule a run if none is in flight
    /// and none is already pending, otherwise collapse into the pending
    /// one (`tokio::sync::Notify` already coalesces multiple permits).
    pub fn update(&self) {
        self.notify.notify_one();
    }

    /// Halt scheduling and await the in-flight callback, if any. Returns
    /// the fatal error that stopped the reactor on its own, if that's why
    /// it stopped rather than being asked to.
    pub async fn stop(&self) -> Option<ReconcileError> {
        self.shutdown.notify_one();
        match self.handle.lock().take() {
            Some(handle) => handle.await.unwrap_or(None),
            None => None,
        }
    }
}

/// Adapts a [`Reactor`] to the [`Notifier`] contract so a
/// `DesiredStateSource` (or any other external event source) can poke it
/// without knowing anything about reconciliation.
pub struct ReactorNotifier(pub Arc<Reactor>);

impl Notifier for ReactorNotifier {
    fn notify(&self) {
        self.0.update();
    }
}

#[cfg(test)]
#[path = "reactor_tests.rs"]
mod tests;
