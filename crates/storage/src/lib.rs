// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable storage for the committed executions map (§4.1).
//!
//! `set` must be atomic: a crash during persistence leaves either the old
//! map or the new one on disk, never a torn state (§9 "atomic map write").
//! This is load-bearing for I2 and I3 — a per-entry write would let a
//! crash commit half a map and violate port disjointness.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod file_store;
mod memory_store;

pub use file_store::{FileExecutionsStore, FsStoreWriter, StoreWriter};
pub use memory_store::InMemoryExecutionsStore;

use fleet_core::ExecutionsMap;
use thiserror::Error;

/// Errors from persisting or loading the executions map.
///
/// Per §7 kind 3, every variant here is fatal to the agent: the core
/// cannot guarantee its invariants without durable state, so the caller
/// (the reconciler, via the reactor) must propagate this out rather than
/// skip the tick and continue.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Holds one value of type [`ExecutionsMap`]. `set` is atomic and durable.
pub trait ExecutionsStore: Send + Sync {
    fn get(&self) -> ExecutionsMap;
    fn set(&self, map: &ExecutionsMap) -> Result<(), StoreError>;
}
