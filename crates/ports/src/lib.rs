// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Port allocation (§4.2).
//!
//! A pure function: given a job's requested port mappings and the set of
//! external ports already in use across every other execution, return a
//! concrete name → external-port assignment, or fail with [`PortConflict`].
//! No side effects, no persistence — the reconciler is responsible for
//! committing the result.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use std::collections::{BTreeMap, HashSet};
use std::ops::RangeInclusive;

use fleet_core::PortMapping;
use thiserror::Error;

/// Allocation failed: a requested static port was already in use, or no
/// free dynamic port remained in the configured range.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PortConflict {
    #[error("static port {port} for {port_name:?} is already in use")]
    StaticPortInUse { port_name: String, port: u16 },
    #[error("no free dynamic port available in range for {port_name:?}")]
    DynamicRangeExhausted { port_name: String },
}

/// Implementations choose concrete external ports for a job's requested
/// port mappings. Pure: no I/O, no mutation of `in_use` (§4.2).
pub trait PortAllocator: Send + Sync {
    fn allocate(
        &self,
        requested: &BTreeMap<String, PortMapping>,
        in_use: &HashSet<u16>,
    ) -> Result<BTreeMap<String, u16>, PortConflict>;
}

/// Default allocator: honors static ports exactly, draws dynamic ports
/// uniformly at random from a configurable range, retrying on collision.
pub struct DefaultPortAllocator {
    dynamic_range: RangeInclusive<u16>,
}

impl DefaultPortAllocator {
    pub fn new(dynamic_range: RangeInclusive<u16>) -> Self {
        Self { dynamic_range }
    }
}

impl Default for DefaultPortAllocator {
    /// The ephemeral range conventionally left to user-space services.
    fn default() -> Self {
        Self::new(30000..=32767)
    }
}

impl PortAllocator for DefaultPortAllocator {
    fn allocate(
        &self,
        requested: &BTreeMap<String, PortMapping>,
        in_use: &HashSet<u16>,
    ) -> Result<BTreeMap<String, u16>, PortConflict> {
        let mut chosen_this_call: HashSet<u16> = HashSet::new();
        let mut result = BTreeMap::new();

        // Static ports first: they are non-negotiable and must fail fast
        // if unavailable, before any dynamic port is drawn.
        for (name, mapping) in requested {
            if let Some(port) = mapping.external_port {
                if in_use.contains(&port) || chosen_this_call.contains(&port) {
                    return Err(PortConflict::StaticPortInUse {
                        port_name: name.clone(),
                        port,
                    });
                }
                chosen_this_call.insert(port);
                result.insert(name.clone(), port);
            }
        }

        for (name, mapping) in requested {
            if mapping.external_port.is_some() {
                continue;
            }
            let port = self
                .pick_dynamic(in_use, &chosen_this_call)
                .ok_or_else(|| PortConflict::DynamicRangeExhausted {
                    port_name: name.clone(),
                })?;
            chosen_this_call.insert(port);
            result.insert(name.clone(), port);
        }

        Ok(result)
    }
}

impl DefaultPortAllocator {
    fn pick_dynamic(&self, in_use: &HashSet<u16>, chosen_this_call: &HashSet<u16>) -> Option<u16> {
        use rand::Rng;

        let start = *self.dynamic_range.start();
        let end = *self.dynamic_range.end();
        if start > end {
            return None;
        }
        let span = (end - start) as u32 + 1;

        // Bounded random probing rather than scanning the whole range: the
        // range is large and near-empty in practice. Fall back to a linear
        // scan if we don't get lucky, so exhaustion is still detected
        // correctly rather than spuriously.
        let mut rng = rand::rng();
        for _ in 0..64 {
            let candidate = start + (rng.random_range(0..span) as u16);
            if !in_use.contains(&candidate) && !chosen_this_call.contains(&candidate) {
                return Some(candidate);
            }
        }

        (start..=end).find(|p| !in_use.contains(p) && !chosen_this_call.contains(p))
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
