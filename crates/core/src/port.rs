// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Port mapping requests and allocations.

use serde::{Deserialize, Serialize};

/// One requested port mapping.
///
/// `external_port` is `Some` for a static, fixed port (the caller pinned
/// it, e.g. "this job must bind host port 443") and `None` for a dynamic
/// port the allocator is free to choose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortMapping {
    pub internal_port: u16,
    pub external_port: Option<u16>,
}

impl PortMapping {
    pub fn dynamic(internal_port: u16) -> Self {
        Self {
            internal_port,
            external_port: None,
        }
    }

    pub fn static_port(internal_port: u16, external_port: u16) -> Self {
        Self {
            internal_port,
            external_port: Some(external_port),
        }
    }

    pub fn is_static(&self) -> bool {
        self.external_port.is_some()
    }
}

#[cfg(test)]
#[path = "port_tests.rs"]
mod tests;
