// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the `fleetd` binary (§11).
//!
//! Nothing in `fleet-core`/`fleet-engine` reads the environment (§6 "no
//! CLI, no environment variables"); this module is the one place that
//! translates `FLEETD_*` variables into the plain constructor parameters
//! the core crates take, mirroring the teacher's `daemon/src/env.rs`.

use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::AgentError;

/// Resolve the state directory: `FLEETD_STATE_DIR` > `XDG_STATE_HOME/fleetd` >
/// `~/.local/state/fleetd`.
pub fn state_dir() -> Result<PathBuf, AgentError> {
    if let Ok(dir) = std::env::var("FLEETD_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("fleetd"));
    }
    let home = std::env::var("HOME").map_err(|_| AgentError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/fleetd"))
}

/// Periodic reactor fallback timeout (§4.5, §9 "make it configurable"),
/// default 5s.
pub fn reconcile_timeout() -> Duration {
    std::env::var("FLEETD_RECONCILE_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(5))
}

/// Dynamic port allocation range, `FLEETD_DYNAMIC_PORT_RANGE="start-end"`,
/// default the ephemeral range `30000-32767`.
pub fn dynamic_port_range() -> Result<RangeInclusive<u16>, AgentError> {
    let Ok(raw) = std::env::var("FLEETD_DYNAMIC_PORT_RANGE") else {
        return Ok(30000..=32767);
    };
    let (start, end) = raw
        .split_once('-')
        .ok_or_else(|| AgentError::InvalidPortRange(raw.clone()))?;
    let start: u16 = start.parse().map_err(|_| AgentError::InvalidPortRange(raw.clone()))?;
    let end: u16 = end.parse().map_err(|_| AgentError::InvalidPortRange(raw.clone()))?;
    Ok(start..=end)
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
