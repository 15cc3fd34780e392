// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job identity and the immutable job descriptor.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::port::PortMapping;

/// Opaque, stable identity of a job.
///
/// Equality is structural: two `JobId`s are equal iff their name, version
/// and content hash all match. There is no generated/random component —
/// the master is the source of identity, not this agent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct JobId {
    pub name: String,
    pub version: String,
    pub content_hash: String,
}

impl JobId {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        content_hash: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            content_hash: content_hash.into(),
        }
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}#{}", self.name, self.version, short(&self.content_hash, 8))
    }
}

fn short(s: &str, n: usize) -> &str {
    if s.len() <= n {
        s
    } else {
        &s[..n]
    }
}

/// Immutable job descriptor: what to run and how to expose its ports.
///
/// `Job` is frozen for the lifetime of an `Execution` (§3 I4): once an
/// execution is born, its job never changes in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub image: String,
    pub command: Vec<String>,
    /// Requested port mappings, keyed by port name.
    pub ports: BTreeMap<String, PortMapping>,
}

impl Job {
    pub fn new(id: JobId, image: impl Into<String>, command: Vec<String>) -> Self {
        Self {
            id,
            image: image.into(),
            command,
            ports: BTreeMap::new(),
        }
    }

    pub fn with_port(mut self, name: impl Into<String>, mapping: PortMapping) -> Self {
        self.ports.insert(name.into(), mapping);
        self
    }
}

#[cfg(any(test, feature = "test-support"))]
pub mod test_support {
    use super::*;

    /// Build a minimal job fixture for tests: `name@v1#hash`, no ports.
    pub fn job_fixture(name: &str) -> Job {
        Job::new(
            JobId::new(name, "v1", format!("hash-{name}")),
            format!("{name}:latest"),
            vec!["run".to_string()],
        )
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
