// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory [`ExecutionsStore`] for tests (§9 "tests supply an in-memory
//! store").

use fleet_core::ExecutionsMap;
use parking_lot::Mutex;

use crate::{ExecutionsStore, StoreError};

#[derive(Default)]
pub struct InMemoryExecutionsStore {
    map: Mutex<ExecutionsMap>,
}

impl InMemoryExecutionsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded(map: ExecutionsMap) -> Self {
        Self {
            map: Mutex::new(map),
        }
    }
}

impl ExecutionsStore for InMemoryExecutionsStore {
    fn get(&self) -> ExecutionsMap {
        self.map.lock().clone()
    }

    fn set(&self, map: &ExecutionsMap) -> Result<(), StoreError> {
        *self.map.lock() = map.clone();
        Ok(())
    }
}
