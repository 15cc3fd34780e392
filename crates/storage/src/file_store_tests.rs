// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use fleet_core::{job_fixture, Execution, Goal};

use super::*;

fn sample_map() -> ExecutionsMap {
    let job = job_fixture("web");
    let id = job.id.clone();
    let mut map = ExecutionsMap::new();
    map.insert(id, Execution::new(job, Goal::Start, BTreeMap::new()));
    map
}

#[test]
fn fresh_store_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileExecutionsStore::open(dir.path().join("executions.json")).unwrap();
    assert!(store.get().is_empty());
}

#[test]
fn set_then_get_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileExecutionsStore::open(dir.path().join("executions.json")).unwrap();

    let map = sample_map();
    store.set(&map).unwrap();

    assert_eq!(store.get(), map);
}

#[test]
fn reopening_store_recovers_persisted_map() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("executions.json");
    let map = sample_map();

    {
        let store = FileExecutionsStore::open(path.clone()).unwrap();
        store.set(&map).unwrap();
    }

    let reopened = FileExecutionsStore::open(path).unwrap();
    assert_eq!(reopened.get(), map);
}

#[test]
fn no_tmp_file_left_behind_after_successful_set() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("executions.json");
    let store = FileExecutionsStore::open(path.clone()).unwrap();

    store.set(&sample_map()).unwrap();

    assert!(!path.with_extension("tmp").exists());
}

/// Writer that fails at a configurable stage, to prove the in-memory
/// cache (and therefore `get()`) is untouched when persistence fails
/// partway — the old map must still be observable (§9 atomic map write).
struct FailingWriter {
    inner: FsStoreWriter,
    fail_on_rename: AtomicBool,
}

impl StoreWriter for FailingWriter {
    fn write_tmp(&self, path: &std::path::Path, data: &[u8]) -> Result<(), StoreError> {
        self.inner.write_tmp(path, data)
    }
    fn fsync_file(&self, path: &std::path::Path) -> Result<(), StoreError> {
        self.inner.fsync_file(path)
    }
    fn rename(&self, from: &std::path::Path, to: &std::path::Path) -> Result<(), StoreError> {
        if self.fail_on_rename.load(Ordering::SeqCst) {
            return Err(StoreError::Io(std::io::Error::other("simulated crash")));
        }
        self.inner.rename(from, to)
    }
    fn fsync_dir(&self, path: &std::path::Path) -> Result<(), StoreError> {
        self.inner.fsync_dir(path)
    }
    fn read(&self, path: &std::path::Path) -> Result<Option<Vec<u8>>, StoreError> {
        self.inner.read(path)
    }
}

#[test]
fn failed_rename_leaves_old_map_observable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("executions.json");
    let writer = FailingWriter {
        inner: FsStoreWriter,
        fail_on_rename: AtomicBool::new(false),
    };
    let store = FileExecutionsStore::open_with_writer(writer, path).unwrap();

    let first = sample_map();
    store.set(&first).unwrap();

    store.writer.fail_on_rename.store(true, Ordering::SeqCst);
    let mut second = first.clone();
    second.clear();
    let err = store.set(&second);

    assert!(err.is_err());
    assert_eq!(store.get(), first, "old map must survive a failed persist");
}
