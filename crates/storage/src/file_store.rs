// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File-backed [`ExecutionsStore`]: write-to-temp, fsync, rename-over.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use fleet_core::{Execution, ExecutionsMap};
use parking_lot::Mutex;
use tracing::{info, warn};

use crate::{ExecutionsStore, StoreError};

/// On-disk shape of an [`ExecutionsMap`].
///
/// `JobId` is a struct, and `serde_json` can only serialize map keys that
/// are strings or other primitives — a `BTreeMap<JobId, Execution>` fails
/// at the first `set()` call with "key must be a string". Every
/// `Execution` already carries its own `JobId` in `job.id`, so the file
/// format is just the list of executions; the map is rebuilt from that
/// field on load.
fn to_wire(map: &ExecutionsMap) -> Vec<&Execution> {
    map.values().collect()
}

fn from_wire(executions: Vec<Execution>) -> ExecutionsMap {
    executions
        .into_iter()
        .map(|execution| (execution.job.id.clone(), execution))
        .collect()
}

/// Abstracts the filesystem operations a durable write depends on, so the
/// atomic-replace protocol can be unit tested without touching a real
/// disk and so crash-midway scenarios can be simulated deterministically.
pub trait StoreWriter: Send + Sync {
    fn write_tmp(&self, path: &Path, data: &[u8]) -> Result<(), StoreError>;
    fn fsync_file(&self, path: &Path) -> Result<(), StoreError>;
    fn rename(&self, from: &Path, to: &Path) -> Result<(), StoreError>;
    fn fsync_dir(&self, path: &Path) -> Result<(), StoreError>;
    fn read(&self, path: &Path) -> Result<Option<Vec<u8>>, StoreError>;
}

/// Production writer using real filesystem operations.
#[derive(Clone, Default)]
pub struct FsStoreWriter;

impl StoreWriter for FsStoreWriter {
    fn write_tmp(&self, path: &Path, data: &[u8]) -> Result<(), StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut file = File::create(path)?;
        file.write_all(data)?;
        Ok(())
    }

    fn fsync_file(&self, path: &Path) -> Result<(), StoreError> {
        File::open(path)?.sync_all()?;
        Ok(())
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<(), StoreError> {
        std::fs::rename(from, to)?;
        Ok(())
    }

    fn fsync_dir(&self, path: &Path) -> Result<(), StoreError> {
        if let Some(parent) = path.parent() {
            // Best-effort: some filesystems (notably on macOS, and tmpfs in
            // CI containers) don't support opening a directory for fsync.
            // The file-level fsync plus rename already makes the content
            // durable; this just tightens the metadata-durability window.
            if let Ok(dir) = File::open(parent) {
                let _ = dir.sync_all();
            }
        }
        Ok(())
    }

    fn read(&self, path: &Path) -> Result<Option<Vec<u8>>, StoreError> {
        match std::fs::read(path) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Durable [`ExecutionsStore`] backed by a single file plus atomic
/// replace. Serves the initial empty map on first startup (§4.1).
pub struct FileExecutionsStore<W: StoreWriter = FsStoreWriter> {
    writer: W,
    path: PathBuf,
    /// In-memory mirror kept in sync with disk; `get()` never touches the
    /// filesystem so it stays cheap for the reconciler's per-tick snapshot.
    cached: Mutex<ExecutionsMap>,
}

impl FileExecutionsStore<FsStoreWriter> {
    /// Load (or initialize) the store at `path` using the real filesystem.
    pub fn open(path: PathBuf) -> Result<Self, StoreError> {
        Self::open_with_writer(FsStoreWriter, path)
    }
}

impl<W: StoreWriter> FileExecutionsStore<W> {
    pub fn open_with_writer(writer: W, path: PathBuf) -> Result<Self, StoreError> {
        let map = match writer.read(&path)? {
            Some(bytes) => from_wire(serde_json::from_slice(&bytes)?),
            None => {
                info!(path = %path.display(), "no existing executions file, starting empty");
                ExecutionsMap::new()
            }
        };
        Ok(Self {
            writer,
            path,
            cached: Mutex::new(map),
        })
    }

    fn tmp_path(&self) -> PathBuf {
        self.path.with_extension("tmp")
    }
}

impl<W: StoreWriter> ExecutionsStore for FileExecutionsStore<W> {
    fn get(&self) -> ExecutionsMap {
        self.cached.lock().clone()
    }

    fn set(&self, map: &ExecutionsMap) -> Result<(), StoreError> {
        let data = serde_json::to_vec_pretty(&to_wire(map))?;
        let tmp = self.tmp_path();

        let result = (|| {
            self.writer.write_tmp(&tmp, &data)?;
            self.writer.fsync_file(&tmp)?;
            self.writer.rename(&tmp, &self.path)?;
            self.writer.fsync_dir(&self.path)
        })();

        if let Err(ref e) = result {
            warn!(error = %e, "failed to persist executions map");
            return result;
        }

        *self.cached.lock() = map.clone();
        Ok(())
    }
}

#[cfg(test)]
#[path = "file_store_tests.rs"]
mod tests;
