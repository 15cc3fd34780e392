// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reference [`DesiredStateSource`] (§12): reads a JSON file of the
//! deployment table and re-reads it on filesystem change, matching the
//! teacher's file-watcher pattern (`adapters/src/notify.rs`,
//! `daemon/src/adapters/agent/watcher_tests`). Not part of the
//! reconciliation core — the master's real wire protocol is out of scope
//! (§1).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use fleet_core::{DesiredMap, Task};
use fleet_engine::{DesiredStateError as EngineDesiredStateError, DesiredStateSource, Notifier};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum FileDesiredStateError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed desired state file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl From<FileDesiredStateError> for EngineDesiredStateError {
    fn from(e: FileDesiredStateError) -> Self {
        EngineDesiredStateError::new(e.to_string())
    }
}

/// The wire format is a plain list: each `Task`'s `Job` already carries
/// its `JobId`, so there is no need for (and, as with `ExecutionsMap`,
/// serde_json can't support) a `JobId`-keyed JSON object.
fn read_desired_map(path: &Path) -> Result<DesiredMap, FileDesiredStateError> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(DesiredMap::new());
        }
        Err(source) => return Err(FileDesiredStateError::Io { path: path.to_path_buf(), source }),
    };
    let tasks: Vec<Task> = serde_json::from_slice(&bytes)
        .map_err(|source| FileDesiredStateError::Parse { path: path.to_path_buf(), source })?;
    Ok(tasks.into_iter().map(|task| (task.job.id.clone(), task)).collect())
}

struct Inner {
    listeners: Vec<Arc<dyn Notifier>>,
    /// Kept alive for as long as the source is: dropping it stops the
    /// underlying OS watch.
    _watcher: Option<RecommendedWatcher>,
}

/// Reads `path` as a JSON array of `Task`s. A `notify`-crate filesystem
/// watch re-reads it on every change and forwards the poke to every
/// registered [`Notifier`]; if the watch itself fails to install, the
/// reactor's periodic fallback tick (§4.5) still picks up edits eventually.
pub struct FileDesiredStateSource {
    path: PathBuf,
    inner: Mutex<Inner>,
}

impl FileDesiredStateSource {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            inner: Mutex::new(Inner {
                listeners: Vec::new(),
                _watcher: None,
            }),
        }
    }

    /// Install the filesystem watch. Separate from `new` so a caller can
    /// register listeners first and know the watch is live before the
    /// agent takes its first `update()`.
    pub fn watch(self: &Arc<Self>) {
        let source = Arc::clone(self);
        let mut watcher = match notify::recommended_watcher(move |event: notify::Result<notify::Event>| {
            match event {
                Ok(event) if event.kind.is_modify() || event.kind.is_create() || event.kind.is_remove() => {
                    debug!(path = %source.path.display(), "desired state file changed");
                    source.notify_listeners();
                }
                Ok(_) => {}
                Err(e) => warn!(error = %e, "desired state file watch error"),
            }
        }) {
            Ok(watcher) => watcher,
            Err(e) => {
                warn!(error = %e, "failed to install desired-state file watch, relying on periodic fallback");
                return;
            }
        };

        let watch_target = self.path.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."));
        if let Err(e) = watcher.watch(&watch_target, RecursiveMode::NonRecursive) {
            warn!(error = %e, path = %watch_target.display(), "failed to watch desired-state directory");
            return;
        }
        self.inner.lock()._watcher = Some(watcher);
    }

    fn notify_listeners(&self) {
        for listener in &self.inner.lock().listeners {
            listener.notify();
        }
    }
}

impl DesiredStateSource for FileDesiredStateSource {
    fn get_tasks(&self) -> Result<DesiredMap, EngineDesiredStateError> {
        read_desired_map(&self.path).map_err(Into::into)
    }

    fn add_listener(&self, notifier: Arc<dyn Notifier>) {
        self.inner.lock().listeners.push(notifier);
    }
}

#[cfg(test)]
#[path = "file_desired_state_tests.rs"]
mod tests;
