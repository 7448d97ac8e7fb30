// src/exec/registry.rs

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tempfile::TempPath;
use tokio::process::Child;
use tracing::{debug, info, warn};

pub type ProcessId = u64;

/// Registry of every live background process spawned by actions.
///
/// Children are registered on spawn and deregistered once their exit is
/// confirmed; [`ProcessRegistry::shutdown`] kills everything still
/// outstanding and is invoked deterministically at program end (and on
/// Ctrl-C). Children additionally carry `kill_on_drop`, so dropping the
/// registry can never leak a process.
#[derive(Default)]
pub struct ProcessRegistry {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    next_id: ProcessId,
    children: HashMap<ProcessId, TrackedChild>,
}

struct TrackedChild {
    child: Child,
    /// Script file backing a background shell action; removed when the
    /// entry is dropped.
    _script: Option<TempPath>,
}

impl ProcessRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register a freshly spawned child, reaping entries whose process has
    /// already exited.
    pub fn track(&self, child: Child, script: Option<TempPath>) -> ProcessId {
        let mut inner = self.lock();
        inner.reap();
        inner.next_id += 1;
        let id = inner.next_id;
        inner.children.insert(
            id,
            TrackedChild {
                child,
                _script: script,
            },
        );
        id
    }

    /// Kill the tracked child with this id, if it is still registered.
    pub fn kill(&self, id: ProcessId) {
        let mut inner = self.lock();
        if let Some(mut tracked) = inner.children.remove(&id) {
            terminate(&mut tracked);
        }
    }

    /// Number of children still registered (exited ones are reaped first).
    pub fn live_count(&self) -> usize {
        let mut inner = self.lock();
        inner.reap();
        inner.children.len()
    }

    /// Kill every outstanding child. Mandatory at program teardown.
    pub fn shutdown(&self) {
        let mut inner = self.lock();
        for (_, mut tracked) in inner.children.drain() {
            terminate(&mut tracked);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Inner {
    fn reap(&mut self) {
        self.children.retain(|_, tracked| match tracked.child.try_wait() {
            Ok(Some(status)) => {
                debug!(code = ?status.code(), "background process exited");
                false
            }
            Ok(None) => true,
            Err(err) => {
                warn!(error = %err, "failed to poll background process; dropping it");
                false
            }
        });
    }
}

fn terminate(tracked: &mut TrackedChild) {
    if let Ok(Some(_)) = tracked.child.try_wait() {
        return;
    }
    info!(pid = ?tracked.child.id(), "terminating process");
    if let Err(err) = tracked.child.start_kill() {
        warn!(error = %err, "failed to kill child process");
    }
}
