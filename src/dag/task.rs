// src/dag/task.rs

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::TaskDesc;
use crate::exec::{Action, ProcessRegistry};

/// Tasks are arena-allocated inside [`crate::dag::TaskGraph`] and addressed
/// by index, so edges never hold object references.
pub type TaskId = usize;

/// Persisted run status; `last_run` is the only task field that survives
/// across process invocations.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TaskStatus {
    /// Epoch milliseconds of the last successful run, 0 when never run.
    #[serde(default)]
    pub last_run: u64,
}

/// A named, schedulable unit of work: one [`TaskDesc`] plus resolved graph
/// edges, expanded sources, compiled actions, and run status.
///
/// After graph compilation a task is immutable except for its status.
#[derive(Debug)]
pub struct Task {
    pub(crate) desc: TaskDesc,
    /// Tasks that must run before this one, declared order.
    pub(crate) deps: Vec<TaskId>,
    /// Tasks whose modification re-triggers this one; defaults to `deps`.
    pub(crate) watches: Vec<TaskId>,
    /// Inverse of `watches`: tasks that watch this one.
    pub(crate) parent_dependents: Vec<TaskId>,
    /// Expanded absolute source paths, fixed for the process lifetime.
    pub(crate) sources: Vec<PathBuf>,
    pub(crate) actions: Vec<Action>,
    pub(crate) status: TaskStatus,
}

impl Task {
    pub(crate) fn new(desc: TaskDesc) -> Self {
        Self {
            desc,
            deps: Vec::new(),
            watches: Vec::new(),
            parent_dependents: Vec::new(),
            sources: Vec::new(),
            actions: Vec::new(),
            status: TaskStatus::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.desc.name
    }

    pub fn description(&self) -> &str {
        &self.desc.description
    }

    /// Directory of the build file that declared this task.
    pub fn cwd(&self) -> &Path {
        &self.desc.cwd
    }

    pub fn deps(&self) -> &[TaskId] {
        &self.deps
    }

    pub fn watches(&self) -> &[TaskId] {
        &self.watches
    }

    pub fn parent_dependents(&self) -> &[TaskId] {
        &self.parent_dependents
    }

    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn last_run(&self) -> u64 {
        self.status.last_run
    }

    pub(crate) fn set_last_run(&mut self, millis: u64) {
        self.status.last_run = millis;
    }

    /// Expand the description's source patterns against the task's working
    /// directory. Glob-capable entries are expanded, plain entries pass
    /// through unexpanded (they may legitimately not exist yet), duplicates
    /// collapse keeping first-occurrence order, and every result is made
    /// absolute.
    pub(crate) fn expand_sources(&mut self) {
        let mut seen = HashSet::new();
        let mut out = Vec::new();

        let mut push = |path: PathBuf| {
            let path = absolute(path);
            if seen.insert(path.clone()) {
                out.push(path);
            }
        };

        for pattern in &self.desc.sources {
            let full = self.desc.cwd.join(pattern);
            if !has_magic(pattern) {
                push(full);
                continue;
            }
            let Some(full_str) = full.to_str() else {
                warn!(task = %self.desc.name, pattern = %pattern, "non-UTF-8 source pattern; ignoring");
                continue;
            };
            match glob::glob(full_str) {
                Ok(paths) => {
                    for entry in paths.flatten() {
                        push(entry);
                    }
                }
                Err(err) => {
                    warn!(
                        task = %self.desc.name,
                        pattern = %pattern,
                        error = %err,
                        "invalid source pattern; ignoring"
                    );
                }
            }
        }

        self.sources = out;
    }

    /// A task is up to date iff it declares at least one source, every source
    /// exists, and every source's mtime is strictly older than the recorded
    /// last run. Tasks without sources always re-run; a missing source
    /// counts as changed.
    pub fn is_up_to_date(&self) -> bool {
        if self.sources.is_empty() {
            return false;
        }
        self.sources.iter().all(|src| match file_time(src) {
            Some(modified) => modified < self.status.last_run,
            None => false,
        })
    }

    /// Run this task's actions in declared order, stopping at the first
    /// failure.
    pub(crate) async fn run_actions(&mut self, registry: &ProcessRegistry) -> bool {
        for action in &mut self.actions {
            if !action.run(registry).await {
                return false;
            }
        }
        true
    }
}

/// Last-modified time in epoch milliseconds; `None` when the file cannot be
/// statted (missing, or mid-replace during a rapid edit).
pub fn file_time(path: &Path) -> Option<u64> {
    let modified = fs::metadata(path).ok()?.modified().ok()?;
    let since_epoch = modified.duration_since(UNIX_EPOCH).ok()?;
    Some(since_epoch.as_millis() as u64)
}

/// Current wall-clock time in epoch milliseconds.
pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

fn has_magic(pattern: &str) -> bool {
    pattern.chars().any(|c| matches!(c, '*' | '?' | '['))
}

fn absolute(path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        match std::env::current_dir() {
            Ok(cwd) => cwd.join(path),
            Err(_) => path,
        }
    }
}
