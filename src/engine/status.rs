// src/engine/status.rs

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::config::BUILD_FILE_NAME;
use crate::dag::{TaskGraph, TaskStatus, file_time};

/// Status filename, one per distinct task working directory.
pub const STATUS_FILE_NAME: &str = ".rbuild.status";

/// Load persisted status for every directory referenced by any task and
/// merge it onto the in-memory graph.
///
/// A status entry recorded before the directory's build file was last
/// modified is discarded (treated as never run): configuration changes
/// invalidate cached freshness. Read errors are tolerated as "no prior
/// status".
pub fn load(graph: &mut TaskGraph) {
    let mut dirs: HashMap<PathBuf, DirStatus> = HashMap::new();

    for id in graph.ids() {
        let dir = graph.task(id).cwd().to_path_buf();
        let loaded = dirs
            .entry(dir.clone())
            .or_insert_with(|| DirStatus::read(&dir));

        let name = unqualified(graph.task(id).name());
        if let Some(status) = loaded.entries.get(name) {
            let mut last_run = status.last_run;
            if last_run < loaded.build_file_time {
                debug!(
                    task = %graph.task(id).name(),
                    "build file newer than recorded run; discarding status"
                );
                last_run = 0;
            }
            graph.task_mut(id).set_last_run(last_run);
        }
    }
}

/// Persist status for every directory, merging into whatever the file on
/// disk currently holds. Called after every run, success or failure; write
/// errors propagate.
pub fn save(graph: &TaskGraph) -> Result<()> {
    let mut by_dir: HashMap<&Path, Vec<usize>> = HashMap::new();
    for id in graph.ids() {
        by_dir.entry(graph.task(id).cwd()).or_default().push(id);
    }

    for (dir, ids) in by_dir {
        let filename = dir.join(STATUS_FILE_NAME);
        let mut existing = read_status_file(&filename);
        for id in ids {
            let task = graph.task(id);
            existing.insert(unqualified(task.name()).to_string(), task.status());
        }

        let json = serde_json::to_string_pretty(&existing)
            .context("serializing status")?;
        fs::write(&filename, json)
            .with_context(|| format!("writing status file at {:?}", filename))?;
        info!(file = %filename.display(), "updated status");
    }

    Ok(())
}

struct DirStatus {
    entries: HashMap<String, TaskStatus>,
    build_file_time: u64,
}

impl DirStatus {
    fn read(dir: &Path) -> Self {
        let filename = dir.join(STATUS_FILE_NAME);
        if !filename.exists() {
            return Self {
                entries: HashMap::new(),
                build_file_time: 0,
            };
        }

        info!(file = %filename.display(), "loading status");
        Self {
            entries: read_status_file(&filename),
            build_file_time: file_time(&dir.join(BUILD_FILE_NAME)).unwrap_or(0),
        }
    }
}

fn read_status_file(path: &Path) -> HashMap<String, TaskStatus> {
    fs::read_to_string(path)
        .ok()
        .and_then(|contents| serde_json::from_str(&contents).ok())
        .unwrap_or_default()
}

/// Strip the namespace prefix from a task name: entries inside a
/// directory's status file are keyed by the unqualified name, so included
/// builds read their own files the same way a standalone run would.
pub(crate) fn unqualified(name: &str) -> &str {
    name.rsplit_once(':').map_or(name, |(_, tail)| tail)
}
