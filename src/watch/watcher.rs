// src/watch/watcher.rs

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::time::Duration;

use rand::seq::SliceRandom;
use rand::thread_rng;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::dag::{TaskGraph, TaskId, file_time};
use crate::engine::Runner;
use crate::errors::Result;

/// Fixed polling interval between watch ticks.
pub const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Poll every watched source file and re-run impacted tasks on
/// modification. Runs until the surrounding future is dropped (Ctrl-C).
///
/// Each tick scans the files in randomized order and handles at most one
/// modification: the remaining changed files keep their stale snapshots and
/// surface on subsequent ticks. Stat failures (a file briefly missing
/// during a rapid editor save) read as "no modification time" and the file
/// is skipped until it stabilises.
pub async fn watch(runner: &mut Runner) -> Result<()> {
    let Some(primary) = runner.graph().primary() else {
        warn!("no primary task; file watching disabled");
        return Ok(());
    };

    let source_map = build_source_map(runner.graph());
    let mut files: Vec<PathBuf> = source_map.keys().cloned().collect();
    if files.is_empty() {
        info!("no source files to watch");
        return Ok(());
    }

    info!(count = files.len(), "starting file watch");
    for file in &files {
        debug!(file = %file.display(), "watching");
    }

    let mut last_modified: HashMap<PathBuf, u64> = files
        .iter()
        .map(|file| (file.clone(), file_time(file).unwrap_or(0)))
        .collect();

    loop {
        files.shuffle(&mut thread_rng());

        let mut modified = None;
        for file in &files {
            let last = last_modified[file];
            let now = file_time(file).unwrap_or(0);
            if now > last {
                last_modified.insert(file.clone(), now);
                modified = Some(file.clone());
                break;
            }
        }

        if let Some(file) = modified {
            info!(file = %file.display(), "file modification");

            let mut run_set = HashSet::new();
            if let Some(tasks) = source_map.get(&file) {
                for &id in tasks {
                    runner.graph().impacted_closure(id, &mut run_set);
                }
            }

            info!("restarting tasks");
            // A failed task run leaves the loop polling; the next relevant
            // change re-attempts it.
            runner.run_filtered(primary, Some(&run_set)).await?;
        }

        sleep(POLL_INTERVAL).await;
    }
}

/// Reverse index: absolute source path -> tasks that declare it, in
/// first-declaration order without duplicates.
pub fn build_source_map(graph: &TaskGraph) -> HashMap<PathBuf, Vec<TaskId>> {
    let mut map: HashMap<PathBuf, Vec<TaskId>> = HashMap::new();
    for id in graph.ids() {
        for source in graph.task(id).sources() {
            let tasks = map.entry(source.clone()).or_default();
            if !tasks.contains(&id) {
                tasks.push(id);
            }
        }
    }
    map
}
