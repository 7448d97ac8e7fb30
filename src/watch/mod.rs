// src/watch/mod.rs

//! File watching and change propagation.
//!
//! A deliberately simple polling watcher: it snapshots the modification
//! time of every expanded source file across all tasks, and on change
//! computes the minimal set of tasks to re-run (the declaring tasks plus
//! everything that watches them, transitively) before re-invoking the
//! runner restricted to that set.
//!
//! It knows nothing about glob patterns or the build description; it only
//! turns file modifications into restricted re-runs.

pub mod watcher;

pub use watcher::{POLL_INTERVAL, build_source_map, watch};
