// src/engine/runner.rs

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info};

use crate::dag::{TaskGraph, TaskId};
use crate::dag::task::now_millis;
use crate::engine::status;
use crate::errors::{RbuildError, Result};
use crate::exec::ProcessRegistry;

#[derive(Debug, Clone, Default)]
pub struct RunnerOptions {
    /// Run every task unconditionally and skip status loading beforehand
    /// (saving afterwards still happens).
    pub force: bool,
}

/// The sequential scheduler: drives tasks through their actions in
/// dependency-consistent order, one at a time.
///
/// Execution is deliberately never parallel, even across independent
/// subtrees: actions share resources (ports, output files, the terminal)
/// and sequential order keeps their side effects and output deterministic.
pub struct Runner {
    graph: TaskGraph,
    options: RunnerOptions,
    registry: Arc<ProcessRegistry>,
}

impl Runner {
    pub fn new(graph: TaskGraph, options: RunnerOptions, registry: Arc<ProcessRegistry>) -> Self {
        Self {
            graph,
            options,
            registry,
        }
    }

    pub fn graph(&self) -> &TaskGraph {
        &self.graph
    }

    /// Run the named task and everything it depends on.
    pub async fn run(&mut self, name: &str) -> Result<bool> {
        let root = self
            .graph
            .task_id(name)
            .ok_or_else(|| RbuildError::TaskNotFound(name.to_string()))?;
        info!(task = %name, "running top-level task");
        self.run_filtered(root, None).await
    }

    /// Run the dependency chain of `root`, optionally restricted to a set
    /// of impacted tasks (watch mode). The restriction filters the already
    /// ordered list, so relative order among the remaining tasks always
    /// matches the full graph.
    ///
    /// Returns `Ok(false)` when a task failed; `Err` only for
    /// process-level problems such as an unwritable status file.
    pub async fn run_filtered(
        &mut self,
        root: TaskId,
        filter: Option<&HashSet<TaskId>>,
    ) -> Result<bool> {
        if !self.options.force {
            status::load(&mut self.graph);
        }

        let mut list = self.graph.prepare(root);
        if let Some(filter) = filter {
            list.retain(|id| filter.contains(id));
        }

        let names = list
            .iter()
            .map(|&id| self.graph.task(id).name())
            .collect::<Vec<_>>()
            .join(", ");
        info!(count = list.len(), tasks = %names, "prepared task chain");

        let mut ok = true;
        for id in list {
            let name = self.graph.task(id).name().to_string();

            if !self.options.force && self.graph.task(id).is_up_to_date() {
                info!(task = %name, "up to date");
                continue;
            }

            info!(task = %name, "starting");
            let start = Instant::now();
            ok = self.run_task(id).await;
            let duration_ms = start.elapsed().as_millis() as u64;

            if !ok {
                error!(task = %name, duration_ms, "task failed");
                break;
            }
            info!(task = %name, duration_ms, "task finished");
        }

        // Partial progress is worth keeping even when the run failed.
        status::save(&self.graph)?;
        Ok(ok)
    }

    async fn run_task(&mut self, id: TaskId) -> bool {
        let registry = Arc::clone(&self.registry);
        let task = self.graph.task_mut(id);
        let ok = task.run_actions(&registry).await;
        if ok {
            task.set_last_run(now_millis());
        }
        ok
    }
}
