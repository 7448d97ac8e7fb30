// src/dag/graph.rs

use std::collections::{HashMap, HashSet};

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use tracing::{debug, error, warn};

use crate::config::BuildDesc;
use crate::dag::task::{Task, TaskId};
use crate::errors::{RbuildError, Result};
use crate::exec;

/// The compiled task graph: an arena of tasks plus a name index.
///
/// Edges are wired in two explicit phases (forward `deps`/`watches`, then
/// the inverse `parent_dependents` map); tasks are never mutated after
/// compilation except for their run status.
#[derive(Debug)]
pub struct TaskGraph {
    tasks: Vec<Task>,
    index: HashMap<String, TaskId>,
    primary: Option<TaskId>,
}

impl TaskGraph {
    /// Compile a normalized build description into a runnable graph.
    ///
    /// Every dependency/watch name must resolve; all unresolved references
    /// are collected and logged before the compilation fails as a whole.
    /// Dependency cycles are rejected.
    pub fn compile(desc: &BuildDesc) -> Result<Self> {
        let mut tasks: Vec<Task> = desc.tasks.iter().cloned().map(Task::new).collect();

        let index: HashMap<String, TaskId> = tasks
            .iter()
            .enumerate()
            .map(|(id, task)| (task.name().to_string(), id))
            .collect();

        // Collect every unresolved reference, not just the first.
        let mut unresolved = Vec::new();
        for task in &tasks {
            let refs = task.desc.dependencies.iter().chain(task.desc.watches.iter());
            for name in refs {
                if !index.contains_key(name) {
                    error!(task = %task.name(), reference = %name, "reference to unknown task");
                    unresolved.push(format!("{} -> {}", task.name(), name));
                }
            }
        }
        if !unresolved.is_empty() {
            return Err(RbuildError::UnresolvedReferences(unresolved.join(", ")));
        }

        // Forward edges. An empty watch list defaults to the dependencies.
        for id in 0..tasks.len() {
            let deps: Vec<TaskId> = tasks[id]
                .desc
                .dependencies
                .iter()
                .map(|name| index[name.as_str()])
                .collect();
            let watches: Vec<TaskId> = if tasks[id].desc.watches.is_empty() {
                deps.clone()
            } else {
                tasks[id]
                    .desc
                    .watches
                    .iter()
                    .map(|name| index[name.as_str()])
                    .collect()
            };
            tasks[id].deps = deps;
            tasks[id].watches = watches;
        }

        // Inverse edges: register each task with everything it watches.
        for id in 0..tasks.len() {
            for watched in tasks[id].watches.clone() {
                tasks[watched].parent_dependents.push(id);
            }
        }

        check_acyclic(&tasks)?;

        for task in &mut tasks {
            task.expand_sources();
            task.actions = task.desc.actions.iter().map(exec::compile).collect();
            debug!(
                task = %task.name(),
                sources = task.sources.len(),
                actions = task.actions.len(),
                "compiled task"
            );
        }

        let primary = match &desc.primary {
            Some(name) => {
                let id = index.get(name.as_str()).copied();
                if id.is_none() {
                    warn!(task = %name, "primary task does not exist");
                }
                id
            }
            None => None,
        };

        Ok(Self {
            tasks,
            index,
            primary,
        })
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn ids(&self) -> std::ops::Range<TaskId> {
        0..self.tasks.len()
    }

    pub fn task_id(&self, name: &str) -> Option<TaskId> {
        self.index.get(name).copied()
    }

    pub fn task(&self, id: TaskId) -> &Task {
        &self.tasks[id]
    }

    pub(crate) fn task_mut(&mut self, id: TaskId) -> &mut Task {
        &mut self.tasks[id]
    }

    /// Record a task's last successful run time (epoch millis). The status
    /// layer uses this when merging persisted state; it is also the only
    /// post-compilation mutation a task supports.
    pub fn set_last_run(&mut self, id: TaskId, millis: u64) {
        self.tasks[id].set_last_run(millis);
    }

    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    /// The graph's primary task, if the build description named one that
    /// exists.
    pub fn primary(&self) -> Option<TaskId> {
        self.primary
    }

    /// Ordered execution list for `root`: a depth-first traversal over
    /// dependencies that appends each task only after all of its
    /// dependencies, with the root last. Each reachable task appears exactly
    /// once, diamonds included.
    pub fn prepare(&self, root: TaskId) -> Vec<TaskId> {
        let mut visited = HashSet::new();
        let mut list = Vec::new();
        self.visit_deps(root, &mut visited, &mut list);
        list
    }

    fn visit_deps(&self, id: TaskId, visited: &mut HashSet<TaskId>, list: &mut Vec<TaskId>) {
        if !visited.insert(id) {
            return;
        }
        for &dep in &self.tasks[id].deps {
            self.visit_deps(dep, visited, list);
        }
        list.push(id);
    }

    /// Accumulate into `set` the task itself plus every task that
    /// (transitively, through watch edges) depends on its freshness.
    pub fn impacted_closure(&self, id: TaskId, set: &mut HashSet<TaskId>) {
        if !set.insert(id) {
            return;
        }
        for &parent in &self.tasks[id].parent_dependents {
            self.impacted_closure(parent, set);
        }
    }
}

/// Reject dependency cycles up front; a cycle would otherwise silently
/// truncate the visited-set-guarded traversal in `prepare`.
fn check_acyclic(tasks: &[Task]) -> Result<()> {
    for (id, task) in tasks.iter().enumerate() {
        if task.deps.contains(&id) {
            return Err(RbuildError::Cycle(task.name().to_string()));
        }
    }

    let mut graph: DiGraphMap<TaskId, ()> = DiGraphMap::new();
    for id in 0..tasks.len() {
        graph.add_node(id);
    }
    for (id, task) in tasks.iter().enumerate() {
        for &dep in &task.deps {
            graph.add_edge(dep, id, ());
        }
    }

    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => Err(RbuildError::Cycle(tasks[cycle.node_id()].name().to_string())),
    }
}
