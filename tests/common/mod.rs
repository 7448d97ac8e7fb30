#![allow(dead_code)]

//! Common test utilities: builders for normalized build descriptions.

use std::path::{Path, PathBuf};

use rbuild::config::model::{ActionDesc, ActionKind, BuildDesc, TaskDesc};

/// Builder for a [`TaskDesc`] to simplify test setup.
pub struct TaskDescBuilder {
    desc: TaskDesc,
}

impl TaskDescBuilder {
    pub fn new(name: &str, cwd: &Path) -> Self {
        Self {
            desc: TaskDesc {
                name: name.to_string(),
                description: String::new(),
                dependencies: Vec::new(),
                watches: Vec::new(),
                sources: Vec::new(),
                actions: Vec::new(),
                cwd: cwd.to_path_buf(),
            },
        }
    }

    pub fn deps(mut self, names: &[&str]) -> Self {
        self.desc.dependencies = names.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn watch(mut self, names: &[&str]) -> Self {
        self.desc.watches = names.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn sources(mut self, patterns: &[&str]) -> Self {
        self.desc.sources = patterns.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn shell(mut self, command: &str) -> Self {
        let cwd = self.desc.cwd.clone();
        self.desc.actions.push(ActionDesc {
            kind: ActionKind::Shell {
                command: command.to_string(),
            },
            background: false,
            cwd,
        });
        self
    }

    pub fn background_shell(mut self, command: &str) -> Self {
        let cwd = self.desc.cwd.clone();
        self.desc.actions.push(ActionDesc {
            kind: ActionKind::Shell {
                command: command.to_string(),
            },
            background: true,
            cwd,
        });
        self
    }

    pub fn exec(mut self, command: &str, args: &[&str]) -> Self {
        let cwd = self.desc.cwd.clone();
        self.desc.actions.push(ActionDesc {
            kind: ActionKind::Exec {
                command: command.to_string(),
                args: args.iter().map(|s| s.to_string()).collect(),
            },
            background: false,
            cwd,
        });
        self
    }

    pub fn build(self) -> TaskDesc {
        self.desc
    }
}

/// Shorthand for starting a task builder.
pub fn task(name: &str, cwd: &Path) -> TaskDescBuilder {
    TaskDescBuilder::new(name, cwd)
}

/// Assemble a [`BuildDesc`]; the primary defaults to the first task, like
/// the loader does.
pub fn build_desc(dir: &Path, tasks: Vec<TaskDesc>) -> BuildDesc {
    let primary = tasks.first().map(|t| t.name.clone());
    BuildDesc {
        dir: dir.to_path_buf(),
        primary,
        tasks,
    }
}

/// A build description rooted in the process cwd, for graph-shape tests
/// that never touch the filesystem.
pub fn build_desc_here(tasks: Vec<TaskDesc>) -> BuildDesc {
    build_desc(&PathBuf::from("."), tasks)
}
