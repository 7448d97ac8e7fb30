// src/config/model.rs

use std::path::PathBuf;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Top-level build description as read from an `rbuild.toml` file.
///
/// ```toml
/// primary = "build"
///
/// [include]
/// sub = "subproject"
///
/// [task.build]
/// description = "link the final artifact"
/// deps = ["compile", "assets"]
/// watch = ["compile"]
/// sources = ["src/**/*.c"]
/// actions = [
///   "make -j4",
///   { shell = "./server.sh", background = true },
///   { exec = "cp", args = ["a.bin", "b.bin"] },
/// ]
/// ```
///
/// All sections are optional. Tasks keep their declaration order; the first
/// declared task is the default primary.
#[derive(Debug, Clone, Deserialize)]
pub struct BuildFile {
    /// Name of the task run when none is given on the command line.
    #[serde(default)]
    pub primary: Option<String>,

    /// Included build files: namespace prefix -> path (relative to this
    /// file's directory; a directory implies its `rbuild.toml`).
    #[serde(default)]
    pub include: IndexMap<String, String>,

    /// All tasks from `[task.<name>]`, in declaration order.
    #[serde(default)]
    pub task: IndexMap<String, TaskSection>,
}

/// `[task.<name>]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskSection {
    #[serde(default)]
    pub description: String,

    /// Names of tasks that must run before this one.
    #[serde(default)]
    pub deps: Vec<String>,

    /// Names of tasks whose modification should re-trigger this one.
    ///
    /// Defaults to `deps` when empty.
    #[serde(default)]
    pub watch: Vec<String>,

    /// Source path patterns, glob-capable, relative to the defining file's
    /// directory. A task with no sources is never considered up to date.
    #[serde(default)]
    pub sources: Vec<String>,

    /// Ordered action list.
    #[serde(default)]
    pub actions: Vec<ActionSection>,
}

/// One action entry. A bare string is shorthand for a foreground shell
/// action.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ActionSection {
    Command(String),
    Shell {
        shell: String,
        #[serde(default)]
        background: bool,
        #[serde(default)]
        cwd: Option<String>,
    },
    Exec {
        exec: String,
        #[serde(default)]
        args: Vec<String>,
        #[serde(default)]
        background: bool,
        #[serde(default)]
        cwd: Option<String>,
    },
}

/// Normalized build description: what the graph compiler consumes.
///
/// Produced by [`crate::config::loader`]; independent of how the build was
/// authored.
#[derive(Debug, Clone, Serialize)]
pub struct BuildDesc {
    /// Base directory of the root build file.
    pub dir: PathBuf,
    /// Primary task name, if any task was declared.
    pub primary: Option<String>,
    /// All task descriptions, declaration order, includes expanded.
    pub tasks: Vec<TaskDesc>,
}

impl BuildDesc {
    pub fn task(&self, name: &str) -> Option<&TaskDesc> {
        self.tasks.iter().find(|t| t.name == name)
    }
}

/// Normalized description of a single task.
#[derive(Debug, Clone, Serialize)]
pub struct TaskDesc {
    /// Unique name; namespaced as `prefix/:name` when included.
    pub name: String,
    pub description: String,
    pub dependencies: Vec<String>,
    pub watches: Vec<String>,
    pub sources: Vec<String>,
    pub actions: Vec<ActionDesc>,
    /// Directory of the build file that declared this task. Sources expand
    /// relative to it, actions run in it, and its `.rbuild.status` holds the
    /// task's persisted run status.
    pub cwd: PathBuf,
}

/// Normalized action descriptor.
#[derive(Debug, Clone, Serialize)]
pub struct ActionDesc {
    pub kind: ActionKind,
    pub background: bool,
    /// Working directory for the action; the declaring task's `cwd` unless
    /// overridden per action.
    pub cwd: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
pub enum ActionKind {
    /// Command text handed to the platform shell, so pipes and redirects
    /// work.
    Shell { command: String },
    /// Direct executable invocation, bypassing the shell.
    Exec { command: String, args: Vec<String> },
}
