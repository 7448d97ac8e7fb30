// src/config/loader.rs

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::info;

use crate::config::model::{
    ActionDesc, ActionKind, ActionSection, BuildDesc, BuildFile, TaskDesc, TaskSection,
};
use crate::errors::{RbuildError, Result};

/// Default build description filename, also looked up inside included
/// directories and consulted for status invalidation.
pub const BUILD_FILE_NAME: &str = "rbuild.toml";

/// Load a build description and all of its includes into normalized form.
///
/// `path` may be a file or a directory (a directory implies its
/// `rbuild.toml`). Included files merge in with every task name, dependency
/// and watch reference prefixed by `<prefix>/:`; including the same file
/// twice is a no-op, and a duplicate task name after merging is an error.
pub fn load(path: impl AsRef<Path>) -> Result<BuildDesc> {
    let file = resolve_build_file(path.as_ref())?;
    let dir = parent_dir(&file);

    let mut loader = Loader {
        included: HashSet::new(),
        names: HashSet::new(),
        tasks: Vec::new(),
    };
    let primary = loader.load_file(&file, "")?;

    // The original author's convention: the first declared task is the
    // default primary.
    let primary = primary.or_else(|| loader.tasks.first().map(|t| t.name.clone()));

    Ok(BuildDesc {
        dir,
        primary,
        tasks: loader.tasks,
    })
}

/// Resolve a user-supplied path into a concrete build file path.
pub fn resolve_build_file(path: &Path) -> Result<PathBuf> {
    let meta = fs::metadata(path)
        .with_context(|| format!("locating build file at {:?}", path))
        .map_err(|e| RbuildError::Config(format!("{e:#}")))?;

    if meta.is_dir() {
        let file = path.join(BUILD_FILE_NAME);
        if !file.is_file() {
            return Err(RbuildError::Config(format!(
                "no {} in directory {:?}",
                BUILD_FILE_NAME, path
            )));
        }
        Ok(file)
    } else {
        Ok(path.to_path_buf())
    }
}

struct Loader {
    /// Canonicalized paths of every file loaded so far.
    included: HashSet<PathBuf>,
    /// Qualified task names seen so far, for duplicate detection.
    names: HashSet<String>,
    tasks: Vec<TaskDesc>,
}

impl Loader {
    /// Load one build file, qualifying everything it declares with `prefix`.
    /// Returns the file's own `primary` (qualified), used only for the root.
    fn load_file(&mut self, file: &Path, prefix: &str) -> Result<Option<String>> {
        let canonical = file.canonicalize().unwrap_or_else(|_| file.to_path_buf());
        if !self.included.insert(canonical) {
            return Ok(None);
        }

        info!(file = %file.display(), "loading build description");

        let contents = fs::read_to_string(file)
            .with_context(|| format!("reading build file at {:?}", file))
            .map_err(RbuildError::Other)?;
        let parsed: BuildFile = toml::from_str(&contents)?;

        let dir = parent_dir(file);

        for (name, section) in &parsed.task {
            let qualified = format!("{prefix}{name}");
            if !self.names.insert(qualified.clone()) {
                return Err(RbuildError::DuplicateTask(qualified));
            }
            self.tasks
                .push(normalize_task(qualified, section, prefix, &dir));
        }

        for (inc_prefix, inc_path) in &parsed.include {
            let target = resolve_build_file(&dir.join(inc_path))?;
            let child_prefix = format!("{prefix}{inc_prefix}/:");
            self.load_file(&target, &child_prefix)?;
        }

        Ok(parsed.primary.map(|p| format!("{prefix}{p}")))
    }
}

fn normalize_task(name: String, section: &TaskSection, prefix: &str, dir: &Path) -> TaskDesc {
    let qualify = |n: &String| format!("{prefix}{n}");

    TaskDesc {
        name,
        description: section.description.clone(),
        dependencies: section.deps.iter().map(qualify).collect(),
        watches: section.watch.iter().map(qualify).collect(),
        sources: section.sources.clone(),
        actions: section
            .actions
            .iter()
            .map(|a| normalize_action(a, dir))
            .collect(),
        cwd: dir.to_path_buf(),
    }
}

fn normalize_action(section: &ActionSection, dir: &Path) -> ActionDesc {
    match section {
        ActionSection::Command(command) => ActionDesc {
            kind: ActionKind::Shell {
                command: command.clone(),
            },
            background: false,
            cwd: dir.to_path_buf(),
        },
        ActionSection::Shell {
            shell,
            background,
            cwd,
        } => ActionDesc {
            kind: ActionKind::Shell {
                command: shell.clone(),
            },
            background: *background,
            cwd: action_cwd(dir, cwd.as_deref()),
        },
        ActionSection::Exec {
            exec,
            args,
            background,
            cwd,
        } => ActionDesc {
            kind: ActionKind::Exec {
                command: exec.clone(),
                args: args.clone(),
            },
            background: *background,
            cwd: action_cwd(dir, cwd.as_deref()),
        },
    }
}

fn action_cwd(dir: &Path, over: Option<&str>) -> PathBuf {
    match over {
        Some(c) => dir.join(c),
        None => dir.to_path_buf(),
    }
}

/// Directory containing `file`, with a bare filename mapping to `.`.
fn parent_dir(file: &Path) -> PathBuf {
    match file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
