// src/exec/action.rs

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tempfile::NamedTempFile;
use tokio::process::Command;
use tracing::{error, info};

use crate::config::{ActionDesc, ActionKind};
use crate::exec::registry::{ProcessId, ProcessRegistry};
use crate::exec::resolve;

/// One runnable step of a task, compiled from an [`ActionDesc`].
#[derive(Debug)]
pub enum Action {
    Shell(ShellAction),
    Exec(ExecAction),
}

/// Compile an action descriptor into a runnable action.
///
/// Exec commands are resolved here, at graph compile time; a command that
/// cannot be located still compiles and reports failure when run.
pub fn compile(desc: &ActionDesc) -> Action {
    match &desc.kind {
        ActionKind::Shell { command } => Action::Shell(ShellAction {
            command: command.clone(),
            cwd: desc.cwd.clone(),
            background: desc.background,
            desc: desc.clone(),
            child: None,
        }),
        ActionKind::Exec { command, args } => Action::Exec(ExecAction {
            resolved: resolve::executable(&desc.cwd, command),
            command: command.clone(),
            args: args.clone(),
            cwd: desc.cwd.clone(),
            background: desc.background,
            desc: desc.clone(),
            child: None,
        }),
    }
}

impl Action {
    /// Run the action; returns `false` on failure. Never panics past the
    /// action boundary — spawn errors and non-zero exits are logged and
    /// reported as failure.
    pub(crate) async fn run(&mut self, registry: &ProcessRegistry) -> bool {
        match self {
            Action::Shell(action) => action.run(registry).await,
            Action::Exec(action) => action.run(registry).await,
        }
    }
}

/// Command text handed to the platform shell via a temporary script file,
/// so pipes, redirects and multi-word commands behave uniformly across
/// platforms.
#[derive(Debug)]
pub struct ShellAction {
    command: String,
    cwd: PathBuf,
    background: bool,
    desc: ActionDesc,
    /// Registry id of the last background child spawned by this action.
    child: Option<ProcessId>,
}

impl ShellAction {
    async fn run(&mut self, registry: &ProcessRegistry) -> bool {
        info!(command = %self.command, "shell");

        // Actions are never stacked: a re-run supersedes the previous child.
        if let Some(id) = self.child.take() {
            registry.kill(id);
        }

        let script = match write_script(&self.command) {
            Ok(script) => script,
            Err(err) => {
                error!(
                    command = %self.command,
                    error = %err,
                    "failed to write action script"
                );
                return false;
            }
        };

        if self.background {
            self.run_background(script, registry)
        } else {
            self.run_foreground(script).await
        }
    }

    async fn run_foreground(&self, script: NamedTempFile) -> bool {
        let mut cmd = shell_command(script.path());
        cmd.current_dir(&self.cwd);

        let ok = match cmd.status().await {
            Ok(status) if status.success() => true,
            Ok(status) => {
                error!(
                    command = %self.command,
                    cwd = %self.cwd.display(),
                    code = status.code().unwrap_or(-1),
                    "shell action failed"
                );
                false
            }
            Err(err) => {
                error!(
                    command = %self.command,
                    cwd = %self.cwd.display(),
                    error = %err,
                    "failed to run shell action"
                );
                false
            }
        };
        // `script` drops here: the temp file is removed regardless of
        // outcome.
        ok
    }

    fn run_background(&mut self, script: NamedTempFile, registry: &ProcessRegistry) -> bool {
        // The script must outlive this call; its TempPath travels with the
        // registry entry and is removed when the child is reaped or killed.
        let script = script.into_temp_path();

        let mut cmd = shell_command(&script);
        cmd.current_dir(&self.cwd)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        match cmd.spawn() {
            Ok(child) => {
                info!(pid = ?child.id(), "started background process");
                self.child = Some(registry.track(child, Some(script)));
                true
            }
            Err(err) => {
                error!(
                    command = %self.command,
                    cwd = %self.cwd.display(),
                    descriptor = ?self.desc,
                    error = %err,
                    "failed to start background process"
                );
                false
            }
        }
    }
}

/// Direct executable invocation, bypassing the shell. The shell can
/// introduce unwanted side effects, especially in a cross-platform setup.
#[derive(Debug)]
pub struct ExecAction {
    /// Resolved at compile time; `None` surfaces as action failure at run.
    resolved: Option<PathBuf>,
    command: String,
    args: Vec<String>,
    cwd: PathBuf,
    background: bool,
    desc: ActionDesc,
    child: Option<ProcessId>,
}

impl ExecAction {
    async fn run(&mut self, registry: &ProcessRegistry) -> bool {
        info!(command = %self.command, args = %self.args.join(" "), "exec");

        if let Some(id) = self.child.take() {
            registry.kill(id);
        }

        let Some(program) = self.resolved.clone() else {
            error!(
                command = %self.command,
                cwd = %self.cwd.display(),
                descriptor = ?self.desc,
                "executable not found"
            );
            return false;
        };

        let mut cmd = Command::new(&program);
        cmd.args(&self.args).current_dir(&self.cwd);

        if self.background {
            cmd.stdin(Stdio::null()).kill_on_drop(true);
            match cmd.spawn() {
                Ok(child) => {
                    info!(pid = ?child.id(), "started background process");
                    self.child = Some(registry.track(child, None));
                    true
                }
                Err(err) => {
                    error!(
                        command = %self.command,
                        cwd = %self.cwd.display(),
                        descriptor = ?self.desc,
                        error = %err,
                        "failed to start background process"
                    );
                    false
                }
            }
        } else {
            match cmd.status().await {
                Ok(status) if status.success() => true,
                Ok(status) => {
                    error!(
                        command = %self.command,
                        cwd = %self.cwd.display(),
                        code = status.code().unwrap_or(-1),
                        "exec action failed"
                    );
                    false
                }
                Err(err) => {
                    error!(
                        command = %self.command,
                        cwd = %self.cwd.display(),
                        descriptor = ?self.desc,
                        error = %err,
                        "failed to run exec action"
                    );
                    false
                }
            }
        }
    }
}

/// Write the command text to a temporary script file.
fn write_script(command: &str) -> std::io::Result<NamedTempFile> {
    let mut script = tempfile::Builder::new()
        .prefix("rbuild-")
        .suffix(SCRIPT_SUFFIX)
        .tempfile()?;
    writeln!(script, "{command}")?;
    Ok(script)
}

const SCRIPT_SUFFIX: &str = if cfg!(windows) { ".cmd" } else { ".sh" };

/// Platform shell invocation for a script file.
fn shell_command(script: &Path) -> Command {
    if cfg!(windows) {
        let mut cmd = Command::new("cmd");
        cmd.arg("/C").arg(script);
        cmd
    } else {
        let mut cmd = Command::new("sh");
        cmd.arg(script);
        cmd
    }
}
