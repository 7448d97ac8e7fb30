// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `rbuild`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "rbuild",
    version,
    about = "Task-based build orchestrator with incremental re-runs and file watching.",
    long_about = None
)]
pub struct CliArgs {
    /// Task to run (defaults to the build file's primary task).
    #[arg(value_name = "TASK")]
    pub task_arg: Option<String>,

    /// Task to run; the positional argument takes precedence.
    #[arg(long, value_name = "NAME")]
    pub task: Option<String>,

    /// Watch source files and re-run impacted tasks on modification.
    #[arg(short, long)]
    pub watch: bool,

    /// Print the ordered execution list and the build description as JSON,
    /// without executing anything.
    #[arg(short, long)]
    pub describe: bool,

    /// Run every task unconditionally, ignoring recorded freshness.
    #[arg(short, long)]
    pub force: bool,

    /// Build description filename (a directory implies its `rbuild.toml`).
    #[arg(long, value_name = "PATH", default_value = "rbuild.toml")]
    pub filename: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `RBUILD_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

impl CliArgs {
    /// Selected task name, if any: the positional argument wins over `--task`.
    pub fn selected_task(&self) -> Option<&str> {
        self.task_arg.as_deref().or(self.task.as_deref())
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
