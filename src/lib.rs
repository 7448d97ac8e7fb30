// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod watch;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Result, anyhow, bail};
use tracing::info;

use crate::cli::CliArgs;
use crate::config::BuildDesc;
use crate::dag::TaskGraph;
use crate::engine::{Runner, RunnerOptions};
use crate::errors::RbuildError;
use crate::exec::ProcessRegistry;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - build description loading (includes expanded)
/// - graph compilation
/// - the sequential runner and the background-process registry
/// - (optional) file watching
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let desc = config::load(Path::new(&args.filename))?;

    let task_name = args
        .selected_task()
        .map(str::to_string)
        .or_else(|| desc.primary.clone())
        .ok_or_else(|| anyhow!("build description declares no tasks"))?;

    let graph = TaskGraph::compile(&desc)?;

    if args.describe {
        print_describe(&desc, &graph, &task_name)?;
        return Ok(());
    }

    let registry = ProcessRegistry::new();
    let mut runner = Runner::new(
        graph,
        RunnerOptions { force: args.force },
        Arc::clone(&registry),
    );

    // Registry shutdown is unconditional, success or failure: background
    // children never outlive the program.
    let result = drive(&args, &mut runner, &task_name).await;
    registry.shutdown();
    result
}

async fn drive(args: &CliArgs, runner: &mut Runner, task_name: &str) -> Result<()> {
    let ok = runner.run(task_name).await?;

    if args.watch {
        // The watch loop only ends with the process; a failed initial run
        // still watches, the next relevant change re-attempts it.
        return tokio::select! {
            res = watch::watch(runner) => res.map_err(Into::into),
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown requested");
                Ok(())
            }
        };
    }

    if !ok {
        bail!("task '{task_name}' failed");
    }
    Ok(())
}

/// `--describe`: print the ordered execution list for the selected task and
/// the full normalized build description as JSON, without executing.
fn print_describe(desc: &BuildDesc, graph: &TaskGraph, task_name: &str) -> Result<()> {
    let root = graph
        .task_id(task_name)
        .ok_or_else(|| RbuildError::TaskNotFound(task_name.to_string()))?;

    let list: Vec<String> = graph
        .prepare(root)
        .into_iter()
        .map(|id| graph.task(id).name().to_string())
        .collect();

    let output = serde_json::json!({
        "build": { "list": list },
        "description": desc,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
