use std::fs;

use rbuild::config::{self, ActionKind};
use rbuild::dag::TaskGraph;
use rbuild::errors::RbuildError;

#[test]
fn loads_tasks_in_declaration_order_with_parsed_actions() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("rbuild.toml"),
        r#"
primary = "build"

[task.build]
description = "link the final artifact"
deps = ["compile"]
sources = ["src/**/*.c"]
actions = [
  "echo build",
  { shell = "./server.sh", background = true },
  { exec = "cp", args = ["a.bin", "b.bin"] },
]

[task.compile]
actions = ["echo compile"]
"#,
    )
    .unwrap();

    let desc = config::load(dir.path()).unwrap();

    assert_eq!(desc.primary.as_deref(), Some("build"));
    let names: Vec<&str> = desc.tasks.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["build", "compile"]);

    let build = desc.task("build").unwrap();
    assert_eq!(build.description, "link the final artifact");
    assert_eq!(build.dependencies, vec!["compile"]);
    assert_eq!(build.sources, vec!["src/**/*.c"]);
    assert_eq!(build.actions.len(), 3);

    match &build.actions[0].kind {
        ActionKind::Shell { command } => assert_eq!(command, "echo build"),
        other => panic!("expected shell action, got {other:?}"),
    }
    assert!(!build.actions[0].background);
    assert!(build.actions[1].background);
    match &build.actions[2].kind {
        ActionKind::Exec { command, args } => {
            assert_eq!(command, "cp");
            assert_eq!(args, &["a.bin", "b.bin"]);
        }
        other => panic!("expected exec action, got {other:?}"),
    }
}

#[test]
fn default_primary_is_the_first_declared_task() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("rbuild.toml"),
        r#"
[task.first]
actions = ["true"]

[task.second]
actions = ["true"]
"#,
    )
    .unwrap();

    let desc = config::load(dir.path()).unwrap();
    assert_eq!(desc.primary.as_deref(), Some("first"));
}

#[test]
fn includes_merge_with_namespace_prefixes() {
    let dir = tempfile::tempdir().unwrap();
    let sub = dir.path().join("subproject");
    fs::create_dir(&sub).unwrap();

    fs::write(
        dir.path().join("rbuild.toml"),
        r#"
[include]
sub = "subproject"

[task.top]
deps = ["sub/:build"]
actions = ["echo top"]
"#,
    )
    .unwrap();
    fs::write(
        sub.join("rbuild.toml"),
        r#"
[task.build]
deps = ["compile"]
actions = ["echo build"]

[task.compile]
actions = ["echo compile"]
"#,
    )
    .unwrap();

    let desc = config::load(dir.path()).unwrap();

    let names: Vec<&str> = desc.tasks.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["top", "sub/:build", "sub/:compile"]);

    // Dependencies inside the included file are prefixed too.
    let included = desc.task("sub/:build").unwrap();
    assert_eq!(included.dependencies, vec!["sub/:compile"]);
    // Included tasks run in their own directory.
    assert_eq!(included.cwd, sub);

    // The merged description compiles: the cross-namespace dep resolves.
    let graph = TaskGraph::compile(&desc).unwrap();
    assert_eq!(graph.len(), 3);
}

#[test]
fn including_the_same_file_twice_is_a_noop() {
    let dir = tempfile::tempdir().unwrap();
    let sub = dir.path().join("subproject");
    fs::create_dir(&sub).unwrap();

    fs::write(
        dir.path().join("rbuild.toml"),
        r#"
[include]
sub = "subproject"
again = "subproject/rbuild.toml"

[task.top]
actions = ["echo top"]
"#,
    )
    .unwrap();
    fs::write(sub.join("rbuild.toml"), "[task.build]\nactions = [\"true\"]\n").unwrap();

    let desc = config::load(dir.path()).unwrap();

    let names: Vec<&str> = desc.tasks.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["top", "sub/:build"]);
}

#[test]
fn duplicate_task_names_across_includes_fail() {
    let dir = tempfile::tempdir().unwrap();
    let sub = dir.path().join("subproject");
    fs::create_dir(&sub).unwrap();

    fs::write(
        dir.path().join("rbuild.toml"),
        r#"
[include]
sub = "subproject"

[task."sub/:build"]
actions = ["echo shadowed"]
"#,
    )
    .unwrap();
    fs::write(sub.join("rbuild.toml"), "[task.build]\nactions = [\"true\"]\n").unwrap();

    match config::load(dir.path()) {
        Err(RbuildError::DuplicateTask(name)) => assert_eq!(name, "sub/:build"),
        other => panic!("expected DuplicateTask, got {other:?}"),
    }
}

#[test]
fn missing_build_file_is_a_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.toml");

    assert!(matches!(
        config::load(&missing),
        Err(RbuildError::Config(_))
    ));
}
