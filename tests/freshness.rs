mod common;

use std::fs;
use std::thread::sleep;
use std::time::Duration;

use rbuild::dag::{TaskGraph, file_time};

use common::{build_desc, task};

#[test]
fn task_without_sources_is_never_up_to_date() {
    let dir = tempfile::tempdir().unwrap();
    let desc = build_desc(dir.path(), vec![task("status", dir.path()).build()]);
    let mut graph = TaskGraph::compile(&desc).unwrap();

    let id = graph.task_id("status").unwrap();
    graph.set_last_run(id, u64::MAX);
    assert!(!graph.task(id).is_up_to_date());
}

#[test]
fn up_to_date_requires_every_source_strictly_older_than_last_run() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("main.c");
    fs::write(&src, "int main() {}\n").unwrap();

    let desc = build_desc(
        dir.path(),
        vec![task("compile", dir.path()).sources(&["main.c"]).build()],
    );
    let mut graph = TaskGraph::compile(&desc).unwrap();
    let id = graph.task_id("compile").unwrap();
    let mtime = file_time(&src).unwrap();

    graph.set_last_run(id, mtime + 1);
    assert!(graph.task(id).is_up_to_date());

    // An mtime equal to last_run counts as changed.
    graph.set_last_run(id, mtime);
    assert!(!graph.task(id).is_up_to_date());
}

#[test]
fn missing_source_counts_as_changed() {
    let dir = tempfile::tempdir().unwrap();
    let desc = build_desc(
        dir.path(),
        vec![
            task("gen", dir.path())
                .sources(&["does_not_exist.txt"])
                .build(),
        ],
    );
    let mut graph = TaskGraph::compile(&desc).unwrap();

    let id = graph.task_id("gen").unwrap();
    graph.set_last_run(id, u64::MAX);
    assert!(!graph.task(id).is_up_to_date());
}

#[test]
fn touching_one_of_several_sources_makes_the_task_stale() {
    let dir = tempfile::tempdir().unwrap();
    let a = dir.path().join("a.c");
    let b = dir.path().join("b.c");
    fs::write(&a, "a\n").unwrap();
    fs::write(&b, "b\n").unwrap();

    let desc = build_desc(
        dir.path(),
        vec![
            task("compile", dir.path())
                .sources(&["a.c", "b.c"])
                .build(),
        ],
    );
    let mut graph = TaskGraph::compile(&desc).unwrap();
    let id = graph.task_id("compile").unwrap();

    let newest = file_time(&a).unwrap().max(file_time(&b).unwrap());
    graph.set_last_run(id, newest + 1);
    assert!(graph.task(id).is_up_to_date());

    sleep(Duration::from_millis(5));
    fs::write(&b, "b changed\n").unwrap();
    assert!(!graph.task(id).is_up_to_date());
}

#[test]
fn glob_sources_expand_relative_to_the_task_directory_and_dedup() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.c"), "a\n").unwrap();
    fs::write(dir.path().join("b.c"), "b\n").unwrap();
    fs::write(dir.path().join("notes.txt"), "n\n").unwrap();

    let desc = build_desc(
        dir.path(),
        vec![
            task("compile", dir.path())
                // The literal entry duplicates a glob match; it collapses.
                .sources(&["*.c", "a.c"])
                .build(),
        ],
    );
    let graph = TaskGraph::compile(&desc).unwrap();

    let id = graph.task_id("compile").unwrap();
    let sources = graph.task(id).sources();
    assert_eq!(sources.len(), 2);
    assert!(sources.iter().all(|p| p.is_absolute()));
    assert!(sources.iter().any(|p| p.ends_with("a.c")));
    assert!(sources.iter().any(|p| p.ends_with("b.c")));
}

#[test]
fn non_glob_sources_pass_through_even_when_absent() {
    let dir = tempfile::tempdir().unwrap();
    let desc = build_desc(
        dir.path(),
        vec![
            task("gen", dir.path())
                .sources(&["generated/output.bin"])
                .build(),
        ],
    );
    let graph = TaskGraph::compile(&desc).unwrap();

    let id = graph.task_id("gen").unwrap();
    assert_eq!(graph.task(id).sources().len(), 1);
}
