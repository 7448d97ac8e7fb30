mod common;

use std::path::Path;

use rbuild::dag::TaskGraph;
use rbuild::errors::RbuildError;

use common::{build_desc_here, task};

#[test]
fn unknown_dependency_fails_compilation_and_names_the_reference() {
    let cwd = Path::new(".");
    let desc = build_desc_here(vec![task("x", cwd).deps(&["y"]).build()]);

    let err = TaskGraph::compile(&desc).unwrap_err();
    match err {
        RbuildError::UnresolvedReferences(refs) => {
            assert!(refs.contains("y"), "missing reference not reported: {refs}");
        }
        other => panic!("expected UnresolvedReferences, got {other:?}"),
    }
}

#[test]
fn all_unresolved_references_are_collected_not_just_the_first() {
    let cwd = Path::new(".");
    let desc = build_desc_here(vec![
        task("x", cwd).deps(&["nope"]).build(),
        task("z", cwd).watch(&["missing"]).build(),
    ]);

    let err = TaskGraph::compile(&desc).unwrap_err();
    match err {
        RbuildError::UnresolvedReferences(refs) => {
            assert!(refs.contains("nope"), "first failure dropped: {refs}");
            assert!(refs.contains("missing"), "second failure dropped: {refs}");
        }
        other => panic!("expected UnresolvedReferences, got {other:?}"),
    }
}

#[test]
fn unknown_watch_reference_is_a_compile_error_too() {
    let cwd = Path::new(".");
    let desc = build_desc_here(vec![
        task("x", cwd).deps(&["y"]).watch(&["ghost"]).build(),
        task("y", cwd).build(),
    ]);

    assert!(matches!(
        TaskGraph::compile(&desc),
        Err(RbuildError::UnresolvedReferences(_))
    ));
}

#[test]
fn dependency_cycles_are_rejected() {
    let cwd = Path::new(".");
    let desc = build_desc_here(vec![
        task("a", cwd).deps(&["b"]).build(),
        task("b", cwd).deps(&["c"]).build(),
        task("c", cwd).deps(&["a"]).build(),
    ]);

    assert!(matches!(
        TaskGraph::compile(&desc),
        Err(RbuildError::Cycle(_))
    ));
}

#[test]
fn self_dependency_is_a_cycle() {
    let cwd = Path::new(".");
    let desc = build_desc_here(vec![task("a", cwd).deps(&["a"]).build()]);

    match TaskGraph::compile(&desc).unwrap_err() {
        RbuildError::Cycle(name) => assert_eq!(name, "a"),
        other => panic!("expected Cycle, got {other:?}"),
    }
}
