// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Loading run files from disk and listing run directories.
#![allow(missing_docs, clippy::unwrap_used, clippy::expect_used)]

use std::fs;

use retrace_core::{run_path, AutoPlayConfig, LoadError, ReplaySession, RunCatalog, RunFile};

const BFS: &str = r#"{
    "meta": { "title": "Breadth-first search", "style": "bfs" },
    "graph": { "nodes": [{ "id": 1 }, { "id": 2 }], "links": [{ "id": 5, "source": 1, "target": 2 }] },
    "frames": [[["nc", [1, "visited"]]], [["ec", [5, "tree"]], ["nc", [2, "visited"]]]]
}"#;

#[test]
fn filename_defaults_to_the_file_stem() {
    let dir = tempfile::tempdir().unwrap();
    let path = run_path(dir.path(), "bfs");
    fs::write(&path, BFS).unwrap();

    let run = RunFile::load(&path).unwrap();
    assert_eq!(run.meta.filename.as_deref(), Some("bfs"));
    assert_eq!(run.meta.style.as_deref(), Some("bfs"));
    assert_eq!(run.frames.frame_count(), 2);

    let mut s = ReplaySession::new(run, AutoPlayConfig::default());
    assert_eq!(s.name(), Some("bfs"));
    assert_eq!(s.title(), Some("Breadth-first search"));
    s.do_frame();
    s.do_frame();
    assert_eq!(s.graph().link(5).unwrap().css_class().as_deref(), Some("tree-link"));
}

#[test]
fn explicit_filename_is_kept() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("copy.mcg");
    fs::write(&path, r#"{ "meta": { "filename": "original" }, "frames": [] }"#).unwrap();
    assert_eq!(
        RunFile::load(&path).unwrap().meta.filename.as_deref(),
        Some("original")
    );
}

#[test]
fn load_errors_name_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.mcg");
    let err = RunFile::load(&missing).unwrap_err();
    assert!(matches!(err, LoadError::Io { .. }));
    assert!(err.to_string().contains("nope.mcg"));

    let broken = dir.path().join("broken.mcg");
    fs::write(&broken, "{ not json").unwrap();
    assert!(matches!(
        RunFile::load(&broken).unwrap_err(),
        LoadError::Json { .. }
    ));
}

#[test]
fn catalog_lists_parseable_runs_in_file_order() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("zeta.mcg"), BFS).unwrap();
    fs::write(dir.path().join("alpha.mcg"), r#"{ "frames": [] }"#).unwrap();
    fs::write(dir.path().join("broken.mcg"), "[").unwrap();
    fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

    let catalog = RunCatalog::scan(dir.path()).unwrap();
    let files: Vec<_> = catalog.entries().iter().map(|e| e.file.as_str()).collect();
    assert_eq!(files, ["alpha", "zeta"]);
    assert_eq!(catalog.find("zeta").unwrap().name, "Breadth-first search");
    assert_eq!(catalog.find("alpha").unwrap().name, "alpha");
    assert_eq!(catalog.len(), 2);
}

#[test]
fn scanning_a_missing_directory_fails() {
    let dir = tempfile::tempdir().unwrap();
    assert!(RunCatalog::scan(&dir.path().join("absent")).is_err());
}
