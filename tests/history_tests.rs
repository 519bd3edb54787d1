use std::fs;
use std::process::Command;

use cellpress_lib::commands::loader::parse_notebook;
use cellpress_lib::diff::{reconstruct, DiffLineKind};
use cellpress_lib::history::HistoryManager;
use tempfile::TempDir;

fn notebook(cells: &[&str]) -> String {
    let cells: Vec<serde_json::Value> = cells
        .iter()
        .map(|source| {
            serde_json::json!({
                "cell_type": "code",
                "metadata": {},
                "outputs": [],
                "source": source,
            })
        })
        .collect();
    serde_json::json!({ "cells": cells, "metadata": {}, "nbformat": 4, "nbformat_minor": 5 })
        .to_string()
}

#[test]
fn test_refetch_reports_only_edited_cells() {
    let history = HistoryManager::default();
    let before = parse_notebook(
        "nb.ipynb",
        &notebook(&["import os", "lr = 1e-3\nmodel.fit(x, lr=lr)", "print('done')"]),
    )
    .unwrap();
    let after = parse_notebook(
        "nb.ipynb",
        &notebook(&["import os", "lr = 3e-4\nmodel.fit(x, lr=lr)", "print('done')"]),
    )
    .unwrap();

    assert_eq!(history.record_fetch(&before), 3);
    assert_eq!(history.record_fetch(&before), 0);
    assert!(history.get_all_diffs().is_empty());

    assert_eq!(history.record_fetch(&after), 1);
    let diffs = history.get_all_diffs();
    assert_eq!(diffs.len(), 1);
    assert_eq!(diffs[0].path, "nb.ipynb#2");
    assert_eq!(diffs[0].display_name, "nb.ipynb#2");

    let stats = diffs[0].stats();
    assert_eq!((stats.added, stats.removed, stats.unchanged), (1, 1, 1));
    assert_eq!(
        reconstruct(&diffs[0].diff, DiffLineKind::Removed),
        "lr = 1e-3\nmodel.fit(x, lr=lr)"
    );
    assert_eq!(
        reconstruct(&diffs[0].diff, DiffLineKind::Added),
        "lr = 3e-4\nmodel.fit(x, lr=lr)"
    );
}

#[test]
fn test_long_editing_session_keeps_latest_versions() {
    let history = HistoryManager::default();
    for step in 0..30 {
        let cells = parse_notebook("nb.ipynb", &notebook(&[&format!("step = {step}")])).unwrap();
        history.record_fetch(&cells);
    }

    let entries = history.entries("nb.ipynb#1");
    assert_eq!(entries.len(), 10);
    assert_eq!(entries[0].content, "step = 20");
    assert_eq!(entries[9].content, "step = 29");

    let diff = history.get_diff("nb.ipynb#1").unwrap();
    assert_eq!(diff.previous.content, "step = 28");
    assert_eq!(diff.current.content, "step = 29");
}

#[test]
fn test_snapshot_then_clear() {
    let history = HistoryManager::new(4);
    let cells = parse_notebook("nb.ipynb", &notebook(&["a = 1", "b = 2"])).unwrap();

    history.record_fetch(&cells);
    let status = history.take_snapshot(&cells);
    assert_eq!(status.cell_count, 2);
    assert_eq!(history.entries("nb.ipynb#1").len(), 2);
    assert!(history.get_all_diffs().is_empty());

    history.clear_history(Some("nb.ipynb#1"));
    assert_eq!(history.tracked_paths(), 1);
    assert!(history.baseline().is_some());

    history.clear_history(None);
    assert_eq!(history.tracked_paths(), 0);
    assert!(history.baseline().is_none());
}

#[test]
fn test_cli_history_prints_json_payload() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("old.py"), "x = 1\ny = 2\n").unwrap();
    fs::write(dir.path().join("new.py"), "x = 1\ny = 3\n").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_cellpress"))
        .args(["history", "old.py", "new.py", "--path", "cell-7"])
        .current_dir(dir.path())
        .output()
        .unwrap();

    assert!(output.status.success());
    let payload: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let diffs = payload.as_array().unwrap();
    assert_eq!(diffs.len(), 1);
    assert_eq!(diffs[0]["path"], "cell-7");
    assert_eq!(diffs[0]["previous"]["content"], "x = 1\ny = 2\n");

    let kinds: Vec<&str> = diffs[0]["diff"]
        .as_array()
        .unwrap()
        .iter()
        .map(|line| line["type"].as_str().unwrap())
        .collect();
    assert_eq!(kinds, vec!["unchanged", "removed", "added"]);
}

#[test]
fn test_cli_diff_without_changes() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.py"), "x = 1\n").unwrap();
    fs::write(dir.path().join("b.py"), "x = 1\n").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_cellpress"))
        .args(["diff", "a.py", "b.py"])
        .current_dir(dir.path())
        .env("NO_COLOR", "1")
        .output()
        .unwrap();

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("No changes"));
}

#[test]
fn test_cli_diff_reports_dropped_final_newline() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.py"), "x = 1\n").unwrap();
    fs::write(dir.path().join("b.py"), "x = 1").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_cellpress"))
        .args(["diff", "a.py", "b.py"])
        .current_dir(dir.path())
        .env("NO_COLOR", "1")
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("-x = 1\n+x = 1"));
    assert!(stdout.contains("+1 -1 (0 unchanged)"));
}
