use std::fs;
use std::path::Path;
use std::process::Command;

use cellpress_lib::assembler::{pack_document, BlockKind};
use cellpress_lib::commands::loader::{expand_patterns, load_selection};
use cellpress_lib::compressor::Compressor;
use tempfile::TempDir;

const TRAINING_NOTEBOOK: &str = r##"{
  "cells": [
    {"cell_type": "markdown", "metadata": {}, "source": ["# Fine-tuning run\n", "Baseline first."]},
    {"cell_type": "code", "metadata": {}, "execution_count": 1, "outputs": [],
     "source": ["import torch\n", "from torch.utils.data import DataLoader\n", "BATCH_SIZE = 16\n", "DATA = './data/train.csv'\n", "model = build_model()\n", "loader = DataLoader(ds, batch_size=BATCH_SIZE)\n", "print('Loading finished')\n", "show(model)"]},
    {"cell_type": "code", "metadata": {}, "execution_count": 2,
     "outputs": [{"output_type": "stream", "name": "stdout", "text": ["epoch 0 loss 1.2\n", "epoch 1 loss 0.8\n"]}],
     "source": ["for epoch in range(2):\n", "    loss = step(model)\n", "    loss.backward()\n", "    optimizer.step()"]},
    {"cell_type": "code", "metadata": {}, "execution_count": 3, "outputs": [],
     "source": ["for epoch in range(5):\n", "    loss = step(model)\n", "    loss.backward()\n", "    optimizer.step()"]},
    {"cell_type": "code", "metadata": {}, "execution_count": 4, "outputs": [],
     "source": ["# same as the first setup cell\n", "import torch\n", "from torch.utils.data import DataLoader\n", "BATCH_SIZE = 16\n", "DATA = './data/train.csv'\n", "model = build_model()\n", "loader = DataLoader(ds, batch_size=BATCH_SIZE)\n", "print('Loading finished')\n", "show(model)"]}
  ],
  "metadata": {}, "nbformat": 4, "nbformat_minor": 5
}"##;

fn write(dir: &Path, name: &str, content: &str) {
    fs::write(dir.join(name), content).unwrap();
}

#[test]
fn test_notebook_document() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "train.ipynb", TRAINING_NOTEBOOK);

    let pattern = dir.path().join("*.ipynb").to_string_lossy().to_string();
    let paths = expand_patterns(&[pattern]).unwrap();
    let selection = load_selection(&paths, &[]);
    assert_eq!(selection.len(), 5);

    let document = pack_document(
        "Review this notebook.",
        "Explain the training loop.",
        &selection,
        &Compressor::default(),
    )
    .unwrap();
    let text = &document.text;

    assert!(text.starts_with("PREAMBLE\nReview this notebook.\n\nTREE\n.\n"));
    assert!(text.contains("FILE train.ipynb#1 MARKDOWN\n# Fine-tuning run\nBaseline first.\nEND_FILE"));

    // Setup cell is skeletonized with its state contract
    assert!(text.contains("FILE train.ipynb#2 SKELETON\n"));
    assert!(text.contains("BATCH_SIZE = 16"));
    assert!(text.contains("# Summarized assignments: model"));
    assert!(text.contains("# Reads: ./data/train.csv"));

    // Training cell is small and keeps its captured output
    assert!(text.contains(
        "OUTPUT:\nepoch 0 loss 1.2\nepoch 1 loss 0.8\nEND_FILE"
    ));

    // Re-run of the training loop collapses onto the first one
    assert!(text.contains(
        "FILE train.ipynb#4 SKELETON\n# Variant of training invocation (see cell 3): trains model\nEND_FILE"
    ));

    // Comment-only difference is an exact duplicate
    assert!(text.contains("FILE train.ipynb#5 SKELETON\n# Duplicate of cell 2\nEND_FILE"));

    assert!(text.ends_with("GOAL\nExplain the training loop.\n"));
    assert!(document.warnings.is_empty());
}

#[test]
fn test_full_and_unreadable_files() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.py", "x = 1\n");
    write(dir.path(), "b.py", "def f():\n    return 2\n");

    let a = dir.path().join("a.py");
    let missing = dir.path().join("gone.py");
    let paths = vec![a.clone(), dir.path().join("b.py"), missing];
    let selection = load_selection(&paths, &[a]);
    let document = pack_document("", "", &selection, &Compressor::default()).unwrap();

    let kinds: Vec<_> = document.cells.iter().map(|c| c.kind).collect();
    assert_eq!(kinds, vec![BlockKind::Full, BlockKind::Skeleton, BlockKind::Error]);
    assert!(document.text.contains("FILE a.py FULL\nx = 1\nEND_FILE"));
    assert!(document.text.contains("FILE gone.py ERROR\n# unreadable: Failed to read"));
    assert!(document.text.contains("└── gone.py (unreadable)"));
}

#[test]
fn test_cli_pack_to_file() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "main.py", "import os\nprint(os.getcwd())\n");
    let out = dir.path().join("prompt.txt");

    let output = Command::new(env!("CARGO_BIN_EXE_cellpress"))
        .args(["pack", "main.py", "--goal", "Tidy up.", "--out", "prompt.txt"])
        .current_dir(dir.path())
        .env_remove("CELLPRESS_LOG")
        .output()
        .unwrap();

    assert!(output.status.success());
    let written = fs::read_to_string(out).unwrap();
    assert!(written.contains("FILE main.py SKELETON\nimport os\nprint(os.getcwd())\nEND_FILE"));
    assert!(written.ends_with("GOAL\nTidy up.\n"));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("1 cells (1 skeleton"));
}

#[test]
fn test_cli_pack_without_matches_fails() {
    let dir = TempDir::new().unwrap();
    let output = Command::new(env!("CARGO_BIN_EXE_cellpress"))
        .args(["pack", "*.py"])
        .current_dir(dir.path())
        .output()
        .unwrap();

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error: No files matched"));
}

#[test]
fn test_cli_skeleton_of_large_script() {
    let dir = TempDir::new().unwrap();
    let script = "\
import json
import os

OUT_DIR = './out'

def export(rows, name):
    \"\"\"Write rows as JSON.\"\"\"
    path = os.path.join(OUT_DIR, name)
    os.makedirs(OUT_DIR, exist_ok=True)
    with open(path, 'w') as fh:
        json.dump(rows, fh)
    print('saved', path)
    return path
    ";
    write(dir.path(), "export.py", script);

    let output = Command::new(env!("CARGO_BIN_EXE_cellpress"))
        .args(["skeleton", "export.py"])
        .current_dir(dir.path())
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("def export(rows, name):\n    \"\"\"Write rows as JSON.\"\"\""));
    assert!(stdout.contains("# Defines: export, OUT_DIR"));
    assert!(stdout.contains("# Compression:"));
}
