//! Turns file patterns into selected cells. The only place cellpress touches the disk.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::types::{Cell, CellBase, Intent, SelectedCell};

/// Expand glob patterns in order, dropping repeats. A literal path that matches nothing
/// is kept so the document can report it as unreadable.
pub fn expand_patterns(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut paths: Vec<PathBuf> = Vec::new();

    for pattern in patterns {
        let mut matched = false;
        let entries =
            glob::glob(pattern).with_context(|| format!("Invalid glob pattern '{}'", pattern))?;
        for entry in entries {
            match entry {
                Ok(path) if path.is_file() => {
                    matched = true;
                    if !paths.contains(&path) {
                        paths.push(path);
                    }
                }
                Ok(_) => {}
                Err(e) => warn!(%pattern, error = %e, "skipping unreadable glob entry"),
            }
        }
        if !matched && !is_glob(pattern) {
            let path = PathBuf::from(pattern);
            if !paths.contains(&path) {
                paths.push(path);
            }
        }
    }

    Ok(paths)
}

fn is_glob(pattern: &str) -> bool {
    pattern.contains(['*', '?', '['])
}

/// Load every path into cells. Notebooks expand to one cell per notebook cell; read or
/// parse failures become unreadable entries instead of aborting.
pub fn load_selection(paths: &[PathBuf], full: &[PathBuf]) -> Vec<SelectedCell> {
    let mut selection = Vec::new();

    for path in paths {
        let intent = if full.iter().any(|f| same_path(f, path)) {
            Intent::Full
        } else {
            Intent::Compressed
        };
        match load_cells(path) {
            Ok(cells) => {
                debug!(path = %path.display(), cells = cells.len(), %intent, "loaded");
                selection.extend(cells.into_iter().map(|cell| SelectedCell::ready(cell, intent)));
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not load");
                selection.push(SelectedCell::unreadable(
                    path.to_string_lossy(),
                    format!("{:#}", e),
                ));
            }
        }
    }

    selection
}

fn same_path(a: &Path, b: &Path) -> bool {
    a == b || a.strip_prefix("./").unwrap_or(a) == b.strip_prefix("./").unwrap_or(b)
}

/// Read one file into cells.
pub fn load_cells(path: &Path) -> Result<Vec<Cell>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let label = path.to_string_lossy().to_string();

    match extension(path).as_deref() {
        Some("ipynb") => parse_notebook(&label, &content),
        Some("md") | Some("markdown") => Ok(vec![Cell::markdown(label, content)]),
        _ => Ok(vec![Cell::code(label, content)]),
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

#[derive(Debug, Deserialize)]
struct Notebook {
    cells: Vec<NotebookCell>,
}

#[derive(Debug, Deserialize)]
struct NotebookCell {
    cell_type: String,
    #[serde(default)]
    source: MultilineText,
    #[serde(default)]
    outputs: Vec<NotebookOutput>,
}

#[derive(Debug, Deserialize)]
struct NotebookOutput {
    output_type: String,
    #[serde(default)]
    text: Option<MultilineText>,
    #[serde(default)]
    data: Option<serde_json::Map<String, serde_json::Value>>,
}

/// Notebook text fields are either one string or a list of line strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MultilineText {
    One(String),
    Many(Vec<String>),
}

impl Default for MultilineText {
    fn default() -> Self {
        MultilineText::One(String::new())
    }
}

impl MultilineText {
    fn joined(&self) -> String {
        match self {
            MultilineText::One(text) => text.clone(),
            MultilineText::Many(lines) => lines.concat(),
        }
    }
}

impl NotebookOutput {
    fn text(&self) -> Option<String> {
        match self.output_type.as_str() {
            "stream" => self.text.as_ref().map(MultilineText::joined),
            "execute_result" => {
                let plain = self.data.as_ref()?.get("text/plain")?;
                serde_json::from_value::<MultilineText>(plain.clone())
                    .ok()
                    .map(|t| t.joined())
            }
            _ => None,
        }
    }
}

/// Parse notebook JSON into cells labelled `<notebook>#<n>` (1-based, raw cells skipped
/// but still counted).
pub fn parse_notebook(label: &str, json: &str) -> Result<Vec<Cell>> {
    let notebook: Notebook =
        serde_json::from_str(json).with_context(|| format!("Invalid notebook {}", label))?;

    let cells = notebook
        .cells
        .iter()
        .enumerate()
        .filter_map(|(i, nb_cell)| {
            let path = format!("{}#{}", label, i + 1);
            let source = nb_cell.source.joined();
            match nb_cell.cell_type.as_str() {
                "code" => {
                    let output: String = nb_cell
                        .outputs
                        .iter()
                        .filter_map(NotebookOutput::text)
                        .collect();
                    let base = CellBase::new(path, source);
                    let base = if output.is_empty() {
                        base
                    } else {
                        base.with_output(output)
                    };
                    Some(Cell::Code(base))
                }
                "markdown" => Some(Cell::markdown(path, source)),
                _ => None,
            }
        })
        .collect();

    Ok(cells)
}
