//! Output assembler: lays out the prompt document.
//!
//! ```text
//! PREAMBLE
//! <text>
//!
//! TREE
//! <ascii tree>
//!
//! FILE <name> FULL|SKELETON|MARKDOWN|ERROR
//! <body>
//! [OUTPUT:
//! <captured output>]
//! END_FILE
//!
//! GOAL
//! <text>
//! [
//! WARNINGS
//! - <name>: <reason>]
//! ```

mod tree;

pub use tree::render_tree;

use serde::Serialize;
use tracing::{debug, warn};

use crate::compressor::{CellCompression, CompressionStats, Compressor, RunInput};
use crate::error::PackError;
use crate::types::{Cell, Intent, SelectedCell};

/// Header tag of a FILE block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BlockKind {
    Full,
    Skeleton,
    Markdown,
    Error,
}

impl std::fmt::Display for BlockKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = match self {
            BlockKind::Full => "FULL",
            BlockKind::Skeleton => "SKELETON",
            BlockKind::Markdown => "MARKDOWN",
            BlockKind::Error => "ERROR",
        };
        write!(f, "{tag}")
    }
}

/// What went into the document for one selected cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackedCell {
    pub path: String,
    pub display_name: String,
    pub kind: BlockKind,
    pub stats: Option<CompressionStats>,
}

/// A cell that fell back to the keyword filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FallbackWarning {
    pub path: String,
    pub display_name: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackedDocument {
    pub text: String,
    pub cells: Vec<PackedCell>,
    pub warnings: Vec<FallbackWarning>,
}

/// Assemble the document for `selection`, in selection order.
///
/// Every ready code cell takes part in duplicate detection, but only `Compressed` ones
/// are skeletonized; a later compressed cell may point back at a `Full` one. Unreadable
/// cells become `ERROR` blocks and skeleton failures are collected into `WARNINGS`.
pub fn pack_document(
    preamble: &str,
    goal: &str,
    selection: &[SelectedCell],
    compressor: &Compressor,
) -> Result<PackedDocument, PackError> {
    if selection.is_empty() {
        return Err(PackError::EmptySelection);
    }

    let inputs: Vec<RunInput<'_>> = selection
        .iter()
        .enumerate()
        .filter_map(|(index, selected)| match selected {
            SelectedCell::Ready {
                cell: Cell::Code(base),
                ..
            } => Some(RunInput {
                index,
                path: &base.path,
                content: &base.content,
            }),
            _ => None,
        })
        .collect();
    let analyzed = compressor.analyze(&inputs);
    let mut compressions: Vec<Option<CellCompression>> = vec![None; selection.len()];
    for (input, cell) in inputs.iter().zip(&analyzed) {
        if matches!(
            selection[input.index],
            SelectedCell::Ready {
                intent: Intent::Compressed,
                ..
            }
        ) {
            compressions[input.index] = Some(compressor.compress(cell));
        }
    }

    let max_output_lines = compressor.config().max_output_lines;
    let mut blocks = Vec::with_capacity(selection.len());
    let mut cells = Vec::with_capacity(selection.len());
    let mut warnings = Vec::new();

    for (selected, compression) in selection.iter().zip(compressions) {
        let (kind, body, stats, output) = match (selected, compression) {
            (SelectedCell::Unreadable { path, reason, .. }, _) => {
                warn!(path = %path, %reason, "cell could not be read");
                (BlockKind::Error, format!("# unreadable: {reason}"), None, None)
            }
            (
                SelectedCell::Ready {
                    cell: Cell::Markdown(base),
                    ..
                },
                _,
            ) => (BlockKind::Markdown, base.content.clone(), None, None),
            (
                SelectedCell::Ready {
                    cell: Cell::Code(base),
                    ..
                },
                Some(compression),
            ) => {
                if let Some(failure) = compression.failure() {
                    warnings.push(FallbackWarning {
                        path: base.path.clone(),
                        display_name: base.display_name.clone(),
                        reason: failure.to_string(),
                    });
                }
                let stats = match &compression {
                    CellCompression::Skeleton(skeleton) => skeleton.stats,
                    CellCompression::Filtered { text, .. } => {
                        CompressionStats::new(&base.content, text)
                    }
                };
                (
                    BlockKind::Skeleton,
                    compression.text().to_string(),
                    Some(stats),
                    base.output.as_deref(),
                )
            }
            (
                SelectedCell::Ready {
                    cell: Cell::Code(base),
                    ..
                },
                None,
            ) => (
                BlockKind::Full,
                base.content.clone(),
                None,
                base.output.as_deref(),
            ),
        };

        debug!(path = selected.path(), %kind, "packed cell");
        blocks.push(render_block(
            selected.display_name(),
            kind,
            &body,
            output,
            max_output_lines,
        ));
        cells.push(PackedCell {
            path: selected.path().to_string(),
            display_name: selected.display_name().to_string(),
            kind,
            stats,
        });
    }

    let mut text = String::new();
    text.push_str(&format!("PREAMBLE\n{}\n\n", preamble.trim_end()));
    text.push_str(&format!("TREE\n{}\n\n", render_tree(selection)));
    for block in &blocks {
        text.push_str(block);
        text.push_str("\n\n");
    }
    text.push_str(&format!("GOAL\n{}\n", goal.trim_end()));
    if !warnings.is_empty() {
        text.push_str(&render_warnings(&warnings));
    }

    Ok(PackedDocument {
        text,
        cells,
        warnings,
    })
}

fn render_block(
    name: &str,
    kind: BlockKind,
    body: &str,
    output: Option<&str>,
    max_output_lines: usize,
) -> String {
    let mut block = format!("FILE {name} {kind}\n{}", body.trim_end_matches('\n'));
    if let Some(output) = output.filter(|o| !o.trim().is_empty()) {
        block.push_str("\nOUTPUT:\n");
        block.push_str(&truncate_output(output, max_output_lines));
    }
    block.push_str("\nEND_FILE");
    block
}

/// First `max_lines` lines of captured output, with a count of what was cut.
pub fn truncate_output(output: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = output.trim_end_matches('\n').lines().collect();
    if lines.len() <= max_lines {
        return lines.join("\n");
    }
    let mut kept = lines[..max_lines].join("\n");
    if !kept.is_empty() {
        kept.push('\n');
    }
    kept.push_str(&format!("... ({} more lines)", lines.len() - max_lines));
    kept
}

fn render_warnings(warnings: &[FallbackWarning]) -> String {
    let mut out = String::from("\nWARNINGS\n");
    for warning in warnings {
        out.push_str(&format!(
            "- {}: {}; used keyword filter\n",
            warning.display_name, warning.reason
        ));
    }
    out
}
