use anyhow::{bail, Context, Result};
use colored::Colorize;
use std::fs;
use std::path::PathBuf;

use crate::assembler::{pack_document, BlockKind, PackedDocument};
use crate::commands::loader;
use crate::compressor::Compressor;
use crate::config;

pub fn run(
    patterns: Vec<String>,
    full: Vec<PathBuf>,
    preamble: Option<String>,
    goal: Option<String>,
    out: Option<PathBuf>,
) -> Result<()> {
    let config = config::load_config();
    let paths = loader::expand_patterns(&patterns)?;
    if paths.is_empty() {
        bail!("No files matched {}", patterns.join(" "));
    }

    let selection = loader::load_selection(&paths, &full);
    let compressor = Compressor::new(config);
    let document = pack_document(
        preamble.as_deref().unwrap_or_default(),
        goal.as_deref().unwrap_or_default(),
        &selection,
        &compressor,
    )?;

    match &out {
        Some(path) => {
            fs::write(path, &document.text)
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }
        None => print!("{}", document.text),
    }

    print_summary(&document, out.as_ref());
    Ok(())
}

/// Summary goes to stderr so stdout stays the document.
fn print_summary(document: &PackedDocument, out: Option<&PathBuf>) {
    let count = |kind: BlockKind| document.cells.iter().filter(|c| c.kind == kind).count();
    let (original, compressed) = document
        .cells
        .iter()
        .filter_map(|c| c.stats)
        .fold((0, 0), |(o, c), s| (o + s.original_lines, c + s.compressed_lines));

    eprintln!(
        "{} {} cells ({} skeleton, {} full, {} markdown, {} error)",
        "✓".green(),
        document.cells.len(),
        count(BlockKind::Skeleton),
        count(BlockKind::Full),
        count(BlockKind::Markdown),
        count(BlockKind::Error),
    );
    if original > 0 {
        eprintln!(
            "  {} {} -> {} lines",
            "compressed".bright_black(),
            original,
            compressed
        );
    }
    if let Some(path) = out {
        eprintln!("  {} {}", "wrote".bright_black(), path.display());
    }
    for warning in &document.warnings {
        eprintln!(
            "  {} {}: {}",
            "⚠".yellow(),
            warning.display_name.yellow(),
            warning.reason
        );
    }
}
