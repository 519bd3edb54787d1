use anyhow::{bail, Result};
use colored::Colorize;
use std::path::Path;

use crate::commands::loader;
use crate::compressor::{Compressor, RunInput};
use crate::config;

/// Print the compressed form of every code cell in `file`.
pub fn run(file: &Path) -> Result<()> {
    let cells = loader::load_cells(file)?;
    let inputs: Vec<RunInput<'_>> = cells
        .iter()
        .enumerate()
        .filter_map(|(index, cell)| {
            cell.as_code().map(|base| RunInput {
                index,
                path: &base.path,
                content: &base.content,
            })
        })
        .collect();
    if inputs.is_empty() {
        bail!("{} has no code cells", file.display());
    }

    let compressor = Compressor::new(config::load_config());
    let results = compressor.compress_all(&inputs);
    let show_headers = inputs.len() > 1;

    for (input, result) in inputs.iter().zip(&results) {
        if show_headers {
            println!("{}", format!("── {} ──", input.path).cyan());
        }
        println!("{}", result.text());
        if let Some(failure) = result.failure() {
            eprintln!("{} {}", "⚠ keyword filter used:".yellow(), failure);
        }
        if show_headers {
            println!();
        }
    }

    Ok(())
}
