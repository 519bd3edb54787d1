use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::config;
use crate::history::HistoryManager;
use crate::types::Cell;

/// Record `old` then `new` as two fetches of one cell and print the change payload.
/// The cell identity is `label`, or the new file's path.
pub fn run(old: &Path, new: &Path, label: Option<String>) -> Result<()> {
    let old_text =
        fs::read_to_string(old).with_context(|| format!("Failed to read {}", old.display()))?;
    let new_text =
        fs::read_to_string(new).with_context(|| format!("Failed to read {}", new.display()))?;
    let path = label.unwrap_or_else(|| new.to_string_lossy().to_string());

    let history = HistoryManager::from_config(&config::load_config());
    history.record_fetch(&[Cell::code(path.clone(), old_text)]);
    history.record_fetch(&[Cell::code(path, new_text)]);

    let diffs = history.get_all_diffs();
    let json = serde_json::to_string_pretty(&diffs).context("Failed to serialize diff")?;
    println!("{}", json);
    Ok(())
}
