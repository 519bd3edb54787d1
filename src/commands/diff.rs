use anyhow::{Context, Result};
use colored::Colorize;
use std::fs;
use std::path::Path;

use crate::diff::{diff_lines, line_prefix, DiffLineKind, DiffStats};

pub fn run(old: &Path, new: &Path) -> Result<()> {
    let old_text =
        fs::read_to_string(old).with_context(|| format!("Failed to read {}", old.display()))?;
    let new_text =
        fs::read_to_string(new).with_context(|| format!("Failed to read {}", new.display()))?;

    let lines = diff_lines(&old_text, &new_text);
    for line in &lines {
        let rendered = format!("{}{}", line_prefix(line.kind), line.content());
        match line.kind {
            DiffLineKind::Added => println!("{}", rendered.green()),
            DiffLineKind::Removed => println!("{}", rendered.red()),
            DiffLineKind::Unchanged => println!("{}", rendered.bright_black()),
        }
    }

    let stats = DiffStats::from_lines(&lines);
    if stats.has_changes() {
        println!("\n{}", stats.to_string().bold());
    } else {
        println!("\n{}", "No changes".green());
    }
    Ok(())
}
