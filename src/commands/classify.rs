use anyhow::Result;
use colored::Colorize;
use std::path::PathBuf;

use crate::commands::loader;
use crate::compressor::{bucket, dedup, Compressor};
use crate::config;

/// Print bucket, normalized hash and signature key for every code cell of `files`.
pub fn run(files: Vec<PathBuf>) -> Result<()> {
    let compressor = Compressor::new(config::load_config());
    for file in &files {
        for cell in loader::load_cells(file)? {
            let Some(base) = cell.as_code() else {
                continue;
            };
            let sanitized = compressor.sanitize(&base.path, &base.content);
            let bucket = bucket::classify(&sanitized);
            let hash = dedup::content_hash(&sanitized);
            let signature = dedup::signature_key(&sanitized)
                .map(|s| s.replace('\n', " "))
                .unwrap_or_else(|| "-".to_string());

            println!(
                "{}  {}  {}  {}",
                base.display_name.bright_white().bold(),
                bucket.to_string().cyan(),
                hash.bright_black(),
                signature
            );
        }
    }
    Ok(())
}
