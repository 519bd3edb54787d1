use anyhow::{Context, Result};
use colored::Colorize;

use crate::config::{self, CompressConfig};

/// Print the resolved config, or write a default local config with `init`.
pub fn run(init: bool) -> Result<()> {
    if init {
        config::save_local_config(&CompressConfig::default())?;
        println!("{} Wrote .cellpress/config.json", "✓".green());
        return Ok(());
    }

    let resolved = config::load_config();
    let json = serde_json::to_string_pretty(&resolved).context("Failed to serialize config")?;
    println!("{}", json);
    Ok(())
}
