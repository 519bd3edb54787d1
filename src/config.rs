use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Tunables for the compression engine and history store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressConfig {
    /// Cells (and definition bodies) with at most this many non-blank lines stay verbatim
    pub small_cell_threshold: usize,
    /// Maximum `# summary:` lines per definition body
    pub max_summary_lines: usize,
    /// Intent phrases per `# summary:` line
    pub phrases_per_line: usize,
    /// Assignment values longer than this are removed unless kept for another reason
    pub long_value_chars: usize,
    /// Entries shown per Defines/Reads/Writes line before the ellipsis
    pub contract_list_cap: usize,
    /// Captured output lines carried into a FILE block
    pub max_output_lines: usize,
    /// Versions retained per cell path
    pub history_capacity: usize,
    /// Canonical line-comment marker comments are rewritten to
    pub target_comment: String,
}

impl Default for CompressConfig {
    fn default() -> Self {
        Self {
            small_cell_threshold: 6,
            max_summary_lines: 3,
            phrases_per_line: 3,
            long_value_chars: 100,
            contract_list_cap: 6,
            max_output_lines: 20,
            history_capacity: 10,
            target_comment: "#".to_string(),
        }
    }
}

/// Resolve config with priority: ENV > local > global > default
pub fn load_config() -> CompressConfig {
    let mut config = load_local_config()
        .or_else(|_| load_global_config())
        .unwrap_or_default();
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    config
}

/// Load local config from .cellpress/config.json
pub fn load_local_config() -> Result<CompressConfig> {
    let config_path = PathBuf::from(".cellpress").join("config.json");
    load_config_from(&config_path).context("Failed to load local config")
}

/// Load global config from ~/.config/cellpress/config.json
pub fn load_global_config() -> Result<CompressConfig> {
    let config_path = global_config_path()?;
    load_config_from(&config_path).context("Failed to load global config")
}

pub fn global_config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .context("Failed to get config directory")?
        .join("cellpress");
    Ok(config_dir.join("config.json"))
}

pub fn load_config_from(path: &Path) -> Result<CompressConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config at {}", path.display()))?;
    let config: CompressConfig =
        serde_json::from_str(&contents).context("Failed to parse config")?;
    Ok(config)
}

/// Save local config to .cellpress/config.json
pub fn save_local_config(config: &CompressConfig) -> Result<()> {
    let config_dir = PathBuf::from(".cellpress");
    std::fs::create_dir_all(&config_dir).context("Failed to create config directory")?;
    let contents = serde_json::to_string_pretty(config).context("Failed to serialize config")?;
    std::fs::write(config_dir.join("config.json"), contents)
        .context("Failed to write local config")?;
    Ok(())
}

/// Apply `CELLPRESS_*` overrides. Unparseable values are ignored.
pub fn apply_env_overrides<F>(config: &mut CompressConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let numeric: [(&str, &mut usize); 7] = [
        ("CELLPRESS_SMALL_CELL_THRESHOLD", &mut config.small_cell_threshold),
        ("CELLPRESS_MAX_SUMMARY_LINES", &mut config.max_summary_lines),
        ("CELLPRESS_PHRASES_PER_LINE", &mut config.phrases_per_line),
        ("CELLPRESS_LONG_VALUE_CHARS", &mut config.long_value_chars),
        ("CELLPRESS_CONTRACT_LIST_CAP", &mut config.contract_list_cap),
        ("CELLPRESS_MAX_OUTPUT_LINES", &mut config.max_output_lines),
        ("CELLPRESS_HISTORY_CAPACITY", &mut config.history_capacity),
    ];
    for (key, slot) in numeric {
        if let Some(value) = lookup(key).and_then(|v| v.trim().parse::<usize>().ok()) {
            *slot = value;
        }
    }
    if let Some(marker) = lookup("CELLPRESS_TARGET_COMMENT") {
        let marker = marker.trim();
        if !marker.is_empty() {
            config.target_comment = marker.to_string();
        }
    }
}
