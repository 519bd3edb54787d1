//! State contract: what a cell defines, and which files it reads or writes.

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

static STRING_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""([^"\n]*)"|'([^'\n]*)'"#).unwrap());

static BARE_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?:https?|ftp|s3|gs)://[^\s'"()<>]+"#).unwrap());

static DEFINITION_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:async\s+)?(?:def|class)\s+([A-Za-z_]\w*)").unwrap());

static TRAILING_EXTENSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.[A-Za-z0-9]{1,8}$").unwrap());

static DRIVE_LETTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z]:[/\\]").unwrap());

static WRITE_VERB: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"save|dump|write|to_csv|to_json|to_parquet|open\([^)]*,\s*['"][wa]"#).unwrap()
});

static READ_VERB: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"read|load|wget|curl|gdown|gsutil|open\([^)]*,\s*['"]r"#).unwrap()
});

const DATA_EXTENSIONS: &[&str] = &[
    "csv", "tsv", "json", "jsonl", "parquet", "txt", "pkl", "pickle", "npy", "npz", "h5",
    "hdf5", "pt", "pth", "ckpt", "safetensors", "bin", "zip", "gz", "tar", "xlsx", "yaml", "yml",
];

const REGEX_METACHARS: &[char] = &['^', '$', '*', '+', '?', '(', ')', '[', ']', '{', '}', '|', '\\'];

/// Whether a file path is being read or written on its line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathAccess {
    Read,
    Write,
}

/// `defines`/`reads`/`writes` facts for one cell. Entries keep first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StateContract {
    pub defines: Vec<String>,
    pub reads: Vec<String>,
    pub writes: Vec<String>,
}

impl StateContract {
    /// Derive the contract for `text`. `kept_assignments` are the top-level assignment
    /// names the skeletonizer chose to keep.
    pub fn derive(text: &str, kept_assignments: &[String]) -> Self {
        let mut contract = StateContract::default();

        for line in text.lines() {
            if let Some(caps) = DEFINITION_NAME.captures(line) {
                push_unique(&mut contract.defines, &caps[1]);
            }
        }
        for name in kept_assignments {
            push_unique(&mut contract.defines, name);
        }

        for line in text.lines() {
            let paths = paths_in_line(line);
            if paths.is_empty() {
                continue;
            }
            let target = match classify_access(line) {
                PathAccess::Write => &mut contract.writes,
                PathAccess::Read => &mut contract.reads,
            };
            for path in paths {
                push_unique(target, &path);
            }
        }

        contract
    }

    /// Footer lines: Defines and Reads always, Writes only when non-empty.
    pub fn footer_lines(&self, cap: usize) -> Vec<String> {
        let mut lines = vec![
            format!("# Defines: {}", render_list(&self.defines, cap)),
            format!("# Reads: {}", render_list(&self.reads, cap)),
        ];
        if !self.writes.is_empty() {
            lines.push(format!("# Writes: {}", render_list(&self.writes, cap)));
        }
        lines
    }
}

fn render_list(items: &[String], cap: usize) -> String {
    if items.is_empty() {
        return "none".to_string();
    }
    let mut shown: Vec<&str> = items.iter().take(cap).map(String::as_str).collect();
    if items.len() > cap {
        shown.push("...");
    }
    shown.join(", ")
}

fn push_unique(list: &mut Vec<String>, item: &str) {
    if !list.iter().any(|existing| existing == item) {
        list.push(item.to_string());
    }
}

/// Every accepted path literal or URL on `line`, in order of appearance.
pub fn paths_in_line(line: &str) -> Vec<String> {
    let mut found: Vec<String> = Vec::new();
    for caps in STRING_LITERAL.captures_iter(line) {
        let literal = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
        if looks_like_path(literal) {
            push_unique(&mut found, literal);
        }
    }
    for m in BARE_URL.find_iter(line) {
        if looks_like_path(m.as_str()) {
            push_unique(&mut found, m.as_str());
        }
    }
    found
}

/// Whether `candidate` is plausibly a file path or data file name.
pub fn looks_like_path(candidate: &str) -> bool {
    if candidate.len() < 4
        || candidate.contains(REGEX_METACHARS)
        || candidate.chars().any(char::is_whitespace)
    {
        return false;
    }

    let has_separator = candidate.contains('/');
    if has_separator
        && (candidate.starts_with("./")
            || candidate.starts_with("../")
            || candidate.starts_with("~/")
            || DRIVE_LETTER.is_match(candidate)
            || TRAILING_EXTENSION.is_match(candidate))
    {
        return true;
    }

    has_data_extension(candidate)
}

fn has_data_extension(candidate: &str) -> bool {
    candidate
        .rsplit_once('.')
        .map(|(stem, ext)| {
            !stem.is_empty() && DATA_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str())
        })
        .unwrap_or(false)
}

/// The access implied by verbs on `line`, write verbs first.
pub fn verb_access(line: &str) -> Option<PathAccess> {
    let lowered = line.to_lowercase();
    if WRITE_VERB.is_match(&lowered) {
        Some(PathAccess::Write)
    } else if READ_VERB.is_match(&lowered) {
        Some(PathAccess::Read)
    } else {
        None
    }
}

/// Access for paths found on `line`; a line with no verb counts as a read.
pub fn classify_access(line: &str) -> PathAccess {
    verb_access(line).unwrap_or(PathAccess::Read)
}
