use regex::Regex;
use std::sync::LazyLock;

use crate::compressor::contract;

static ASSIGNMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z_]\w*(?:\s*,\s*[A-Za-z_]\w*)*)\s*(?::[^=]*)?=(.*)$").unwrap()
});

static CONFIG_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:config|params|args|options|settings|opts)").unwrap());

static LARGE_OBJECT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)dataframe|pd\.read_|\.read_csv|\btensor\b|torch\.(?:tensor|zeros|ones|randn|rand|stack|cat)|np\.(?:array|zeros|ones|random|stack|concatenate)|\barray\(|model|tokenizer|dataset",
    )
    .unwrap()
});

/// Times a name must appear elsewhere in the cell before its assignment is pinned.
const REFERENCE_KEEP_THRESHOLD: usize = 2;

/// What the skeleton does with a top-level assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentAction {
    Keep,
    /// Name goes into the footer note, value is dropped
    Summarize,
    Remove,
}

/// A parsed top-level assignment statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub names: Vec<String>,
    pub value: String,
}

/// Parse `name = value` / `a, b = value` / `name: T = value`. The statement may span
/// several lines; only the first needs to carry the `=`.
pub fn parse_assignment(statement: &str) -> Option<Assignment> {
    let (first, rest) = match statement.split_once('\n') {
        Some((first, rest)) => (first, Some(rest)),
        None => (statement, None),
    };
    let caps = ASSIGNMENT.captures(first)?;
    let head = caps.get(2).map_or("", |m| m.as_str());
    if head.starts_with('=') {
        return None;
    }
    let names = caps[1]
        .split(',')
        .map(|name| name.trim().to_string())
        .collect();
    let mut value = head.trim().to_string();
    if let Some(rest) = rest {
        value.push('\n');
        value.push_str(rest);
    }
    Some(Assignment { names, value })
}

/// Decision table for an assignment. `statement` is the assignment's own text and
/// `cell_text` the whole cell it came from.
pub fn classify_assignment(
    assignment: &Assignment,
    statement: &str,
    cell_text: &str,
    long_value_chars: usize,
) -> AssignmentAction {
    let always_keep = assignment.names.iter().all(|name| is_constant_name(name))
        || value_has_path(&assignment.value)
        || assignment
            .names
            .iter()
            .any(|name| CONFIG_PREFIX.is_match(&name.to_lowercase()))
        || assignment
            .names
            .iter()
            .any(|name| references_elsewhere(name, statement, cell_text) > REFERENCE_KEEP_THRESHOLD);

    if always_keep {
        AssignmentAction::Keep
    } else if LARGE_OBJECT.is_match(&assignment.value) {
        AssignmentAction::Summarize
    } else if assignment.value.chars().count() > long_value_chars {
        AssignmentAction::Remove
    } else {
        AssignmentAction::Keep
    }
}

/// All-uppercase identifier with at least one letter (`BATCH_SIZE`, `LR2`).
pub fn is_constant_name(name: &str) -> bool {
    name.chars().any(|c| c.is_ascii_alphabetic())
        && name
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

fn value_has_path(value: &str) -> bool {
    value.lines().any(|line| !contract::paths_in_line(line).is_empty())
}

fn references_elsewhere(name: &str, statement: &str, cell_text: &str) -> usize {
    let Ok(word) = Regex::new(&format!(r"\b{}\b", regex::escape(name))) else {
        return 0;
    };
    let total = word.find_iter(cell_text).count();
    let own = word.find_iter(statement).count();
    total.saturating_sub(own)
}
