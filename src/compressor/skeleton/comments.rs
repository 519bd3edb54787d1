use regex::Regex;
use std::sync::LazyLock;

static TODO_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:TODO|FIXME|NOTE|HACK|XXX|BUG|WARNING)\b").unwrap());

static DIVIDER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(?:-{3,}|={3,}|%%)").unwrap());

static CODE_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^(?:import\s+\w|from\s+\S+\s+import\s|[A-Za-z_][\w.]*\s*\(.*\)\s*$|[A-Za-z_][\w.\[\]'"]*\s*[-+*/]?=\s*\S|return\b|print\s*\()"#,
    )
    .unwrap()
});

/// Minimum length for a comment to count as explanatory prose.
const EXPLANATORY_MIN_CHARS: usize = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentKind {
    /// Markdown-style header or a `---` / `===` divider
    Structural,
    Todo,
    Explanatory,
    Trivial,
    /// Commented-out code
    DisabledCode,
}

impl CommentKind {
    pub fn is_retained(self) -> bool {
        matches!(
            self,
            CommentKind::Structural | CommentKind::Todo | CommentKind::Explanatory
        )
    }
}

/// Classify a zero-indent comment line (leading `#` included).
pub fn classify_comment(line: &str) -> CommentKind {
    let Some(body) = line.trim().strip_prefix('#') else {
        return CommentKind::Trivial;
    };
    if body.starts_with('!') {
        return CommentKind::Trivial;
    }
    let text = body.trim();

    if text.starts_with('#') || DIVIDER.is_match(text) {
        return CommentKind::Structural;
    }
    if TODO_PREFIX.is_match(text) {
        return CommentKind::Todo;
    }
    if CODE_SHAPE.is_match(text) {
        return CommentKind::DisabledCode;
    }
    if text.chars().count() >= EXPLANATORY_MIN_CHARS {
        return CommentKind::Explanatory;
    }
    CommentKind::Trivial
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_comments() {
        assert_eq!(classify_comment("## Data loading"), CommentKind::Structural);
        assert_eq!(classify_comment("# # Section"), CommentKind::Structural);
        assert_eq!(classify_comment("# --- setup ---"), CommentKind::Structural);
        assert_eq!(classify_comment("# ======"), CommentKind::Structural);
        assert_eq!(classify_comment("# %% cell"), CommentKind::Structural);
    }

    #[test]
    fn test_todo_comments() {
        assert_eq!(classify_comment("# TODO: batch this"), CommentKind::Todo);
        assert_eq!(classify_comment("# FIXME"), CommentKind::Todo);
        assert_eq!(classify_comment("# WARNING slow on CPU"), CommentKind::Todo);
    }

    #[test]
    fn test_disabled_code() {
        assert_eq!(classify_comment("# model.fit(x, y)"), CommentKind::DisabledCode);
        assert_eq!(classify_comment("# lr = 0.001"), CommentKind::DisabledCode);
        assert_eq!(classify_comment("# import wandb"), CommentKind::DisabledCode);
        assert_eq!(classify_comment("# print(df.head())"), CommentKind::DisabledCode);
    }

    #[test]
    fn test_explanatory_and_trivial() {
        assert_eq!(
            classify_comment("# normalize pixel values before batching"),
            CommentKind::Explanatory
        );
        assert_eq!(classify_comment("# helpers"), CommentKind::Trivial);
        assert_eq!(classify_comment("#!/usr/bin/env python"), CommentKind::Trivial);
    }

    #[test]
    fn test_retention() {
        assert!(CommentKind::Structural.is_retained());
        assert!(CommentKind::Todo.is_retained());
        assert!(CommentKind::Explanatory.is_retained());
        assert!(!CommentKind::Trivial.is_retained());
        assert!(!CommentKind::DisabledCode.is_retained());
    }
}
