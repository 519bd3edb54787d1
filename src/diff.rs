//! Line-level diff between two text snapshots.
//!
//! The edit script comes from `similar` (Myers); it is flattened into `DiffLine`
//! records carrying independent 1-based old/new line numbers.

use serde::{Deserialize, Serialize};
use similar::{Algorithm, ChangeTag, TextDiff};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffLineKind {
    Unchanged,
    Removed,
    Added,
}

/// One line of a flattened diff. Removed lines carry only `old_line_number`,
/// added lines only `new_line_number`. `text` keeps the line's terminator (`\n` or
/// `\r\n`), so concatenating one side's records restores that side byte for byte.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffLine {
    #[serde(rename = "type")]
    pub kind: DiffLineKind,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_line_number: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_line_number: Option<usize>,
}

impl DiffLine {
    /// The line without its terminator.
    pub fn content(&self) -> &str {
        let text = self.text.strip_suffix('\n').unwrap_or(&self.text);
        text.strip_suffix('\r').unwrap_or(text)
    }
}

/// Diff `old` against `new` line by line. A missing final newline makes the last line
/// differ from the same line with one.
pub fn diff_lines(old: &str, new: &str) -> Vec<DiffLine> {
    let text_diff = TextDiff::configure()
        .algorithm(Algorithm::Myers)
        .diff_lines(old, new);

    let mut old_line = 1usize;
    let mut new_line = 1usize;
    let mut out = Vec::new();

    for change in text_diff.iter_all_changes() {
        let text = change.value().to_string();
        match change.tag() {
            ChangeTag::Equal => {
                out.push(DiffLine {
                    kind: DiffLineKind::Unchanged,
                    text,
                    old_line_number: Some(old_line),
                    new_line_number: Some(new_line),
                });
                old_line += 1;
                new_line += 1;
            }
            ChangeTag::Delete => {
                out.push(DiffLine {
                    kind: DiffLineKind::Removed,
                    text,
                    old_line_number: Some(old_line),
                    new_line_number: None,
                });
                old_line += 1;
            }
            ChangeTag::Insert => {
                out.push(DiffLine {
                    kind: DiffLineKind::Added,
                    text,
                    old_line_number: None,
                    new_line_number: Some(new_line),
                });
                new_line += 1;
            }
        }
    }

    out
}

/// Counts per line kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiffStats {
    pub added: usize,
    pub removed: usize,
    pub unchanged: usize,
}

impl DiffStats {
    pub fn from_lines(lines: &[DiffLine]) -> Self {
        lines.iter().fold(Self::default(), |mut stats, line| {
            match line.kind {
                DiffLineKind::Added => stats.added += 1,
                DiffLineKind::Removed => stats.removed += 1,
                DiffLineKind::Unchanged => stats.unchanged += 1,
            }
            stats
        })
    }

    pub fn has_changes(&self) -> bool {
        self.added > 0 || self.removed > 0
    }
}

impl std::fmt::Display for DiffStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "+{} -{} ({} unchanged)",
            self.added, self.removed, self.unchanged
        )
    }
}

/// Prefix for a line kind in plain renderings.
pub fn line_prefix(kind: DiffLineKind) -> char {
    match kind {
        DiffLineKind::Added => '+',
        DiffLineKind::Removed => '-',
        DiffLineKind::Unchanged => ' ',
    }
}

/// `+`/`-`/space prefixed rendering, one record per line.
pub fn render_plain(lines: &[DiffLine]) -> String {
    lines
        .iter()
        .map(|line| format!("{}{}", line_prefix(line.kind), line.content()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Rebuild the old side (`Removed` + `Unchanged`) or the new side (`Added` + `Unchanged`).
pub fn reconstruct(lines: &[DiffLine], side: DiffLineKind) -> String {
    lines
        .iter()
        .filter(|line| line.kind == DiffLineKind::Unchanged || line.kind == side)
        .map(|line| line.text.as_str())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_text_is_all_unchanged() {
        let text = "a\nb\n\nc";
        let lines = diff_lines(text, text);
        assert_eq!(lines.len(), 4);
        for (i, line) in lines.iter().enumerate() {
            assert_eq!(line.kind, DiffLineKind::Unchanged);
            assert_eq!(line.old_line_number, Some(i + 1));
            assert_eq!(line.old_line_number, line.new_line_number);
        }
    }

    #[test]
    fn test_reconstructs_both_sides() {
        let old = "import os\nx = 1\ny = 2\nprint(x)";
        let new = "import os\nimport sys\nx = 1\nprint(x, y)";
        let lines = diff_lines(old, new);
        assert_eq!(reconstruct(&lines, DiffLineKind::Added), new);
        assert_eq!(reconstruct(&lines, DiffLineKind::Removed), old);
    }

    #[test]
    fn test_line_numbers_are_independent() {
        let lines = diff_lines("a\nb\nc", "a\nc\nd");
        let removed: Vec<_> = lines
            .iter()
            .filter(|l| l.kind == DiffLineKind::Removed)
            .collect();
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].text, "b\n");
        assert_eq!(removed[0].content(), "b");
        assert_eq!(removed[0].old_line_number, Some(2));
        assert_eq!(removed[0].new_line_number, None);

        let added: Vec<_> = lines
            .iter()
            .filter(|l| l.kind == DiffLineKind::Added)
            .collect();
        assert_eq!(added.len(), 1);
        assert_eq!(added[0].new_line_number, Some(3));
    }

    #[test]
    fn test_swapped_roles_mirror() {
        let a = "one\ntwo\nthree";
        let b = "one\n2\nthree\nfour";
        let forward = DiffStats::from_lines(&diff_lines(a, b));
        let backward = DiffStats::from_lines(&diff_lines(b, a));
        assert_eq!(forward.added, backward.removed);
        assert_eq!(forward.removed, backward.added);
        assert_eq!(forward.unchanged, backward.unchanged);
    }

    #[test]
    fn test_no_duplicate_line_numbers_per_kind() {
        let lines = diff_lines("a\nb\nc\nd", "x\nb\ny\nd\ne");
        let mut seen_old = std::collections::HashSet::new();
        let mut seen_new = std::collections::HashSet::new();
        for line in &lines {
            if let Some(n) = line.old_line_number {
                assert!(seen_old.insert((line.kind == DiffLineKind::Removed, n)));
            }
            if let Some(n) = line.new_line_number {
                assert!(seen_new.insert((line.kind == DiffLineKind::Added, n)));
            }
        }
    }

    #[test]
    fn test_trailing_newline_round_trips() {
        let old = "x = 1\n";
        let new = "x = 1\ny = 2\n";
        let lines = diff_lines(old, new);
        assert_eq!(reconstruct(&lines, DiffLineKind::Added), new);
        assert_eq!(reconstruct(&lines, DiffLineKind::Removed), old);
        assert_eq!(DiffStats::from_lines(&lines).added, 1);
    }

    #[test]
    fn test_dropping_final_newline_is_a_change() {
        let lines = diff_lines("a\nb\n", "a\nb");
        let stats = DiffStats::from_lines(&lines);
        assert_eq!((stats.added, stats.removed, stats.unchanged), (1, 1, 1));
        assert_eq!(reconstruct(&lines, DiffLineKind::Added), "a\nb");
        assert_eq!(reconstruct(&lines, DiffLineKind::Removed), "a\nb\n");
    }

    #[test]
    fn test_crlf_round_trips() {
        let old = "a\r\nb\r\n";
        let new = "a\r\nc\r\nb\r\n";
        let lines = diff_lines(old, new);
        assert_eq!(reconstruct(&lines, DiffLineKind::Added), new);
        assert_eq!(reconstruct(&lines, DiffLineKind::Removed), old);
        let added: Vec<_> = lines
            .iter()
            .filter(|l| l.kind == DiffLineKind::Added)
            .collect();
        assert_eq!(added.len(), 1);
        assert_eq!(added[0].content(), "c");
    }

    #[test]
    fn test_empty_sides() {
        assert!(diff_lines("", "").is_empty());
        let added = diff_lines("", "x\ny");
        assert_eq!(DiffStats::from_lines(&added).added, 2);
    }

    #[test]
    fn test_render_and_stats() {
        let lines = diff_lines("a\nb", "a\nc");
        assert_eq!(render_plain(&lines), " a\n-b\n+c");
        let stats = DiffStats::from_lines(&lines);
        assert_eq!(stats.to_string(), "+1 -1 (1 unchanged)");
    }

    #[test]
    fn test_serializes_with_type_field() {
        let lines = diff_lines("a", "b");
        let json = serde_json::to_value(&lines[0]).unwrap();
        assert_eq!(json["type"], "removed");
        assert_eq!(json["oldLineNumber"], 1);
        assert!(json.get("newLineNumber").is_none());
    }
}
