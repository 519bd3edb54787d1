//! Sanitizer: strips injected citation artifacts and normalizes line-comment markers.
//!
//! Never adds or removes lines; `sanitize(x).lines().count() == x.lines().count()`.

use regex::Regex;
use std::sync::LazyLock;

static CITATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[cite_start\]|\[cite_end\]|\[cite:[\d, ]*\]|【[^】\n]*】|\[\d+†[^\]\n]*\]")
        .unwrap()
});

/// Line-comment dialect of a cell, inferred from its path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentStyle {
    /// `#` (Python, shell, R, YAML, ...)
    Hash,
    /// `//` (C family, JS/TS, Rust, Go, ...)
    Slash,
    /// `--` (SQL, Lua, Haskell)
    DoubleDash,
}

impl CommentStyle {
    pub fn marker(self) -> &'static str {
        match self {
            CommentStyle::Hash => "#",
            CommentStyle::Slash => "//",
            CommentStyle::DoubleDash => "--",
        }
    }

    /// Dialect for a file path. Unknown extensions are treated as `#`.
    pub fn for_path(path: &str) -> Self {
        let ext = file_name(path)
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "js" | "jsx" | "ts" | "tsx" | "mjs" | "cjs" | "rs" | "c" | "h" | "cc" | "cpp"
            | "hpp" | "java" | "go" | "kt" | "swift" | "cs" | "scala" | "dart" => {
                CommentStyle::Slash
            }
            "sql" | "lua" | "hs" => CommentStyle::DoubleDash,
            _ => CommentStyle::Hash,
        }
    }
}

/// Whether a path holds Python-shaped code the skeletonizer understands in depth.
/// Extensionless names (`cell-3`, `./runs.v2/cell`) count as Python.
pub fn is_python_like(path: &str) -> bool {
    let file = file_name(path).to_ascii_lowercase();
    file.ends_with(".py") || file.ends_with(".ipynb") || file.ends_with(".pyw") || !file.contains('.')
}

/// Last path component, without a `#N` notebook cell suffix.
fn file_name(path: &str) -> &str {
    let file = path.split('#').next().unwrap_or(path);
    file.rsplit(['/', '\\']).next().unwrap_or(file)
}

/// Clean a cell's text for the given path, rewriting comments to `target_marker`.
pub fn sanitize(text: &str, path: &str, target_marker: &str) -> String {
    let source = CommentStyle::for_path(path).marker();
    text.split('\n')
        .map(|line| {
            let line = strip_citations(line);
            if source == target_marker {
                line
            } else {
                rewrite_comment_marker(&line, source, target_marker)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn strip_citations(line: &str) -> String {
    if !line.contains('[') && !line.contains('【') {
        return line.to_string();
    }
    CITATION.replace_all(line, "").into_owned()
}

fn rewrite_comment_marker(line: &str, source: &str, target: &str) -> String {
    let trimmed = line.trim_start();
    let Some(rest) = trimmed.strip_prefix(source) else {
        return line.to_string();
    };
    // `///` and `---` collapse to a single marker
    let rest = rest.trim_start_matches(source.chars().next().unwrap_or(' '));
    let indent = &line[..line.len() - trimmed.len()];
    format!("{indent}{target}{rest}")
}
