//! Keyword-line filter used for non-Python cells and when skeletonization fails.

use regex::Regex;
use std::sync::LazyLock;

use super::skeleton::ELISION_MARKER;

/// Definition-shaped lines kept at any indentation.
static DEFINITION_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(?:(?:pub(?:\([^)]*\))?\s+)?(?:async\s+)?(?:def|class|fn|function|struct|enum|trait|impl|interface|type)\b|@\w)",
    )
    .unwrap()
});

/// Module-level lines kept only at zero indent.
static MODULE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:import\b|from\s+\S+\s+import\b|export\b|const\b|let\b|var\b|use\b|mod\b|package\b|module\b|#include\b|#\s*#|[A-Z][A-Z0-9_]+\s*=)",
    )
    .unwrap()
});

/// Keep definition and module-level lines; everything else is elided.
pub fn keyword_filter(text: &str) -> String {
    let mut kept: Vec<&str> = Vec::new();
    let mut dropped = false;

    for line in text.lines() {
        let line = line.trim_end();
        if line.trim().is_empty() {
            continue;
        }
        if DEFINITION_LINE.is_match(line) || MODULE_LINE.is_match(line) {
            kept.push(line);
        } else {
            dropped = true;
        }
    }

    if dropped || kept.is_empty() {
        kept.push(ELISION_MARKER);
    }
    kept.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_python_fallback() {
        let text = "import os\nMAX = 3\ndef f(x):\n    y = x + 1\n    return y\nf(2)\n";
        assert_eq!(keyword_filter(text), "import os\nMAX = 3\ndef f(x):\n# ...");
    }

    #[test]
    fn test_typescript_lines() {
        let text = "import { a } from './a';\nexport function go(n: number) {\n  return n * 2;\n}\nconst k = 1;\n";
        assert_eq!(
            keyword_filter(text),
            "import { a } from './a';\nexport function go(n: number) {\nconst k = 1;\n# ..."
        );
    }

    #[test]
    fn test_nested_definitions_kept() {
        let text = "class A:\n    def m(self):\n        pass";
        assert_eq!(keyword_filter(text), "class A:\n    def m(self):\n# ...");
    }

    #[test]
    fn test_nothing_kept_still_marks() {
        assert_eq!(keyword_filter("x = compute()\n"), "# ...");
        assert_eq!(keyword_filter(""), "# ...");
    }
}
