//! Structural hashing and signature keys used to spot duplicate cells within one run.

use std::collections::HashMap;

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// Separator between headers in a signature key.
pub const SIGNATURE_SEPARATOR: &str = " || ";

/// Drop blank and pure-comment lines, strip all whitespace, concatenate.
pub fn normalize(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !is_comment_line(line))
        .flat_map(|line| line.chars().filter(|c| !c.is_whitespace()))
        .collect()
}

/// FNV-1a over the bytes of `normalized`, as 8 lowercase hex digits.
pub fn hash(normalized: &str) -> String {
    let h = normalized.bytes().fold(FNV_OFFSET_BASIS, |h, byte| {
        (h ^ u32::from(byte)).wrapping_mul(FNV_PRIME)
    });
    format!("{h:08x}")
}

/// Convenience for `hash(&normalize(text))`.
pub fn content_hash(text: &str) -> String {
    hash(&normalize(text))
}

/// Ordered top-level `def`/`class` headers, each with its attached decorators.
/// `None` when the text has no top-level definitions.
pub fn signature_key(text: &str) -> Option<String> {
    let mut headers = Vec::new();
    let mut decorators: Vec<&str> = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() || line.starts_with(char::is_whitespace) {
            decorators.clear();
            continue;
        }
        let line = line.trim_end();
        if line.starts_with('@') {
            decorators.push(line);
        } else if is_definition_header(line) {
            let mut entry = decorators.join("\n");
            if !entry.is_empty() {
                entry.push('\n');
            }
            entry.push_str(line);
            headers.push(entry);
            decorators.clear();
        } else {
            decorators.clear();
        }
    }

    if headers.is_empty() {
        None
    } else {
        Some(headers.join(SIGNATURE_SEPARATOR))
    }
}

pub(crate) fn is_comment_line(trimmed: &str) -> bool {
    trimmed.starts_with('#') || trimmed.starts_with("//")
}

pub(crate) fn is_definition_header(trimmed: &str) -> bool {
    ["def ", "async def ", "class "]
        .iter()
        .any(|kw| trimmed.starts_with(kw))
}

/// Run-scoped "first writer wins" maps. Build a fresh one per compression run.
#[derive(Debug, Default)]
pub struct DedupIndex {
    by_hash: HashMap<String, usize>,
    by_signature: HashMap<String, usize>,
}

impl DedupIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `hash` for `index`; returns the earlier owner if one exists.
    pub fn observe_hash(&mut self, hash: &str, index: usize) -> Option<usize> {
        match self.by_hash.get(hash) {
            Some(&first) => Some(first),
            None => {
                self.by_hash.insert(hash.to_string(), index);
                None
            }
        }
    }

    /// Register `signature` for `index`; returns the earlier owner if one exists.
    pub fn observe_signature(&mut self, signature: &str, index: usize) -> Option<usize> {
        match self.by_signature.get(signature) {
            Some(&first) => Some(first),
            None => {
                self.by_signature.insert(signature.to_string(), index);
                None
            }
        }
    }

    pub fn len(&self) -> usize {
        self.by_hash.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_hash.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fnv1a_known_vectors() {
        assert_eq!(hash(""), "811c9dc5");
        assert_eq!(hash("a"), "e40c292c");
        assert_eq!(hash("foobar"), "bf9cf968");
    }

    #[test]
    fn test_normalize_ignores_formatting_and_comments() {
        let plain = "x = 1\ny = x + 2";
        let noisy = "# setup\nx   =   1\n\n\n  // note\ny = x+2   # trailing stays\n";
        assert_eq!(normalize(plain), "x=1y=x+2");
        assert_eq!(normalize(noisy), "x=1y=x+2#trailingstays");
        assert_eq!(content_hash("x = 1\n\n# c\n"), content_hash("x=1"));
    }

    #[test]
    fn test_hash_is_order_sensitive() {
        assert_ne!(content_hash("a = 1\nb = 2"), content_hash("b = 2\na = 1"));
    }

    #[test]
    fn test_signature_key_includes_decorators() {
        let text = "import os\n\n@torch.no_grad()\ndef evaluate(model):\n    pass\n\nclass Runner:\n    def go(self):\n        pass\n";
        let key = signature_key(text).unwrap();
        assert_eq!(
            key,
            "@torch.no_grad()\ndef evaluate(model): || class Runner:"
        );
    }

    #[test]
    fn test_signature_key_absent_without_definitions() {
        assert!(signature_key("x = 1\nprint(x)").is_none());
        assert!(signature_key("if True:\n    def inner():\n        pass").is_none());
    }

    #[test]
    fn test_detached_decorator_not_attached() {
        let key = signature_key("@cache\n\ndef f():\n    return 1").unwrap();
        assert_eq!(key, "def f():");
    }

    #[test]
    fn test_first_writer_wins() {
        let mut index = DedupIndex::new();
        assert_eq!(index.observe_hash("aa", 0), None);
        assert_eq!(index.observe_hash("bb", 1), None);
        assert_eq!(index.observe_hash("aa", 2), Some(0));
        assert_eq!(index.observe_hash("aa", 3), Some(0));
        assert_eq!(index.observe_signature("def f():", 1), None);
        assert_eq!(index.observe_signature("def f():", 4), Some(1));
        assert_eq!(index.len(), 2);
    }
}
