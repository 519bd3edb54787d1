//! Skeletonizer: turns a Python-shaped cell into its structural outline.
//!
//! Only zero-indent lines are walked. Imports, kept assignments, definition headers and
//! top-level calls survive; long definition bodies are replaced by a docstring summary
//! and pattern-derived `# summary:` lines. A state-contract footer and a compression
//! statistics comment close every structural skeleton.

mod assignments;
mod comments;
mod phrases;

pub use assignments::{
    classify_assignment, is_constant_name, parse_assignment, Assignment, AssignmentAction,
};
pub use comments::{classify_comment, CommentKind};
pub use phrases::{intent_phrases, merge_phrases, print_intents, summary_lines};

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;
use tracing::debug;

use super::contract::StateContract;
use super::dedup::is_definition_header;
use super::{CompressionContext, VariantKind};
use crate::config::CompressConfig;
use crate::error::SkeletonError;
use crate::types::non_blank_line_count;

static IMPORT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:import\s|from\s+\S+\s+import\b)").unwrap());

static PRINT_CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:print|pprint|display|log|logger\.\w+|logging\.\w+|tqdm\.write)\s*\(").unwrap()
});

static TOP_LEVEL_CALL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:await\s+)?[A-Za-z_][\w.]*(?:\[[^\]]*\])?\s*\(").unwrap());

static TOP_LEVEL_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(?:async\s+)?(?:def|class)\s+([A-Za-z_]\w*)").unwrap());

/// Marker appended when anything was left out.
pub const ELISION_MARKER: &str = "# ...";

const MAX_VARIANT_NAMES: usize = 3;
const MAX_VARIANT_PHRASES: usize = 2;
const MAX_VARIANT_CLAUSES: usize = 3;

/// Which path produced a skeleton.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkeletonMode {
    /// One-line pointer to an earlier duplicate or variant
    Pointer,
    /// Small cell emitted unchanged
    Verbatim,
    /// Full structural extraction
    Structural,
}

/// Non-blank line counts before and after compression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompressionStats {
    pub original_lines: usize,
    pub compressed_lines: usize,
}

impl CompressionStats {
    pub fn new(original: &str, compressed: &str) -> Self {
        Self {
            original_lines: non_blank_line_count(original),
            compressed_lines: non_blank_line_count(compressed),
        }
    }

    /// Fraction of lines saved, never negative.
    pub fn ratio(&self) -> f64 {
        if self.original_lines == 0 {
            return 0.0;
        }
        (1.0 - self.compressed_lines as f64 / self.original_lines as f64).max(0.0)
    }

    pub fn comment(&self) -> String {
        format!(
            "# Compression: {} -> {} lines ({:.0}% reduction)",
            self.original_lines,
            self.compressed_lines,
            self.ratio() * 100.0
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Skeleton {
    pub text: String,
    pub mode: SkeletonMode,
    pub stats: CompressionStats,
    /// Present only for structural skeletons
    pub contract: Option<StateContract>,
}

/// Skeletonize sanitized cell text under its run context.
pub fn skeletonize(
    text: &str,
    context: &CompressionContext,
    config: &CompressConfig,
) -> Result<Skeleton, SkeletonError> {
    if let Some(pointer) = variant_pointer(text, context) {
        let stats = CompressionStats::new(text, &pointer);
        return Ok(Skeleton {
            text: pointer,
            mode: SkeletonMode::Pointer,
            stats,
            contract: None,
        });
    }

    if non_blank_line_count(text) <= config.small_cell_threshold {
        return Ok(Skeleton {
            text: text.to_string(),
            mode: SkeletonMode::Verbatim,
            stats: CompressionStats::new(text, text),
            contract: None,
        });
    }

    let extraction = extract(text, config)?;
    let contract = StateContract::derive(text, &extraction.kept_names);
    let mut body = extraction.render();
    body.push_str("\n\n");
    body.push_str(&contract.footer_lines(config.contract_list_cap).join("\n"));

    let stats = CompressionStats::new(text, &body);
    body.push('\n');
    body.push_str(&stats.comment());

    debug!(
        original = stats.original_lines,
        compressed = stats.compressed_lines,
        "skeletonized cell"
    );

    Ok(Skeleton {
        text: body,
        mode: SkeletonMode::Structural,
        stats,
        contract: Some(contract),
    })
}

/// One-line pointer for duplicate and variant cells; `None` when the cell stands alone.
pub fn variant_pointer(text: &str, context: &CompressionContext) -> Option<String> {
    let line = match context.variant() {
        VariantKind::None => return None,
        VariantKind::Duplicate(first) => format!("# Duplicate of cell {}", first + 1),
        VariantKind::SignatureDuplicate(first) | VariantKind::BucketVariant(first) => {
            with_summary(
                format!("# Variant of {} (see cell {})", context.bucket, first + 1),
                text,
            )
        }
    };
    Some(line)
}

fn with_summary(prefix: String, text: &str) -> String {
    let summary = variant_summary(text);
    if summary.is_empty() {
        prefix
    } else {
        format!("{prefix}: {summary}")
    }
}

/// Up to three clauses: top-level definition names first, then intent phrases.
pub fn variant_summary(text: &str) -> String {
    let names = TOP_LEVEL_NAME
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
        .take(MAX_VARIANT_NAMES);

    let mut phrases = intent_phrases(text);
    for line in text.lines().map(str::trim) {
        if PRINT_CALL.is_match(line) {
            merge_phrases(&mut phrases, print_intents(line));
        }
    }
    let phrases = phrases
        .into_iter()
        .take(MAX_VARIANT_PHRASES)
        .map(str::to_string);

    names
        .chain(phrases)
        .take(MAX_VARIANT_CLAUSES)
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Default)]
struct Extraction {
    leading_structural: Vec<String>,
    imports: Vec<String>,
    trailing_structural: Vec<String>,
    assignments: Vec<String>,
    definitions: Vec<Vec<String>>,
    calls: Vec<String>,
    top_level_intents: Vec<&'static str>,
    summarized: Vec<String>,
    kept_names: Vec<String>,
    dropped: bool,
    summary_per_line: usize,
    summary_max_lines: usize,
}

impl Extraction {
    fn render(mut self) -> String {
        self.imports.sort();
        self.imports.dedup();

        let mut sections: Vec<Vec<String>> = vec![
            self.leading_structural,
            self.imports,
            self.trailing_structural,
            self.assignments,
        ];
        sections.extend(self.definitions);

        let mut calls = self.calls;
        calls.extend(
            summary_lines(
                &self.top_level_intents,
                self.summary_per_line,
                self.summary_max_lines,
            )
            .into_iter()
            .map(|line| format!("# {line}")),
        );
        sections.push(calls);

        let mut footer = Vec::new();
        if !self.summarized.is_empty() {
            footer.push(format!(
                "# Summarized assignments: {}",
                self.summarized.join(", ")
            ));
        }
        let nothing_emitted = sections.iter().all(Vec::is_empty);
        if self.dropped || nothing_emitted {
            footer.push(ELISION_MARKER.to_string());
        }
        sections.push(footer);

        sections
            .into_iter()
            .filter(|section| !section.is_empty())
            .map(|section| section.join("\n"))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

fn extract(text: &str, config: &CompressConfig) -> Result<Extraction, SkeletonError> {
    let lines: Vec<&str> = text.lines().collect();
    let mut ex = Extraction {
        summary_per_line: config.phrases_per_line,
        summary_max_lines: config.max_summary_lines,
        ..Extraction::default()
    };
    let mut pending_comments: Vec<String> = Vec::new();
    let mut pending_decorators: Vec<String> = Vec::new();
    let mut seen_import = false;
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i].trim_end();
        // Decorators count only when directly attached to the next header
        if !pending_decorators.is_empty()
            && !line.starts_with('@')
            && !is_definition_header(line)
        {
            pending_decorators.clear();
            ex.dropped = true;
        }
        if line.trim().is_empty() {
            i += 1;
            continue;
        }
        if line.starts_with(char::is_whitespace) {
            // Stray indented line, e.g. after a dropped decorator
            ex.dropped = true;
            i += 1;
            continue;
        }

        if line.starts_with('#') {
            match classify_comment(line) {
                CommentKind::Structural if seen_import => {
                    ex.trailing_structural.push(line.to_string())
                }
                CommentKind::Structural => ex.leading_structural.push(line.to_string()),
                kind if kind.is_retained() => pending_comments.push(line.to_string()),
                _ => ex.dropped = true,
            }
            i += 1;
            continue;
        }

        if line.starts_with('@') {
            let end = collect_statement(&lines, i);
            pending_decorators.extend(lines[i..end].iter().map(|l| l.trim_end().to_string()));
            i = end;
            continue;
        }

        if is_definition_header(line) {
            let header_end = collect_header(&lines, i)?;
            let body_end = block_end(&lines, header_end);
            let rendered = render_definition(&lines, i, header_end, body_end, config)?;

            let mut block = std::mem::take(&mut pending_comments);
            block.append(&mut pending_decorators);
            block.extend(rendered.lines);
            ex.dropped |= rendered.summarized;
            ex.definitions.push(block);
            i = body_end;
            continue;
        }

        if line.starts_with('!') || line.starts_with('%') {
            ex.calls.push(line.to_string());
            i += 1;
            continue;
        }

        let end = collect_statement(&lines, i);
        let statement = lines[i..end]
            .iter()
            .map(|l| l.trim_end())
            .collect::<Vec<_>>()
            .join("\n");
        // Compound statements (`for`, `if`, `with`) own the indented block after them
        i = block_end(&lines, end);
        if i > end {
            ex.dropped = true;
        }

        if IMPORT.is_match(line) {
            seen_import = true;
            ex.imports.push(statement);
        } else if PRINT_CALL.is_match(line) {
            merge_phrases(&mut ex.top_level_intents, print_intents(&statement));
            ex.dropped = true;
        } else if let Some(assignment) = parse_assignment(&statement) {
            match classify_assignment(&assignment, &statement, text, config.long_value_chars) {
                AssignmentAction::Keep => {
                    ex.kept_names.extend(assignment.names);
                    ex.assignments.push(statement);
                }
                AssignmentAction::Summarize => {
                    ex.summarized.extend(assignment.names);
                    ex.dropped = true;
                }
                AssignmentAction::Remove => ex.dropped = true,
            }
        } else if is_top_level_call(line) {
            ex.calls.push(statement);
        } else {
            ex.dropped = true;
        }
    }

    if !pending_comments.is_empty() || !pending_decorators.is_empty() {
        ex.dropped = true;
    }

    Ok(ex)
}

fn is_top_level_call(line: &str) -> bool {
    const KEYWORDS: &[&str] = &[
        "if", "elif", "while", "for", "with", "assert", "del", "not", "return", "raise", "yield",
    ];
    let first_word = line
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .next()
        .unwrap_or("");
    TOP_LEVEL_CALL.is_match(line) && !KEYWORDS.contains(&first_word)
}

struct RenderedDefinition {
    lines: Vec<String>,
    summarized: bool,
}

fn render_definition(
    lines: &[&str],
    start: usize,
    header_end: usize,
    body_end: usize,
    config: &CompressConfig,
) -> Result<RenderedDefinition, SkeletonError> {
    let mut out: Vec<String> = lines[start..header_end]
        .iter()
        .map(|l| l.trim_end().to_string())
        .collect();
    let body = &lines[header_end..body_end];

    if body.iter().filter(|l| !l.trim().is_empty()).count() <= config.small_cell_threshold {
        out.extend(body.iter().map(|l| l.trim_end().to_string()));
        return Ok(RenderedDefinition {
            lines: out,
            summarized: false,
        });
    }

    let indent = body
        .iter()
        .find(|l| !l.trim().is_empty())
        .map(|l| &l[..l.len() - l.trim_start().len()])
        .unwrap_or("    ");

    let (docstring, consumed) = match extract_docstring(body, header_end)? {
        Some(found) => found,
        None => (None, 0),
    };
    let rest = &body[consumed..];

    let rest_text = rest.join("\n");
    let mut phrases = intent_phrases(&rest_text);
    for line in rest.iter().map(|l| l.trim()) {
        if PRINT_CALL.is_match(line) {
            merge_phrases(&mut phrases, print_intents(line));
        }
    }
    let summaries = summary_lines(&phrases, config.phrases_per_line, config.max_summary_lines);

    if let Some(doc) = &docstring {
        out.push(format!("{indent}\"\"\"{doc}\"\"\""));
    }
    out.extend(summaries.iter().map(|s| format!("{indent}# {s}")));
    if docstring.is_none() && summaries.is_empty() {
        out.push(format!("{indent}# summary: implementation elided"));
    }

    let is_class = lines[start].trim_start().starts_with("class ");
    if is_class {
        out.extend(method_headers(lines, header_end + consumed, body_end, indent)?);
    }

    Ok(RenderedDefinition {
        lines: out,
        summarized: true,
    })
}

/// Method signatures one level inside a class body, each followed by `...`.
fn method_headers(
    lines: &[&str],
    start: usize,
    end: usize,
    indent: &str,
) -> Result<Vec<String>, SkeletonError> {
    let mut out = Vec::new();
    let mut i = start;
    while i < end {
        let line = lines[i];
        let at_member_level = line.starts_with(indent)
            && !line[indent.len()..].starts_with(char::is_whitespace);
        if at_member_level && is_definition_header(line.trim_start()) {
            let header_end = collect_header(lines, i)?.min(end);
            out.extend(lines[i..header_end].iter().map(|l| l.trim_end().to_string()));
            out.push(format!("{indent}    ..."));
            i = header_end;
        } else {
            i += 1;
        }
    }
    Ok(out)
}

/// Summary line of a leading docstring and the number of body lines it spans.
/// An empty docstring yields `Some((None, n))`.
fn extract_docstring(
    body: &[&str],
    first_line_index: usize,
) -> Result<Option<(Option<String>, usize)>, SkeletonError> {
    let Some(first_idx) = body.iter().position(|l| !l.trim().is_empty()) else {
        return Ok(None);
    };
    let first = body[first_idx].trim();
    let unprefixed = first.trim_start_matches(['r', 'R', 'u', 'U', 'b', 'B', 'f', 'F']);
    if first.len() - unprefixed.len() > 2 {
        return Ok(None);
    }
    let delim = if unprefixed.starts_with("\"\"\"") {
        "\"\"\""
    } else if unprefixed.starts_with("'''") {
        "'''"
    } else {
        return Ok(None);
    };

    let after = &unprefixed[3..];
    if let Some(pos) = after.find(delim) {
        return Ok(Some((non_empty(&after[..pos]), first_idx + 1)));
    }

    let mut summary = non_empty(after);
    for (k, line) in body.iter().enumerate().skip(first_idx + 1) {
        let line = line.trim();
        if let Some(pos) = line.find(delim) {
            if summary.is_none() {
                summary = non_empty(&line[..pos]);
            }
            return Ok(Some((summary, k + 1)));
        }
        if summary.is_none() {
            summary = non_empty(line);
        }
    }

    Err(SkeletonError::UnterminatedDocstring {
        line: first_line_index + first_idx + 1,
    })
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

/// Bracket and string tracker for statements that span lines.
#[derive(Debug, Default)]
struct ScanState {
    depth: usize,
    triple: Option<char>,
}

impl ScanState {
    fn feed(&mut self, line: &str) {
        let chars: Vec<char> = line.chars().collect();
        let mut i = 0;
        while i < chars.len() {
            let c = chars[i];
            if let Some(quote) = self.triple {
                if c == '\\' {
                    i += 2;
                    continue;
                }
                if is_triple(&chars, i, quote) {
                    self.triple = None;
                    i += 3;
                    continue;
                }
                i += 1;
                continue;
            }
            match c {
                '#' => break,
                '"' | '\'' => {
                    if is_triple(&chars, i, c) {
                        self.triple = Some(c);
                        i += 3;
                        continue;
                    }
                    i += 1;
                    while i < chars.len() && chars[i] != c {
                        if chars[i] == '\\' {
                            i += 1;
                        }
                        i += 1;
                    }
                }
                '(' | '[' | '{' => self.depth += 1,
                ')' | ']' | '}' => self.depth = self.depth.saturating_sub(1),
                _ => {}
            }
            i += 1;
        }
    }

    fn is_open(&self) -> bool {
        self.depth > 0 || self.triple.is_some()
    }
}

fn is_triple(chars: &[char], i: usize, quote: char) -> bool {
    chars.get(i) == Some(&quote) && chars.get(i + 1) == Some(&quote) && chars.get(i + 2) == Some(&quote)
}

/// Exclusive end of the logical statement starting at `start`.
fn collect_statement(lines: &[&str], start: usize) -> usize {
    let mut state = ScanState::default();
    let mut end = start;
    while end < lines.len() {
        let line = lines[end];
        state.feed(line);
        end += 1;
        if !(state.is_open() || line.trim_end().ends_with('\\')) {
            break;
        }
    }
    end
}

/// Exclusive end of a (possibly wrapped) definition header.
fn collect_header(lines: &[&str], start: usize) -> Result<usize, SkeletonError> {
    let mut state = ScanState::default();
    let mut end = start;
    while end < lines.len() {
        let line = lines[end];
        state.feed(line);
        end += 1;
        if state.depth == 0 && !line.trim_end().ends_with('\\') {
            return Ok(end);
        }
    }
    Err(SkeletonError::UnterminatedSignature { line: start + 1 })
}

/// Exclusive end of the indented block after `header_end`, trailing blank lines excluded.
/// Zero-indent lines inside an open string or bracket still belong to the block.
fn block_end(lines: &[&str], header_end: usize) -> usize {
    let mut state = ScanState::default();
    let mut end = header_end;
    for (j, line) in lines.iter().enumerate().skip(header_end) {
        if !state.is_open() {
            if line.trim().is_empty() {
                continue;
            }
            if !line.starts_with(char::is_whitespace) {
                break;
            }
        }
        state.feed(line);
        end = j + 1;
    }
    end
}
