//! Pattern-derived intent phrases used for body summaries and variant pointers.

use regex::Regex;
use std::sync::LazyLock;

/// Body patterns in declaration order. Each phrase fires at most once.
static BODY_PATTERNS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"pip install|conda install|apt-get install", "installs dependencies"),
        (
            r"wget|curl\s|gdown|urlretrieve|requests\.get|hf_hub_download|snapshot_download|\bdownload",
            "downloads resources",
        ),
        (
            r"load_state_dict|torch\.load|load_checkpoint|from_pretrained",
            "loads checkpoint",
        ),
        (
            r"torch\.save|save_checkpoint|save_pretrained|save_model",
            "saves checkpoint",
        ),
        (
            r"read_csv|read_json|read_parquet|read_excel|load_dataset|json\.load\(|np\.load\(|open\([^)]*,\s*['\x22]r",
            "reads data files",
        ),
        (
            r"to_csv|to_json|to_parquet|json\.dump\(|np\.save\(|open\([^)]*,\s*['\x22][wa]",
            "writes data files",
        ),
        (r"tokeniz", "tokenizes text"),
        (r"dataloader", "builds dataloaders"),
        (
            r"\.to\(\s*device|\.cuda\(|\.to\(\s*['\x22]cuda|\.cpu\(\)",
            "moves tensors to device",
        ),
        (
            r"\.backward\(|optimizer\.step|trainer\.train|\.fit\(|for epoch",
            "trains model",
        ),
        (
            r"\.eval\(\)|evaluate|accuracy|f1_score|no_grad",
            "evaluates model",
        ),
        (r"\.generate\(|\.predict\(|inference", "runs inference"),
        (
            r"plt\.|matplotlib|seaborn|sns\.|\.plot\(|savefig",
            "plots results",
        ),
        (
            r"wandb\.log|add_scalar|mlflow\.log|tensorboard",
            "logs metrics",
        ),
        (r"train_test_split|random_split|\.shuffle\(", "splits data"),
    ]
    .into_iter()
    .map(|(pattern, phrase)| (Regex::new(&format!("(?i){pattern}")).unwrap(), phrase))
    .collect()
});

static PRINT_INTENTS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"\bbuild", "builds artifacts"),
        (r"\bload", "loads inputs"),
        (r"\bsav(?:e|ing|ed)", "saves outputs"),
        (r"\btrain", "reports training progress"),
        (r"\bprocess", "processes data"),
        (r"\bcomplet", "reports completion"),
    ]
    .into_iter()
    .map(|(pattern, phrase)| (Regex::new(&format!("(?i){pattern}")).unwrap(), phrase))
    .collect()
});

/// Phrases triggered anywhere in `text`, in declaration order.
pub fn intent_phrases(text: &str) -> Vec<&'static str> {
    BODY_PATTERNS
        .iter()
        .filter(|(regex, _)| regex.is_match(text))
        .map(|(_, phrase)| *phrase)
        .collect()
}

/// Intent keywords found in a print-style message.
pub fn print_intents(message: &str) -> Vec<&'static str> {
    PRINT_INTENTS
        .iter()
        .filter(|(regex, _)| regex.is_match(message))
        .map(|(_, phrase)| *phrase)
        .collect()
}

/// Append phrases not already present.
pub fn merge_phrases(into: &mut Vec<&'static str>, more: impl IntoIterator<Item = &'static str>) {
    for phrase in more {
        if !into.contains(&phrase) {
            into.push(phrase);
        }
    }
}

/// Chunk phrases into `summary: a, b, c` lines.
pub fn summary_lines(phrases: &[&str], per_line: usize, max_lines: usize) -> Vec<String> {
    if per_line == 0 {
        return Vec::new();
    }
    phrases
        .iter()
        .take(per_line * max_lines)
        .collect::<Vec<_>>()
        .chunks(per_line)
        .map(|chunk| {
            let joined: Vec<&str> = chunk.iter().map(|p| **p).collect();
            format!("summary: {}", joined.join(", "))
        })
        .collect()
}
