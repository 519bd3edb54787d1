//! Bucket classifier: scores a cell against weighted keyword families.

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

/// Semantic category of a cell. Declaration order is the tie-break order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    Setup,
    DataAcquisition,
    DatasetBuild,
    TrainingInvocation,
    CheckpointHandling,
    ModelLoad,
    Inference,
    Evaluation,
    Plotting,
    Debug,
    Other,
}

impl Bucket {
    pub const ALL: [Bucket; 11] = [
        Bucket::Setup,
        Bucket::DataAcquisition,
        Bucket::DatasetBuild,
        Bucket::TrainingInvocation,
        Bucket::CheckpointHandling,
        Bucket::ModelLoad,
        Bucket::Inference,
        Bucket::Evaluation,
        Bucket::Plotting,
        Bucket::Debug,
        Bucket::Other,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Bucket::Setup => "setup",
            Bucket::DataAcquisition => "data acquisition",
            Bucket::DatasetBuild => "dataset build",
            Bucket::TrainingInvocation => "training invocation",
            Bucket::CheckpointHandling => "checkpoint handling",
            Bucket::ModelLoad => "model load",
            Bucket::Inference => "inference",
            Bucket::Evaluation => "evaluation",
            Bucket::Plotting => "plotting",
            Bucket::Debug => "debug",
            Bucket::Other => "other",
        }
    }

    /// Buckets whose repeated cells are usually re-runs with tweaked arguments.
    pub fn collapses_variants(self) -> bool {
        matches!(
            self,
            Bucket::TrainingInvocation
                | Bucket::Inference
                | Bucket::Evaluation
                | Bucket::Plotting
                | Bucket::Debug
        )
    }
}

impl std::fmt::Display for Bucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

struct WeightedPattern {
    regex: Regex,
    weight: u32,
}

fn family(patterns: &[(&str, u32)]) -> Vec<WeightedPattern> {
    patterns
        .iter()
        .map(|(pattern, weight)| WeightedPattern {
            regex: Regex::new(pattern).unwrap(),
            weight: *weight,
        })
        .collect()
}

static FAMILIES: LazyLock<Vec<(Bucket, Vec<WeightedPattern>)>> = LazyLock::new(|| {
    vec![
        (
            Bucket::Setup,
            family(&[
                (r"pip install", 3),
                (r"conda install|apt-get|apt install", 3),
                (r"^\s*[!%]", 1),
                (r"os\.environ", 1),
                (r"set_seed|manual_seed|random\.seed", 2),
                (r"drive\.mount", 2),
            ]),
        ),
        (
            Bucket::DataAcquisition,
            family(&[
                (r"wget|curl ", 3),
                (r"gdown|gsutil|urlretrieve", 3),
                (r"requests\.get|download", 2),
                (r"kaggle|hf_hub_download|snapshot_download", 2),
                (r"unzip|tarfile|zipfile", 1),
            ]),
        ),
        (
            Bucket::DatasetBuild,
            family(&[
                (r"class \w*dataset", 3),
                (r"dataloader", 2),
                (r"train_test_split|random_split", 2),
                (r"load_dataset|read_csv|read_json|read_parquet", 2),
                (r"collate_fn|tokeniz", 1),
                (r"__getitem__|__len__", 1),
            ]),
        ),
        (
            Bucket::TrainingInvocation,
            family(&[
                (r"\.backward\(", 3),
                (r"optimizer\.step|optimizer\.zero_grad", 3),
                (r"trainer\.train|\.fit\(", 3),
                (r"for epoch|num_epochs|epochs\s*=", 2),
                (r"lr_scheduler|learning_rate|\blr\s*=", 1),
                (r"train\(", 1),
            ]),
        ),
        (
            Bucket::CheckpointHandling,
            family(&[
                (r"torch\.save|save_checkpoint|save_pretrained", 3),
                (r"checkpoint|ckpt", 2),
                (r"state_dict", 1),
                (r"\.pt\b|\.pth\b|\.safetensors", 1),
            ]),
        ),
        (
            Bucket::ModelLoad,
            family(&[
                (r"from_pretrained", 3),
                (r"load_state_dict|torch\.load", 3),
                (r"automodel|autotokenizer", 2),
                (r"model\s*=", 1),
            ]),
        ),
        (
            Bucket::Inference,
            family(&[
                (r"\.generate\(", 3),
                (r"predict|inference", 2),
                (r"pipeline\(", 2),
                (r"softmax|argmax", 1),
            ]),
        ),
        (
            Bucket::Evaluation,
            family(&[
                (r"evaluate|evaluation", 3),
                (r"accuracy|f1_score|precision|recall|bleu|rouge", 2),
                (r"model\.eval\(\)|no_grad", 2),
                (r"confusion_matrix|classification_report", 2),
                (r"val_loss|test_loss", 1),
            ]),
        ),
        (
            Bucket::Plotting,
            family(&[
                (r"plt\.|matplotlib", 3),
                (r"seaborn|sns\.|plotly", 3),
                (r"\.plot\(|imshow|savefig", 2),
                (r"figure|subplot", 1),
            ]),
        ),
        (
            Bucket::Debug,
            family(&[
                (r"breakpoint\(\)|pdb\.set_trace", 3),
                (r"\.shape\b", 1),
                (r"print\(type\(|print\(len\(", 2),
                (r"\bassert\b", 1),
                (r"debug", 2),
            ]),
        ),
    ]
});

/// Per-bucket score for `text`; buckets without any match are omitted.
pub fn scores(text: &str) -> Vec<(Bucket, u32)> {
    let lowered = text.to_lowercase();
    FAMILIES
        .iter()
        .filter_map(|(bucket, patterns)| {
            let score: u32 = patterns
                .iter()
                .filter(|p| p.regex.is_match(&lowered))
                .map(|p| p.weight)
                .sum();
            (score > 0).then_some((*bucket, score))
        })
        .collect()
}

/// Highest-scoring bucket; earlier buckets win ties, no match yields `Other`.
pub fn classify(text: &str) -> Bucket {
    let mut best = (Bucket::Other, 0u32);
    for (bucket, score) in scores(text) {
        if score > best.1 {
            best = (bucket, score);
        }
    }
    best.0
}
