//! Cell compressor: sanitizes, classifies and skeletonizes code cells.
//!
//! A run has two phases. `analyze` walks the cells once in scan order and assigns each
//! a `CompressionContext` (bucket, earliest duplicate, earliest signature twin, bucket
//! primary). `compress` then turns one sanitized cell into its skeleton. The first phase
//! owns all cross-cell state, so the second is independent per cell.

pub mod bucket;
pub mod contract;
pub mod dedup;
pub mod fallback;
pub mod sanitize;
pub mod skeleton;

use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::config::CompressConfig;
use crate::error::SkeletonError;

pub use bucket::Bucket;
pub use contract::StateContract;
pub use dedup::DedupIndex;
pub use skeleton::{CompressionStats, Skeleton, SkeletonMode};

/// How a cell relates to earlier cells in the same run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "of", rename_all = "snake_case")]
pub enum VariantKind {
    None,
    Duplicate(usize),
    SignatureDuplicate(usize),
    BucketVariant(usize),
}

/// Per-cell facts derived during one run. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompressionContext {
    pub index: usize,
    pub bucket: Bucket,
    pub bucket_primary_index: Option<usize>,
    pub duplicate_of_index: Option<usize>,
    pub signature_duplicate_of_index: Option<usize>,
}

impl CompressionContext {
    /// A context with no relation to other cells.
    pub fn standalone(index: usize, bucket: Bucket) -> Self {
        Self {
            index,
            bucket,
            bucket_primary_index: None,
            duplicate_of_index: None,
            signature_duplicate_of_index: None,
        }
    }

    pub fn variant(&self) -> VariantKind {
        classify_variant(self)
    }
}

/// Duplicate beats signature twin beats bucket variant.
pub fn classify_variant(context: &CompressionContext) -> VariantKind {
    match (
        context.duplicate_of_index,
        context.signature_duplicate_of_index,
        context.bucket_primary_index,
    ) {
        (Some(first), _, _) => VariantKind::Duplicate(first),
        (None, Some(first), _) => VariantKind::SignatureDuplicate(first),
        (None, None, Some(primary)) if primary != context.index => {
            VariantKind::BucketVariant(primary)
        }
        _ => VariantKind::None,
    }
}

/// One code cell entering a run. `index` is the cell's position in the document.
#[derive(Debug, Clone, Copy)]
pub struct RunInput<'a> {
    pub index: usize,
    pub path: &'a str,
    pub content: &'a str,
}

/// Output of the sequential analysis pass, aligned with the run inputs.
#[derive(Debug, Clone)]
pub struct AnalyzedCell {
    pub path: String,
    pub sanitized: String,
    pub hash: String,
    pub signature: Option<String>,
    pub context: CompressionContext,
}

/// Compressed form of one cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellCompression {
    Skeleton(Skeleton),
    /// Keyword-line filter output; `failure` is set when skeletonization errored
    Filtered {
        text: String,
        failure: Option<SkeletonError>,
    },
}

impl CellCompression {
    pub fn text(&self) -> &str {
        match self {
            CellCompression::Skeleton(skeleton) => &skeleton.text,
            CellCompression::Filtered { text, .. } => text,
        }
    }

    pub fn failure(&self) -> Option<&SkeletonError> {
        match self {
            CellCompression::Skeleton(_) => None,
            CellCompression::Filtered { failure, .. } => failure.as_ref(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Compressor {
    config: CompressConfig,
}

impl Compressor {
    pub fn new(config: CompressConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CompressConfig {
        &self.config
    }

    /// Sanitize a cell's raw text for this compressor's comment target.
    pub fn sanitize(&self, path: &str, content: &str) -> String {
        sanitize::sanitize(content, path, &self.config.target_comment)
    }

    /// Sequential pre-pass: assigns contexts in input order with a fresh dedup index.
    pub fn analyze(&self, inputs: &[RunInput<'_>]) -> Vec<AnalyzedCell> {
        let mut index = DedupIndex::new();
        let mut bucket_primary: HashMap<Bucket, usize> = HashMap::new();

        inputs
            .iter()
            .map(|input| {
                let sanitized = self.sanitize(input.path, input.content);
                let normalized = dedup::normalize(&sanitized);
                let hash = dedup::hash(&normalized);
                let signature = dedup::signature_key(&sanitized);
                let bucket = bucket::classify(&sanitized);

                let duplicate_of_index = if normalized.is_empty() {
                    None
                } else {
                    index.observe_hash(&hash, input.index)
                };
                let signature_duplicate_of_index = signature
                    .as_deref()
                    .and_then(|sig| index.observe_signature(sig, input.index));
                let primary = *bucket_primary.entry(bucket).or_insert(input.index);
                let bucket_primary_index = (bucket.collapses_variants()
                    && signature.is_none()
                    && primary != input.index)
                    .then_some(primary);

                let context = CompressionContext {
                    index: input.index,
                    bucket,
                    bucket_primary_index,
                    duplicate_of_index,
                    signature_duplicate_of_index,
                };
                debug!(
                    path = input.path,
                    %hash,
                    %bucket,
                    variant = ?context.variant(),
                    "analyzed cell"
                );

                AnalyzedCell {
                    path: input.path.to_string(),
                    sanitized,
                    hash,
                    signature,
                    context,
                }
            })
            .collect()
    }

    /// Compress one analyzed cell. Never fails: errors fall back to the keyword filter.
    pub fn compress(&self, cell: &AnalyzedCell) -> CellCompression {
        if !sanitize::is_python_like(&cell.path) {
            if let Some(pointer) = skeleton::variant_pointer(&cell.sanitized, &cell.context) {
                return CellCompression::Skeleton(Skeleton {
                    stats: CompressionStats::new(&cell.sanitized, &pointer),
                    text: pointer,
                    mode: SkeletonMode::Pointer,
                    contract: None,
                });
            }
            if crate::types::non_blank_line_count(&cell.sanitized)
                <= self.config.small_cell_threshold
            {
                return CellCompression::Skeleton(Skeleton {
                    text: cell.sanitized.clone(),
                    mode: SkeletonMode::Verbatim,
                    stats: CompressionStats::new(&cell.sanitized, &cell.sanitized),
                    contract: None,
                });
            }
            return CellCompression::Filtered {
                text: fallback::keyword_filter(&cell.sanitized),
                failure: None,
            };
        }

        match skeleton::skeletonize(&cell.sanitized, &cell.context, &self.config) {
            Ok(skeleton) => CellCompression::Skeleton(skeleton),
            Err(err) => {
                warn!(path = %cell.path, error = %err, "skeletonization failed, using keyword filter");
                CellCompression::Filtered {
                    text: fallback::keyword_filter(&cell.sanitized),
                    failure: Some(err),
                }
            }
        }
    }

    /// Analyze then compress every input, in order.
    pub fn compress_all(&self, inputs: &[RunInput<'_>]) -> Vec<CellCompression> {
        self.analyze(inputs)
            .iter()
            .map(|cell| self.compress(cell))
            .collect()
    }
}
