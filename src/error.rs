/// Why a cell could not be skeletonized. The caller falls back to the keyword filter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SkeletonError {
    #[error("signature starting at line {line} never closes its parentheses")]
    UnterminatedSignature { line: usize },

    #[error("docstring starting at line {line} is never closed")]
    UnterminatedDocstring { line: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PackError {
    #[error("no cells selected")]
    EmptySelection,
}
