//! Error types for sitechunk-chunker.

/// A document that could not be obtained or parsed.
///
/// Recorded by the batch and skipped; never aborts processing of the other
/// documents.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unreadable source {source_id}: {reason}")]
pub struct UnreadableSource {
    pub source_id: String,
    pub reason: String,
}

impl UnreadableSource {
    pub fn new(source_id: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self {
            source_id: source_id.into(),
            reason: reason.to_string(),
        }
    }
}

/// Errors raised by configuration, loading and output.
#[derive(Debug, thiserror::Error)]
pub enum ChunkError {
    /// Rejected before any document is processed.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error(transparent)]
    UnreadableSource(#[from] UnreadableSource),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("file too large: {0} bytes")]
    FileTooLarge(u64),

    #[error("parse failed: {0}")]
    Parse(String),

    #[error("tokenizer error: {0}")]
    Tokenizer(String),
}

/// Result type alias using `ChunkError`.
pub type Result<T> = std::result::Result<T, ChunkError>;
