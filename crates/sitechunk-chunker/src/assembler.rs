use crate::splitter::TextSplitter;
use crate::types::{Chunk, Document, SourceHash};

/// Chunks produced for one document.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentChunks {
    pub source: String,
    pub source_hash: SourceHash,
    pub chunks: Vec<Chunk>,
    /// Segments dropped because their trimmed text was empty.
    pub blank_dropped: usize,
}

impl DocumentChunks {
    #[must_use]
    pub fn oversized(&self) -> impl Iterator<Item = &Chunk> {
        self.chunks.iter().filter(|c| c.oversized)
    }
}

/// Turns split text into chunk records with stable ids.
#[derive(Debug, Clone)]
pub struct ChunkAssembler {
    splitter: TextSplitter,
}

impl ChunkAssembler {
    #[must_use]
    pub fn new(splitter: TextSplitter) -> Self {
        Self { splitter }
    }

    #[must_use]
    pub fn splitter(&self) -> &TextSplitter {
        &self.splitter
    }

    /// Split a document and wrap every non-blank segment into a [`Chunk`].
    ///
    /// Sequence indices count emitted chunks only, so ids stay contiguous
    /// when blank segments are dropped.
    #[must_use]
    pub fn assemble(&self, document: &Document) -> DocumentChunks {
        let source_hash = SourceHash::of(&document.source);
        let segments = self.splitter.split(&document.text);
        let total = segments.len();

        let chunks: Vec<Chunk> = segments
            .into_iter()
            .filter(|s| !s.text.is_empty())
            .enumerate()
            .map(|(i, s)| Chunk {
                id: source_hash.chunk_id(i),
                text: s.text,
                metadata: document.metadata.clone(),
                source: document.source.clone(),
                sequence_index: i,
                token_count: s.token_count,
                span: s.span,
                oversized: s.oversized,
            })
            .collect();

        let blank_dropped = total - chunks.len();
        if blank_dropped > 0 {
            tracing::debug!(
                source = %document.source,
                blank_dropped,
                "dropped whitespace-only segments"
            );
        }

        DocumentChunks {
            source: document.source.clone(),
            source_hash,
            chunks,
            blank_dropped,
        }
    }
}
