//! Batch processing: feed documents in, get chunks out plus a report.

use crate::assembler::ChunkAssembler;
use crate::error::{Result, UnreadableSource};
use crate::sink::ChunkSink;
use crate::types::Document;

/// Summary of a finished batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub documents_processed: usize,
    pub chunks_emitted: usize,
    pub skipped: Vec<UnreadableSource>,
    /// Ids of chunks over the token budget.
    pub oversized_chunks: Vec<String>,
    pub blank_chunks_dropped: usize,
}

impl BatchReport {
    #[must_use]
    pub fn documents_skipped(&self) -> usize {
        self.skipped.len()
    }
}

/// What happened to one submitted document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentOutcome {
    Chunked {
        source: String,
        chunks: usize,
        oversized: usize,
    },
    Skipped(UnreadableSource),
}

/// An in-progress batch writing into a sink.
///
/// Documents are processed in submission order and chunks reach the sink in
/// that order. Unreadable documents are recorded and skipped.
#[derive(Debug)]
pub struct Batch<'a, S: ChunkSink> {
    assembler: &'a ChunkAssembler,
    sink: S,
    report: BatchReport,
}

impl<'a, S: ChunkSink> Batch<'a, S> {
    pub fn new(assembler: &'a ChunkAssembler, sink: S) -> Self {
        Self {
            assembler,
            sink,
            report: BatchReport::default(),
        }
    }

    /// Chunk one document, or record why it could not be read.
    ///
    /// # Errors
    ///
    /// Returns an error if the sink fails to accept a chunk.
    pub fn submit(
        &mut self,
        document: std::result::Result<Document, UnreadableSource>,
    ) -> Result<DocumentOutcome> {
        let document = match document {
            Ok(d) => d,
            Err(unreadable) => {
                tracing::warn!(
                    source = %unreadable.source_id,
                    reason = %unreadable.reason,
                    "skipping unreadable source"
                );
                self.report.skipped.push(unreadable.clone());
                return Ok(DocumentOutcome::Skipped(unreadable));
            }
        };

        let out = self.assembler.assemble(&document);
        let mut oversized = 0;
        for chunk in &out.chunks {
            self.sink.write_chunk(chunk)?;
            if chunk.oversized {
                oversized += 1;
                self.report.oversized_chunks.push(chunk.id.clone());
            }
        }

        self.report.documents_processed += 1;
        self.report.chunks_emitted += out.chunks.len();
        self.report.blank_chunks_dropped += out.blank_dropped;
        tracing::debug!(
            source = %out.source,
            chunks = out.chunks.len(),
            oversized,
            "document chunked"
        );

        Ok(DocumentOutcome::Chunked {
            source: out.source,
            chunks: out.chunks.len(),
            oversized,
        })
    }

    #[must_use]
    pub fn report(&self) -> &BatchReport {
        &self.report
    }

    /// Flush the sink and return the final report with it.
    ///
    /// # Errors
    ///
    /// Returns an error if the sink fails to flush.
    pub fn finish(mut self) -> Result<(BatchReport, S)> {
        self.sink.finish()?;
        tracing::info!(
            documents = self.report.documents_processed,
            chunks = self.report.chunks_emitted,
            skipped = self.report.skipped.len(),
            oversized = self.report.oversized_chunks.len(),
            "batch complete"
        );
        Ok((self.report, self.sink))
    }
}

impl ChunkAssembler {
    /// Process every document in order into `sink`.
    ///
    /// # Errors
    ///
    /// Returns an error if the sink fails; unreadable documents are not errors.
    pub fn process_batch<I, S>(&self, documents: I, sink: S) -> Result<(BatchReport, S)>
    where
        I: IntoIterator<Item = std::result::Result<Document, UnreadableSource>>,
        S: ChunkSink,
    {
        let mut batch = Batch::new(self, sink);
        for document in documents {
            batch.submit(document)?;
        }
        batch.finish()
    }
}
