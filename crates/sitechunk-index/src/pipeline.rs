use std::collections::HashMap;

use serde_json::{Value, json};
use sitechunk_chunker::{Chunk, Metadata, MetadataValue};

use crate::error::{IndexError, Result};
use crate::vector_store::{BoxFuture, VectorPoint, VectorStore};

pub const DEFAULT_BATCH_SIZE: usize = 32;

/// Placeholder stored for metadata fields without a value.
pub const UNKNOWN: &str = "unknown";

/// Embeds a batch of texts, one vector per text in input order.
pub type EmbedFuture = BoxFuture<'static, Result<Vec<Vec<f32>>>>;
pub type EmbedFn = Box<dyn Fn(Vec<String>) -> EmbedFuture + Send + Sync>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexReport {
    pub points_upserted: usize,
    pub batches: usize,
    pub blank_skipped: usize,
}

/// Replace missing values with [`UNKNOWN`] so every field is indexable.
#[must_use]
pub fn normalize_metadata(metadata: &Metadata) -> serde_json::Map<String, Value> {
    metadata
        .iter()
        .map(|(key, value)| {
            let value = match value {
                None => json!(UNKNOWN),
                Some(MetadataValue::List(items)) if items.is_empty() => json!([UNKNOWN]),
                Some(MetadataValue::List(items)) => json!(items),
                Some(MetadataValue::Text(text)) => json!(text),
            };
            (key.clone(), value)
        })
        .collect()
}

fn to_point(chunk: &Chunk, vector: Vec<f32>) -> VectorPoint {
    let mut payload = HashMap::from([
        ("text".to_owned(), json!(chunk.text)),
        ("source".to_owned(), json!(chunk.source)),
    ]);
    if let Some(metadata) = &chunk.metadata {
        payload.insert(
            "metadata".to_owned(),
            Value::Object(normalize_metadata(metadata)),
        );
    }
    VectorPoint {
        id: chunk.id.clone(),
        vector,
        payload,
    }
}

/// Embeds chunks in batches and upserts them into a vector store.
pub struct IngestionPipeline<S> {
    store: S,
    collection: String,
    embed_fn: EmbedFn,
    batch_size: usize,
}

impl<S: VectorStore> IngestionPipeline<S> {
    pub fn new(store: S, collection: impl Into<String>, embed_fn: EmbedFn) -> Self {
        Self {
            store,
            collection: collection.into(),
            embed_fn,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Embed and store `chunks`. Chunks with blank text are skipped.
    ///
    /// The collection is created on the first batch, sized to the returned
    /// vectors. Batches already upserted stay stored if a later batch fails.
    ///
    /// # Errors
    ///
    /// Returns an error if embedding fails, the embedder returns the wrong
    /// number of vectors, or the store rejects a batch.
    pub async fn index(&self, chunks: &[Chunk]) -> Result<IndexReport> {
        let mut report = IndexReport::default();
        let indexable: Vec<&Chunk> = chunks
            .iter()
            .filter(|c| !c.text.trim().is_empty())
            .collect();
        report.blank_skipped = chunks.len() - indexable.len();

        for batch in indexable.chunks(self.batch_size) {
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let vectors = (self.embed_fn)(texts).await?;
            if vectors.len() != batch.len() {
                return Err(IndexError::VectorCountMismatch {
                    expected: batch.len(),
                    got: vectors.len(),
                });
            }

            if report.batches == 0
                && let Some(first) = vectors.first()
            {
                self.store
                    .ensure_collection(&self.collection, first.len() as u64)
                    .await?;
            }

            let points: Vec<VectorPoint> = batch
                .iter()
                .zip(vectors)
                .map(|(chunk, vector)| to_point(chunk, vector))
                .collect();
            let count = points.len();
            self.store.upsert(&self.collection, points).await?;

            report.batches += 1;
            report.points_upserted += count;
            tracing::debug!(batch = report.batches, points = count, "batch upserted");
        }

        tracing::info!(
            collection = %self.collection,
            points = report.points_upserted,
            batches = report.batches,
            blank_skipped = report.blank_skipped,
            "indexing complete"
        );
        Ok(report)
    }
}

impl<S> std::fmt::Debug for IngestionPipeline<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestionPipeline")
            .field("collection", &self.collection)
            .field("batch_size", &self.batch_size)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::InMemoryVectorStore;

    fn chunk(id: &str, text: &str) -> Chunk {
        Chunk {
            id: id.into(),
            text: text.into(),
            metadata: None,
            source: "page".into(),
            sequence_index: 0,
            token_count: 1,
            span: 0..text.len(),
            oversized: false,
        }
    }

    fn len_embed() -> EmbedFn {
        Box::new(|texts: Vec<String>| {
            Box::pin(async move { Ok(texts.iter().map(|t| vec![t.len() as f32, 1.0]).collect()) })
        })
    }

    #[test]
    fn normalize_fills_placeholders() {
        let mut metadata = Metadata::new();
        metadata.insert("author".into(), None);
        metadata.insert("tags".into(), Some(MetadataValue::List(vec![])));
        metadata.insert("lang".into(), Some(MetadataValue::from("en")));
        metadata.insert(
            "topics".into(),
            Some(MetadataValue::List(vec!["bees".into()])),
        );

        let out = normalize_metadata(&metadata);
        assert_eq!(out["author"], json!("unknown"));
        assert_eq!(out["tags"], json!(["unknown"]));
        assert_eq!(out["lang"], json!("en"));
        assert_eq!(out["topics"], json!(["bees"]));
    }

    #[tokio::test]
    async fn batches_of_configured_size() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let embed: EmbedFn = Box::new(move |texts: Vec<String>| {
            seen.fetch_add(1, Ordering::SeqCst);
            Box::pin(async move { Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect()) })
        });
        let pipeline =
            IngestionPipeline::new(InMemoryVectorStore::new(), "col", embed).with_batch_size(32);

        let chunks: Vec<Chunk> = (0..70).map(|i| chunk(&format!("c-{i}"), "text")).collect();
        let report = pipeline.index(&chunks).await.unwrap();

        assert_eq!(report.batches, 3);
        assert_eq!(report.points_upserted, 70);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(pipeline.store().count("col").await.unwrap(), 70);
    }

    #[tokio::test]
    async fn blank_texts_are_skipped() {
        let pipeline = IngestionPipeline::new(InMemoryVectorStore::new(), "col", len_embed());
        let chunks = vec![chunk("a-0", "hello"), chunk("a-1", "  \n"), chunk("a-2", "")];
        let report = pipeline.index(&chunks).await.unwrap();
        assert_eq!(report.points_upserted, 1);
        assert_eq!(report.blank_skipped, 2);
    }

    #[tokio::test]
    async fn empty_input_touches_nothing() {
        let pipeline = IngestionPipeline::new(InMemoryVectorStore::new(), "col", len_embed());
        let report = pipeline.index(&[]).await.unwrap();
        assert_eq!(report, IndexReport::default());
        assert!(pipeline.store().count("col").await.is_err());
    }

    #[tokio::test]
    async fn payload_carries_text_source_and_metadata() {
        let mut metadata = Metadata::new();
        metadata.insert("author".into(), None);
        let mut c = chunk("a-0", "bees");
        c.metadata = Some(Arc::new(metadata));

        let pipeline = IngestionPipeline::new(InMemoryVectorStore::new(), "col", len_embed());
        pipeline.index(&[c]).await.unwrap();

        let payload = pipeline.store().payload("col", "a-0").unwrap();
        assert_eq!(payload["text"], "bees");
        assert_eq!(payload["source"], "page");
        assert_eq!(payload["metadata"]["author"], "unknown");
    }

    #[tokio::test]
    async fn vector_count_mismatch_is_error() {
        let embed: EmbedFn = Box::new(|_texts: Vec<String>| Box::pin(async { Ok(vec![]) }));
        let pipeline = IngestionPipeline::new(InMemoryVectorStore::new(), "col", embed);
        let result = pipeline.index(&[chunk("a-0", "x")]).await;
        assert!(matches!(
            result,
            Err(IndexError::VectorCountMismatch {
                expected: 1,
                got: 0
            })
        ));
    }

    #[tokio::test]
    async fn embedding_error_propagates() {
        let embed: EmbedFn = Box::new(|_texts: Vec<String>| {
            Box::pin(async { Err(IndexError::Embedding("model offline".into())) })
        });
        let pipeline = IngestionPipeline::new(InMemoryVectorStore::new(), "col", embed);
        let result = pipeline.index(&[chunk("a-0", "x")]).await;
        assert!(matches!(result, Err(IndexError::Embedding(_))));
    }

    #[test]
    fn batch_size_is_at_least_one() {
        let pipeline =
            IngestionPipeline::new(InMemoryVectorStore::new(), "col", len_embed()).with_batch_size(0);
        assert!(format!("{pipeline:?}").contains("batch_size: 1"));
    }
}
