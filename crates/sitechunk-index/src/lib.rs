//! Embedding and vector storage for chunk records.
//!
//! The embedder is an opaque callback; [`IngestionPipeline`] batches chunk
//! texts through it and upserts the vectors into any [`VectorStore`].

pub mod error;
pub mod in_memory_store;
pub mod pipeline;
pub mod vector_store;

pub use error::{IndexError, Result};
pub use in_memory_store::InMemoryVectorStore;
pub use pipeline::{
    DEFAULT_BATCH_SIZE, EmbedFn, EmbedFuture, IndexReport, IngestionPipeline, normalize_metadata,
};
pub use vector_store::{ScoredVectorPoint, VectorPoint, VectorStore, VectorStoreError};
