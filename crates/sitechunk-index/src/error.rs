use crate::vector_store::VectorStoreError;

#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("embedding failed: {0}")]
    Embedding(String),

    #[error("embedder returned {got} vectors for {expected} texts")]
    VectorCountMismatch { expected: usize, got: usize },

    #[error("vector store error: {0}")]
    VectorStore(#[from] VectorStoreError),
}

pub type Result<T> = std::result::Result<T, IndexError>;
