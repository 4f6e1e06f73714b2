//! Token-budgeted chunking of crawled website text.
//!
//! Documents are split along the coarsest separator that fits a token budget,
//! adjacent chunks share a bounded overlap, and every chunk gets a stable id
//! derived from its source. Loaders turn saved pages and crawl dumps into
//! documents; sinks receive the chunk records.

pub mod assembler;
pub mod batch;
pub mod error;
pub mod loader;
pub mod sink;
pub mod splitter;
pub mod tokenizer;
pub mod types;

pub use assembler::{ChunkAssembler, DocumentChunks};
pub use batch::{Batch, BatchReport, DocumentOutcome};
pub use error::{ChunkError, Result, UnreadableSource};
pub use loader::{
    DocumentLoader, HtmlLoader, JsonlLoader, LoaderConfig, Loaders, TextLoader, validate_selector,
};
pub use sink::{ChunkSink, JsonlSink};
pub use splitter::{Segment, SplitterConfig, TextSplitter};
pub use tokenizer::{Tokenizer, TokenizerKind};
pub use types::{Chunk, Document, Metadata, MetadataValue, SourceHash};
