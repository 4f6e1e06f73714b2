use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Number of hex characters kept from the source digest.
pub const SOURCE_HASH_LEN: usize = 12;

/// A single metadata value: a string or a list of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Text(String),
    List(Vec<String>),
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec<String>> for MetadataValue {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

/// Document metadata. `None` values are fields that exist but carry no value
/// (`null` in JSON). Keys are kept sorted so serialized records are stable.
pub type Metadata = BTreeMap<String, Option<MetadataValue>>;

/// A unit of normalized source text. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub source: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Arc<Metadata>>,
}

impl Document {
    pub fn new(source: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            text: text.into(),
            metadata: None,
        }
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(Arc::new(metadata));
        self
    }
}

/// Deterministic short digest of a source identifier.
///
/// The first [`SOURCE_HASH_LEN`] hex characters of the blake3 hash (48 bits).
/// Collisions are negligible for site-sized corpora (millions of sources) but
/// the truncated digest is not collision resistant against adversarially
/// chosen source names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceHash(String);

impl SourceHash {
    #[must_use]
    pub fn of(source: &str) -> Self {
        let hex = blake3::hash(source.as_bytes()).to_hex();
        Self(hex[..SOURCE_HASH_LEN].to_owned())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Chunk id for the chunk at `sequence_index`: `{hash}-{index}`.
    #[must_use]
    pub fn chunk_id(&self, sequence_index: usize) -> String {
        format!("{}-{sequence_index}", self.0)
    }
}

impl fmt::Display for SourceHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A bounded-length slice of a document, ready for embedding.
///
/// Serializes as the flat record `{id, text, metadata?, source}`; the
/// bookkeeping fields are never written out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Arc<Metadata>>,
    pub source: String,
    #[serde(skip)]
    pub sequence_index: usize,
    #[serde(skip)]
    pub token_count: usize,
    /// Byte range of `text` within the source document text.
    #[serde(skip)]
    pub span: Range<usize>,
    /// Over the token budget even after character-level splitting.
    #[serde(skip)]
    pub oversized: bool,
}
