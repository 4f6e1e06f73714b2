//! Token counting under one fixed scheme per run.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use tiktoken_rs::CoreBPE;

use crate::error::{ChunkError, Result};

/// Tokenization scheme identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TokenizerKind {
    #[default]
    #[serde(rename = "cl100k_base")]
    Cl100kBase,
    #[serde(rename = "o200k_base")]
    O200kBase,
    #[serde(rename = "p50k_base")]
    P50kBase,
    /// ceil(chars / 4); no BPE tables involved.
    #[serde(rename = "char_estimate")]
    CharEstimate,
}

impl TokenizerKind {
    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            Self::Cl100kBase => "cl100k_base",
            Self::O200kBase => "o200k_base",
            Self::P50kBase => "p50k_base",
            Self::CharEstimate => "char_estimate",
        }
    }
}

impl fmt::Display for TokenizerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for TokenizerKind {
    type Err = ChunkError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "cl100k_base" => Ok(Self::Cl100kBase),
            "o200k_base" => Ok(Self::O200kBase),
            "p50k_base" => Ok(Self::P50kBase),
            "char_estimate" => Ok(Self::CharEstimate),
            other => Err(ChunkError::InvalidConfiguration(format!(
                "unknown tokenizer: {other}"
            ))),
        }
    }
}

/// Counts tokens in text spans.
///
/// BPE encoders are built once per process and shared by every `Tokenizer`
/// of the same kind. Text is encoded with ordinary encoding only, so strings
/// such as `<|endoftext|>` are counted as literal content.
#[derive(Clone, Copy)]
pub struct Tokenizer {
    kind: TokenizerKind,
    bpe: Option<&'static CoreBPE>,
}

impl Tokenizer {
    /// # Errors
    ///
    /// Returns `ChunkError::Tokenizer` if the BPE tables cannot be loaded.
    pub fn new(kind: TokenizerKind) -> Result<Self> {
        let bpe = match kind {
            TokenizerKind::CharEstimate => None,
            bpe_kind => Some(encoder(bpe_kind)?),
        };
        Ok(Self { kind, bpe })
    }

    #[must_use]
    pub fn kind(&self) -> TokenizerKind {
        self.kind
    }

    /// Number of tokens in `text`. Zero for the empty string.
    #[must_use]
    pub fn count(&self, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }
        match self.bpe {
            Some(bpe) => bpe.encode_ordinary(text).len(),
            None => text.chars().count().div_ceil(4),
        }
    }
}

impl fmt::Debug for Tokenizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tokenizer")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

fn encoder(kind: TokenizerKind) -> Result<&'static CoreBPE> {
    static CL100K: OnceLock<Option<CoreBPE>> = OnceLock::new();
    static O200K: OnceLock<Option<CoreBPE>> = OnceLock::new();
    static P50K: OnceLock<Option<CoreBPE>> = OnceLock::new();

    let cell = match kind {
        TokenizerKind::Cl100kBase => &CL100K,
        TokenizerKind::O200kBase => &O200K,
        TokenizerKind::P50kBase => &P50K,
        TokenizerKind::CharEstimate => {
            return Err(ChunkError::Tokenizer(format!("{kind} has no BPE tables")));
        }
    };

    cell.get_or_init(|| {
        let built = match kind {
            TokenizerKind::O200kBase => tiktoken_rs::o200k_base(),
            TokenizerKind::P50kBase => tiktoken_rs::p50k_base(),
            _ => tiktoken_rs::cl100k_base(),
        };
        built
            .inspect_err(|e| tracing::error!(tokenizer = %kind, "failed to load BPE tables: {e}"))
            .ok()
    })
    .as_ref()
    .ok_or_else(|| ChunkError::Tokenizer(format!("{kind} tables unavailable")))
}
