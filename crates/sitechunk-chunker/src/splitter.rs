//! Recursive separator-based splitting under a token budget with overlap.

use std::ops::Range;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{ChunkError, Result};
use crate::tokenizer::{Tokenizer, TokenizerKind};

fn default_chunk_size() -> usize {
    400
}

fn default_chunk_overlap() -> usize {
    20
}

fn default_separators() -> Vec<String> {
    vec![
        "\n\n".into(),
        "\n".into(),
        r"[.!?]\s".into(),
        " ".into(),
        String::new(),
    ]
}

/// Splitter settings. Separators are regular expressions ordered from
/// coarsest to finest; the empty string means character level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitterConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
    #[serde(default)]
    pub tokenizer: TokenizerKind,
    #[serde(default = "default_separators")]
    pub separators: Vec<String>,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            tokenizer: TokenizerKind::default(),
            separators: default_separators(),
        }
    }
}

impl SplitterConfig {
    /// # Errors
    ///
    /// Returns `ChunkError::InvalidConfiguration` when `chunk_size` is zero,
    /// `chunk_overlap >= chunk_size`, or no separator is configured.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(ChunkError::InvalidConfiguration(
                "chunk_size must be positive".into(),
            ));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(ChunkError::InvalidConfiguration(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.separators.is_empty() {
            return Err(ChunkError::InvalidConfiguration(
                "at least one separator is required".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
enum Separator {
    Pattern(Regex),
    Chars,
}

impl Separator {
    fn parse(pattern: &str) -> Result<Self> {
        if pattern.is_empty() {
            return Ok(Self::Chars);
        }
        Regex::new(pattern).map(Self::Pattern).map_err(|e| {
            ChunkError::InvalidConfiguration(format!("invalid separator {pattern:?}: {e}"))
        })
    }

    fn occurs_in(&self, text: &str) -> bool {
        match self {
            Self::Pattern(re) => re.is_match(text),
            Self::Chars => !text.is_empty(),
        }
    }

    /// Byte ranges of the pieces of `text`. Each separator match stays at the
    /// end of the piece it terminates, so the ranges tile `text` exactly.
    fn split(&self, text: &str) -> Vec<Range<usize>> {
        let mut ranges = Vec::new();
        match self {
            Self::Chars => {
                ranges.extend(text.char_indices().map(|(i, c)| i..i + c.len_utf8()));
            }
            Self::Pattern(re) => {
                let mut last = 0;
                for m in re.find_iter(text) {
                    if m.end() > last {
                        ranges.push(last..m.end());
                        last = m.end();
                    }
                }
                if last < text.len() {
                    ranges.push(last..text.len());
                }
            }
        }
        ranges
    }
}

/// Raw splitter output: one chunk of text before it becomes a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Whitespace-trimmed chunk text.
    pub text: String,
    /// Byte range of `text` in the input.
    pub span: Range<usize>,
    pub token_count: usize,
    pub oversized: bool,
}

#[derive(Debug, Clone)]
struct Piece {
    span: Range<usize>,
    tokens: usize,
    /// First piece of a re-split over-budget unit; a chunk is closed before it.
    boundary: bool,
    oversized: bool,
}

/// Splits text into overlapping segments that fit a token budget, preferring
/// the coarsest separator available.
#[derive(Debug, Clone)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<Separator>,
    tokenizer: Tokenizer,
}

impl TextSplitter {
    /// # Errors
    ///
    /// Returns `ChunkError::InvalidConfiguration` for invalid sizes or
    /// separator patterns, and `ChunkError::Tokenizer` if the tokenizer
    /// cannot be loaded.
    pub fn new(config: &SplitterConfig) -> Result<Self> {
        config.validate()?;
        let separators = config
            .separators
            .iter()
            .map(|s| Separator::parse(s))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            chunk_size: config.chunk_size,
            chunk_overlap: config.chunk_overlap,
            separators,
            tokenizer: Tokenizer::new(config.tokenizer)?,
        })
    }

    #[must_use]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    #[must_use]
    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    #[must_use]
    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    /// Split `text` into ordered segments. Empty input yields no segments.
    #[must_use]
    pub fn split(&self, text: &str) -> Vec<Segment> {
        if text.is_empty() {
            return Vec::new();
        }

        let mut pieces = Vec::new();
        self.collect_pieces(text, 0, 0, &mut pieces);
        self.merge(text, &pieces)
    }

    fn measure(&self, text: &str) -> usize {
        self.tokenizer.count(text.trim())
    }

    fn collect_pieces(&self, text: &str, offset: usize, level: usize, out: &mut Vec<Piece>) {
        let Some(found) = self.separators[level..]
            .iter()
            .position(|sep| sep.occurs_in(text))
        else {
            // No finer boundary exists in this text.
            let tokens = self.measure(text);
            out.push(Piece {
                span: offset..offset + text.len(),
                tokens,
                boundary: false,
                oversized: tokens > self.chunk_size,
            });
            return;
        };
        let level = level + found;

        for range in self.separators[level].split(text) {
            let piece = &text[range.clone()];
            let span = offset + range.start..offset + range.end;
            let tokens = self.measure(piece);

            if tokens <= self.chunk_size {
                out.push(Piece {
                    span,
                    tokens,
                    boundary: false,
                    oversized: false,
                });
            } else if level + 1 < self.separators.len() {
                let first = out.len();
                self.collect_pieces(piece, span.start, level + 1, out);
                if let Some(p) = out.get_mut(first) {
                    p.boundary = true;
                }
            } else {
                out.push(Piece {
                    span,
                    tokens,
                    boundary: false,
                    oversized: true,
                });
            }
        }
    }

    fn merge(&self, text: &str, pieces: &[Piece]) -> Vec<Segment> {
        let mut segments = Vec::new();
        let mut start = 0;
        let mut estimate = 0;
        let mut last_break = None;
        let mut i = 0;

        while i < pieces.len() {
            let piece = &pieces[i];

            if piece.oversized {
                self.drain(text, pieces, start, i, &mut segments);
                tracing::warn!(
                    tokens = piece.tokens,
                    chunk_size = self.chunk_size,
                    "emitting oversized chunk"
                );
                segments.push(segment(text, piece.span.clone(), piece.tokens, true));
                start = i + 1;
                estimate = 0;
                i += 1;
                continue;
            }

            let boundary = piece.boundary && start < i && last_break != Some(i);
            let over = start < i && estimate + piece.tokens > self.chunk_size;

            if over && !boundary {
                let exact = self.window_tokens(text, pieces, start, i + 1);
                if exact <= self.chunk_size {
                    estimate = exact;
                    i += 1;
                    continue;
                }
            }

            if boundary || over {
                let end = self.fit_end(text, pieces, start, i);
                segments.push(self.window_segment(text, pieces, start, end));
                if boundary && end == i {
                    last_break = Some(i);
                }
                start = self.overlap_start(text, pieces, start, end);
                estimate = self.window_tokens(text, pieces, start, end);
                i = end;
                continue;
            }

            estimate += piece.tokens;
            i += 1;
        }

        self.drain(text, pieces, start, pieces.len(), &mut segments);
        segments
    }

    /// Emit windows until every piece in `start..limit` is covered.
    fn drain(
        &self,
        text: &str,
        pieces: &[Piece],
        mut start: usize,
        limit: usize,
        segments: &mut Vec<Segment>,
    ) {
        while start < limit {
            let end = self.fit_end(text, pieces, start, limit);
            segments.push(self.window_segment(text, pieces, start, end));
            if end == limit {
                break;
            }
            start = self.overlap_start(text, pieces, start, end);
        }
    }

    /// Largest `end` in `start + 1..=limit` whose window fits the budget.
    fn fit_end(&self, text: &str, pieces: &[Piece], start: usize, limit: usize) -> usize {
        let fits = |end| self.window_tokens(text, pieces, start, end) <= self.chunk_size;
        if fits(limit) {
            return limit;
        }
        // A single non-oversized piece always fits.
        let (mut lo, mut hi) = (start + 1, limit);
        while hi - lo > 1 {
            let mid = lo + (hi - lo) / 2;
            if fits(mid) {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        lo
    }

    /// First piece of the next window after closing `start..end`.
    ///
    /// Picks the shortest piece-aligned suffix of the closed window holding at
    /// least `chunk_overlap` tokens (the whole window if it is shorter), then
    /// drops pieces from its front until the piece at `end` fits after it.
    fn overlap_start(&self, text: &str, pieces: &[Piece], start: usize, end: usize) -> usize {
        if self.chunk_overlap == 0 {
            return end;
        }

        let mut k = (start..end)
            .rev()
            .find(|&k| self.window_tokens(text, pieces, k, end) >= self.chunk_overlap)
            .unwrap_or(start);

        if end < pieces.len() && !pieces[end].oversized {
            while k < end && self.window_tokens(text, pieces, k, end + 1) > self.chunk_size {
                k += 1;
            }
        }
        k
    }

    fn window_tokens(&self, text: &str, pieces: &[Piece], start: usize, end: usize) -> usize {
        if start >= end {
            return 0;
        }
        self.measure(&text[window_span(pieces, start, end)])
    }

    fn window_segment(&self, text: &str, pieces: &[Piece], start: usize, end: usize) -> Segment {
        let span = window_span(pieces, start, end);
        let tokens = self.measure(&text[span.clone()]);
        segment(text, span, tokens, false)
    }
}

fn window_span(pieces: &[Piece], start: usize, end: usize) -> Range<usize> {
    pieces[start].span.start..pieces[end - 1].span.end
}

fn segment(text: &str, span: Range<usize>, token_count: usize, oversized: bool) -> Segment {
    let raw = &text[span.clone()];
    let leading = raw.len() - raw.trim_start().len();
    let trimmed = raw.trim();
    let start = span.start + leading;
    Segment {
        text: trimmed.to_owned(),
        span: start..start + trimmed.len(),
        token_count,
        oversized,
    }
}
