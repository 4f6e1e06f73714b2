use std::path::PathBuf;

use super::Config;

impl Config {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("SITECHUNK_CHUNK_SIZE") {
            if let Ok(size) = v.parse::<usize>() {
                self.chunker.chunk_size = size;
            } else {
                tracing::warn!("ignoring invalid SITECHUNK_CHUNK_SIZE value: {v}");
            }
        }
        if let Ok(v) = std::env::var("SITECHUNK_CHUNK_OVERLAP") {
            if let Ok(overlap) = v.parse::<usize>() {
                self.chunker.chunk_overlap = overlap;
            } else {
                tracing::warn!("ignoring invalid SITECHUNK_CHUNK_OVERLAP value: {v}");
            }
        }
        if let Ok(v) = std::env::var("SITECHUNK_TOKENIZER") {
            if let Ok(kind) = v.parse() {
                self.chunker.tokenizer = kind;
            } else {
                tracing::warn!("ignoring invalid SITECHUNK_TOKENIZER value: {v}");
            }
        }
        if let Ok(v) = std::env::var("SITECHUNK_MAX_FILE_SIZE") {
            if let Ok(size) = v.parse::<u64>() {
                self.loader.max_file_size = size;
            } else {
                tracing::warn!("ignoring invalid SITECHUNK_MAX_FILE_SIZE value: {v}");
            }
        }
        if let Ok(v) = std::env::var("SITECHUNK_HTML_SELECTOR")
            && !v.trim().is_empty()
        {
            self.loader.html_selector = v;
        }
        if let Ok(v) = std::env::var("SITECHUNK_HTML_EXCLUDE_SELECTOR") {
            self.loader.html_exclude_selector = v;
        }
        if let Ok(v) = std::env::var("SITECHUNK_OUTPUT_PATH")
            && !v.is_empty()
        {
            self.output.path = PathBuf::from(v);
        }
    }
}
