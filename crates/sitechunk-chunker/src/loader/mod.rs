//! File loaders producing [`Document`]s.

mod html;
mod jsonl;
mod text;

use std::future::Future;
use std::path::Path;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

pub use html::{HtmlLoader, validate_selector};
pub use jsonl::JsonlLoader;
pub use text::TextLoader;

use crate::error::{ChunkError, Result, UnreadableSource};
use crate::types::Document;

/// Default maximum file size: 50 MiB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

pub const DEFAULT_HTML_SELECTOR: &str = "h1, h2, h3, h4, h5, h6, p, li, pre, td";

/// Site chrome and teaser blocks left out of extracted page text.
pub const DEFAULT_HTML_EXCLUDE_SELECTOR: &str =
    "nav, footer, .navbar, .footer, .payment-wall, .h1-alternative, .h3-alternative";

pub type LoadFuture<'a> = Pin<Box<dyn Future<Output = Result<Vec<Document>>> + Send + 'a>>;

pub trait DocumentLoader: Send + Sync {
    fn load(&self, path: &Path) -> LoadFuture<'_>;

    fn supported_extensions(&self) -> &[&str];
}

fn default_max_file_size() -> u64 {
    DEFAULT_MAX_FILE_SIZE
}

fn default_html_selector() -> String {
    DEFAULT_HTML_SELECTOR.into()
}

fn default_html_exclude_selector() -> String {
    DEFAULT_HTML_EXCLUDE_SELECTOR.into()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoaderConfig {
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    #[serde(default = "default_html_selector")]
    pub html_selector: String,
    /// Empty disables exclusion.
    #[serde(default = "default_html_exclude_selector")]
    pub html_exclude_selector: String,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            max_file_size: default_max_file_size(),
            html_selector: default_html_selector(),
            html_exclude_selector: default_html_exclude_selector(),
        }
    }
}

/// Canonicalize `path` and reject it if it exceeds `max_size` bytes.
async fn checked_path(path: &Path, max_size: u64) -> Result<std::path::PathBuf> {
    let path = tokio::fs::canonicalize(path).await?;
    let meta = tokio::fs::metadata(&path).await?;
    if meta.len() > max_size {
        return Err(ChunkError::FileTooLarge(meta.len()));
    }
    Ok(path)
}

/// Loaders keyed by file extension.
pub struct Loaders {
    loaders: Vec<Box<dyn DocumentLoader>>,
}

impl Loaders {
    #[must_use]
    pub fn new(config: &LoaderConfig) -> Self {
        Self {
            loaders: vec![
                Box::new(TextLoader {
                    max_file_size: config.max_file_size,
                }),
                Box::new(HtmlLoader {
                    max_file_size: config.max_file_size,
                    selector: config.html_selector.clone(),
                    exclude: config.html_exclude_selector.clone(),
                }),
                Box::new(JsonlLoader {
                    max_file_size: config.max_file_size,
                }),
            ],
        }
    }

    /// The loader registered for the extension of `path`, ignoring case.
    #[must_use]
    pub fn for_path(&self, path: &Path) -> Option<&dyn DocumentLoader> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        self.loaders
            .iter()
            .find(|l| l.supported_extensions().contains(&ext.as_str()))
            .map(|l| l.as_ref())
    }

    #[must_use]
    pub fn supports(&self, path: &Path) -> bool {
        self.for_path(path).is_some()
    }

    /// Load `path`, converting every failure into an [`UnreadableSource`].
    ///
    /// # Errors
    ///
    /// Returns `UnreadableSource` when no loader handles the extension or
    /// the file cannot be read or parsed.
    pub async fn load(&self, path: &Path) -> std::result::Result<Vec<Document>, UnreadableSource> {
        let source = path.display().to_string();
        let Some(loader) = self.for_path(path) else {
            return Err(UnreadableSource::new(
                source,
                ChunkError::UnsupportedFormat(
                    path.extension()
                        .map(|e| e.to_string_lossy().into_owned())
                        .unwrap_or_default(),
                ),
            ));
        };
        loader
            .load(path)
            .await
            .map_err(|e| UnreadableSource::new(source, e))
    }
}

impl Default for Loaders {
    fn default() -> Self {
        Self::new(&LoaderConfig::default())
    }
}

impl std::fmt::Debug for Loaders {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let exts: Vec<&str> = self
            .loaders
            .iter()
            .flat_map(|l| l.supported_extensions().iter().copied())
            .collect();
        f.debug_struct("Loaders").field("extensions", &exts).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selects_loader_by_extension() {
        let loaders = Loaders::default();
        assert!(loaders.supports(Path::new("a/readme.md")));
        assert!(loaders.supports(Path::new("page.HTML")));
        assert!(loaders.supports(Path::new("dump.jsonl")));
        assert!(!loaders.supports(Path::new("image.png")));
        assert!(!loaders.supports(Path::new("Makefile")));
    }

    #[tokio::test]
    async fn unsupported_extension_is_unreadable() {
        let err = Loaders::default()
            .load(Path::new("image.png"))
            .await
            .unwrap_err();
        assert_eq!(err.source_id, "image.png");
        assert!(err.reason.contains("unsupported format"));
    }

    #[tokio::test]
    async fn missing_file_is_unreadable() {
        let err = Loaders::default()
            .load(Path::new("/nonexistent/page.txt"))
            .await
            .unwrap_err();
        assert_eq!(err.source_id, "/nonexistent/page.txt");
    }

    #[test]
    fn loader_config_defaults() {
        let config: LoaderConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, LoaderConfig::default());
        assert_eq!(config.max_file_size, 50 * 1024 * 1024);
    }
}
