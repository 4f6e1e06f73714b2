use std::path::Path;

use super::{DEFAULT_MAX_FILE_SIZE, DocumentLoader, LoadFuture, checked_path};
use crate::types::{Document, Metadata};

pub struct TextLoader {
    pub max_file_size: u64,
}

impl Default for TextLoader {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

impl DocumentLoader for TextLoader {
    fn load(&self, path: &Path) -> LoadFuture<'_> {
        let path = path.to_path_buf();
        let max_size = self.max_file_size;
        Box::pin(async move {
            let path = checked_path(&path, max_size).await?;

            let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
            let content_type = match ext.to_ascii_lowercase().as_str() {
                "md" | "markdown" => "text/markdown",
                _ => "text/plain",
            };

            let text = tokio::fs::read_to_string(&path).await?;

            let mut metadata = Metadata::new();
            metadata.insert("content_type".into(), Some(content_type.into()));
            Ok(vec![
                Document::new(path.display().to_string(), text).with_metadata(metadata),
            ])
        })
    }

    fn supported_extensions(&self) -> &[&str] {
        &["txt", "md", "markdown"]
    }
}
