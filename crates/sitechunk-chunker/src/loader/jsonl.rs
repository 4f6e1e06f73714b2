use std::path::Path;

use super::{DEFAULT_MAX_FILE_SIZE, DocumentLoader, LoadFuture, checked_path};
use crate::error::{ChunkError, Result};
use crate::types::Document;

/// Reads crawl dumps: one `{"source", "text", "metadata"?}` object per line.
///
/// Blank lines are ignored. Any malformed line rejects the whole file.
pub struct JsonlLoader {
    pub max_file_size: u64,
}

impl Default for JsonlLoader {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

fn parse_lines(content: &str) -> Result<Vec<Document>> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str::<Document>(line)
                .map_err(|e| ChunkError::Parse(format!("line {}: {e}", i + 1)))
        })
        .collect()
}

impl DocumentLoader for JsonlLoader {
    fn load(&self, path: &Path) -> LoadFuture<'_> {
        let path = path.to_path_buf();
        let max_size = self.max_file_size;
        Box::pin(async move {
            let path = checked_path(&path, max_size).await?;
            let content = tokio::fs::read_to_string(&path).await?;
            let documents = parse_lines(&content)?;
            tracing::debug!(path = %path.display(), documents = documents.len(), "loaded jsonl dump");
            Ok(documents)
        })
    }

    fn supported_extensions(&self) -> &[&str] {
        &["jsonl"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_documents_with_optional_metadata() {
        let content = concat!(
            r#"{"source":"https://a.example/","text":"alpha"}"#,
            "\n\n",
            r#"{"source":"https://b.example/","text":"beta","metadata":{"tags":[],"author":null}}"#,
            "\n",
        );
        let docs = parse_lines(content).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].source, "https://a.example/");
        assert!(docs[0].metadata.is_none());
        let meta = docs[1].metadata.as_ref().unwrap();
        assert_eq!(meta.get("author"), Some(&None));
    }

    #[test]
    fn malformed_line_reports_line_number() {
        let content = "{\"source\":\"a\",\"text\":\"x\"}\n{\"source\":\"b\"}\n";
        let err = parse_lines(content).unwrap_err();
        assert!(matches!(err, ChunkError::Parse(ref msg) if msg.starts_with("line 2:")));
    }

    #[tokio::test]
    async fn load_jsonl_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("crawl.jsonl");
        std::fs::write(&file, "{\"source\":\"s1\",\"text\":\"one\"}\n").unwrap();

        let docs = JsonlLoader::default().load(&file).await.unwrap();
        assert_eq!(docs, vec![Document::new("s1", "one")]);
    }

    #[tokio::test]
    async fn empty_file_has_no_documents() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("empty.jsonl");
        std::fs::write(&file, "").unwrap();

        assert!(JsonlLoader::default().load(&file).await.unwrap().is_empty());
    }
}
