use std::collections::HashSet;
use std::path::Path;

use scrape_core::{NodeId, Soup, Tag};

use super::{
    DEFAULT_HTML_EXCLUDE_SELECTOR, DEFAULT_HTML_SELECTOR, DEFAULT_MAX_FILE_SIZE, DocumentLoader,
    LoadFuture, checked_path,
};
use crate::error::{ChunkError, Result};
use crate::types::{Document, Metadata};

/// Extracts readable text from saved HTML pages.
///
/// The text of every element matching `selector` becomes one paragraph; the
/// paragraphs are joined with blank lines so the splitter's paragraph
/// separator sees them. A match nested inside another match is part of the
/// outer paragraph and is not emitted again. Matches inside an element
/// matching `exclude` are dropped; an empty `exclude` keeps everything.
pub struct HtmlLoader {
    pub max_file_size: u64,
    pub selector: String,
    pub exclude: String,
}

impl Default for HtmlLoader {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            selector: DEFAULT_HTML_SELECTOR.into(),
            exclude: DEFAULT_HTML_EXCLUDE_SELECTOR.into(),
        }
    }
}

/// Check that `selector` parses as a CSS selector list.
///
/// # Errors
///
/// Returns `InvalidConfiguration` naming the selector.
pub fn validate_selector(selector: &str) -> Result<()> {
    Soup::parse("")
        .find_all(selector)
        .map(|_| ())
        .map_err(|e| {
            ChunkError::InvalidConfiguration(format!("invalid selector {selector:?}: {e}"))
        })
}

fn select<'a>(soup: &'a Soup, selector: &str) -> Result<Vec<Tag<'a>>> {
    soup.find_all(selector)
        .map_err(|e| ChunkError::Parse(format!("invalid selector {selector:?}: {e}")))
}

/// Page title and the text blocks matching `selector`, in document order.
fn extract(html: &str, selector: &str, exclude: &str) -> Result<(Option<String>, Vec<String>)> {
    let soup = Soup::parse(html);

    let tags = select(&soup, selector)?;
    let excluded: HashSet<NodeId> = if exclude.trim().is_empty() {
        HashSet::new()
    } else {
        select(&soup, exclude)?.iter().map(Tag::node_id).collect()
    };
    let matched: HashSet<NodeId> = tags.iter().map(Tag::node_id).collect();

    let blocks = tags
        .iter()
        .filter(|tag| {
            !excluded.contains(&tag.node_id())
                && !tag.parents().any(|p| {
                    let id = p.node_id();
                    matched.contains(&id) || excluded.contains(&id)
                })
        })
        .map(|tag| collapse_whitespace(&tag.text()))
        .filter(|text| !text.is_empty())
        .collect();

    let title = select(&soup, "title")?
        .into_iter()
        .map(|tag| collapse_whitespace(&tag.text()))
        .find(|text| !text.is_empty());

    Ok((title, blocks))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

impl DocumentLoader for HtmlLoader {
    fn load(&self, path: &Path) -> LoadFuture<'_> {
        let path = path.to_path_buf();
        let max_size = self.max_file_size;
        let selector = self.selector.clone();
        let exclude = self.exclude.clone();
        Box::pin(async move {
            let path = checked_path(&path, max_size).await?;
            let html = tokio::fs::read_to_string(&path).await?;

            let (title, blocks) =
                tokio::task::spawn_blocking(move || extract(&html, &selector, &exclude))
                    .await
                    .map_err(|e| ChunkError::Parse(format!("extraction task failed: {e}")))??;

            let mut metadata = Metadata::new();
            metadata.insert("content_type".into(), Some("text/html".into()));
            if let Some(title) = title {
                metadata.insert("title".into(), Some(title.into()));
            }

            Ok(vec![
                Document::new(path.display().to_string(), blocks.join("\n\n"))
                    .with_metadata(metadata),
            ])
        })
    }

    fn supported_extensions(&self) -> &[&str] {
        &["html", "htm"]
    }
}
