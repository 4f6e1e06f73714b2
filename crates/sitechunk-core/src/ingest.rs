//! Chunk a set of input files and directories into the configured JSONL file.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::Context;
use sitechunk_chunker::{Batch, BatchReport, ChunkAssembler, JsonlSink, Loaders, TextSplitter};

use crate::config::Config;

/// Expand `inputs` into the files to load, in a stable order.
///
/// Directories are walked recursively, skipping hidden and git-ignored
/// entries and files no loader handles. Explicit file paths are kept as
/// given so that unsupported or missing files show up in the report.
#[must_use]
pub fn collect_inputs(inputs: &[PathBuf], loaders: &Loaders) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let mut found: Vec<PathBuf> = ignore::WalkBuilder::new(input)
                .hidden(true)
                .git_ignore(true)
                .build()
                .flatten()
                .filter(|e| {
                    e.file_type().is_some_and(|ft| ft.is_file()) && loaders.supports(e.path())
                })
                .map(ignore::DirEntry::into_path)
                .collect();
            found.sort();
            tracing::debug!(dir = %input.display(), files = found.len(), "walked input directory");
            files.extend(found);
        } else {
            files.push(input.clone());
        }
    }
    files
}

fn create_output(path: &Path) -> anyhow::Result<BufWriter<File>> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory {}", parent.display()))?;
    }
    let file = File::create(path)
        .with_context(|| format!("failed to create output file {}", path.display()))?;
    Ok(BufWriter::new(file))
}

/// Load, chunk and write every input.
///
/// Unreadable inputs are recorded in the report and skipped.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the output file
/// cannot be created or written.
pub async fn run(config: &Config, inputs: &[PathBuf]) -> anyhow::Result<BatchReport> {
    let splitter = TextSplitter::new(&config.chunker)?;
    let assembler = ChunkAssembler::new(splitter);
    let loaders = Loaders::new(&config.loader);

    let files = collect_inputs(inputs, &loaders);
    tracing::info!(
        files = files.len(),
        output = %config.output.path.display(),
        tokenizer = %config.chunker.tokenizer,
        chunk_size = config.chunker.chunk_size,
        chunk_overlap = config.chunker.chunk_overlap,
        "chunking started"
    );

    let sink = JsonlSink::new(create_output(&config.output.path)?);
    let mut batch = Batch::new(&assembler, sink);

    for path in &files {
        match loaders.load(path).await {
            Ok(documents) => {
                for document in documents {
                    batch
                        .submit(Ok(document))
                        .context("failed to write chunk output")?;
                }
            }
            Err(unreadable) => {
                batch
                    .submit(Err(unreadable))
                    .context("failed to write chunk output")?;
            }
        }
    }

    let (report, _) = batch.finish().context("failed to flush chunk output")?;
    Ok(report)
}
