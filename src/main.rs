use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use sitechunk_chunker::{BatchReport, TokenizerKind};
use sitechunk_core::Config;

/// Split crawled pages into token-bounded, overlapping chunks.
#[derive(Debug, Parser)]
#[command(name = "sitechunk", version)]
struct Cli {
    /// Path to config file (default: $SITECHUNK_CONFIG or sitechunk.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// JSONL output file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Maximum tokens per chunk
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Minimum tokens shared by adjacent chunks
    #[arg(long)]
    chunk_overlap: Option<usize>,

    /// Tokenizer: cl100k_base, o200k_base, p50k_base or char_estimate
    #[arg(long)]
    tokenizer: Option<TokenizerKind>,

    /// Files or directories to chunk
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
}

impl Cli {
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(path) = &self.output {
            config.output.path.clone_from(path);
        }
        if let Some(size) = self.chunk_size {
            config.chunker.chunk_size = size;
        }
        if let Some(overlap) = self.chunk_overlap {
            config.chunker.chunk_overlap = overlap;
        }
        if let Some(kind) = self.tokenizer {
            config.chunker.tokenizer = kind;
        }
    }
}

fn print_report(report: &BatchReport, config: &Config) {
    println!("documents processed: {}", report.documents_processed);
    println!("chunks emitted:      {}", report.chunks_emitted);
    println!("output:              {}", config.output.path.display());
    if report.blank_chunks_dropped > 0 {
        println!("blank chunks dropped: {}", report.blank_chunks_dropped);
    }
    if !report.skipped.is_empty() {
        println!("skipped documents ({}):", report.skipped.len());
        for skipped in &report.skipped {
            println!("  {}: {}", skipped.source_id, skipped.reason);
        }
    }
    if !report.oversized_chunks.is_empty() {
        println!(
            "oversized chunks over {} tokens ({}):",
            config.chunker.chunk_size,
            report.oversized_chunks.len()
        );
        for id in &report.oversized_chunks {
            println!("  {id}");
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config_path = Config::resolve_path(cli.config.as_deref());
    let mut config = Config::load(&config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))?;
    cli.apply_overrides(&mut config);
    config.validate()?;

    let report = sitechunk_core::run(&config, &cli.inputs).await?;
    print_report(&report, &config);
    Ok(())
}
