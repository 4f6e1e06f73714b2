use std::path::PathBuf;

use sitechunk_chunker::{SourceHash, TokenizerKind};
use sitechunk_core::Config;

fn config_for(out: PathBuf) -> Config {
    let mut config = Config::default();
    config.output.path = out;
    config
}

fn read_records(path: &std::path::Path) -> Vec<serde_json::Value> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect()
}

#[tokio::test]
async fn run_chunks_directory_into_jsonl() {
    let input = tempfile::tempdir().unwrap();
    std::fs::write(input.path().join("long.txt"), ["the"; 1000].join(" ")).unwrap();
    std::fs::write(
        input.path().join("page.html"),
        "<html><head><title>Bees</title></head><body><h1>Bees</h1><p>Bees make honey.</p></body></html>",
    )
    .unwrap();

    let out_dir = tempfile::tempdir().unwrap();
    let out = out_dir.path().join("nested/train.jsonl");
    let config = config_for(out.clone());

    let report = sitechunk_core::run(&config, &[input.path().to_path_buf()])
        .await
        .unwrap();

    assert_eq!(report.documents_processed, 2);
    assert_eq!(report.chunks_emitted, 4);
    assert!(report.skipped.is_empty());
    assert!(report.oversized_chunks.is_empty());

    let records = read_records(&out);
    assert_eq!(records.len(), 4);

    let long = std::fs::canonicalize(input.path().join("long.txt")).unwrap();
    let long_source = long.display().to_string();
    let hash = SourceHash::of(&long_source);
    let long_ids: Vec<&str> = records
        .iter()
        .filter(|r| r["source"] == long_source.as_str())
        .map(|r| r["id"].as_str().unwrap())
        .collect();
    assert_eq!(
        long_ids,
        vec![
            format!("{hash}-0"),
            format!("{hash}-1"),
            format!("{hash}-2")
        ]
    );
}

#[tokio::test]
async fn unreadable_inputs_are_reported_not_fatal() {
    let input = tempfile::tempdir().unwrap();
    let good = input.path().join("good.md");
    std::fs::write(&good, "Some text.").unwrap();

    let out_dir = tempfile::tempdir().unwrap();
    let config = config_for(out_dir.path().join("out.jsonl"));

    let report = sitechunk_core::run(
        &config,
        &[good, input.path().join("missing.txt"), input.path().join("x.png")],
    )
    .await
    .unwrap();

    assert_eq!(report.documents_processed, 1);
    assert_eq!(report.skipped.len(), 2);
    assert_eq!(report.chunks_emitted, 1);
}

#[tokio::test]
async fn rerun_is_byte_identical() {
    let input = tempfile::tempdir().unwrap();
    std::fs::write(
        input.path().join("a.txt"),
        "First paragraph here.\n\nSecond paragraph follows with more words.",
    )
    .unwrap();

    let out_dir = tempfile::tempdir().unwrap();
    let mut config = config_for(out_dir.path().join("one.jsonl"));
    config.chunker.chunk_size = 6;
    config.chunker.chunk_overlap = 1;
    config.chunker.tokenizer = TokenizerKind::CharEstimate;

    sitechunk_core::run(&config, &[input.path().to_path_buf()])
        .await
        .unwrap();
    let first = std::fs::read(&config.output.path).unwrap();

    config.output.path = out_dir.path().join("two.jsonl");
    sitechunk_core::run(&config, &[input.path().to_path_buf()])
        .await
        .unwrap();
    let second = std::fs::read(&config.output.path).unwrap();

    assert!(!first.is_empty());
    assert_eq!(first, second);
}

#[tokio::test]
async fn invalid_configuration_fails_before_output() {
    let out_dir = tempfile::tempdir().unwrap();
    let out = out_dir.path().join("never.jsonl");
    let mut config = config_for(out.clone());
    config.chunker.chunk_overlap = config.chunker.chunk_size;

    let result = sitechunk_core::run(&config, &[]).await;
    assert!(result.is_err());
    assert!(!out.exists());
}

#[tokio::test]
async fn unwritable_output_is_fatal() {
    let out_dir = tempfile::tempdir().unwrap();
    // A directory cannot be opened as the output file.
    let config = config_for(out_dir.path().to_path_buf());
    assert!(sitechunk_core::run(&config, &[]).await.is_err());
}
