//! Configuration loading and the file-to-JSONL ingest runner.

pub mod config;
pub mod ingest;

pub use config::Config;
pub use ingest::{collect_inputs, run};
