//! cflogs-feeds: inbound batch sources for cflogs.
//!
//! Each feed reads Kinesis-style event documents from somewhere and yields
//! one [`Batch`] at a time. Input is either a single JSON event document or
//! newline-delimited JSON with one event per line.

pub mod file;
pub mod stdin;

use std::path::PathBuf;

use anyhow::Context;
use async_trait::async_trait;
use cflogs_core::Batch;

pub use file::FileFeed;
pub use stdin::StdinFeed;

/// Trait implemented by each batch source.
#[async_trait]
pub trait FeedHandle: Send {
    /// The next batch, or `None` once the source is exhausted.
    async fn next_batch(&mut self) -> anyhow::Result<Option<Batch>>;
}

/// Open the file at `path`, or stdin when `path` is `None` or `-`.
pub fn open(path: Option<PathBuf>) -> Box<dyn FeedHandle> {
    match path {
        Some(path) if path.as_os_str() != "-" => Box::new(FileFeed::new(path)),
        _ => Box::new(StdinFeed::new()),
    }
}

/// Decode a whole input into batches.
///
/// A document that parses as one event is one batch. Otherwise every
/// non-blank line must be an event on its own.
pub fn parse_events(input: &str) -> anyhow::Result<Vec<Batch>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    if let Ok(batch) = serde_json::from_str::<Batch>(trimmed) {
        return Ok(vec![batch]);
    }

    input
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(i, line)| {
            serde_json::from_str::<Batch>(line)
                .with_context(|| format!("malformed event on line {}", i + 1))
        })
        .collect()
}
