//! File feed: reads event documents from a file on disk.

use std::collections::VecDeque;
use std::path::PathBuf;

use anyhow::Context;
use async_trait::async_trait;
use cflogs_core::Batch;

use crate::{parse_events, FeedHandle};

pub struct FileFeed {
    path: PathBuf,
    pending: Option<VecDeque<Batch>>,
}

impl FileFeed {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            pending: None,
        }
    }
}

#[async_trait]
impl FeedHandle for FileFeed {
    async fn next_batch(&mut self) -> anyhow::Result<Option<Batch>> {
        if self.pending.is_none() {
            let input = tokio::fs::read_to_string(&self.path)
                .await
                .with_context(|| format!("failed to read {}", self.path.display()))?;
            let batches = parse_events(&input)
                .with_context(|| format!("failed to parse {}", self.path.display()))?;
            tracing::debug!(path = %self.path.display(), batches = batches.len(), "loaded event file");
            self.pending = Some(batches.into());
        }
        Ok(self.pending.as_mut().and_then(VecDeque::pop_front))
    }
}
