//! Stdin feed: reads event documents from standard input (or any reader).
//!
//! Input is buffered until EOF before the first batch is returned.

use std::collections::VecDeque;

use anyhow::Context;
use async_trait::async_trait;
use cflogs_core::Batch;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::{parse_events, FeedHandle};

pub struct StdinFeed<R = tokio::io::Stdin> {
    reader: Option<R>,
    pending: VecDeque<Batch>,
}

impl StdinFeed {
    pub fn new() -> Self {
        Self::from_reader(tokio::io::stdin())
    }
}

impl Default for StdinFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> StdinFeed<R>
where
    R: AsyncRead + Unpin + Send,
{
    pub fn from_reader(reader: R) -> Self {
        Self {
            reader: Some(reader),
            pending: VecDeque::new(),
        }
    }
}

#[async_trait]
impl<R> FeedHandle for StdinFeed<R>
where
    R: AsyncRead + Unpin + Send,
{
    async fn next_batch(&mut self) -> anyhow::Result<Option<Batch>> {
        if let Some(mut reader) = self.reader.take() {
            let mut input = String::new();
            reader
                .read_to_string(&mut input)
                .await
                .context("failed to read stdin")?;
            self.pending = parse_events(&input)?.into();
            tracing::debug!(batches = self.pending.len(), "read events from stdin");
        }
        Ok(self.pending.pop_front())
    }
}
