//! cflogs: CloudFront real-time access log loader.
//!
//! Reads Kinesis-style batches of base64 log lines, normalizes each line and
//! writes it to a DynamoDB-compatible table with a 90-day expiry marker. The
//! workspace crates are re-exported here so integration tests and the binary
//! share one import path.
//!
//! # Architecture
//!
//! ```text
//! Feed (file | stdin | POST /invoke) ──► BatchProcessor ──► RecordStore
//!                                             │           (DynamoDB | memory)
//!                                             └──► Acknowledgement | BatchFailure
//! ```
//!
//! The store client is built once per process and shared by every batch.

pub mod runner;
pub mod server;

pub use cflogs_core;
pub use cflogs_dynamo;
pub use cflogs_feeds;

use std::sync::Arc;

use cflogs_core::config::Config;
use cflogs_core::{MemoryStore, RecordStore};
use cflogs_dynamo::DynamoClient;

/// Build the process-wide store client. `dry_run` keeps writes in memory.
pub fn build_store(config: &Config, dry_run: bool) -> anyhow::Result<Arc<dyn RecordStore>> {
    if dry_run {
        tracing::info!(table = %config.store.table, "dry run: records are kept in memory");
        return Ok(Arc::new(MemoryStore::new()));
    }
    let client = DynamoClient::from_config(&config.store)?;
    tracing::info!(
        table = %config.store.table,
        endpoint = %client.endpoint(),
        "store client ready"
    );
    Ok(Arc::new(client))
}
