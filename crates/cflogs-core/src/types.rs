//! Core types for cflogs-core.
//!
//! This module defines the transport envelope ([`Batch`] of [`RawRecord`]),
//! the positional [`ParsedFields`] view of a decoded log line, the persisted
//! [`NormalizedRecord`] and the batch-level [`BatchOutcome`].

use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::BatchFailure;

/// Literal substituted for an empty or absent method or user agent.
pub const UNKNOWN: &str = "UNKNOWN";

/// Acknowledgement body returned when every record in a batch succeeded.
pub const SUCCESS_BODY: &str = "Processed CloudFront logs successfully";

/// One batch of records, shaped like a Kinesis stream event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    #[serde(rename = "Records")]
    pub records: Vec<RawRecord>,
}

impl Batch {
    pub fn new(records: Vec<RawRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// A single transport entry.
///
/// Only `kinesis.data` is read. Every other property of the envelope is kept
/// as-is so a failed record can be reported back to the transport verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub kinesis: KinesisData,
    #[serde(flatten)]
    pub envelope: Map<String, Value>,
}

/// The `kinesis` object of a [`RawRecord`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KinesisData {
    /// Base64-encoded log line.
    pub data: String,
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

impl RawRecord {
    /// Wrap an already base64-encoded payload.
    pub fn new(data: impl Into<String>) -> Self {
        Self {
            kinesis: KinesisData {
                data: data.into(),
                metadata: Map::new(),
            },
            envelope: Map::new(),
        }
    }

    /// Base64-encode `payload` and wrap it.
    pub fn from_payload(payload: impl AsRef<[u8]>) -> Self {
        Self::new(base64::engine::general_purpose::STANDARD.encode(payload))
    }

    pub fn data(&self) -> &str {
        &self.kinesis.data
    }
}

/// The seven positional fields of a tab-separated CloudFront log line.
///
/// A field is `None` when the line has fewer tabs than its position. Content
/// after the seventh field is ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParsedFields<'a> {
    pub timestamp: Option<&'a str>,
    pub ip: Option<&'a str>,
    pub method: Option<&'a str>,
    pub uri: Option<&'a str>,
    pub status: Option<&'a str>,
    pub user_agent: Option<&'a str>,
    pub referer: Option<&'a str>,
}

impl<'a> ParsedFields<'a> {
    pub fn split(line: &'a str) -> Self {
        let mut parts = line.split('\t');
        Self {
            timestamp: parts.next(),
            ip: parts.next(),
            method: parts.next(),
            uri: parts.next(),
            status: parts.next(),
            user_agent: parts.next(),
            referer: parts.next(),
        }
    }
}

/// The record persisted to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub visitor_ip: String,
    /// ISO-8601 instant with millisecond precision, e.g. `2023-11-14T22:13:20.123Z`.
    pub timestamp: String,
    pub path: String,
    pub method: String,
    pub status: i64,
    pub user_agent: String,
    pub referer: Option<String>,
    /// UNIX seconds after which the store's reaper may delete the item.
    pub expiration_time: i64,
}

/// Result of processing one batch.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchOutcome {
    Success,
    /// Records that failed validation or storage, in batch order.
    PartialFailure(Vec<RawRecord>),
}

impl BatchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, BatchOutcome::Success)
    }

    pub fn failed(&self) -> &[RawRecord] {
        match self {
            BatchOutcome::Success => &[],
            BatchOutcome::PartialFailure(failed) => failed,
        }
    }

    /// What the invoking transport sees: an acknowledgement, or an error
    /// carrying every failed record.
    pub fn into_result(self) -> Result<Acknowledgement, BatchFailure> {
        match self {
            BatchOutcome::Success => Ok(Acknowledgement::default()),
            BatchOutcome::PartialFailure(failed) => Err(BatchFailure { failed }),
        }
    }
}

/// Per-batch counters, one entry per terminal record state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub stored: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.stored + self.skipped + self.failed
    }
}

/// Success payload handed back to the invoker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acknowledgement {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: String,
}

impl Default for Acknowledgement {
    fn default() -> Self {
        Self {
            status_code: 200,
            body: SUCCESS_BODY.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
