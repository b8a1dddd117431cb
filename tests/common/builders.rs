//! Test builders: ergonomic constructors for log lines, records and batches.
//!
//! These builders are designed for readability in test assertions, not for
//! production use. They panic on invalid input rather than returning `Result`.

use std::sync::Arc;

use cflogs_core::{Batch, BatchProcessor, FixedClock, RawRecord, RecordStore};

/// Table name used by every harness.
pub const TABLE: &str = "cloudfront-logs";

/// Instant the fixed test clock reports (2023-11-14T22:13:20Z).
pub const NOW: i64 = 1_700_000_000;

/// `expiration_time` expected for records processed at [`NOW`].
pub const EXPIRES: i64 = NOW + 90 * 86_400;

// ---------------------------------------------------------------------------
// LogLineBuilder
// ---------------------------------------------------------------------------

/// Fluent builder for tab-separated CloudFront log lines.
///
/// # Example
///
/// ```rust
/// let record = LogLineBuilder::new()
///     .ip("198.51.100.7")
///     .uri("/checkout")
///     .status("503")
///     .referer("https%3A%2F%2Fexample.com%2F")
///     .record();
/// ```
#[derive(Debug, Clone)]
pub struct LogLineBuilder {
    fields: Vec<String>,
}

impl Default for LogLineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl LogLineBuilder {
    pub fn new() -> Self {
        Self {
            fields: [
                "1700000000.123",
                "203.0.113.5",
                "GET",
                "/index.html",
                "200",
                "Mozilla%2F5.0",
                "-",
            ]
            .iter()
            .map(|f| f.to_string())
            .collect(),
        }
    }

    fn set(mut self, index: usize, value: impl Into<String>) -> Self {
        self.fields[index] = value.into();
        self
    }

    pub fn timestamp(self, value: impl Into<String>) -> Self {
        self.set(0, value)
    }

    pub fn ip(self, value: impl Into<String>) -> Self {
        self.set(1, value)
    }

    pub fn method(self, value: impl Into<String>) -> Self {
        self.set(2, value)
    }

    pub fn uri(self, value: impl Into<String>) -> Self {
        self.set(3, value)
    }

    pub fn status(self, value: impl Into<String>) -> Self {
        self.set(4, value)
    }

    pub fn user_agent(self, value: impl Into<String>) -> Self {
        self.set(5, value)
    }

    pub fn referer(self, value: impl Into<String>) -> Self {
        self.set(6, value)
    }

    /// Drop every field from `position` onward.
    pub fn truncate(mut self, position: usize) -> Self {
        self.fields.truncate(position);
        self
    }

    /// Append an extra trailing field (beyond the seventh).
    pub fn extra(mut self, value: impl Into<String>) -> Self {
        self.fields.push(value.into());
        self
    }

    pub fn line(&self) -> String {
        self.fields.join("\t")
    }

    pub fn record(&self) -> RawRecord {
        RawRecord::from_payload(self.line())
    }
}

// ---------------------------------------------------------------------------
// Convenience constructors
// ---------------------------------------------------------------------------

/// A valid record from visitor `ip`.
pub fn record_from(ip: &str) -> RawRecord {
    LogLineBuilder::new().ip(ip).record()
}

/// A record whose line lacks the visitor IP.
pub fn skipped_record() -> RawRecord {
    LogLineBuilder::new().ip("").record()
}

/// A record whose user agent has a truncated percent escape.
pub fn malformed_record() -> RawRecord {
    LogLineBuilder::new().user_agent("Mozilla%2").record()
}

/// Batch of raw lines, base64-encoded.
pub fn batch_of_lines(lines: &[&str]) -> Batch {
    Batch::new(lines.iter().map(RawRecord::from_payload).collect())
}

/// `n` valid records from distinct visitors `10.0.x.y`.
pub fn distinct_batch(n: usize) -> Batch {
    Batch::new(
        (0..n)
            .map(|i| record_from(&format!("10.0.{}.{}", i / 256, i % 256)))
            .collect(),
    )
}

/// Processor over `store` with the clock fixed at [`NOW`].
pub fn processor_with(store: Arc<dyn RecordStore>) -> BatchProcessor {
    BatchProcessor::new(store, TABLE, Arc::new(FixedClock::at_unix(NOW)))
}
