//! Batch processor: one linear pass over a [`Batch`] with per-record error
//! containment.
//!
//! Each record ends in exactly one terminal state, each with its own log line:
//!
//! - **stored**: normalized and written (`info`)
//! - **skipped**: a required field is missing (`warn`), never retried
//! - **failed**: validation or store error (`error`), reported for redelivery
//!
//! No record's failure stops the batch. The outcome is decided once every
//! record has reached a terminal state.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{debug, error, info, instrument, warn};

use crate::clock::Clock;
use crate::config::Config;
use crate::error::{BatchFailure, RecordError};
use crate::normalizer::{Normalization, Normalizer};
use crate::store::RecordStore;
use crate::types::{Acknowledgement, Batch, BatchOutcome, BatchReport, RawRecord};

/// Terminal state of a record that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Disposition {
    Stored,
    Skipped,
}

pub struct BatchProcessor {
    normalizer: Normalizer,
    store: Arc<dyn RecordStore>,
    table: String,
    concurrency: usize,
}

impl BatchProcessor {
    /// Sequential processor with the default 90-day retention.
    pub fn new(store: Arc<dyn RecordStore>, table: impl Into<String>, clock: Arc<dyn Clock>) -> Self {
        Self {
            normalizer: Normalizer::new(clock),
            store,
            table: table.into(),
            concurrency: 1,
        }
    }

    pub fn from_config(config: &Config, store: Arc<dyn RecordStore>, clock: Arc<dyn Clock>) -> Self {
        Self::new(store, config.store.table.clone(), clock)
            .with_retention_days(config.processing.retention_days)
            .with_concurrency(config.processing.concurrency)
    }

    pub fn with_retention_days(mut self, days: u32) -> Self {
        self.normalizer = self.normalizer.with_retention_days(days);
        self
    }

    /// Maximum number of records in flight at once. `1` is strictly sequential.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub async fn process(&self, batch: &Batch) -> BatchOutcome {
        self.process_with_report(batch).await.0
    }

    /// Process a batch and report it the way the invoking transport expects.
    pub async fn invoke(&self, batch: &Batch) -> Result<Acknowledgement, BatchFailure> {
        self.process(batch).await.into_result()
    }

    #[instrument(skip_all, fields(table = %self.table, records = batch.len()))]
    pub async fn process_with_report(&self, batch: &Batch) -> (BatchOutcome, BatchReport) {
        debug!(
            event = %serde_json::to_string(batch).unwrap_or_default(),
            "received event"
        );

        let results: Vec<Result<Disposition, RecordError>> = if self.concurrency == 1 {
            let mut results = Vec::with_capacity(batch.len());
            for record in &batch.records {
                results.push(self.process_record(record).await);
            }
            results
        } else {
            // Futures are built up front so the stream holds no borrowing
            // closure. `buffered` yields in input order.
            let pending: Vec<_> = batch
                .records
                .iter()
                .map(|record| self.process_record(record))
                .collect();
            stream::iter(pending)
                .buffered(self.concurrency)
                .collect()
                .await
        };

        let mut report = BatchReport::default();
        let mut failed = Vec::new();
        for (record, result) in batch.records.iter().zip(results) {
            match result {
                Ok(Disposition::Stored) => report.stored += 1,
                Ok(Disposition::Skipped) => report.skipped += 1,
                Err(_) => {
                    report.failed += 1;
                    failed.push(record.clone());
                }
            }
        }

        if failed.is_empty() {
            debug!(stored = report.stored, skipped = report.skipped, "batch processed");
            (BatchOutcome::Success, report)
        } else {
            error!(
                failed = report.failed,
                stored = report.stored,
                skipped = report.skipped,
                "Failed records count: {}",
                report.failed
            );
            (BatchOutcome::PartialFailure(failed), report)
        }
    }

    async fn process_record(&self, record: &RawRecord) -> Result<Disposition, RecordError> {
        let result = self.normalize_and_store(record).await;
        match &result {
            Ok(Disposition::Stored) | Ok(Disposition::Skipped) => {}
            Err(RecordError::Validation(err)) => {
                error!(error = %err, data = %record.data(), "record failed validation");
            }
            Err(RecordError::Storage(err)) => {
                error!(error = %err, data = %record.data(), "record failed to store");
            }
        }
        result
    }

    async fn normalize_and_store(&self, record: &RawRecord) -> Result<Disposition, RecordError> {
        let normalized = match self.normalizer.normalize(record.data())? {
            Normalization::Record(normalized) => normalized,
            Normalization::Skip(skipped) => {
                warn!(missing = skipped.missing, line = %skipped.line, "skipping invalid record");
                return Ok(Disposition::Skipped);
            }
        };

        self.store.put(&self.table, &normalized).await?;

        info!(
            record = %serde_json::to_string(&normalized).unwrap_or_default(),
            "successfully inserted record"
        );
        Ok(Disposition::Stored)
    }
}

impl std::fmt::Debug for BatchProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchProcessor")
            .field("table", &self.table)
            .field("concurrency", &self.concurrency)
            .field("normalizer", &self.normalizer)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
