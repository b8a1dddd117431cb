//! Batch runner for `cflogs process`: drains a feed through the processor.

use std::io::Write;

use cflogs_core::{BatchProcessor, BatchReport};
use cflogs_feeds::FeedHandle;

/// Totals across every batch read from a feed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub batches: usize,
    pub failed_batches: usize,
    pub records: BatchReport,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.failed_batches == 0
    }
}

/// Process every batch from `feed`. Each acknowledgement is written to `out`
/// as one JSON line; each batch failure is written to `err`. A failed batch
/// does not stop the run.
pub async fn run_feed<O, E>(
    feed: &mut dyn FeedHandle,
    processor: &BatchProcessor,
    out: &mut O,
    err: &mut E,
) -> anyhow::Result<RunSummary>
where
    O: Write,
    E: Write,
{
    let mut summary = RunSummary::default();

    while let Some(batch) = feed.next_batch().await? {
        summary.batches += 1;
        let (outcome, report) = processor.process_with_report(&batch).await;
        summary.records.stored += report.stored;
        summary.records.skipped += report.skipped;
        summary.records.failed += report.failed;

        match outcome.into_result() {
            Ok(ack) => writeln!(out, "{}", serde_json::to_string(&ack)?)?,
            Err(failure) => {
                summary.failed_batches += 1;
                writeln!(err, "{failure}")?;
            }
        }
    }

    tracing::info!(
        batches = summary.batches,
        failed_batches = summary.failed_batches,
        stored = summary.records.stored,
        skipped = summary.records.skipped,
        failed = summary.records.failed,
        "feed drained"
    );
    Ok(summary)
}
