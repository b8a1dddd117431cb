//! Domain-specific assertion macros for cflogs harnesses.
//!
//! These wrap `pretty_assertions` and add context-rich failure messages that
//! make it clear which record and which pipeline stage broke.

use cflogs_core::{Normalization, NormalizedRecord};

// ---------------------------------------------------------------------------
// Normalization assertions
// ---------------------------------------------------------------------------

/// Unwrap a normalization into its record, panicking with the line otherwise.
pub fn expect_record(line: &str, result: Result<Normalization, cflogs_core::ValidationError>) -> NormalizedRecord {
    match result {
        Ok(Normalization::Record(record)) => record,
        Ok(Normalization::Skip(skipped)) => panic!(
            "expected a record, line was skipped (missing {}):\n  line: {:?}",
            skipped.missing, line
        ),
        Err(err) => panic!("expected a record, validation failed: {err}\n  line: {line:?}"),
    }
}

/// Assert that a normalization result is a skip.
///
/// ```rust
/// assert_skipped!(normalizer.normalize(&data), line);
/// ```
#[macro_export]
macro_rules! assert_skipped {
    ($result:expr, $line:expr) => {{
        match $result {
            Ok(cflogs_core::Normalization::Skip(_)) => {}
            other => panic!(
                "assert_skipped! failed:\n  line:   {:?}\n  result: {:?}",
                $line, other
            ),
        }
    }};
}

/// Assert that a normalization result is a validation failure.
#[macro_export]
macro_rules! assert_invalid {
    ($result:expr, $line:expr) => {{
        match $result {
            Err(_) => {}
            other => panic!(
                "assert_invalid! failed:\n  line:   {:?}\n  result: {:?}",
                $line, other
            ),
        }
    }};
}

// ---------------------------------------------------------------------------
// Batch outcome assertions
// ---------------------------------------------------------------------------

/// Assert that a batch outcome failed exactly `n` records.
///
/// ```rust
/// assert_failed_count!(outcome, 2);
/// ```
#[macro_export]
macro_rules! assert_failed_count {
    ($outcome:expr, $n:expr) => {{
        let outcome: &cflogs_core::BatchOutcome = &$outcome;
        let expected: usize = $n;
        let actual = outcome.failed().len();
        if actual != expected || (expected > 0 && outcome.is_success()) {
            panic!(
                "assert_failed_count! failed:\n  expected: {} failed records\n  actual:   {}\n  outcome:  {:?}",
                expected, actual, outcome
            );
        }
    }};
}
