use thiserror::Error;

use crate::types::RawRecord;

/// A record that decoded but could not be normalized. The raw record is
/// reported back to the transport for redelivery.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid base64 payload: {0}")]
    InvalidBase64(String),

    #[error("timestamp {0:?} is not a representable UNIX time")]
    InvalidTimestamp(String),

    #[error("malformed percent-encoding in {field}: {value:?}")]
    MalformedPercentEncoding { field: &'static str, value: String },
}

impl From<base64::DecodeError> for ValidationError {
    fn from(err: base64::DecodeError) -> Self {
        ValidationError::InvalidBase64(err.to_string())
    }
}

/// The store did not accept a write.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store request failed: {0}")]
    Http(String),

    #[error("store responded with HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("failed to encode item: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("store rejected the write: {0}")]
    Rejected(String),
}

/// Why one record ended up in the failed set.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("storage failed: {0}")]
    Storage(#[from] StoreError),
}

/// Aggregate error for a batch with at least one failed record.
///
/// The message carries the failed records as JSON so the invoking transport
/// can decide what to redeliver.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Some records failed: {}", records_json(.failed))]
pub struct BatchFailure {
    pub failed: Vec<RawRecord>,
}

impl BatchFailure {
    pub fn count(&self) -> usize {
        self.failed.len()
    }
}

fn records_json(records: &[RawRecord]) -> String {
    serde_json::to_string(records).unwrap_or_else(|err| format!("<unserializable: {err}>"))
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no table configured: set DYNAMODB_TABLE")]
    MissingTable,

    #[error("concurrency must be at least 1")]
    InvalidConcurrency,

    #[error(transparent)]
    Load(#[from] config::ConfigError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
