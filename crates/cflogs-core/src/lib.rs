//! cflogs-core: CloudFront real-time log loader core library.
//!
//! This crate holds everything between the inbound transport and the outbound
//! key-value store: the batch envelope types, the record normalizer, the
//! batch processor and the storage boundary it writes through.
//!
//! # Architecture
//!
//! ```text
//! Feed ──► BatchProcessor ──► Normalizer ──► RecordStore
//!               │
//!               └──► BatchOutcome (Success | PartialFailure)
//! ```
//!
//! One batch is processed per invocation. Records never share state except
//! the failure accumulator owned by the processor for the duration of a batch.

pub mod clock;
pub mod config;
pub mod error;
pub mod normalizer;
pub mod processor;
pub mod store;
pub mod types;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{BatchFailure, ConfigError, RecordError, StoreError, ValidationError};
pub use normalizer::{Normalization, Normalizer, Skipped};
pub use processor::BatchProcessor;
pub use store::{MemoryStore, RecordStore};
pub use types::{Acknowledgement, Batch, BatchOutcome, BatchReport, NormalizedRecord, RawRecord};
