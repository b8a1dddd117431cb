//! Store: the outbound key-value boundary.
//!
//! Every normalized record is written with exactly one unconditional
//! insert-or-overwrite call. Expiry is left to the store's own reaper, driven
//! by the record's `expiration_time`.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::types::NormalizedRecord;

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert or overwrite `record` in `table`.
    async fn put(&self, table: &str, record: &NormalizedRecord) -> Result<(), StoreError>;
}

type FailurePredicate = Box<dyn Fn(&NormalizedRecord) -> bool + Send + Sync>;

/// Item key: table, then the `(visitor_ip, timestamp)` key schema.
type ItemKey = (String, String, String);

/// In-memory [`RecordStore`], used for dry runs and tests.
///
/// Writes for which the optional failure predicate returns `true` are
/// rejected with [`StoreError::Rejected`] and not stored.
#[derive(Default)]
pub struct MemoryStore {
    items: Mutex<BTreeMap<ItemKey, NormalizedRecord>>,
    attempts: AtomicUsize,
    fail_when: Option<FailurePredicate>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_when<F>(predicate: F) -> Self
    where
        F: Fn(&NormalizedRecord) -> bool + Send + Sync + 'static,
    {
        Self {
            fail_when: Some(Box::new(predicate)),
            ..Self::default()
        }
    }

    /// Number of `put` calls, successful or not.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, table: &str, visitor_ip: &str, timestamp: &str) -> Option<NormalizedRecord> {
        self.lock()
            .get(&(table.to_string(), visitor_ip.to_string(), timestamp.to_string()))
            .cloned()
    }

    /// All stored records of `table`, in key order.
    pub fn records(&self, table: &str) -> Vec<NormalizedRecord> {
        self.lock()
            .iter()
            .filter(|((t, _, _), _)| t == table)
            .map(|(_, record)| record.clone())
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<ItemKey, NormalizedRecord>> {
        // A panic while holding the lock cannot leave the map half-written.
        self.items.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("len", &self.len())
            .field("attempts", &self.attempts())
            .finish()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn put(&self, table: &str, record: &NormalizedRecord) -> Result<(), StoreError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        if self.fail_when.as_ref().is_some_and(|fail| fail(record)) {
            return Err(StoreError::Rejected(format!(
                "write of {} at {} refused",
                record.visitor_ip, record.timestamp
            )));
        }

        self.lock().insert(
            (
                table.to_string(),
                record.visitor_ip.clone(),
                record.timestamp.clone(),
            ),
            record.clone(),
        );
        Ok(())
    }
}
