use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, RwLock};

use thiserror::Error;

use crate::ItemAddress;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The persistence layer could not be read or written.
    #[error("store unavailable: {0}")]
    Unavailable(String),
    /// A persisted entry exists but could not be decoded.
    #[error("failed to decode {what}: {message}")]
    Decode { what: String, message: String },
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}

/// Durable cache of computed results keyed by [`ItemAddress`].
///
/// Implementations must be safe to share between the control thread and the
/// background runner; every call is persisted before it returns.
pub trait ResultStore: Send + Sync {
    /// True iff a value has been set for `addr`. Absent keys are not an error.
    fn has(&self, addr: &ItemAddress) -> Result<bool, StoreError>;
    /// Stored value for `addr`, never computed on demand.
    fn get(&self, addr: &ItemAddress) -> Result<Option<String>, StoreError>;
    /// Upsert; overwrites any previous value.
    fn set(&self, addr: &ItemAddress, result: &str) -> Result<(), StoreError>;
    fn clear_all(&self) -> Result<(), StoreError>;
}

/// Non-durable store backed by a map.
#[derive(Debug, Default)]
pub struct MemoryResultStore {
    entries: RwLock<HashMap<ItemAddress, String>>,
}

impl MemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned() -> StoreError {
    StoreError::Unavailable("store lock poisoned".to_string())
}

impl ResultStore for MemoryResultStore {
    fn has(&self, addr: &ItemAddress) -> Result<bool, StoreError> {
        let entries = self.entries.read().map_err(|_| poisoned())?;
        Ok(entries.contains_key(addr))
    }

    fn get(&self, addr: &ItemAddress) -> Result<Option<String>, StoreError> {
        let entries = self.entries.read().map_err(|_| poisoned())?;
        Ok(entries.get(addr).cloned())
    }

    fn set(&self, addr: &ItemAddress, result: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        entries.insert(addr.clone(), result.to_string());
        Ok(())
    }

    fn clear_all(&self) -> Result<(), StoreError> {
        self.entries.write().map_err(|_| poisoned())?.clear();
        Ok(())
    }
}

/// Named monotonically increasing counters used to tag batches.
pub trait SequenceSource: Send + Sync {
    /// Next value for `name`; the first value of a fresh counter is 1.
    fn next(&self, name: &str) -> Result<u64, StoreError>;
}

/// In-process counters.
#[derive(Debug, Default)]
pub struct AtomicSequence {
    counters: Mutex<HashMap<String, u64>>,
    total: AtomicU64,
}

impl AtomicSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of values handed out across all counters.
    pub fn issued(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }
}

impl SequenceSource for AtomicSequence {
    fn next(&self, name: &str) -> Result<u64, StoreError> {
        let mut counters = self.counters.lock().map_err(|_| poisoned())?;
        let counter = counters.entry(name.to_string()).or_insert(0);
        *counter += 1;
        self.total.fetch_add(1, Ordering::Relaxed);
        Ok(*counter)
    }
}
