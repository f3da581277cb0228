//! In-process key-value store
//!
//! Holds everything in a map behind a lock. An optional byte capacity mimics
//! the quota of a browser-style local store, and the fault toggles let tests
//! simulate a store that stops answering.

use std::{
    collections::HashMap,
    sync::atomic::{AtomicBool, Ordering},
};

use application::{error::ApplicationError, ports::KeyValueStorePort};
use parking_lot::RwLock;
use tracing::{debug, warn};

/// Map-backed key-value store with optional quota
#[derive(Debug, Default)]
pub struct InMemoryKeyValueStore {
    entries: RwLock<HashMap<String, String>>,
    capacity_bytes: Option<usize>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl InMemoryKeyValueStore {
    /// Create an unbounded store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that rejects writes once keys and values exceed `bytes`
    #[must_use]
    pub fn with_capacity_bytes(bytes: usize) -> Self {
        Self {
            capacity_bytes: Some(bytes),
            ..Self::default()
        }
    }

    /// Make every subsequent `get` fail
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent `set` and `remove` fail
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Bytes currently used by keys and values
    pub fn used_bytes(&self) -> usize {
        self.entries
            .read()
            .iter()
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    fn check_writable(&self) -> Result<(), ApplicationError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(ApplicationError::Storage(
                "in-memory store is unavailable".to_string(),
            ));
        }
        Ok(())
    }
}

impl KeyValueStorePort for InMemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, ApplicationError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(ApplicationError::Storage(
                "in-memory store is unavailable".to_string(),
            ));
        }
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ApplicationError> {
        self.check_writable()?;
        let mut entries = self.entries.write();

        if let Some(capacity) = self.capacity_bytes {
            let others: usize = entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let required = key.len() + value.len();
            let available = capacity.saturating_sub(others);
            if required > available {
                warn!(key = %key, required, available, "Store quota exceeded");
                return Err(ApplicationError::QuotaExceeded {
                    key: key.to_string(),
                    required,
                    available,
                });
            }
        }

        entries.insert(key.to_string(), value.to_string());
        debug!(key = %key, bytes = value.len(), "Stored value");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), ApplicationError> {
        self.check_writable()?;
        self.entries.write().remove(key);
        Ok(())
    }
}
