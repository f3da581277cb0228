//! Key-value store adapters
//!
//! - `memory_store`: process-local map, optionally bounded
//! - `redb_store`: embedded on-disk database

mod memory_store;
mod redb_store;

use std::sync::Arc;

use application::{error::ApplicationError, ports::KeyValueStorePort};
use tracing::info;

pub use memory_store::InMemoryKeyValueStore;
pub use redb_store::RedbKeyValueStore;

use crate::config::{StorageBackend, StorageConfig};

/// Open the store selected by `config`
///
/// # Errors
///
/// Returns an error if the on-disk database cannot be opened.
pub fn open_store(config: &StorageConfig) -> Result<Arc<dyn KeyValueStorePort>, ApplicationError> {
    let store: Arc<dyn KeyValueStorePort> = match config.backend {
        StorageBackend::Memory => Arc::new(match config.capacity_bytes {
            Some(bytes) => InMemoryKeyValueStore::with_capacity_bytes(bytes),
            None => InMemoryKeyValueStore::new(),
        }),
        StorageBackend::Redb => {
            let store = RedbKeyValueStore::open(&config.path)?;
            Arc::new(match config.capacity_bytes {
                Some(bytes) => store.with_capacity_bytes(bytes),
                None => store,
            })
        },
    };
    info!(
        backend = %config.backend,
        path = %config.path.display(),
        "Draft store opened"
    );
    Ok(store)
}
