//! Serialized layout of drafts in the key-value store
//!
//! Two entries are kept: the full draft collection and a metadata
//! projection of it. They are written one after the other with no
//! transaction, so the projection may lag behind after a crash; the draft
//! collection is always the source of truth.

use std::sync::Arc;

use domain::{Draft, DraftCollection, DraftMetadata};
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::{error::ApplicationError, ports::KeyValueStorePort};

/// Store key holding the serialized draft collection
pub const DRAFTS_KEY: &str = "invoice_drafts";

/// Store key holding the serialized metadata projection
pub const METADATA_KEY: &str = "invoice_drafts_metadata";

#[derive(Debug)]
pub(super) struct DraftStorage {
    store: Arc<dyn KeyValueStorePort>,
}

impl DraftStorage {
    pub(super) fn new(store: Arc<dyn KeyValueStorePort>) -> Self {
        Self { store }
    }

    /// Read the draft collection; a malformed value reads as empty
    pub(super) fn read_drafts(&self) -> Result<DraftCollection, ApplicationError> {
        let drafts: Vec<Draft> = self.read_list(DRAFTS_KEY)?;
        Ok(DraftCollection::from(drafts))
    }

    /// Read the metadata projection; a malformed value reads as empty
    pub(super) fn read_metadata(&self) -> Result<Vec<DraftMetadata>, ApplicationError> {
        self.read_list(METADATA_KEY)
    }

    /// Write the collection followed by its regenerated projection
    pub(super) fn write(&self, drafts: &DraftCollection) -> Result<(), ApplicationError> {
        let drafts_json = serde_json::to_string(drafts.as_slice())?;
        let metadata_json = serde_json::to_string(&drafts.metadata())?;
        self.store.set(DRAFTS_KEY, &drafts_json)?;
        self.store.set(METADATA_KEY, &metadata_json)
    }

    pub(super) fn write_drafts(&self, drafts: &DraftCollection) -> Result<(), ApplicationError> {
        let json = serde_json::to_string(drafts.as_slice())?;
        self.store.set(DRAFTS_KEY, &json)
    }

    pub(super) fn write_metadata(&self, metadata: &[DraftMetadata]) -> Result<(), ApplicationError> {
        let json = serde_json::to_string(metadata)?;
        self.store.set(METADATA_KEY, &json)
    }

    /// Remove both entries, attempting the second even if the first fails
    pub(super) fn clear(&self) -> Result<(), ApplicationError> {
        let drafts = self.store.remove(DRAFTS_KEY);
        let metadata = self.store.remove(METADATA_KEY);
        drafts.and(metadata)
    }

    fn read_list<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>, ApplicationError> {
        let Some(raw) = self.store.get(key)? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str(&raw) {
            Ok(values) => Ok(values),
            Err(e) => {
                warn!(key = %key, error = %e, "Stored value is malformed, treating as empty");
                Ok(Vec::new())
            },
        }
    }
}
