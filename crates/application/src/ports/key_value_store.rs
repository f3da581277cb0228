//! Key-value storage port
//!
//! Models a synchronous, string-keyed persistent store with a bounded
//! capacity, shared by everything running against the same origin.

use std::fmt::Debug;

#[cfg(test)]
use mockall::automock;

use crate::error::ApplicationError;

/// Port for the persistent key-value store drafts are written to
///
/// Values are opaque strings; callers handle serialization. Writes may be
/// rejected when the store is full, in which case the previous value for
/// the key is left in place.
#[cfg_attr(test, automock)]
pub trait KeyValueStorePort: Send + Sync + Debug {
    /// Read the value stored under `key`
    fn get(&self, key: &str) -> Result<Option<String>, ApplicationError>;

    /// Store `value` under `key`, replacing any previous value
    fn set(&self, key: &str, value: &str) -> Result<(), ApplicationError>;

    /// Remove `key`; removing a missing key is not an error
    fn remove(&self, key: &str) -> Result<(), ApplicationError>;
}
