//! Redb embedded key-value store
//!
//! Persists the draft entries on disk in a single string table so they
//! survive restarts. Each `set` and `remove` is its own ACID transaction.

use std::{
    fmt::Display,
    fs,
    path::{Path, PathBuf},
};

use application::{error::ApplicationError, ports::KeyValueStorePort};
use redb::{
    Database, DatabaseError, ReadableDatabase, ReadableTable, StorageError, TableDefinition,
};
use tracing::{debug, instrument, warn};

/// Table holding all key-value entries
const ENTRIES_TABLE: TableDefinition<&str, &str> = TableDefinition::new("entries");

/// Redb-backed key-value store
///
/// # Auto-Recovery
///
/// If the database file is corrupted or written by an incompatible format
/// version, it is deleted and a fresh database is created in its place. A
/// file that is merely locked by another process, or that cannot be read
/// for I/O or permission reasons, is left untouched and reported as a
/// storage error.
pub struct RedbKeyValueStore {
    db: Database,
    path: Option<PathBuf>,
    capacity_bytes: Option<usize>,
}

impl std::fmt::Debug for RedbKeyValueStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbKeyValueStore")
            .field("db", &"<Database>")
            .field("path", &self.path)
            .field("capacity_bytes", &self.capacity_bytes)
            .finish()
    }
}

impl RedbKeyValueStore {
    /// Open or create a store at `path`
    ///
    /// # Errors
    ///
    /// Returns [`ApplicationError::Storage`] if the file is locked by another
    /// handle or cannot be accessed, and an internal error if a corrupted
    /// file cannot be replaced.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ApplicationError> {
        let path_buf = path.as_ref().to_path_buf();

        let db = match Database::create(&path_buf) {
            Ok(db) => db,
            Err(e) if is_unreadable_file(&e) => {
                warn!(
                    path = %path_buf.display(),
                    error = %e,
                    "Draft database corrupted or incompatible, recreating"
                );
                fs::remove_file(&path_buf).map_err(|e| {
                    ApplicationError::Internal(format!("Failed to remove corrupted database: {e}"))
                })?;
                Database::create(&path_buf).map_err(|e| {
                    ApplicationError::Internal(format!("Failed to create Redb database: {e}"))
                })?
            },
            Err(e) => {
                return Err(ApplicationError::Storage(format!(
                    "Failed to open draft database {}: {e}",
                    path_buf.display()
                )));
            },
        };

        Self::with_database(db, Some(path_buf))
    }

    /// Create a store that lives only in memory
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory backend cannot be initialized.
    pub fn in_memory() -> Result<Self, ApplicationError> {
        let db = Database::builder()
            .create_with_backend(redb::backends::InMemoryBackend::new())
            .map_err(|e| {
                ApplicationError::Internal(format!("Failed to create in-memory Redb: {e}"))
            })?;
        Self::with_database(db, None)
    }

    /// Reject writes once keys and values together exceed `bytes`
    #[must_use]
    pub const fn with_capacity_bytes(mut self, bytes: usize) -> Self {
        self.capacity_bytes = Some(bytes);
        self
    }

    /// File backing this store, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn with_database(db: Database, path: Option<PathBuf>) -> Result<Self, ApplicationError> {
        // Opening the table inside a write transaction creates it
        let write_txn = db
            .begin_write()
            .map_err(internal("Failed to begin write transaction"))?;
        {
            let _ = write_txn
                .open_table(ENTRIES_TABLE)
                .map_err(internal("Failed to open entries table"))?;
        }
        write_txn
            .commit()
            .map_err(internal("Failed to commit transaction"))?;

        Ok(Self {
            db,
            path,
            capacity_bytes: None,
        })
    }
}

impl KeyValueStorePort for RedbKeyValueStore {
    #[instrument(skip(self))]
    fn get(&self, key: &str) -> Result<Option<String>, ApplicationError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(storage("Failed to begin read transaction"))?;
        let table = read_txn
            .open_table(ENTRIES_TABLE)
            .map_err(storage("Failed to open entries table"))?;

        let value = table
            .get(key)
            .map_err(storage("Failed to read entry"))?
            .map(|guard| guard.value().to_string());
        debug!(found = value.is_some(), "Read entry");
        Ok(value)
    }

    #[instrument(skip(self, value), fields(bytes = value.len()))]
    fn set(&self, key: &str, value: &str) -> Result<(), ApplicationError> {
        let write_txn = self
            .db
            .begin_write()
            .map_err(storage("Failed to begin write transaction"))?;
        {
            let mut table = write_txn
                .open_table(ENTRIES_TABLE)
                .map_err(storage("Failed to open entries table"))?;

            if let Some(capacity) = self.capacity_bytes {
                let mut others = 0usize;
                for entry in table.iter().map_err(storage("Failed to scan entries"))? {
                    let (k, v) = entry.map_err(storage("Failed to scan entries"))?;
                    if k.value() != key {
                        others += k.value().len() + v.value().len();
                    }
                }
                let required = key.len() + value.len();
                let available = capacity.saturating_sub(others);
                if required > available {
                    warn!(required, available, "Store quota exceeded");
                    // Dropping the transaction without commit aborts it
                    return Err(ApplicationError::QuotaExceeded {
                        key: key.to_string(),
                        required,
                        available,
                    });
                }
            }

            table
                .insert(key, value)
                .map_err(storage("Failed to write entry"))?;
        }
        write_txn
            .commit()
            .map_err(storage("Failed to commit entry"))?;
        debug!("Stored entry");
        Ok(())
    }

    #[instrument(skip(self))]
    fn remove(&self, key: &str) -> Result<(), ApplicationError> {
        let write_txn = self
            .db
            .begin_write()
            .map_err(storage("Failed to begin write transaction"))?;
        {
            let mut table = write_txn
                .open_table(ENTRIES_TABLE)
                .map_err(storage("Failed to open entries table"))?;
            table
                .remove(key)
                .map_err(storage("Failed to remove entry"))?;
        }
        write_txn
            .commit()
            .map_err(storage("Failed to commit removal"))?;
        Ok(())
    }
}

/// Whether the file content itself is unusable, as opposed to the file
/// being locked or inaccessible
fn is_unreadable_file(error: &DatabaseError) -> bool {
    matches!(
        error,
        DatabaseError::UpgradeRequired(_) | DatabaseError::Storage(StorageError::Corrupted(_))
    )
}

fn storage<E: Display>(context: &'static str) -> impl FnOnce(E) -> ApplicationError {
    move |e| ApplicationError::Storage(format!("{context}: {e}"))
}

fn internal<E: Display>(context: &'static str) -> impl FnOnce(E) -> ApplicationError {
    move |e| ApplicationError::Internal(format!("{context}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_set_get_remove() {
        let store = RedbKeyValueStore::in_memory().unwrap();
        assert_eq!(store.get("k").unwrap(), None);

        store.set("k", "v1").unwrap();
        store.set("k", "v2").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v2"));

        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn removing_missing_key_is_ok() {
        let store = RedbKeyValueStore::in_memory().unwrap();
        assert!(store.remove("missing").is_ok());
    }

    #[test]
    fn quota_aborts_write() {
        let store = RedbKeyValueStore::in_memory()
            .unwrap()
            .with_capacity_bytes(16);
        store.set("k", "short").unwrap();

        let err = store.set("k", "far too long a value").unwrap_err();
        assert!(matches!(err, ApplicationError::QuotaExceeded { .. }));
        assert_eq!(store.get("k").unwrap().as_deref(), Some("short"));
    }

    #[test]
    fn second_open_of_locked_file_keeps_existing_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("drafts.redb");

        let first = RedbKeyValueStore::open(&path).unwrap();
        first.set("invoice_drafts", "[1]").unwrap();

        let err = RedbKeyValueStore::open(&path).unwrap_err();
        assert!(matches!(err, ApplicationError::Storage(_)));
        assert_eq!(first.get("invoice_drafts").unwrap().as_deref(), Some("[1]"));

        drop(first);
        let reopened = RedbKeyValueStore::open(&path).unwrap();
        assert_eq!(
            reopened.get("invoice_drafts").unwrap().as_deref(),
            Some("[1]")
        );
    }

    #[test]
    fn corruption_is_recognised() {
        assert!(is_unreadable_file(&DatabaseError::Storage(
            StorageError::Corrupted("bad magic".to_string())
        )));
        assert!(is_unreadable_file(&DatabaseError::UpgradeRequired(2)));
        assert!(!is_unreadable_file(&DatabaseError::DatabaseAlreadyOpen));
        assert!(!is_unreadable_file(&DatabaseError::Storage(StorageError::Io(
            std::io::Error::from(std::io::ErrorKind::PermissionDenied)
        ))));
    }

    #[test]
    fn in_memory_has_no_path() {
        assert!(RedbKeyValueStore::in_memory().unwrap().path().is_none());
    }
}
