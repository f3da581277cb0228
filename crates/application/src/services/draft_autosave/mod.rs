//! Draft Autosave Service - Debounced persistence of invoice form drafts
//!
//! The service owns the debounce timers and all reads and writes of the
//! draft entries in the key-value store. It never reports failures to its
//! callers: storage errors are logged and the operation degrades to a no-op
//! or an empty result, since a lost draft is recoverable and a broken store
//! must not take the editor down with it.
//!
//! Every mutating operation, including a fired timer, runs under a single
//! write lock. `clear_all` cancels the timers and wipes storage while holding
//! it, so a timer armed before the clear can never bring a draft back.

mod storage;

use std::{
    sync::{Arc, Weak},
    time::Duration,
};

use domain::{
    DEFAULT_MAX_AGE_DAYS, DEFAULT_MAX_DRAFTS, Draft, DraftCollection, DraftId, DraftMetadata,
    InvoicePayload,
};
use parking_lot::Mutex;
use tracing::{debug, error, info, instrument, warn};

pub use storage::{DRAFTS_KEY, METADATA_KEY};
use storage::DraftStorage;

use super::debouncer::Debouncer;
use crate::{
    error::ApplicationError,
    ports::{ClockPort, KeyValueStorePort},
};

/// Default quiet period before a scheduled save is written
pub const DEFAULT_SAVE_DELAY: Duration = Duration::from_millis(2000);

/// Caller-side defaults for the per-call autosave parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutosavePolicy {
    /// Debounce window for scheduled saves
    pub delay: Duration,
    /// Maximum number of drafts kept; older ones are evicted
    pub max_drafts: usize,
    /// Age in days after which cleanup removes a draft
    pub max_age_days: u32,
}

impl Default for AutosavePolicy {
    fn default() -> Self {
        Self {
            delay: DEFAULT_SAVE_DELAY,
            max_drafts: DEFAULT_MAX_DRAFTS,
            max_age_days: DEFAULT_MAX_AGE_DAYS,
        }
    }
}

/// Autosave manager for invoice drafts
#[derive(Clone)]
pub struct DraftAutosaveService {
    inner: Arc<AutosaveInner>,
}

struct AutosaveInner {
    storage: DraftStorage,
    clock: Arc<dyn ClockPort>,
    timers: Debouncer<DraftId>,
    write_lock: Mutex<()>,
}

impl std::fmt::Debug for DraftAutosaveService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DraftAutosaveService")
            .field("pending_saves", &self.inner.timers.pending_count())
            .finish_non_exhaustive()
    }
}

impl DraftAutosaveService {
    /// Create a new autosave service over the given store and clock
    pub fn new(store: Arc<dyn KeyValueStorePort>, clock: Arc<dyn ClockPort>) -> Self {
        Self {
            inner: Arc::new(AutosaveInner {
                storage: DraftStorage::new(store),
                clock,
                timers: Debouncer::new(),
                write_lock: Mutex::new(()),
            }),
        }
    }

    /// Persist `payload` once no newer request for `id` arrives within `delay`
    ///
    /// Re-scheduling the same id restarts the delay and replaces the payload.
    /// Returns `false` if the save could not be scheduled (no async runtime).
    #[instrument(skip(self, payload), fields(draft_id = %id))]
    pub fn schedule_save(
        &self,
        id: DraftId,
        payload: InvoicePayload,
        delay: Duration,
        max_drafts: usize,
    ) -> bool {
        let inner: Weak<AutosaveInner> = Arc::downgrade(&self.inner);
        self.inner.timers.arm(id, delay, move |ticket| {
            let Some(inner) = inner.upgrade() else {
                return;
            };
            let _guard = inner.write_lock.lock();
            if inner.timers.claim(&ticket) {
                inner.persist(ticket.key(), payload, max_drafts);
            } else {
                debug!(draft_id = %ticket.key(), "Scheduled save was superseded");
            }
        })
    }

    /// Schedule a save using the policy's delay and draft limit
    pub fn schedule_save_with_policy(
        &self,
        id: DraftId,
        payload: InvoicePayload,
        policy: &AutosavePolicy,
    ) -> bool {
        self.schedule_save(id, payload, policy.delay, policy.max_drafts)
    }

    /// Persist `payload` immediately, bypassing the debounce
    ///
    /// Empty payloads are ignored. Returns the metadata of the stored draft
    /// once the draft collection is written, even if the metadata write
    /// then fails. Returns `None` if the draft is not in storage.
    #[instrument(skip(self, payload), fields(draft_id = %id))]
    pub fn save_now(
        &self,
        id: &DraftId,
        payload: InvoicePayload,
        max_drafts: usize,
    ) -> Option<DraftMetadata> {
        let _guard = self.inner.write_lock.lock();
        self.inner.persist(id, payload, max_drafts)
    }

    /// Save immediately using the policy's draft limit
    pub fn save_now_with_policy(
        &self,
        id: &DraftId,
        payload: InvoicePayload,
        policy: &AutosavePolicy,
    ) -> Option<DraftMetadata> {
        self.save_now(id, payload, policy.max_drafts)
    }

    /// Stored payload for `id`
    pub fn load_draft(&self, id: &DraftId) -> Option<InvoicePayload> {
        self.get_draft(id).map(|draft| draft.data)
    }

    /// Full stored draft for `id`
    pub fn get_draft(&self, id: &DraftId) -> Option<Draft> {
        self.inner.read_drafts().find(id).cloned()
    }

    /// All stored drafts, most recent first
    pub fn list_drafts(&self) -> Vec<Draft> {
        self.inner.read_drafts().into_vec()
    }

    /// Stored metadata projection, most recent first
    ///
    /// Cheaper than [`Self::list_drafts`] but may lag behind it if a previous
    /// write was interrupted.
    pub fn list_metadata(&self) -> Vec<DraftMetadata> {
        self.inner.storage.read_metadata().unwrap_or_else(|e| {
            warn!(error = %e, "Failed to read draft metadata");
            Vec::new()
        })
    }

    /// Remove the draft for `id` from both stored collections
    ///
    /// Deleting an unknown id writes nothing. Pending scheduled saves for
    /// `id` are left armed. Returns whether anything was removed.
    #[instrument(skip(self), fields(draft_id = %id))]
    pub fn delete_draft(&self, id: &DraftId) -> bool {
        let _guard = self.inner.write_lock.lock();
        let storage = &self.inner.storage;

        let removed_draft = match storage.read_drafts() {
            Ok(mut drafts) => {
                drafts.remove(id) && log_failure(storage.write_drafts(&drafts), "delete draft")
            },
            Err(e) => {
                warn!(error = %e, "Failed to read drafts for deletion");
                return false;
            },
        };

        let removed_metadata = match storage.read_metadata() {
            Ok(mut metadata) => {
                let before = metadata.len();
                metadata.retain(|m| &m.id != id);
                metadata.len() != before
                    && log_failure(storage.write_metadata(&metadata), "delete draft metadata")
            },
            Err(e) => {
                warn!(error = %e, "Failed to read draft metadata for deletion");
                false
            },
        };

        if removed_draft || removed_metadata {
            info!("Draft deleted");
        } else {
            debug!("No draft to delete");
        }
        removed_draft || removed_metadata
    }

    /// Cancel every pending save and remove all stored drafts
    #[instrument(skip(self))]
    pub fn clear_all(&self) {
        let _guard = self.inner.write_lock.lock();
        let cancelled = self.inner.timers.cancel_all();
        match self.inner.storage.clear() {
            Ok(()) => info!(cancelled_saves = cancelled, "Cleared all drafts"),
            Err(e) => warn!(
                cancelled_saves = cancelled,
                error = %e,
                "Failed to clear stored drafts"
            ),
        }
    }

    /// Whether a draft is stored for `id`
    pub fn has_draft(&self, id: &DraftId) -> bool {
        self.inner.read_drafts().contains(id)
    }

    /// Whole minutes since the draft for `id` was last saved
    pub fn draft_age_minutes(&self, id: &DraftId) -> Option<i64> {
        let now = self.inner.clock.now();
        self.inner
            .read_drafts()
            .find(id)
            .map(|draft| draft.age_minutes(now))
    }

    /// Remove drafts saved more than `max_age_days` ago
    ///
    /// A draft saved exactly at the cutoff is kept. Returns how many drafts
    /// were removed.
    #[instrument(skip(self))]
    pub fn cleanup_older_than(&self, max_age_days: u32) -> usize {
        let _guard = self.inner.write_lock.lock();
        let mut drafts = match self.inner.storage.read_drafts() {
            Ok(drafts) => drafts,
            Err(e) => {
                warn!(error = %e, "Failed to read drafts for cleanup");
                return 0;
            },
        };

        let cutoff = Draft::retention_cutoff(self.inner.clock.now(), max_age_days);
        let removed = drafts.retain_since(cutoff);

        if !log_failure(self.inner.storage.write(&drafts), "write cleaned drafts") {
            return 0;
        }
        if removed > 0 {
            info!(removed, remaining = drafts.len(), "Removed stale drafts");
        }
        removed
    }

    /// Cleanup using the policy's age limit
    pub fn cleanup_with_policy(&self, policy: &AutosavePolicy) -> usize {
        self.cleanup_older_than(policy.max_age_days)
    }

    /// Cancel the pending scheduled save for `id`, if any
    pub fn cancel_scheduled(&self, id: &DraftId) -> bool {
        self.inner.timers.cancel(id)
    }

    /// Number of scheduled saves that have not fired yet
    pub fn pending_saves(&self) -> usize {
        self.inner.timers.pending_count()
    }

    /// Regenerate the metadata projection from the stored drafts
    ///
    /// Returns the number of entries written, or zero if the store failed.
    #[instrument(skip(self))]
    pub fn rebuild_metadata(&self) -> usize {
        let _guard = self.inner.write_lock.lock();
        let drafts = match self.inner.storage.read_drafts() {
            Ok(drafts) => drafts,
            Err(e) => {
                warn!(error = %e, "Failed to read drafts for metadata rebuild");
                return 0;
            },
        };
        if log_failure(
            self.inner.storage.write_metadata(&drafts.metadata()),
            "rebuild draft metadata",
        ) {
            info!(entries = drafts.len(), "Rebuilt draft metadata");
            drafts.len()
        } else {
            0
        }
    }
}

impl AutosaveInner {
    /// Write `payload` as the newest draft for `id`; caller holds the write lock
    fn persist(
        &self,
        id: &DraftId,
        payload: InvoicePayload,
        max_drafts: usize,
    ) -> Option<DraftMetadata> {
        if payload.is_empty() {
            debug!(draft_id = %id, "Skipping save of empty draft");
            return None;
        }

        let mut drafts = match self.storage.read_drafts() {
            Ok(drafts) => drafts,
            Err(e) => {
                warn!(draft_id = %id, error = %e, "Failed to read drafts, save skipped");
                return None;
            },
        };

        let draft = Draft::capture(id.clone(), payload, self.clock.now());
        let metadata = draft.metadata();
        let evicted = drafts.upsert_front(draft, max_drafts);
        if !evicted.is_empty() {
            debug!(
                evicted = evicted.len(),
                max_drafts, "Evicted oldest drafts over the limit"
            );
        }

        if !log_failure(self.storage.write_drafts(&drafts), "persist draft") {
            return None;
        }
        // The collection is authoritative; a stale projection is repaired by
        // the next write or by `rebuild_metadata`.
        log_failure(
            self.storage.write_metadata(&drafts.metadata()),
            "persist draft metadata",
        );

        debug!(draft_id = %id, description = %metadata.description, "Draft saved");
        drafts.contains(id).then_some(metadata)
    }

    fn read_drafts(&self) -> DraftCollection {
        self.storage.read_drafts().unwrap_or_else(|e| {
            warn!(error = %e, "Failed to read drafts");
            DraftCollection::new()
        })
    }
}

/// Log a failed write; returns whether the write succeeded
///
/// An unavailable or full store is expected and logged as a warning. Any
/// other failure points at a bug and is logged as an error.
fn log_failure(result: Result<(), ApplicationError>, action: &str) -> bool {
    match result {
        Ok(()) => true,
        Err(e) if e.is_storage_failure() => {
            warn!(error = %e, "Failed to {action}");
            false
        },
        Err(e) => {
            error!(error = %e, "Failed to {action}");
            false
        },
    }
}
