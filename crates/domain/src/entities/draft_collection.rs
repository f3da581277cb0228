//! Ordered set of stored drafts
//!
//! Drafts are kept most-recent-first with unique ids. Saving an id again
//! replaces its entry and moves it to the front; entries pushed past the
//! limit fall off the back.

use chrono::{DateTime, Utc};

use super::draft::{Draft, DraftMetadata};
use crate::value_objects::DraftId;

/// Default upper bound on the number of stored drafts
pub const DEFAULT_MAX_DRAFTS: usize = 10;

/// Most-recent-first collection of drafts
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DraftCollection {
    drafts: Vec<Draft>,
}

impl DraftCollection {
    /// Create an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a draft at the front, replacing any entry with the same id
    ///
    /// The collection is then truncated to `max_drafts` entries; the
    /// evicted drafts are returned oldest last.
    pub fn upsert_front(&mut self, draft: Draft, max_drafts: usize) -> Vec<Draft> {
        self.drafts.retain(|d| d.id != draft.id);
        self.drafts.insert(0, draft);
        if self.drafts.len() > max_drafts {
            self.drafts.split_off(max_drafts)
        } else {
            Vec::new()
        }
    }

    /// Remove the draft with the given id
    pub fn remove(&mut self, id: &DraftId) -> bool {
        let before = self.drafts.len();
        self.drafts.retain(|d| &d.id != id);
        self.drafts.len() != before
    }

    /// Keep drafts saved at or after `cutoff`; returns how many were dropped
    pub fn retain_since(&mut self, cutoff: DateTime<Utc>) -> usize {
        let before = self.drafts.len();
        self.drafts.retain(|d| d.timestamp >= cutoff);
        before - self.drafts.len()
    }

    pub fn find(&self, id: &DraftId) -> Option<&Draft> {
        self.drafts.iter().find(|d| &d.id == id)
    }

    pub fn contains(&self, id: &DraftId) -> bool {
        self.find(id).is_some()
    }

    /// Listing projection in collection order
    pub fn metadata(&self) -> Vec<DraftMetadata> {
        self.drafts.iter().map(Draft::metadata).collect()
    }

    pub fn len(&self) -> usize {
        self.drafts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drafts.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Draft> {
        self.drafts.iter()
    }

    pub fn as_slice(&self) -> &[Draft] {
        &self.drafts
    }

    pub fn into_vec(self) -> Vec<Draft> {
        self.drafts
    }
}

impl From<Vec<Draft>> for DraftCollection {
    /// Build from stored order, dropping later duplicates of an id
    fn from(drafts: Vec<Draft>) -> Self {
        let mut unique: Vec<Draft> = Vec::with_capacity(drafts.len());
        for draft in drafts {
            if !unique.iter().any(|d| d.id == draft.id) {
                unique.push(draft);
            }
        }
        Self { drafts: unique }
    }
}

impl<'a> IntoIterator for &'a DraftCollection {
    type Item = &'a Draft;
    type IntoIter = std::slice::Iter<'a, Draft>;

    fn into_iter(self) -> Self::IntoIter {
        self.drafts.iter()
    }
}
