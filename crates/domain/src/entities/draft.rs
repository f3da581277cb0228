//! Persisted autosave draft and its listing projection

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::invoice_payload::InvoicePayload;
use crate::value_objects::DraftId;

/// Default number of days a draft is kept before cleanup
pub const DEFAULT_MAX_AGE_DAYS: u32 = 7;

/// A persisted snapshot of an in-progress invoice form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Draft {
    /// Editing session the draft belongs to
    pub id: DraftId,
    /// Captured form state
    pub data: InvoicePayload,
    /// When the draft was last persisted
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    /// Summary derived from `data` at save time
    pub description: String,
}

/// Listing view of a draft without its payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftMetadata {
    pub id: DraftId,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    pub description: String,
}

impl Draft {
    /// Capture a payload at the given instant, deriving its description
    pub fn capture(id: DraftId, data: InvoicePayload, timestamp: DateTime<Utc>) -> Self {
        let description = data.describe();
        Self {
            id,
            data,
            timestamp,
            description,
        }
    }

    /// Project onto the listing metadata
    pub fn metadata(&self) -> DraftMetadata {
        DraftMetadata {
            id: self.id.clone(),
            timestamp: self.timestamp,
            description: self.description.clone(),
        }
    }

    /// Whole minutes elapsed since the draft was saved
    pub fn age_minutes(&self, now: DateTime<Utc>) -> i64 {
        (now - self.timestamp).num_minutes()
    }

    /// Earliest timestamp a draft may carry and still survive cleanup
    pub fn retention_cutoff(now: DateTime<Utc>, max_age_days: u32) -> DateTime<Utc> {
        now - Duration::days(i64::from(max_age_days))
    }
}
