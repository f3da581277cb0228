//! Draft identifier naming a logical editing session

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::DomainError;

/// Identifier of the draft for a new, unsaved invoice
pub const NEW_INVOICE_DRAFT: &str = "new-invoice";

/// Identifies the editing session a draft belongs to
///
/// Ids are supplied by the caller ("new invoice", "edit invoice #42", ...)
/// and are unique among the drafts currently stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DraftId(String);

impl DraftId {
    /// Create a draft ID from a caller-supplied session key
    ///
    /// # Errors
    /// Returns an error if the key is empty or only whitespace
    pub fn new(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(DomainError::InvalidDraftId(id));
        }
        Ok(Self(id))
    }

    /// Draft ID for the "create a new invoice" form
    pub fn new_invoice() -> Self {
        Self(NEW_INVOICE_DRAFT.to_string())
    }

    /// Draft ID for editing an existing invoice
    pub fn for_invoice(invoice_id: impl fmt::Display) -> Self {
        Self(format!("edit-invoice-{invoice_id}"))
    }

    /// Generate a unique draft ID for sessions without a natural key
    pub fn generate() -> Self {
        Self(format!("draft-{}", Uuid::new_v4()))
    }

    /// Get the underlying string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DraftId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for DraftId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for DraftId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
