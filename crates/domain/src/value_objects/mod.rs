//! Value Objects - Immutable, identity-less domain primitives

mod draft_id;

pub use draft_id::{DraftId, NEW_INVOICE_DRAFT};
