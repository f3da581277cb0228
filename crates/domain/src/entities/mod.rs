//! Domain entities - Objects with identity and lifecycle

mod draft;
mod draft_collection;
mod invoice_payload;

pub use draft::{DEFAULT_MAX_AGE_DAYS, Draft, DraftMetadata};
pub use draft_collection::{DEFAULT_MAX_DRAFTS, DraftCollection};
pub use invoice_payload::{
    FALLBACK_DESCRIPTION, ITEM_PREVIEW_CHARS, InvoicePayload, LineItem, UNTITLED_ITEM,
};
