//! Application services - Use case implementations

mod debouncer;
mod draft_autosave;

pub use debouncer::{Debouncer, Ticket};
pub use draft_autosave::{
    AutosavePolicy, DEFAULT_SAVE_DELAY, DRAFTS_KEY, DraftAutosaveService, METADATA_KEY,
};
