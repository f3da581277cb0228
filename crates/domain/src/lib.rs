//! Domain layer for invoice draft autosave
//!
//! Contains the draft entities, the invoice form schema and the heuristics
//! that decide whether a form is worth saving and how it is summarized.
//! This layer performs no I/O.

pub mod entities;
pub mod errors;
pub mod value_objects;

pub use entities::*;
pub use errors::DomainError;
pub use value_objects::*;
