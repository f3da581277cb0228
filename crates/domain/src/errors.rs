//! Domain-level errors

use thiserror::Error;

/// Errors that can occur in the domain layer
#[derive(Debug, Error)]
pub enum DomainError {
    /// Draft identifier is blank or otherwise unusable
    #[error("Invalid draft id: {0}")]
    InvalidDraftId(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_draft_id_error_message() {
        let err = DomainError::InvalidDraftId("   ".to_string());
        assert_eq!(err.to_string(), "Invalid draft id:    ");
    }
}
