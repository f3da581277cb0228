//! Application-level errors

use thiserror::Error;

/// Errors that can occur in the application layer
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// Backing store could not be read or written
    #[error("Storage error: {0}")]
    Storage(String),

    /// Write rejected because the store is full
    #[error("Storage quota exceeded for '{key}': needs {required} bytes, {available} available")]
    QuotaExceeded {
        key: String,
        required: usize,
        available: usize,
    },

    /// Stored value could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApplicationError {
    /// Check if the failure came from the storage medium itself
    pub const fn is_storage_failure(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::QuotaExceeded { .. })
    }
}

impl From<serde_json::Error> for ApplicationError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_error_message() {
        let err = ApplicationError::QuotaExceeded {
            key: "invoice_drafts".to_string(),
            required: 120,
            available: 40,
        };
        assert_eq!(
            err.to_string(),
            "Storage quota exceeded for 'invoice_drafts': needs 120 bytes, 40 available"
        );
    }

    #[test]
    fn storage_failures_are_classified() {
        assert!(ApplicationError::Storage("disk gone".into()).is_storage_failure());
        assert!(
            ApplicationError::QuotaExceeded {
                key: "k".into(),
                required: 2,
                available: 1
            }
            .is_storage_failure()
        );
        assert!(!ApplicationError::Serialization("bad json".into()).is_storage_failure());
    }

    #[test]
    fn serde_errors_convert() {
        let err: ApplicationError = serde_json::from_str::<u32>("nope").unwrap_err().into();
        assert!(matches!(err, ApplicationError::Serialization(_)));
    }
}
