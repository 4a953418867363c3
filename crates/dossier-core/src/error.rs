//! Error types for dossier.

use thiserror::Error;
use uuid::Uuid;

/// Result type alias using dossier's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for dossier operations.
///
/// `Conflict` is the only structured variant: dependency checks must hand the
/// caller enough detail (count + blocking ids) to render an actionable
/// message. Ownership misses always surface as `NotFound`, never as a
/// permission error, so callers cannot probe for other users' rows.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resource not found (or not owned by the caller)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Document not found
    #[error("Document not found: {0}")]
    DocumentNotFound(Uuid),

    /// Application not found
    #[error("Application not found: {0}")]
    ApplicationNotFound(Uuid),

    /// Invalid input or invariant violation unrelated to dependencies
    #[error("Validation error: {0}")]
    Validation(String),

    /// A dependency check blocked the requested deletion
    #[error("{message}")]
    Conflict {
        message: String,
        blocking_count: usize,
        blocking_ids: Vec<Uuid>,
    },

    /// The external text generator failed (retryable by the caller)
    #[error("Generation error: {0}")]
    Generation(String),

    /// Object storage mirror operation failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build a `Conflict` from a human message and the blocking ids.
    pub fn conflict(message: impl Into<String>, blocking_ids: Vec<Uuid>) -> Self {
        Error::Conflict {
            message: message.into(),
            blocking_count: blocking_ids.len(),
            blocking_ids,
        }
    }

    /// Whether a caller may retry the same request unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Generation(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_not_found() {
        let err = Error::NotFound("resume 42".to_string());
        assert_eq!(err.to_string(), "Not found: resume 42");
    }

    #[test]
    fn test_error_display_document_not_found() {
        let id = Uuid::nil();
        let err = Error::DocumentNotFound(id);
        assert_eq!(err.to_string(), format!("Document not found: {}", id));
    }

    #[test]
    fn test_error_display_application_not_found() {
        let id = Uuid::nil();
        let err = Error::ApplicationNotFound(id);
        assert_eq!(err.to_string(), format!("Application not found: {}", id));
    }

    #[test]
    fn test_error_display_validation() {
        let err = Error::Validation("content must not be empty".to_string());
        assert_eq!(err.to_string(), "Validation error: content must not be empty");
    }

    #[test]
    fn test_conflict_carries_count_and_ids() {
        let ids = vec![Uuid::new_v4(), Uuid::new_v4()];
        let err = Error::conflict("2 applications reference this resume", ids.clone());
        match err {
            Error::Conflict {
                message,
                blocking_count,
                blocking_ids,
            } => {
                assert_eq!(message, "2 applications reference this resume");
                assert_eq!(blocking_count, 2);
                assert_eq!(blocking_ids, ids);
            }
            _ => panic!("Expected Conflict"),
        }
    }

    #[test]
    fn test_conflict_display_is_message_only() {
        let err = Error::conflict("blocked", vec![Uuid::nil()]);
        assert_eq!(err.to_string(), "blocked");
    }

    #[test]
    fn test_error_display_generation() {
        let err = Error::Generation("model timeout".to_string());
        assert_eq!(err.to_string(), "Generation error: model timeout");
        assert!(err.is_retryable());
    }

    #[test]
    fn test_non_generation_errors_not_retryable() {
        assert!(!Error::NotFound("x".to_string()).is_retryable());
        assert!(!Error::Validation("x".to_string()).is_retryable());
        assert!(!Error::conflict("x", vec![]).is_retryable());
    }

    #[test]
    fn test_error_display_storage() {
        let err = Error::Storage("disk full".to_string());
        assert_eq!(err.to_string(), "Storage error: disk full");
    }

    #[test]
    fn test_error_display_config() {
        let err = Error::Config("missing API key".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing API key");
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<i32>("not a number").unwrap_err();
        let err: Error = json_err.into();
        match err {
            Error::Serialization(msg) => assert!(!msg.is_empty()),
            _ => panic!("Expected Serialization error"),
        }
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err: Error = io_err.into();
        match err {
            Error::Io(_) => {}
            _ => panic!("Expected Io error"),
        }
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
