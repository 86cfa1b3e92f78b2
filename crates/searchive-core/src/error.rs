//! Error types for searchive.

use thiserror::Error;

/// Result type alias using searchive's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for searchive operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Document not found (or not owned by the caller)
    #[error("Document not found: {0}")]
    DocumentNotFound(i64),

    /// Declared MIME type is outside the supported set
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Blob storage operation failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Search index operation failed
    #[error("Search error: {0}")]
    Search(String),

    /// Embedding generation failed
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Text extraction failed
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// A concurrent request already claimed the same identity
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Authentication failed
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Caller-facing error classification.
///
/// Every [`Error`] maps onto exactly one kind; the HTTP layer chooses status
/// codes from the kind, never from the concrete variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// User-correctable request problem (unsupported format, bad input).
    Validation,
    /// A backing service (blob store, search index, ranker) is unreachable. Retryable.
    DependencyUnavailable,
    /// Lookup miss, usually scoped by owner.
    NotFound,
    /// Duplicate concurrent identity-creating request.
    Conflict,
    /// Missing or invalid credentials.
    Unauthorized,
    /// Unexpected failure. Surfaced generically.
    Internal,
}

impl Error {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::UnsupportedFormat(_) | Error::InvalidInput(_) => ErrorKind::Validation,
            Error::NotFound(_) | Error::DocumentNotFound(_) => ErrorKind::NotFound,
            Error::Conflict(_) => ErrorKind::Conflict,
            Error::Unauthorized(_) => ErrorKind::Unauthorized,
            Error::Storage(_)
            | Error::Search(_)
            | Error::Embedding(_)
            | Error::Request(_) => ErrorKind::DependencyUnavailable,
            Error::Database(e) if is_unique_violation(e) => ErrorKind::Conflict,
            Error::Database(sqlx::Error::RowNotFound) => ErrorKind::NotFound,
            Error::Database(
                sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_),
            ) => ErrorKind::DependencyUnavailable,
            Error::Database(_)
            | Error::Extraction(_)
            | Error::Config(_)
            | Error::Serialization(_)
            | Error::Internal(_)
            | Error::Io(_) => ErrorKind::Internal,
        }
    }

    /// True when the request may succeed if simply retried.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::DependencyUnavailable | ErrorKind::Conflict
        )
    }
}

/// Postgres SQLSTATE 23505.
fn is_unique_violation(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Database(db) => db.code().as_deref() == Some("23505"),
        _ => false,
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
        let err = Error::NotFound("tag".to_string());
        assert_eq!(err.to_string(), "Not found: tag");
    }

    #[test]
    fn test_error_display_document_not_found() {
        let err = Error::DocumentNotFound(42);
        assert_eq!(err.to_string(), "Document not found: 42");
    }

    #[test]
    fn test_error_display_unsupported_format() {
        let err = Error::UnsupportedFormat("image/png".to_string());
        assert_eq!(err.to_string(), "Unsupported format: image/png");
    }

    #[test]
    fn test_error_display_storage() {
        let err = Error::Storage("bucket missing".to_string());
        assert_eq!(err.to_string(), "Storage error: bucket missing");
    }

    #[test]
    fn test_error_display_conflict() {
        let err = Error::Conflict("retry shortly".to_string());
        assert_eq!(err.to_string(), "Conflict: retry shortly");
    }

    #[test]
    fn test_kind_validation() {
        assert_eq!(
            Error::UnsupportedFormat("x".into()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(Error::InvalidInput("x".into()).kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_kind_dependency_unavailable() {
        for err in [
            Error::Storage("down".into()),
            Error::Search("down".into()),
            Error::Embedding("down".into()),
            Error::Request("down".into()),
        ] {
            assert_eq!(err.kind(), ErrorKind::DependencyUnavailable);
            assert!(err.is_retryable());
        }
    }

    #[test]
    fn test_kind_not_found() {
        assert_eq!(Error::DocumentNotFound(1).kind(), ErrorKind::NotFound);
        assert_eq!(
            Error::Database(sqlx::Error::RowNotFound).kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn test_kind_pool_timeout_is_dependency() {
        assert_eq!(
            Error::Database(sqlx::Error::PoolTimedOut).kind(),
            ErrorKind::DependencyUnavailable
        );
    }

    #[test]
    fn test_kind_internal_not_retryable() {
        let err = Error::Internal("boom".into());
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{bad").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.to_string().contains("gone"));
    }
}
