//! Error types for guardian.
//!
//! This module defines the error type shared by the store, the plan editor,
//! the drill book and the CLI. Problems with the *shape* of persisted documents
//! are not represented here: those are repaired by falling back to defaults
//! (see [`crate::storage::documents`]).

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for guardian operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Plan Errors ===
    /// An uploaded floor plan could not be decoded or re-encoded.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// A stored data URL was not in the expected format.
    #[error("malformed data URL: {reason}")]
    DataUrl {
        /// Why the data URL was rejected.
        reason: String,
    },

    // === Advisory Errors ===
    /// The remote advisory service could not be reached.
    #[error("advisory request failed: {0}")]
    Advisory(#[from] reqwest::Error),

    /// The remote advisory service answered with a non-success status.
    #[error("advisory service returned HTTP {status}")]
    AdvisoryStatus {
        /// The HTTP status code.
        status: u16,
    },

    // === Input Errors ===
    /// User-supplied input was rejected.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A referenced record does not exist.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// What kind of record was looked up.
        kind: &'static str,
        /// The identifier that was not found.
        id: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for guardian operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new invalid input error.
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a malformed data URL error.
    #[must_use]
    pub fn data_url(reason: impl Into<String>) -> Self {
        Self::DataUrl {
            reason: reason.into(),
        }
    }

    /// Create a not-found error for the given record kind.
    #[must_use]
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Check if this error means a record was not found.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::invalid_input("name must not be blank");
        assert_eq!(err.to_string(), "invalid input: name must not be blank");

        let err = Error::internal("test error");
        assert_eq!(err.to_string(), "internal error: test error");
    }

    #[test]
    fn test_not_found_display() {
        let err = Error::not_found("drill", "42");
        assert_eq!(err.to_string(), "drill not found: 42");
        assert!(err.is_not_found());
        assert!(!Error::internal("x").is_not_found());
    }

    #[test]
    fn test_advisory_status_display() {
        let err = Error::AdvisoryStatus { status: 503 };
        assert!(err.to_string().contains("503"));
    }

    #[test]
    fn test_data_url_error_display() {
        let err = Error::data_url("missing base64 marker");
        assert!(err.to_string().contains("missing base64 marker"));
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_rusqlite_error() {
        let result = rusqlite::Connection::open_with_flags(
            "/nonexistent/path/db.sqlite",
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY,
        );
        if let Err(sqlite_err) = result {
            let err: Error = sqlite_err.into();
            assert!(matches!(err, Error::DatabaseQuery(_)));
        }
    }

    #[test]
    fn test_from_json_error() {
        let json_result: std::result::Result<i32, serde_json::Error> =
            serde_json::from_str("not valid json");
        if let Err(json_err) = json_result {
            let err: Error = json_err.into();
            assert!(matches!(err, Error::Json(_)));
        }
    }

    #[test]
    fn test_from_image_error() {
        let result = image::load_from_memory(b"definitely not an image");
        if let Err(image_err) = result {
            let err: Error = image_err.into();
            assert!(matches!(err, Error::Image(_)));
        }
    }

    #[test]
    fn test_database_migration_error_display() {
        let err = Error::DatabaseMigration {
            message: "version mismatch".to_string(),
        };
        assert!(err.to_string().contains("version mismatch"));
    }

    #[test]
    fn test_config_validation_error_display() {
        let err = Error::ConfigValidation {
            message: "invalid interval".to_string(),
        };
        assert!(err.to_string().contains("invalid interval"));
    }

    #[test]
    fn test_directory_create_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = Error::DirectoryCreate {
            path: PathBuf::from("/root/forbidden"),
            source: io_err,
        };
        assert!(err.to_string().contains("/root/forbidden"));
    }
}
