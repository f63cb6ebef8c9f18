//! Error types for XojoDoc.
//!
//! Failures local to a single documentation page are handled inside the indexer and only
//! show up in its statistics. The variants here are the ones that can reach a caller.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the XojoDoc engine.
#[derive(Debug, Error)]
pub enum DocError {
    // Database errors
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[source]
        source: Option<rusqlite::Error>,
    },

    #[error("Database not found: {0}")]
    DatabaseNotFound(PathBuf),

    // File system errors
    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Path is not a directory: {0}")]
    NotADirectory(PathBuf),

    // Serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    // Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    // Validation errors
    #[error("Validation error for {field}: {message}")]
    Validation { field: String, message: String },

    // Generic errors
    #[error("{0}")]
    Other(String),
}

/// Result type alias for XojoDoc operations.
pub type Result<T> = std::result::Result<T, DocError>;

impl From<std::io::Error> for DocError {
    fn from(err: std::io::Error) -> Self {
        DocError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for DocError {
    fn from(err: serde_json::Error) -> Self {
        DocError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<rusqlite::Error> for DocError {
    fn from(err: rusqlite::Error) -> Self {
        DocError::Database {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl DocError {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if err.kind() == std::io::ErrorKind::NotFound {
            return DocError::FileNotFound(path);
        }
        DocError::Io {
            message: err.to_string(),
            path: Some(path),
            source: Some(err),
        }
    }

    /// Whether this error describes something that is simply absent.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            DocError::FileNotFound(_) | DocError::DatabaseNotFound(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DocError::Validation {
            field: "page_extension".into(),
            message: "must not be empty".into(),
        };
        assert_eq!(
            err.to_string(),
            "Validation error for page_extension: must not be empty"
        );
    }

    #[test]
    fn test_io_with_path_maps_not_found() {
        let err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = DocError::io_with_path(err, "/docs/api/graphics/graphics.html");
        assert!(err.is_not_found());
        assert!(err.to_string().contains("graphics.html"));
    }

    #[test]
    fn test_io_with_path_keeps_other_kinds() {
        let err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = DocError::io_with_path(err, "/docs");
        assert!(!err.is_not_found());
        assert!(matches!(err, DocError::Io { path: Some(_), .. }));
    }

    #[test]
    fn test_sqlite_error_converts() {
        let err: DocError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, DocError::Database { source: Some(_), .. }));
    }
}
