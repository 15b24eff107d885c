//! Error types for the link engine.
//!
//! All hard failures are represented by the [`Error`] enum. Expected partial
//! failures (a single file that could not be rewritten, an unreadable directory)
//! are reported as data by the operations themselves and never surface here.

use std::io;
use std::path::PathBuf;
use thiserror::Error as ThisError;

/// The core error type for all engine operations.
#[derive(ThisError, Debug)]
pub enum Error {
    /// File system error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// File not found
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Destination already occupied (move/rename)
    #[error("File already exists: {path}")]
    AlreadyExists { path: PathBuf },

    /// Invalid file path (not a directory, empty identity, etc.)
    #[error("Invalid file path: {reason}")]
    InvalidPath { reason: String },

    /// Path traversal attempt detected
    #[error("Path traversal detected: {path}")]
    PathTraversalAttempt { path: PathBuf },

    /// Parse error
    #[error("Parse error: {reason}")]
    ParseError { reason: String },

    /// Invalid configuration
    #[error("Configuration error: {reason}")]
    ConfigError { reason: String },

    /// Storage backend failure for a specific path
    #[error("Storage error on {path}: {reason}")]
    Storage { path: PathBuf, reason: String },

    /// Not found in graph
    #[error("Not found in graph: {key}")]
    NotFound { key: String },

    /// Generic unclassified error
    #[error("Error: {0}")]
    Other(String),
}

/// Convenient Result type alias
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an IO error
    pub fn io(err: io::Error) -> Self {
        Error::Io(err)
    }

    /// Create a file not found error
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Error::FileNotFound { path: path.into() }
    }

    /// Create an already-exists error
    pub fn already_exists(path: impl Into<PathBuf>) -> Self {
        Error::AlreadyExists { path: path.into() }
    }

    /// Create an invalid path error
    pub fn invalid_path(reason: impl Into<String>) -> Self {
        Error::InvalidPath {
            reason: reason.into(),
        }
    }

    /// Create a path traversal error
    pub fn path_traversal(path: impl Into<PathBuf>) -> Self {
        Error::PathTraversalAttempt { path: path.into() }
    }

    /// Create a parse error
    pub fn parse_error(reason: impl Into<String>) -> Self {
        Error::ParseError {
            reason: reason.into(),
        }
    }

    /// Create a configuration error
    pub fn config_error(reason: impl Into<String>) -> Self {
        Error::ConfigError {
            reason: reason.into(),
        }
    }

    /// Create a storage error bound to a path
    pub fn storage(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::Storage {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(key: impl Into<String>) -> Self {
        Error::NotFound { key: key.into() }
    }

    /// Create a generic error
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Whether this error means the file simply isn't there
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::FileNotFound { .. } => true,
            Error::Io(e) => e.kind() == io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = Error::file_not_found("/path/to/file");
        assert!(err.to_string().contains("File not found"));

        let err = Error::invalid_path("root is not a directory");
        assert!(err.to_string().contains("Invalid file path"));

        let err = Error::storage("notes/a.md", "disk full");
        assert_eq!(err.to_string(), "Storage error on notes/a.md: disk full");
    }

    #[test]
    fn test_is_not_found() {
        assert!(Error::file_not_found("x.md").is_not_found());
        assert!(Error::io(io::Error::new(io::ErrorKind::NotFound, "gone")).is_not_found());
        assert!(!Error::other("boom").is_not_found());
    }
}
