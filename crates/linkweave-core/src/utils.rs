//! Shared utilities for operations across linkweave crates.
//!
//! Provides helpers for:
//! - Serialization with consistent error handling
//! - Path validation
//! - Operation tracking (id, start time, elapsed)

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use std::path::{Component, Path, PathBuf};
use std::time::Instant;

/// Generic JSON serialization with consistent error handling
pub fn to_json_string<T: serde::Serialize + ?Sized>(data: &T, context: &str) -> Result<String> {
    serde_json::to_string_pretty(data)
        .map_err(|e| Error::other(format!("Failed to serialize {} as JSON: {}", context, e)))
}

/// Path validation helpers
pub struct PathValidator;

impl PathValidator {
    /// Join a vault-relative path onto the root, rejecting anything that would
    /// escape it (absolute paths, `..` above the root).
    pub fn validate_path_in_vault(vault_root: &Path, path: &Path) -> Result<PathBuf> {
        if path.as_os_str().is_empty() {
            return Err(Error::invalid_path("empty path"));
        }

        let mut normalized = PathBuf::new();
        for component in path.components() {
            match component {
                Component::Normal(name) => normalized.push(name),
                Component::CurDir => {}
                Component::ParentDir => {
                    if !normalized.pop() {
                        return Err(Error::path_traversal(vault_root.join(path)));
                    }
                }
                Component::RootDir | Component::Prefix(_) => {
                    return Err(Error::path_traversal(path.to_path_buf()));
                }
            }
        }

        Ok(vault_root.join(normalized))
    }

    /// Lexically normalize a `/`-separated relative path, resolving `.` and
    /// `..`. Returns `None` when `..` climbs above the start.
    pub fn normalize_relative(path: &str) -> Option<String> {
        let mut parts: Vec<&str> = Vec::new();
        for segment in path.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    parts.pop()?;
                }
                other => parts.push(other),
            }
        }
        Some(parts.join("/"))
    }
}

/// Operation tracking: unique id, wall-clock start, monotonic elapsed time
pub struct TransactionBuilder {
    transaction_id: String,
    started_at: DateTime<Utc>,
    start_time: Instant,
}

impl TransactionBuilder {
    /// Create a new transaction tracker
    pub fn new() -> Self {
        Self {
            transaction_id: uuid::Uuid::new_v4().to_string(),
            started_at: Utc::now(),
            start_time: Instant::now(),
        }
    }

    /// Get the transaction ID
    pub fn transaction_id(&self) -> &str {
        &self.transaction_id
    }

    /// Wall-clock start time
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Get elapsed time in milliseconds
    pub fn elapsed_ms(&self) -> u64 {
        self.start_time.elapsed().as_millis() as u64
    }
}

impl Default for TransactionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize)]
    struct TestData {
        name: String,
        value: i32,
    }

    #[test]
    fn test_to_json_string() {
        let data = TestData {
            name: "test".to_string(),
            value: 42,
        };
        let json = to_json_string(&data, "test_data").unwrap();
        assert!(json.contains("test"));
        assert!(json.contains("42"));
    }

    #[test]
    fn test_path_validator_valid() {
        let vault_root = PathBuf::from("/vault");
        let result = PathValidator::validate_path_in_vault(&vault_root, Path::new("notes/./file.md"));
        assert_eq!(result.unwrap(), PathBuf::from("/vault/notes/file.md"));
    }

    #[test]
    fn test_path_validator_traversal() {
        let vault_root = PathBuf::from("/vault");
        let result =
            PathValidator::validate_path_in_vault(&vault_root, Path::new("../../../etc/passwd"));
        assert!(result.is_err());

        let result = PathValidator::validate_path_in_vault(&vault_root, Path::new("/etc/passwd"));
        assert!(result.is_err());
    }

    #[test]
    fn test_normalize_relative() {
        assert_eq!(
            PathValidator::normalize_relative("Projects/../Notes/./a"),
            Some("Notes/a".to_string())
        );
        assert_eq!(PathValidator::normalize_relative("../a"), None);
    }

    #[test]
    fn test_transaction_builder() {
        let builder = TransactionBuilder::new();
        assert!(!builder.transaction_id().is_empty());
        assert!(builder.started_at() <= Utc::now());
        assert!(builder.elapsed_ms() < 1000);
    }
}
