//! Configuration types for the link engine.
//!
//! Follows a builder pattern for vault configuration with validation.
//! [`EngineConfig`] is plain serde data and can be loaded from YAML.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Configuration for a single vault
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultConfig {
    /// Identifier used in logs and reports
    pub name: String,
    /// Path to the vault directory
    pub path: PathBuf,
    /// Engine settings for this vault
    pub engine: EngineConfig,
}

impl VaultConfig {
    /// Create a new vault config with builder
    pub fn builder(name: impl Into<String>, path: impl Into<PathBuf>) -> VaultConfigBuilder {
        VaultConfigBuilder::new(name, path)
    }

    /// Validate the vault configuration
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::config_error("Vault name cannot be empty"));
        }

        if !self.path.exists() {
            return Err(Error::config_error(format!(
                "Vault path does not exist: {}",
                self.path.display()
            )));
        }

        if !self.path.is_dir() {
            return Err(Error::invalid_path(format!(
                "Vault path is not a directory: {}",
                self.path.display()
            )));
        }

        self.engine.validate()
    }
}

/// Builder for VaultConfig
pub struct VaultConfigBuilder {
    name: String,
    path: PathBuf,
    engine: EngineConfig,
}

impl VaultConfigBuilder {
    /// Create a new builder
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            engine: EngineConfig::default(),
        }
    }

    /// Use the given engine settings
    pub fn engine(mut self, engine: EngineConfig) -> Self {
        self.engine = engine;
        self
    }

    /// Override the scan worker count
    pub fn scan_concurrency(mut self, workers: usize) -> Self {
        self.engine.scan_concurrency = workers;
        self
    }

    /// Build and validate
    pub fn build(self) -> Result<VaultConfig> {
        let config = VaultConfig {
            name: self.name,
            path: self.path,
            engine: self.engine,
        };
        config.validate()?;
        Ok(config)
    }
}

/// Names the scanner never descends into
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionSet {
    /// Entries whose name starts with any of these are skipped
    pub prefixes: BTreeSet<String>,
    /// Directories with exactly these names are skipped
    pub dirs: BTreeSet<String>,
}

impl ExclusionSet {
    /// Whether a single path component should be skipped
    pub fn excludes(&self, name: &str) -> bool {
        self.prefixes.iter().any(|p| name.starts_with(p.as_str())) || self.dirs.contains(name)
    }

    /// Whether any component of a relative path is excluded
    pub fn excludes_path(&self, relative: &Path) -> bool {
        relative
            .components()
            .filter_map(|c| c.as_os_str().to_str())
            .any(|name| self.excludes(name))
    }
}

impl Default for ExclusionSet {
    fn default() -> Self {
        Self {
            prefixes: [".", "_trash"].iter().map(|s| s.to_string()).collect(),
            dirs: ["node_modules", ".trash"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Engine-wide settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Note file extension, without the dot
    pub note_extension: String,
    pub exclusions: ExclusionSet,
    /// Files above this size are not scanned
    pub max_file_size: u64,
    /// Concurrent file reads during a scan
    pub scan_concurrency: usize,
    /// Candidates kept per broken reference
    pub max_suggestions: usize,
    /// Minimum distinct notes for a tag cluster
    pub min_cluster_size: usize,
    pub log_level: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            note_extension: "md".to_string(),
            exclusions: ExclusionSet::default(),
            max_file_size: 10 * 1024 * 1024, // 10MB
            scan_concurrency: 8,
            max_suggestions: 3,
            min_cluster_size: 3,
            log_level: "info".to_string(),
        }
    }
}

impl EngineConfig {
    /// Create new configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.note_extension.is_empty() || self.note_extension.starts_with('.') {
            return Err(Error::config_error(
                "note_extension must be a bare extension such as \"md\"",
            ));
        }

        if self.scan_concurrency == 0 {
            return Err(Error::config_error("scan_concurrency must be at least 1"));
        }

        if self.max_suggestions == 0 {
            return Err(Error::config_error("max_suggestions must be at least 1"));
        }

        if self.min_cluster_size == 0 {
            return Err(Error::config_error("min_cluster_size must be at least 1"));
        }

        Ok(())
    }

    /// Load configuration from a YAML file.
    ///
    /// A missing file yields the defaults.
    pub async fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            Error::config_error(format!(
                "Failed to load config from {}: {}",
                path.display(),
                e
            ))
        })?;

        let config: Self = serde_yaml::from_str(&content)
            .map_err(|e| Error::config_error(format!("Invalid configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration as YAML
    pub async fn save(&self, path: &Path) -> Result<()> {
        let yaml = serde_yaml::to_string(self)
            .map_err(|e| Error::config_error(format!("Failed to serialize config: {}", e)))?;

        tokio::fs::write(path, yaml).await.map_err(|e| {
            Error::config_error(format!(
                "Failed to save config to {}: {}",
                path.display(),
                e
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_vault_config_builder() {
        let temp = TempDir::new().unwrap();
        let vault = VaultConfig::builder("main", temp.path())
            .scan_concurrency(4)
            .build();

        assert!(vault.is_ok());
        let v = vault.unwrap();
        assert_eq!(v.name, "main");
        assert_eq!(v.engine.scan_concurrency, 4);
    }

    #[test]
    fn test_vault_config_rejects_file_root() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("note.md");
        std::fs::write(&file, "x").unwrap();

        let result = VaultConfig::builder("main", &file).build();
        assert!(matches!(result, Err(Error::InvalidPath { .. })));
    }

    #[test]
    fn test_engine_config_validation() {
        let mut config = EngineConfig::new();
        assert!(config.validate().is_ok());

        config.scan_concurrency = 0;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::new();
        config.note_extension = ".md".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_exclusions() {
        let exclusions = ExclusionSet::default();
        assert!(exclusions.excludes(".obsidian"));
        assert!(exclusions.excludes("_trash"));
        assert!(exclusions.excludes("node_modules"));
        assert!(!exclusions.excludes("Notes"));
        // a vault folder that happens to be called `target` is content
        assert!(!exclusions.excludes("target"));
        assert!(exclusions.excludes_path(Path::new("Notes/.hidden/a.md")));
        assert!(!exclusions.excludes_path(Path::new("Notes/a.md")));
    }

    #[tokio::test]
    async fn test_load_missing_and_roundtrip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("linkweave.yaml");

        let loaded = EngineConfig::load(&path).await.unwrap();
        assert_eq!(loaded, EngineConfig::default());

        let mut config = EngineConfig::default();
        config.max_suggestions = 5;
        config.save(&path).await.unwrap();

        let loaded = EngineConfig::load(&path).await.unwrap();
        assert_eq!(loaded.max_suggestions, 5);
    }

    #[tokio::test]
    async fn test_load_partial_yaml_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("linkweave.yaml");
        tokio::fs::write(&path, "scan_concurrency: 2\n").await.unwrap();

        let loaded = EngineConfig::load(&path).await.unwrap();
        assert_eq!(loaded.scan_concurrency, 2);
        assert_eq!(loaded.note_extension, "md");
    }
}
