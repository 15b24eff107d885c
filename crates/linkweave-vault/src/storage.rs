//! Storage backends.
//!
//! All paths crossing the [`Storage`] boundary are vault-relative. The
//! filesystem backend joins them onto its root and refuses anything that would
//! escape it.

use async_trait::async_trait;
use linkweave_core::{Error, ExclusionSet, PathValidator, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::instrument;
use walkdir::WalkDir;

/// A note file found by [`Storage::list_files`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteFile {
    /// Vault-relative path
    pub path: PathBuf,
    /// Size in bytes
    pub size: u64,
}

/// Abstract storage backend for note access.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Every file carrying `extension`, sorted by path.
    ///
    /// Excluded names are never descended into. Unreadable entries are skipped.
    async fn list_files(&self, exclusions: &ExclusionSet, extension: &str)
    -> Result<Vec<NoteFile>>;

    /// Read a file as UTF-8 text
    async fn read_file(&self, path: &Path) -> Result<String>;

    /// Replace a file's content, creating parent folders as needed
    async fn write_file(&self, path: &Path, content: &str) -> Result<()>;

    /// Move a file; fails if the destination exists
    async fn rename_file(&self, from: &Path, to: &Path) -> Result<()>;

    async fn exists(&self, path: &Path) -> Result<bool>;
}

/// Filesystem storage rooted at a vault directory
#[derive(Debug, Clone)]
pub struct FsStorage {
    root: PathBuf,
}

impl FsStorage {
    /// Open a vault root; it must be an existing directory
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(Error::invalid_path(format!(
                "Vault root is not a directory: {}",
                root.display()
            )));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &Path) -> Result<PathBuf> {
        PathValidator::validate_path_in_vault(&self.root, path)
    }
}

fn map_io(path: &Path, e: std::io::Error) -> Error {
    if e.kind() == std::io::ErrorKind::NotFound {
        Error::file_not_found(path)
    } else {
        Error::storage(path, e.to_string())
    }
}

#[async_trait]
impl Storage for FsStorage {
    #[instrument(skip(self, exclusions), name = "storage_list_files")]
    async fn list_files(
        &self,
        exclusions: &ExclusionSet,
        extension: &str,
    ) -> Result<Vec<NoteFile>> {
        let root = self.root.clone();
        let exclusions = exclusions.clone();
        let suffix = format!(".{}", extension);

        let walk = move || {
            let mut files = Vec::new();
            let walker = WalkDir::new(&root).follow_links(false).into_iter();
            let entries = walker.filter_entry(|entry| {
                entry.depth() == 0
                    || !entry
                        .file_name()
                        .to_str()
                        .is_some_and(|name| exclusions.excludes(name))
            });

            for entry in entries {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        log::warn!("Skipping unreadable entry: {}", e);
                        continue;
                    }
                };
                if !entry.file_type().is_file() {
                    continue;
                }
                let is_note = entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| name.len() > suffix.len() && name.ends_with(&suffix));
                if !is_note {
                    continue;
                }
                let Ok(relative) = entry.path().strip_prefix(&root) else {
                    continue;
                };
                let size = match entry.metadata() {
                    Ok(meta) => meta.len(),
                    Err(e) => {
                        log::debug!("No metadata for {}: {}", entry.path().display(), e);
                        continue;
                    }
                };
                files.push(NoteFile {
                    path: relative.to_path_buf(),
                    size,
                });
            }

            files.sort_by(|a, b| a.path.cmp(&b.path));
            files
        };

        tokio::task::spawn_blocking(walk)
            .await
            .map_err(|e| Error::other(format!("Vault walk panicked: {}", e)))
    }

    async fn read_file(&self, path: &Path) -> Result<String> {
        let full = self.resolve(path)?;
        tokio::fs::read_to_string(&full)
            .await
            .map_err(|e| map_io(path, e))
    }

    #[instrument(skip(self, content), fields(file = ?path, size = content.len()), name = "storage_write_file")]
    async fn write_file(&self, path: &Path, content: &str) -> Result<()> {
        let full = self.resolve(path)?;

        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| map_io(path, e))?;
        }

        // Write to a sibling temp file, then rename over the target
        let mut temp_name = full.file_name().unwrap_or_default().to_os_string();
        temp_name.push(".linkweave-tmp");
        let temp = full.with_file_name(temp_name);

        tokio::fs::write(&temp, content)
            .await
            .map_err(|e| map_io(path, e))?;
        if let Err(e) = tokio::fs::rename(&temp, &full).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(map_io(path, e));
        }
        Ok(())
    }

    #[instrument(skip(self), name = "storage_rename_file")]
    async fn rename_file(&self, from: &Path, to: &Path) -> Result<()> {
        let full_from = self.resolve(from)?;
        let full_to = self.resolve(to)?;

        if !tokio::fs::try_exists(&full_from)
            .await
            .map_err(|e| map_io(from, e))?
        {
            return Err(Error::file_not_found(from));
        }
        if tokio::fs::try_exists(&full_to)
            .await
            .map_err(|e| map_io(to, e))?
        {
            return Err(Error::already_exists(to));
        }

        if let Some(parent) = full_to.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| map_io(to, e))?;
        }
        tokio::fs::rename(&full_from, &full_to)
            .await
            .map_err(|e| map_io(from, e))
    }

    async fn exists(&self, path: &Path) -> Result<bool> {
        let full = self.resolve(path)?;
        tokio::fs::try_exists(&full)
            .await
            .map_err(|e| map_io(path, e))
    }
}

/// In-memory storage for tests and dry runs.
///
/// Reads and writes of paths registered with [`MemoryStorage::fail_reads_from`]
/// and [`MemoryStorage::fail_writes_to`] return a storage error, which
/// exercises the partial-failure paths.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    files: RwLock<BTreeMap<PathBuf, String>>,
    failing_reads: RwLock<BTreeSet<PathBuf>>,
    failing_writes: RwLock<BTreeSet<PathBuf>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-filled with `(path, content)` pairs
    pub fn with_files<I, P, S>(files: I) -> Self
    where
        I: IntoIterator<Item = (P, S)>,
        P: Into<PathBuf>,
        S: Into<String>,
    {
        let files = files
            .into_iter()
            .map(|(p, s)| (p.into(), s.into()))
            .collect();
        Self {
            files: RwLock::new(files),
            ..Self::default()
        }
    }

    /// Make every later read of `path` fail
    pub async fn fail_reads_from(&self, path: impl Into<PathBuf>) {
        self.failing_reads.write().await.insert(path.into());
    }

    /// Make every later write to `path` fail
    pub async fn fail_writes_to(&self, path: impl Into<PathBuf>) {
        self.failing_writes.write().await.insert(path.into());
    }

    /// Current content of a file
    pub async fn get(&self, path: impl AsRef<Path>) -> Option<String> {
        self.files.read().await.get(path.as_ref()).cloned()
    }

    /// All paths currently stored
    pub async fn paths(&self) -> Vec<PathBuf> {
        self.files.read().await.keys().cloned().collect()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn list_files(
        &self,
        exclusions: &ExclusionSet,
        extension: &str,
    ) -> Result<Vec<NoteFile>> {
        let suffix = format!(".{}", extension);
        let files = self.files.read().await;
        Ok(files
            .iter()
            .filter(|(path, _)| !exclusions.excludes_path(path))
            .filter(|(path, _)| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|name| name.len() > suffix.len() && name.ends_with(&suffix))
            })
            .map(|(path, content)| NoteFile {
                path: path.clone(),
                size: content.len() as u64,
            })
            .collect())
    }

    async fn read_file(&self, path: &Path) -> Result<String> {
        if self.failing_reads.read().await.contains(path) {
            return Err(Error::storage(path, "read rejected"));
        }
        self.files
            .read()
            .await
            .get(path)
            .cloned()
            .ok_or_else(|| Error::file_not_found(path))
    }

    async fn write_file(&self, path: &Path, content: &str) -> Result<()> {
        if self.failing_writes.read().await.contains(path) {
            return Err(Error::storage(path, "write rejected"));
        }
        self.files
            .write()
            .await
            .insert(path.to_path_buf(), content.to_string());
        Ok(())
    }

    async fn rename_file(&self, from: &Path, to: &Path) -> Result<()> {
        let mut files = self.files.write().await;
        if files.contains_key(to) {
            return Err(Error::already_exists(to));
        }
        let content = files.remove(from).ok_or_else(|| Error::file_not_found(from))?;
        files.insert(to.to_path_buf(), content);
        Ok(())
    }

    async fn exists(&self, path: &Path) -> Result<bool> {
        Ok(self.files.read().await.contains_key(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        tokio::fs::write(path, content).await.unwrap();
    }

    #[test]
    fn test_root_must_be_directory() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("a.md");
        std::fs::write(&file, "x").unwrap();

        assert!(FsStorage::new(temp.path()).is_ok());
        assert!(matches!(
            FsStorage::new(&file),
            Err(Error::InvalidPath { .. })
        ));
    }

    #[tokio::test]
    async fn test_list_files_sorted_and_excluded() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write(root, "b.md", "").await;
        write(root, "A/a.md", "").await;
        write(root, ".obsidian/config.md", "").await;
        write(root, "node_modules/pkg/readme.md", "").await;
        write(root, "_trash/old.md", "").await;
        write(root, "image.png", "").await;

        let storage = FsStorage::new(root).unwrap();
        let files = storage
            .list_files(&ExclusionSet::default(), "md")
            .await
            .unwrap();
        let paths: Vec<_> = files.iter().map(|f| f.path.clone()).collect();
        assert_eq!(paths, vec![PathBuf::from("A/a.md"), PathBuf::from("b.md")]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_list_files_skips_unreadable_folder() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write(root, "a.md", "").await;
        write(root, "Locked/hidden.md", "").await;
        write(root, "Open/b.md", "").await;

        let locked = root.join("Locked");
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000)).unwrap();
        // privileged users read through mode 000
        let enforced = std::fs::read_dir(&locked).is_err();

        let storage = FsStorage::new(root).unwrap();
        let result = storage.list_files(&ExclusionSet::default(), "md").await;
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();

        let paths: Vec<_> = result.unwrap().into_iter().map(|f| f.path).collect();
        assert!(paths.contains(&PathBuf::from("a.md")));
        assert!(paths.contains(&PathBuf::from("Open/b.md")));
        if enforced {
            assert_eq!(paths.len(), 2);
        }
    }

    #[tokio::test]
    async fn test_write_read_rename() {
        let temp = TempDir::new().unwrap();
        let storage = FsStorage::new(temp.path()).unwrap();

        storage
            .write_file(Path::new("Notes/Old.md"), "hello")
            .await
            .unwrap();
        assert_eq!(
            storage.read_file(Path::new("Notes/Old.md")).await.unwrap(),
            "hello"
        );

        storage
            .rename_file(Path::new("Notes/Old.md"), Path::new("Archive/New.md"))
            .await
            .unwrap();
        assert!(!storage.exists(Path::new("Notes/Old.md")).await.unwrap());
        assert!(storage.exists(Path::new("Archive/New.md")).await.unwrap());

        let missing = storage.read_file(Path::new("Notes/Old.md")).await;
        assert!(missing.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_rename_refuses_existing_destination() {
        let temp = TempDir::new().unwrap();
        let storage = FsStorage::new(temp.path()).unwrap();
        storage.write_file(Path::new("a.md"), "a").await.unwrap();
        storage.write_file(Path::new("b.md"), "b").await.unwrap();

        let result = storage
            .rename_file(Path::new("a.md"), Path::new("b.md"))
            .await;
        assert!(matches!(result, Err(Error::AlreadyExists { .. })));
        assert_eq!(storage.read_file(Path::new("b.md")).await.unwrap(), "b");
    }

    #[tokio::test]
    async fn test_traversal_rejected() {
        let temp = TempDir::new().unwrap();
        let storage = FsStorage::new(temp.path()).unwrap();
        let result = storage.read_file(Path::new("../outside.md")).await;
        assert!(matches!(result, Err(Error::PathTraversalAttempt { .. })));
    }

    #[tokio::test]
    async fn test_memory_storage_failures() {
        let storage = MemoryStorage::with_files([("a.md", "x"), (".hidden/b.md", "y")]);
        storage.fail_writes_to("a.md").await;

        assert!(storage.write_file(Path::new("a.md"), "z").await.is_err());
        assert_eq!(storage.get("a.md").await.as_deref(), Some("x"));

        storage.fail_reads_from("a.md").await;
        assert!(matches!(
            storage.read_file(Path::new("a.md")).await,
            Err(Error::Storage { .. })
        ));

        let files = storage
            .list_files(&ExclusionSet::default(), "md")
            .await
            .unwrap();
        assert_eq!(files.len(), 1);
    }
}
