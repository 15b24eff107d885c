//! Note scanner: every note file of a vault with its text.

use crate::storage::Storage;
use futures::stream::{self, StreamExt};
use linkweave_core::{EngineConfig, NoteIdentity, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::instrument;

/// A note read during a scan
#[derive(Debug, Clone)]
pub struct ScannedNote {
    pub id: NoteIdentity,
    /// Vault-relative path with extension
    pub path: PathBuf,
    pub content: String,
}

/// Walks a vault through a [`Storage`] backend.
///
/// Reads run with bounded concurrency (`scan_concurrency`) and are buffered in
/// order, so output stays sorted by path. Oversized and unreadable files are
/// skipped with a warning.
pub struct NoteScanner {
    storage: Arc<dyn Storage>,
    config: EngineConfig,
}

impl NoteScanner {
    pub fn new(storage: Arc<dyn Storage>, config: EngineConfig) -> Self {
        Self { storage, config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Read every note, sorted by path
    #[instrument(skip(self), name = "scan_vault")]
    pub async fn scan(&self) -> Result<Vec<ScannedNote>> {
        let extension = self.config.note_extension.as_str();
        let files = self
            .storage
            .list_files(&self.config.exclusions, extension)
            .await?;
        let listed = files.len();

        let candidates: Vec<(NoteIdentity, PathBuf)> = files
            .into_iter()
            .filter(|file| {
                if file.size > self.config.max_file_size {
                    log::warn!(
                        "Skipping {} ({} bytes exceeds limit of {})",
                        file.path.display(),
                        file.size,
                        self.config.max_file_size
                    );
                    return false;
                }
                true
            })
            .filter_map(|file| {
                NoteIdentity::from_file_path(&file.path, extension).map(|id| (id, file.path))
            })
            .collect();

        let storage = &self.storage;
        let notes: Vec<ScannedNote> = stream::iter(candidates)
            .map(|(id, path)| async move {
                match storage.read_file(&path).await {
                    Ok(content) => Some(ScannedNote { id, path, content }),
                    Err(e) => {
                        log::warn!("Skipping unreadable note {}: {}", path.display(), e);
                        None
                    }
                }
            })
            .buffered(self.config.scan_concurrency.max(1))
            .filter_map(|note| async move { note })
            .collect()
            .await;

        log::debug!("Scanned {} of {} listed notes", notes.len(), listed);
        Ok(notes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    #[tokio::test]
    async fn test_scan_sorted_and_filtered() {
        let storage = MemoryStorage::with_files([
            ("Zeta.md", "z"),
            ("Alpha/One.md", "one"),
            ("_trash/Gone.md", "gone"),
            ("picture.png", "bytes"),
            ("Big.md", "0123456789"),
        ]);
        let config = EngineConfig {
            max_file_size: 5,
            scan_concurrency: 2,
            ..EngineConfig::default()
        };

        let notes = NoteScanner::new(Arc::new(storage), config).scan().await.unwrap();
        let paths: Vec<_> = notes.iter().map(|n| n.id.path.as_str()).collect();
        assert_eq!(paths, vec!["Alpha/One", "Zeta"]);
        assert_eq!(notes[0].content, "one");
    }

    #[tokio::test]
    async fn test_scan_skips_unreadable_note() {
        let storage = Arc::new(MemoryStorage::with_files([
            ("A.md", "a"),
            ("B.md", "b"),
            ("C.md", "c"),
        ]));
        storage.fail_reads_from("B.md").await;

        let notes = NoteScanner::new(storage, EngineConfig::default())
            .scan()
            .await
            .unwrap();
        let paths: Vec<_> = notes.iter().map(|n| n.id.path.as_str()).collect();
        assert_eq!(paths, vec!["A", "C"]);
    }

    #[tokio::test]
    async fn test_scan_skips_invalid_utf8_on_disk() {
        let temp = tempfile::TempDir::new().unwrap();
        std::fs::write(temp.path().join("Good.md"), "fine").unwrap();
        std::fs::write(temp.path().join("Bad.md"), [0xff, 0xfe, 0x00]).unwrap();

        let storage = crate::storage::FsStorage::new(temp.path()).unwrap();
        let notes = NoteScanner::new(Arc::new(storage), EngineConfig::default())
            .scan()
            .await
            .unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].id.path, "Good");
    }

    #[tokio::test]
    async fn test_scan_empty_vault() {
        let scanner = NoteScanner::new(Arc::new(MemoryStorage::new()), EngineConfig::default());
        assert!(scanner.scan().await.unwrap().is_empty());
    }
}
