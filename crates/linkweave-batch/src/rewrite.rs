//! Link propagation after a note moves or is renamed.
//!
//! References are matched against the file set as it was before the move, so
//! bare-name, path and inline forms pointing at the old identity are all found.
//! Files are rewritten independently: one failure never stops the others.

use crate::report::{BatchMoveReport, FileFailure, MoveRecord, RenameReport};
use linkweave_core::prelude::*;
use linkweave_core::TransactionBuilder;
use linkweave_graph::NoteIndex;
use linkweave_parser::{Parser, render_reference};
use linkweave_vault::{LineEdit, Storage, apply_line_edits};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::instrument;

/// Rewrites references across a vault when identities change
pub struct LinkRewriter {
    storage: Arc<dyn Storage>,
    config: EngineConfig,
    parser: Parser,
}

impl LinkRewriter {
    pub fn new(storage: Arc<dyn Storage>, config: EngineConfig) -> Self {
        let parser = Parser::new(config.note_extension.clone());
        Self {
            storage,
            config,
            parser,
        }
    }

    /// Move a note file, then propagate the new identity.
    ///
    /// Fails without touching anything if the source is missing or the
    /// destination already exists.
    #[instrument(skip_all, fields(from = %from, to = %to), name = "move_note")]
    pub async fn move_note(&self, from: &NoteIdentity, to: &NoteIdentity) -> Result<RenameReport> {
        check_identity(from)?;
        check_identity(to)?;
        if from == to {
            return Err(Error::invalid_path(format!(
                "Source and destination are the same note: {}",
                from
            )));
        }

        let extension = &self.config.note_extension;
        let from_path = from.file_path(extension);
        let to_path = to.file_path(extension);

        if !self.storage.exists(&from_path).await? {
            return Err(Error::file_not_found(from_path));
        }
        if self.storage.exists(&to_path).await? {
            return Err(Error::already_exists(to_path));
        }

        self.storage.rename_file(&from_path, &to_path).await?;
        log::info!("Moved {} -> {}", from_path.display(), to_path.display());

        self.propagate_rename(from, to).await
    }

    /// Move several notes in order; a failed pair is recorded and the rest
    /// still run
    #[instrument(skip(self, pairs), fields(count = pairs.len()), name = "move_notes")]
    pub async fn move_notes(&self, pairs: &[(NoteIdentity, NoteIdentity)]) -> BatchMoveReport {
        let transaction = TransactionBuilder::new();
        let mut records = Vec::with_capacity(pairs.len());

        for (idx, (from, to)) in pairs.iter().enumerate() {
            let record = match self.move_note(from, to).await {
                Ok(rename) => MoveRecord {
                    operation_index: idx,
                    from: from.clone(),
                    to: to.clone(),
                    success: true,
                    error: None,
                    rename: Some(rename),
                },
                Err(e) => {
                    log::warn!("Move {} -> {} failed: {}", from, to, e);
                    MoveRecord {
                        operation_index: idx,
                        from: from.clone(),
                        to: to.clone(),
                        success: false,
                        error: Some(e.to_string()),
                        rename: None,
                    }
                }
            };
            records.push(record);
        }

        BatchMoveReport::finish(&transaction, records)
    }

    /// Propagate several identity changes, one after another
    pub async fn propagate_renames(
        &self,
        pairs: &[(NoteIdentity, NoteIdentity)],
    ) -> Result<Vec<RenameReport>> {
        let mut reports = Vec::with_capacity(pairs.len());
        for (old, new) in pairs {
            reports.push(self.propagate_rename(old, new).await?);
        }
        Ok(reports)
    }

    /// Rewrite every reference to `old` so it points at `new`.
    ///
    /// The note at `new` is not rewritten. Each file is read right before its
    /// rewrite; unreadable or unwritable files land in `failures`.
    #[instrument(skip_all, fields(old = %old, new = %new), name = "propagate_rename")]
    pub async fn propagate_rename(
        &self,
        old: &NoteIdentity,
        new: &NoteIdentity,
    ) -> Result<RenameReport> {
        check_identity(old)?;
        check_identity(new)?;
        let transaction = TransactionBuilder::new();
        let extension = self.config.note_extension.as_str();

        let files = self
            .storage
            .list_files(&self.config.exclusions, extension)
            .await?;
        let current: Vec<(NoteIdentity, PathBuf)> = files
            .into_iter()
            .filter_map(|f| NoteIdentity::from_file_path(&f.path, extension).map(|id| (id, f.path)))
            .collect();

        // file set before the move resolves the old references
        let mut before = NoteIndex::from_identities(current.iter().map(|(id, _)| id.clone()), extension);
        before.remove(new);
        before.insert(old.clone());
        // file set after the move decides whether the bare name is still unique
        let mut after = before.clone();
        after.remove(old);
        after.insert(new.clone());

        let mut report = RenameReport {
            transaction_id: transaction.transaction_id().to_string(),
            started_at: transaction.started_at(),
            duration_ms: 0,
            old: old.clone(),
            new: new.clone(),
            files_updated: 0,
            references_updated: 0,
            updated_files: Vec::new(),
            failures: Vec::new(),
        };

        for (source, path) in current {
            if &source == new {
                continue;
            }
            let display = path.to_string_lossy().replace('\\', "/");

            let content = match self.storage.read_file(&path).await {
                Ok(content) => content,
                Err(e) => {
                    log::warn!("Cannot read {} during rename: {}", display, e);
                    report.failures.push(FileFailure {
                        path: display,
                        error: e.to_string(),
                    });
                    continue;
                }
            };

            let edits = self.edits_for(&source, &content, old, new, &before, &after);
            if edits.is_empty() {
                continue;
            }

            let result = apply_line_edits(&content, &edits);
            if !result.changed() {
                continue;
            }
            match self.storage.write_file(&path, &result.content).await {
                Ok(()) => {
                    report.files_updated += 1;
                    report.references_updated += result.applied();
                    report.updated_files.push(display);
                }
                Err(e) => {
                    log::warn!("Cannot write {} during rename: {}", display, e);
                    report.failures.push(FileFailure {
                        path: display,
                        error: e.to_string(),
                    });
                }
            }
        }

        report.duration_ms = transaction.elapsed_ms();
        log::info!(
            "Rename {} -> {}: {} files updated, {} failed",
            old,
            new,
            report.files_updated,
            report.failures.len()
        );
        Ok(report)
    }

    fn edits_for(
        &self,
        source: &NoteIdentity,
        content: &str,
        old: &NoteIdentity,
        new: &NoteIdentity,
        before: &NoteIndex,
        after: &NoteIndex,
    ) -> Vec<LineEdit> {
        self.parser
            .extract(source, content)
            .into_iter()
            .filter(|reference| before.resolve_reference(reference).identity() == Some(old))
            .map(|reference| {
                let target = self.new_target_text(&reference, new, before, after);
                LineEdit {
                    line: reference.line,
                    column: reference.column,
                    replacement: render_reference(&reference, &target),
                    original: reference.link_text,
                }
            })
            .filter(|edit| edit.original != edit.replacement)
            .collect()
    }

    /// Bare name only if the reference was bare and the name stays unique.
    /// Inline targets are checked to resolve to `new` from their own folder.
    fn new_target_text(
        &self,
        reference: &RawReference,
        new: &NoteIdentity,
        before: &NoteIndex,
        after: &NoteIndex,
    ) -> String {
        match reference.kind {
            ReferenceKind::Bracketed => {
                let written = before.normalize_target(&reference.target);
                if !written.contains('/') && after.is_unique_name(&new.name) {
                    new.name.clone()
                } else {
                    new.path.clone()
                }
            }
            ReferenceKind::Inline => after.inline_text_for(&reference.source, new),
        }
    }
}

fn check_identity(id: &NoteIdentity) -> Result<()> {
    if id.is_empty() {
        return Err(Error::invalid_path("Note identity must not be empty"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use linkweave_vault::MemoryStorage;

    fn rewriter(storage: &Arc<MemoryStorage>) -> LinkRewriter {
        LinkRewriter::new(storage.clone(), EngineConfig::default())
    }

    #[tokio::test]
    async fn test_rename_bare_and_alias() {
        let storage = Arc::new(MemoryStorage::with_files([
            ("Notes/New.md", "moved body"),
            ("Other.md", "[[Old]] and [[Old|alias]]\n"),
            ("Unrelated.md", "[[Other]]\n"),
        ]));

        let report = rewriter(&storage)
            .propagate_rename(&NoteIdentity::new("Notes/Old"), &NoteIdentity::new("Notes/New"))
            .await
            .unwrap();

        assert_eq!(report.files_updated, 1);
        assert_eq!(report.references_updated, 2);
        assert_eq!(report.updated_files, vec!["Other.md"]);
        assert_eq!(
            storage.get("Other.md").await.unwrap(),
            "[[New]] and [[New|alias]]\n"
        );
        assert_eq!(storage.get("Unrelated.md").await.unwrap(), "[[Other]]\n");
    }

    #[tokio::test]
    async fn test_rename_path_inline_and_fragment() {
        let storage = Arc::new(MemoryStorage::with_files([
            ("Archive/Plan.md", ""),
            (
                "Journal/Today.md",
                "[[Projects/Plan#Goals]]\n[see](../Projects/Plan.md#Goals)\n",
            ),
        ]));

        rewriter(&storage)
            .propagate_rename(
                &NoteIdentity::new("Projects/Plan"),
                &NoteIdentity::new("Archive/Plan"),
            )
            .await
            .unwrap();

        assert_eq!(
            storage.get("Journal/Today.md").await.unwrap(),
            "[[Archive/Plan#Goals]]\n[see](Archive/Plan.md#Goals)\n"
        );
    }

    #[tokio::test]
    async fn test_rename_inline_not_shadowed_by_local_folder() {
        let storage = Arc::new(MemoryStorage::with_files([
            ("Archive/Plan.md", ""),
            ("Journal/Archive/Plan.md", ""),
            ("Journal/Today.md", "[see](../Projects/Plan.md)\n"),
        ]));

        rewriter(&storage)
            .propagate_rename(
                &NoteIdentity::new("Projects/Plan"),
                &NoteIdentity::new("Archive/Plan"),
            )
            .await
            .unwrap();

        assert_eq!(
            storage.get("Journal/Today.md").await.unwrap(),
            "[see](../Archive/Plan.md)\n"
        );

        let graph = linkweave_vault::GraphBuilder::new(storage.clone(), EngineConfig::default())
            .build()
            .await
            .unwrap();
        let targets: Vec<_> = graph
            .forward_links(&NoteIdentity::new("Journal/Today"))
            .iter()
            .map(|edge| edge.target.path.clone())
            .collect();
        assert_eq!(targets, vec!["Archive/Plan".to_string()]);
    }

    #[tokio::test]
    async fn test_rename_uses_path_when_name_collides() {
        let storage = Arc::new(MemoryStorage::with_files([
            ("B/Topic.md", ""),
            ("C/Topic.md", ""),
            ("Index.md", "[[Old]]\n"),
        ]));

        rewriter(&storage)
            .propagate_rename(&NoteIdentity::new("A/Old"), &NoteIdentity::new("B/Topic"))
            .await
            .unwrap();

        assert_eq!(storage.get("Index.md").await.unwrap(), "[[B/Topic]]\n");
    }

    #[tokio::test]
    async fn test_destination_excluded_and_failures_continue() {
        let storage = Arc::new(MemoryStorage::with_files([
            ("New.md", "self link [[Old]]\n"),
            ("A.md", "[[Old]]\n"),
            ("B.md", "[[Old]]\n"),
        ]));
        storage.fail_writes_to("A.md").await;

        let report = rewriter(&storage)
            .propagate_rename(&NoteIdentity::new("Old"), &NoteIdentity::new("New"))
            .await
            .unwrap();

        assert_eq!(report.files_updated, 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].path, "A.md");
        assert_eq!(storage.get("B.md").await.unwrap(), "[[New]]\n");
        assert_eq!(storage.get("New.md").await.unwrap(), "self link [[Old]]\n");
    }

    #[tokio::test]
    async fn test_move_note_checks() {
        let storage = Arc::new(MemoryStorage::with_files([("A.md", ""), ("B.md", "")]));
        let rewriter = rewriter(&storage);

        let missing = rewriter
            .move_note(&NoteIdentity::new("Nope"), &NoteIdentity::new("C"))
            .await;
        assert!(missing.unwrap_err().is_not_found());

        let taken = rewriter
            .move_note(&NoteIdentity::new("A"), &NoteIdentity::new("B"))
            .await;
        assert!(matches!(taken, Err(Error::AlreadyExists { .. })));
        assert!(storage.get("A.md").await.is_some());
    }

    #[tokio::test]
    async fn test_move_notes_in_order() {
        let storage = Arc::new(MemoryStorage::with_files([
            ("One.md", ""),
            ("Two.md", ""),
            ("Index.md", "[[One]] [[Two]]\n"),
        ]));

        let report = rewriter(&storage)
            .move_notes(&[
                (NoteIdentity::new("One"), NoteIdentity::new("Done/One-Final")),
                (NoteIdentity::new("Missing"), NoteIdentity::new("X")),
                (NoteIdentity::new("Two"), NoteIdentity::new("Done/Two-Final")),
            ])
            .await;

        assert_eq!(report.total, 3);
        assert_eq!(report.succeeded, 2);
        assert!(!report.records[1].success);
        assert_eq!(report.files_updated(), 2);
        assert_eq!(
            storage.get("Index.md").await.unwrap(),
            "[[One-Final]] [[Two-Final]]\n"
        );
    }
}
