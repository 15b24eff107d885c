//! Broken reference detection, candidate ranking and repair.

use crate::report::{FixOutcome, FixReport};
use linkweave_core::prelude::*;
use linkweave_core::TransactionBuilder;
use linkweave_graph::{LinkGraph, NoteIndex, fold_case};
use linkweave_parser::render_reference;
use linkweave_vault::{LineEdit, Storage, apply_line_edits, compute_hash};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::instrument;

/// A resolved reference whose `#fragment` names no heading of its target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingFragment {
    pub source: NoteIdentity,
    pub target: NoteIdentity,
    pub line: usize,
    pub fragment: String,
}

/// Rank notes whose bare name contains the target's bare name, or is contained
/// by it (case-insensitive).
///
/// Order: normalized Levenshtein similarity descending, then path ascending.
pub fn rank_candidates(
    raw_target: &str,
    notes: &NoteIndex,
    exclude: Option<&NoteIdentity>,
    limit: usize,
) -> Vec<NoteIdentity> {
    let normalized = notes.normalize_target(raw_target);
    let bare = normalized.rsplit('/').next().unwrap_or_default();
    let wanted = fold_case(bare);
    if wanted.is_empty() {
        return Vec::new();
    }

    let mut scored: Vec<(f64, &NoteIdentity)> = notes
        .identities()
        .filter(|id| Some(*id) != exclude)
        .filter_map(|id| {
            let name = fold_case(&id.name);
            if name.is_empty() || !(name.contains(&wanted) || wanted.contains(&name)) {
                return None;
            }
            Some((strsim::normalized_levenshtein(&wanted, &name), id))
        })
        .collect();

    scored.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.cmp(b.1)));
    scored
        .into_iter()
        .take(limit)
        .map(|(_, id)| id.clone())
        .collect()
}

/// Finds and repairs broken references
pub struct IntegrityChecker {
    storage: Arc<dyn Storage>,
    config: EngineConfig,
}

impl IntegrityChecker {
    pub fn new(storage: Arc<dyn Storage>, config: EngineConfig) -> Self {
        Self { storage, config }
    }

    /// Broken references of `graph`, each with ranked candidates
    pub fn find_broken(&self, graph: &LinkGraph) -> Vec<BrokenReference> {
        graph
            .broken()
            .iter()
            .map(|broken| {
                let candidates = rank_candidates(
                    &broken.reference.target,
                    graph.note_index(),
                    Some(&broken.reference.source),
                    self.config.max_suggestions,
                );
                BrokenReference::unranked(broken.reference.clone()).with_candidates(candidates)
            })
            .collect()
    }

    /// Ranked candidates for a raw target
    pub fn suggest(&self, raw_target: &str, notes: &NoteIndex) -> Vec<NoteIdentity> {
        rank_candidates(raw_target, notes, None, self.config.max_suggestions)
    }

    /// Resolved references whose fragment names a missing heading.
    ///
    /// Block references (`#^id`) are not checked. For nested fragments
    /// (`#Parent#Child`) only the last heading is compared.
    pub fn find_missing_fragments(&self, graph: &LinkGraph) -> Vec<MissingFragment> {
        graph
            .edges()
            .filter_map(|edge| {
                let fragment = edge.fragment.as_deref()?;
                if edge.is_block_ref() || fragment.trim().is_empty() {
                    return None;
                }
                let heading = fragment.rsplit('#').next().unwrap_or(fragment);
                let target = graph.node(&edge.target)?;
                if target.has_heading(heading) {
                    return None;
                }
                Some(MissingFragment {
                    source: edge.source.clone(),
                    target: edge.target.clone(),
                    line: edge.line,
                    fragment: fragment.to_string(),
                })
            })
            .collect()
    }

    /// Text that replaces `reference` when pointing it at `candidate`
    pub fn replacement_text(
        &self,
        reference: &RawReference,
        candidate: &NoteIdentity,
        notes: &NoteIndex,
    ) -> String {
        let target = match reference.kind {
            ReferenceKind::Bracketed => notes.link_text_for(candidate),
            ReferenceKind::Inline => notes.inline_text_for(&reference.source, candidate),
        };
        render_reference(reference, &target)
    }

    /// Repair one reference
    pub async fn apply_fix(
        &self,
        reference: &RawReference,
        candidate: &NoteIdentity,
        notes: &NoteIndex,
    ) -> FixOutcome {
        let report = self
            .apply_fixes(vec![(reference.clone(), candidate.clone())], notes)
            .await;
        report
            .outcomes
            .into_iter()
            .next()
            .unwrap_or_else(|| FixOutcome::pending(reference, candidate))
    }

    /// Repair every broken reference of `graph` that has a candidate, using the
    /// first-ranked one
    #[instrument(skip(self, graph), name = "auto_fix_broken_links")]
    pub async fn auto_fix(&self, graph: &LinkGraph) -> FixReport {
        let fixes: Vec<(RawReference, NoteIdentity)> = self
            .find_broken(graph)
            .into_iter()
            .filter_map(|broken| {
                let candidate = broken.suggested_fix()?.clone();
                Some((broken.reference, candidate))
            })
            .collect();
        let mut report = self.apply_grouped(fixes, graph.note_index(), Some(graph)).await;
        report.ambiguous = graph.ambiguous().to_vec();
        if !report.ambiguous.is_empty() {
            log::warn!(
                "{} ambiguous references resolved by tie-break",
                report.ambiguous.len()
            );
        }
        report
    }

    /// Apply repairs grouped per file.
    ///
    /// Each file is read once right before editing, all of its edits are made
    /// on that copy, and it is written once. Failures are recorded per
    /// reference and the batch continues.
    #[instrument(skip(self, fixes, notes), fields(count = fixes.len()), name = "apply_fixes")]
    pub async fn apply_fixes(
        &self,
        fixes: Vec<(RawReference, NoteIdentity)>,
        notes: &NoteIndex,
    ) -> FixReport {
        self.apply_grouped(fixes, notes, None).await
    }

    async fn apply_grouped(
        &self,
        fixes: Vec<(RawReference, NoteIdentity)>,
        notes: &NoteIndex,
        scanned: Option<&LinkGraph>,
    ) -> FixReport {
        let transaction = TransactionBuilder::new();
        let mut outcomes: Vec<FixOutcome> = fixes
            .iter()
            .map(|(reference, candidate)| FixOutcome::pending(reference, candidate))
            .collect();

        let mut by_file: BTreeMap<&NoteIdentity, Vec<usize>> = BTreeMap::new();
        for (i, (reference, _)) in fixes.iter().enumerate() {
            by_file.entry(&reference.source).or_default().push(i);
        }

        let mut files_written = 0;
        for (source, indices) in by_file {
            let path = source.file_path(&self.config.note_extension);

            let content = match self.storage.read_file(&path).await {
                Ok(content) => content,
                Err(e) => {
                    log::warn!("Cannot read {} for repair: {}", path.display(), e);
                    for &i in &indices {
                        outcomes[i].fail(e.to_string());
                    }
                    continue;
                }
            };

            if let Some(node) = scanned.and_then(|g| g.node(source))
                && node.checksum != compute_hash(&content)
            {
                log::debug!("{} changed since scan; spans re-verified", path.display());
            }

            let edits: Vec<LineEdit> = indices
                .iter()
                .map(|&i| {
                    let (reference, candidate) = &fixes[i];
                    LineEdit {
                        line: reference.line,
                        column: reference.column,
                        original: reference.link_text.clone(),
                        replacement: self.replacement_text(reference, candidate, notes),
                    }
                })
                .collect();

            let result = apply_line_edits(&content, &edits);
            for (&i, (edit, status)) in indices.iter().zip(edits.iter().zip(&result.statuses)) {
                if status.is_applied() {
                    outcomes[i].fixed = true;
                    outcomes[i].new_text = Some(edit.replacement.clone());
                } else {
                    outcomes[i].fail(format!(
                        "'{}' is no longer on line {}",
                        edit.original, edit.line
                    ));
                }
            }

            if !result.changed() {
                continue;
            }
            if let Err(e) = self.storage.write_file(&path, &result.content).await {
                log::warn!("Cannot write repairs to {}: {}", path.display(), e);
                for &i in &indices {
                    if outcomes[i].fixed {
                        outcomes[i].fail(e.to_string());
                    }
                }
                continue;
            }
            files_written += 1;
        }

        let report = FixReport::finish(&transaction, outcomes, files_written);
        log::info!(
            "Repaired {}/{} broken references in {} files",
            report.fixed,
            report.total,
            report.files_written
        );
        report
    }
}
