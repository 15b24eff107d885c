//! Tool façade over one vault.
//!
//! Every call builds a fresh graph from storage; nothing is cached between
//! calls. Replies are plain serde types so a dispatcher can emit them as JSON.

use linkweave_batch::{
    BatchMoveReport, FixOutcome, FixReport, IntegrityChecker, LinkRewriter, MissingFragment,
    RenameReport,
};
use linkweave_core::prelude::*;
use linkweave_graph::{ConnectedNote, GraphAnalytics, GraphStats, LinkGraph, TagCluster};
use linkweave_vault::{FsStorage, GraphBuilder, Storage};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::instrument;

/// Broken reference as reported to tool callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrokenLinkInfo {
    pub source_file: String,
    pub line_number: usize,
    pub link_text: String,
    pub link_target: String,
    pub link_type: ReferenceKind,
    pub suggested_fix: Option<String>,
    pub candidates: Vec<String>,
    pub can_auto_fix: bool,
}

impl BrokenLinkInfo {
    fn from_broken(broken: &BrokenReference, extension: &str) -> Self {
        let reference = &broken.reference;
        Self {
            source_file: display_path(&reference.source.file_path(extension)),
            line_number: reference.line,
            link_text: reference.link_text.clone(),
            link_target: reference.target.clone(),
            link_type: reference.kind,
            suggested_fix: broken.suggested_fix().map(|id| id.path.clone()),
            candidates: broken.candidates.iter().map(|id| id.path.clone()).collect(),
            can_auto_fix: broken.auto_fixable,
        }
    }
}

/// One edge of a backlink / forward link listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkInfo {
    pub source: String,
    pub target: String,
    pub line: usize,
    pub kind: ReferenceKind,
    pub fragment: Option<String>,
}

impl From<&LinkEdge> for LinkInfo {
    fn from(edge: &LinkEdge) -> Self {
        Self {
            source: edge.source.path.clone(),
            target: edge.target.path.clone(),
            line: edge.line,
            kind: edge.kind,
            fragment: edge.fragment.clone(),
        }
    }
}

/// Ambiguous reference as reported to tool callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmbiguousLinkInfo {
    pub source: String,
    pub line: usize,
    pub link_text: String,
    pub chosen: String,
    pub alternatives: Vec<String>,
}

impl From<&AmbiguousReference> for AmbiguousLinkInfo {
    fn from(ambiguous: &AmbiguousReference) -> Self {
        Self {
            source: ambiguous.reference.source.path.clone(),
            line: ambiguous.reference.line,
            link_text: ambiguous.reference.link_text.clone(),
            chosen: ambiguous.chosen.path.clone(),
            alternatives: ambiguous.alternatives.iter().map(|id| id.path.clone()).collect(),
        }
    }
}

/// Broken references plus the references settled by the bare-name tie-break
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BrokenLinkReport {
    pub broken: Vec<BrokenLinkInfo>,
    pub ambiguous: Vec<AmbiguousLinkInfo>,
}

impl BrokenLinkReport {
    /// Nothing broken and nothing ambiguous
    pub fn is_clean(&self) -> bool {
        self.broken.is_empty() && self.ambiguous.is_empty()
    }
}

/// Graph statistics plus the ambiguity listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphSummary {
    #[serde(flatten)]
    pub stats: GraphStats,
    pub ambiguous: Vec<AmbiguousLinkInfo>,
}

/// Link tools for a single vault
pub struct LinkTools {
    storage: Arc<dyn Storage>,
    config: EngineConfig,
}

impl LinkTools {
    /// Create tools over any storage backend
    pub fn new(storage: Arc<dyn Storage>, config: EngineConfig) -> Self {
        Self { storage, config }
    }

    /// Tools over a vault directory on disk
    pub fn open(vault: &VaultConfig) -> Result<Self> {
        let storage = FsStorage::new(&vault.path)?;
        Ok(Self::new(Arc::new(storage), vault.engine.clone()))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Parse a note argument: `Folder/Note` or `Folder/Note.md`
    pub fn note_identity(&self, input: &str) -> Result<NoteIdentity> {
        let trimmed = input.trim();
        let id = NoteIdentity::from_file_path(Path::new(trimmed), &self.config.note_extension)
            .unwrap_or_else(|| NoteIdentity::new(trimmed));
        if id.is_empty() {
            return Err(Error::invalid_path(format!("Not a note reference: '{}'", input)));
        }
        Ok(id)
    }

    /// Fresh graph snapshot
    pub async fn graph(&self) -> Result<LinkGraph> {
        GraphBuilder::new(self.storage.clone(), self.config.clone())
            .build()
            .await
    }

    fn checker(&self) -> IntegrityChecker {
        IntegrityChecker::new(self.storage.clone(), self.config.clone())
    }

    fn rewriter(&self) -> LinkRewriter {
        LinkRewriter::new(self.storage.clone(), self.config.clone())
    }

    /// Node, edge, broken and orphan counts
    #[instrument(skip(self), name = "tool_graph_summary")]
    pub async fn graph_summary(&self) -> Result<GraphSummary> {
        let graph = self.graph().await?;
        Ok(GraphSummary {
            stats: graph.stats(),
            ambiguous: graph.ambiguous().iter().map(AmbiguousLinkInfo::from).collect(),
        })
    }

    /// Notes with no links in or out
    pub async fn orphans(&self) -> Result<Vec<String>> {
        let graph = self.graph().await?;
        Ok(GraphAnalytics::new(&graph)
            .orphans()
            .into_iter()
            .map(|id| id.path)
            .collect())
    }

    /// Notes ranked by link count
    pub async fn most_connected(&self, limit: Option<usize>) -> Result<Vec<ConnectedNote>> {
        let graph = self.graph().await?;
        Ok(GraphAnalytics::new(&graph).most_connected(limit))
    }

    /// Tag clusters
    pub async fn clusters(&self) -> Result<Vec<TagCluster>> {
        let graph = self.graph().await?;
        Ok(GraphAnalytics::new(&graph)
            .with_min_cluster_size(self.config.min_cluster_size)
            .clusters())
    }

    /// References pointing at `note`
    pub async fn backlinks(&self, note: &str) -> Result<Vec<LinkInfo>> {
        let id = self.note_identity(note)?;
        let graph = self.graph().await?;
        if !graph.contains(&id) {
            return Err(Error::not_found(id.path.clone()));
        }
        Ok(graph.backlinks(&id).into_iter().map(LinkInfo::from).collect())
    }

    /// References leaving `note`
    pub async fn forward_links(&self, note: &str) -> Result<Vec<LinkInfo>> {
        let id = self.note_identity(note)?;
        let graph = self.graph().await?;
        if !graph.contains(&id) {
            return Err(Error::not_found(id.path.clone()));
        }
        Ok(graph
            .forward_links(&id)
            .into_iter()
            .map(LinkInfo::from)
            .collect())
    }

    /// Every broken reference with ranked candidates, and every ambiguous one
    #[instrument(skip(self), name = "tool_broken_links")]
    pub async fn broken_links(&self) -> Result<BrokenLinkReport> {
        let graph = self.graph().await?;
        let broken = self
            .checker()
            .find_broken(&graph)
            .iter()
            .map(|b| BrokenLinkInfo::from_broken(b, &self.config.note_extension))
            .collect();
        Ok(BrokenLinkReport {
            broken,
            ambiguous: graph.ambiguous().iter().map(AmbiguousLinkInfo::from).collect(),
        })
    }

    /// Repair every auto-fixable broken reference
    pub async fn fix_broken_links(&self) -> Result<FixReport> {
        let graph = self.graph().await?;
        Ok(self.checker().auto_fix(&graph).await)
    }

    /// Repair one broken reference identified by source note, line and target.
    ///
    /// Without `candidate` the first-ranked suggestion is used.
    pub async fn fix_link(
        &self,
        source: &str,
        line: usize,
        target: &str,
        candidate: Option<&str>,
    ) -> Result<FixOutcome> {
        let source = self.note_identity(source)?;
        let graph = self.graph().await?;
        let checker = self.checker();

        let broken = checker
            .find_broken(&graph)
            .into_iter()
            .find(|b| {
                b.reference.source == source
                    && b.reference.line == line
                    && b.reference.target == target
            })
            .ok_or_else(|| {
                Error::not_found(format!(
                    "No broken reference to '{}' at {}:{}",
                    target, source, line
                ))
            })?;

        let chosen = match candidate {
            Some(raw) => {
                let id = self.note_identity(raw)?;
                if !graph.contains(&id) {
                    return Err(Error::not_found(id.path.clone()));
                }
                id
            }
            None => broken.suggested_fix().cloned().ok_or_else(|| {
                Error::not_found(format!("No candidate for '{}'", broken.reference.link_text))
            })?,
        };

        Ok(checker
            .apply_fix(&broken.reference, &chosen, graph.note_index())
            .await)
    }

    /// Fragments naming headings that do not exist
    pub async fn missing_fragments(&self) -> Result<Vec<MissingFragment>> {
        let graph = self.graph().await?;
        Ok(self.checker().find_missing_fragments(&graph))
    }

    /// Move a note and rewrite references to it
    pub async fn move_note(&self, from: &str, to: &str) -> Result<RenameReport> {
        let from = self.note_identity(from)?;
        let to = self.note_identity(to)?;
        self.rewriter().move_note(&from, &to).await
    }

    /// Move several notes in order
    pub async fn move_notes(&self, pairs: &[(String, String)]) -> Result<BatchMoveReport> {
        let pairs = pairs
            .iter()
            .map(|(from, to)| Ok((self.note_identity(from)?, self.note_identity(to)?)))
            .collect::<Result<Vec<_>>>()?;
        Ok(self.rewriter().move_notes(&pairs).await)
    }

    /// Rewrite references after a move done outside the engine
    pub async fn propagate_rename(&self, old: &str, new: &str) -> Result<RenameReport> {
        let old = self.note_identity(old)?;
        let new = self.note_identity(new)?;
        self.rewriter().propagate_rename(&old, &new).await
    }
}

fn display_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
