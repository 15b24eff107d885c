//! Graph builder: scan, parse and resolve into a [`LinkGraph`] snapshot.

use crate::edit::compute_hash;
use crate::scanner::{NoteScanner, ScannedNote};
use crate::storage::Storage;
use linkweave_core::{EngineConfig, NoteNode, RawReference, Result};
use linkweave_graph::LinkGraph;
use linkweave_parser::Parser;
use std::sync::Arc;
use tracing::instrument;

/// Builds a fresh graph per call; nothing is cached between builds
pub struct GraphBuilder {
    scanner: NoteScanner,
    parser: Parser,
}

impl GraphBuilder {
    pub fn new(storage: Arc<dyn Storage>, config: EngineConfig) -> Self {
        let parser = Parser::new(config.note_extension.clone());
        Self {
            scanner: NoteScanner::new(storage, config),
            parser,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        self.scanner.config()
    }

    /// Scan the vault and build the graph
    #[instrument(skip(self), name = "build_graph")]
    pub async fn build(&self) -> Result<LinkGraph> {
        let notes = self.scanner.scan().await?;
        let graph = self.build_from(&notes);
        log::info!(
            "Graph built: {} notes, {} links, {} broken",
            graph.node_count(),
            graph.edge_count(),
            graph.broken().len()
        );
        Ok(graph)
    }

    /// Build from notes already in memory
    pub fn build_from(&self, notes: &[ScannedNote]) -> LinkGraph {
        let extension = self.parser.note_extension().to_string();
        LinkGraph::from_notes(notes.iter().map(|note| self.node_for(note)), extension)
    }

    fn node_for(&self, note: &ScannedNote) -> (NoteNode, Vec<RawReference>) {
        let parsed = self.parser.parse_note(&note.id, &note.content);

        let mut node = NoteNode::new(note.id.clone(), note.path.clone()).with_tags(parsed.tags());
        if let Some(title) = parsed.title() {
            node.title = title.to_string();
        }
        node.size = parsed.word_count;
        node.headings = parsed.heading_texts();
        node.checksum = compute_hash(&note.content);

        (node, parsed.references)
    }
}
