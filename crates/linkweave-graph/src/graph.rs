//! Link graph snapshot built on petgraph

use crate::resolver::{NoteIndex, Resolution};
use linkweave_core::prelude::*;
use petgraph::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Node index type for graph
type NodeIndex = petgraph::graph::NodeIndex;

/// Immutable snapshot of the vault's cross-references.
///
/// Every edge endpoint is a node; references that do not resolve are kept in
/// [`LinkGraph::broken`] and never become edges.
#[derive(Debug, Clone)]
pub struct LinkGraph {
    /// Directed graph: nodes are notes, edges are resolved references
    graph: DiGraph<NoteNode, LinkEdge>,

    /// Identity to node index, sorted by path
    index: BTreeMap<NoteIdentity, NodeIndex>,

    /// Resolver over the same node set
    notes: NoteIndex,

    broken: Vec<BrokenReference>,
    ambiguous: Vec<AmbiguousReference>,
}

impl LinkGraph {
    /// Create an empty graph
    pub fn new(note_extension: impl Into<String>) -> Self {
        Self {
            graph: DiGraph::new(),
            index: BTreeMap::new(),
            notes: NoteIndex::new(note_extension),
            broken: Vec::new(),
            ambiguous: Vec::new(),
        }
    }

    /// Build a snapshot from parsed notes.
    ///
    /// All nodes are registered first so resolution sees the full note set.
    /// References are resolved in the order given; input sorted by path gives a
    /// deterministic graph.
    pub fn from_notes<I>(notes: I, note_extension: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = (NoteNode, Vec<RawReference>)>,
    {
        let mut graph = Self::new(note_extension);
        let mut pending = Vec::new();

        for (node, references) in notes {
            let id = node.id.clone();
            if graph.add_node(node) {
                pending.push(references);
            } else {
                log::warn!("Duplicate note identity skipped: {}", id);
            }
        }

        for reference in pending.into_iter().flatten() {
            graph.add_reference(reference);
        }

        log::debug!(
            "Link graph built: {} notes, {} edges, {} broken, {} ambiguous",
            graph.node_count(),
            graph.edge_count(),
            graph.broken.len(),
            graph.ambiguous.len()
        );
        graph
    }

    /// Register a note; false if the identity is already present
    fn add_node(&mut self, node: NoteNode) -> bool {
        if self.index.contains_key(&node.id) {
            return false;
        }
        let id = node.id.clone();
        let idx = self.graph.add_node(node);
        self.notes.insert(id.clone());
        self.index.insert(id, idx);
        true
    }

    /// Resolve one reference into an edge, a broken entry, or both an edge and
    /// an ambiguity record
    fn add_reference(&mut self, reference: RawReference) {
        let resolution = self.notes.resolve_reference(&reference);

        let target = match resolution.identity() {
            Some(target) => target.clone(),
            None => {
                self.broken.push(BrokenReference::unranked(reference));
                return;
            }
        };

        let (Some(&source_idx), Some(&target_idx)) =
            (self.index.get(&reference.source), self.index.get(&target))
        else {
            // source not scanned: nothing to attach the edge to
            self.broken.push(BrokenReference::unranked(reference));
            return;
        };

        let edge = LinkEdge {
            source: reference.source.clone(),
            target: target.clone(),
            kind: reference.kind,
            line: reference.line,
            fragment: reference.fragment.clone(),
        };
        self.graph.add_edge(source_idx, target_idx, edge);

        if let Resolution::Ambiguous { alternatives, .. } = resolution {
            self.ambiguous.push(AmbiguousReference {
                reference,
                chosen: target,
                alternatives,
            });
        }
    }

    /// Notes sorted by path
    pub fn nodes(&self) -> impl Iterator<Item = &NoteNode> {
        self.index.values().map(|&idx| &self.graph[idx])
    }

    pub fn node(&self, id: &NoteIdentity) -> Option<&NoteNode> {
        self.index.get(id).map(|&idx| &self.graph[idx])
    }

    pub fn contains(&self, id: &NoteIdentity) -> bool {
        self.index.contains_key(id)
    }

    /// Identities sorted by path
    pub fn identities(&self) -> impl Iterator<Item = &NoteIdentity> {
        self.index.keys()
    }

    /// All edges in insertion order
    pub fn edges(&self) -> impl Iterator<Item = &LinkEdge> {
        self.graph.edge_weights()
    }

    pub fn broken(&self) -> &[BrokenReference] {
        &self.broken
    }

    pub fn ambiguous(&self) -> &[AmbiguousReference] {
        &self.ambiguous
    }

    /// Resolver over this snapshot's notes
    pub fn note_index(&self) -> &NoteIndex {
        &self.notes
    }

    /// Get node count
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Get edge count
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Incoming edges, self-edges excluded
    pub fn in_degree(&self, id: &NoteIdentity) -> usize {
        self.degree_in_direction(id, Incoming)
    }

    /// Outgoing edges, self-edges excluded
    pub fn out_degree(&self, id: &NoteIdentity) -> usize {
        self.degree_in_direction(id, Outgoing)
    }

    /// In plus out; parallel edges count separately
    pub fn degree(&self, id: &NoteIdentity) -> usize {
        self.in_degree(id) + self.out_degree(id)
    }

    fn degree_in_direction(&self, id: &NoteIdentity, direction: Direction) -> usize {
        self.index.get(id).map_or(0, |&idx| {
            self.graph
                .edges_directed(idx, direction)
                .filter(|e| e.source() != e.target())
                .count()
        })
    }

    /// Edges pointing at `id`, sorted by source path then line
    pub fn backlinks(&self, id: &NoteIdentity) -> Vec<&LinkEdge> {
        self.edges_sorted(id, Incoming)
    }

    /// Edges leaving `id`, in document order
    pub fn forward_links(&self, id: &NoteIdentity) -> Vec<&LinkEdge> {
        self.edges_sorted(id, Outgoing)
    }

    fn edges_sorted(&self, id: &NoteIdentity, direction: Direction) -> Vec<&LinkEdge> {
        let Some(&idx) = self.index.get(id) else {
            return Vec::new();
        };
        let mut edges: Vec<&LinkEdge> = self
            .graph
            .edges_directed(idx, direction)
            .map(|e| e.weight())
            .collect();
        edges.sort_by(|a, b| {
            (&a.source, a.line, &a.target).cmp(&(&b.source, b.line, &b.target))
        });
        edges
    }

    /// Find all orphaned notes (no links in or out besides self-links), sorted
    pub fn orphaned_notes(&self) -> Vec<NoteIdentity> {
        self.identities()
            .filter(|id| self.degree(id) == 0)
            .cloned()
            .collect()
    }

    /// Get statistics about the graph
    pub fn stats(&self) -> GraphStats {
        let total_notes = self.node_count();
        let total_links = self.edge_count();

        let average_links_per_note = if total_notes > 0 {
            total_links as f64 / total_notes as f64
        } else {
            0.0
        };

        GraphStats {
            total_notes,
            total_links,
            broken_links: self.broken.len(),
            ambiguous_links: self.ambiguous.len(),
            orphaned_notes: self.orphaned_notes().len(),
            average_links_per_note,
        }
    }
}

/// Statistics about the graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphStats {
    pub total_notes: usize,
    pub total_links: usize,
    pub broken_links: usize,
    pub ambiguous_links: usize,
    pub orphaned_notes: usize,
    pub average_links_per_note: f64,
}
