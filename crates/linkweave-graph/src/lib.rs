//! # Link Graph Analysis
//!
//! Link resolution and the link graph of a note vault, using petgraph.
//!
//! Provides:
//! - Tiered link resolution ([`NoteIndex`]) with ambiguity reporting
//! - Immutable graph snapshot of notes and resolved references
//! - Broken reference collection
//! - Backlink / forward link queries
//! - Orphan detection, most-connected ranking, tag clusters
//! - Graph statistics
//!
//! ## Quick Start
//!
//! ```
//! use linkweave_core::{NoteIdentity, NoteNode};
//! use linkweave_graph::{GraphAnalytics, LinkGraph};
//! use linkweave_parser::extract_references;
//!
//! let notes = [("A", "Links to [[B]]"), ("B", "Nothing"), ("C", "Alone")]
//!     .into_iter()
//!     .map(|(path, body)| {
//!         let id = NoteIdentity::new(path);
//!         let refs = extract_references(&id, body);
//!         (NoteNode::new(id.clone(), id.file_path("md")), refs)
//!     });
//!
//! let graph = LinkGraph::from_notes(notes, "md");
//! assert_eq!(graph.edge_count(), 1);
//!
//! let analytics = GraphAnalytics::new(&graph);
//! assert_eq!(analytics.orphans(), vec![NoteIdentity::new("C")]);
//! ```
//!
//! ## Resolution
//!
//! ```
//! use linkweave_core::NoteIdentity;
//! use linkweave_graph::{NoteIndex, Resolution};
//!
//! let index = NoteIndex::from_identities(
//!     [NoteIdentity::new("B/x"), NoteIdentity::new("A/x")],
//!     "md",
//! );
//! match index.resolve("x") {
//!     Resolution::Ambiguous { chosen, alternatives } => {
//!         assert_eq!(chosen.path, "A/x");
//!         assert_eq!(alternatives.len(), 1);
//!     }
//!     other => panic!("unexpected {:?}", other),
//! }
//! ```
//!
//! ## Modules
//!
//! - [`resolver`] - Tiered target resolution
//! - [`graph`] - LinkGraph snapshot
//! - [`analytics`] - Orphans, most-connected, clusters

pub mod analytics;
pub mod graph;
pub mod resolver;

pub use analytics::{ConnectedNote, GraphAnalytics, TagCluster};
pub use graph::{GraphStats, LinkGraph};
pub use resolver::{NoteIndex, Resolution, fold_case};

pub mod prelude {
    pub use crate::analytics::{ConnectedNote, GraphAnalytics, TagCluster};
    pub use crate::graph::{GraphStats, LinkGraph};
    pub use crate::resolver::{NoteIndex, Resolution};
    pub use linkweave_core::prelude::*;
}
