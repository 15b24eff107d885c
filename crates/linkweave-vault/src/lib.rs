//! # Vault Access
//!
//! Storage backends, the note scanner and the graph builder.
//!
//! This crate provides:
//! - The [`Storage`] trait with filesystem ([`FsStorage`]) and in-memory
//!   ([`MemoryStorage`]) backends
//! - [`NoteScanner`]: sorted `(path, text)` of every note, bounded concurrent reads
//! - [`GraphBuilder`]: scan, parse and resolve into a [`linkweave_graph::LinkGraph`]
//! - Span edits verified against the recorded line ([`edit`])
//!
//! ## Quick Start
//!
//! ```no_run
//! use linkweave_vault::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let storage = Arc::new(FsStorage::new("/path/to/vault")?);
//!     let graph = GraphBuilder::new(storage, EngineConfig::default()).build().await?;
//!     println!("{} notes, {} broken links", graph.node_count(), graph.broken().len());
//!     Ok(())
//! }
//! ```
//!
//! ## Edits
//!
//! ```
//! use linkweave_vault::edit::{LineEdit, apply_line_edits};
//!
//! let result = apply_line_edits(
//!     "intro\nsee [[Bee]]\n",
//!     &[LineEdit {
//!         line: 2,
//!         column: 4,
//!         original: "[[Bee]]".into(),
//!         replacement: "[[Bee-Keeping]]".into(),
//!     }],
//! );
//! assert_eq!(result.content, "intro\nsee [[Bee-Keeping]]\n");
//! ```
//!
//! ## Error Handling
//!
//! All operations return [`linkweave_core::Result<T>`]. Unreadable files met
//! during a scan are logged and skipped rather than failing the scan.

pub mod builder;
pub mod edit;
pub mod scanner;
pub mod storage;

pub use builder::GraphBuilder;
pub use edit::{EditResult, EditStatus, LineEdit, apply_line_edits, compute_hash};
pub use scanner::{NoteScanner, ScannedNote};
pub use storage::{FsStorage, MemoryStorage, NoteFile, Storage};

pub mod prelude {
    pub use crate::builder::GraphBuilder;
    pub use crate::edit::{EditResult, EditStatus, LineEdit, apply_line_edits, compute_hash};
    pub use crate::scanner::{NoteScanner, ScannedNote};
    pub use crate::storage::{FsStorage, MemoryStorage, NoteFile, Storage};
    pub use linkweave_core::prelude::*;
}
