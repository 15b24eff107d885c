//! # Link Integrity & Rewriting
//!
//! Operations that change many notes at once:
//! - [`IntegrityChecker`]: rank candidates for broken references and repair
//!   them, grouped per file (one read, one write per file per batch)
//! - [`LinkRewriter`]: move notes and propagate the new identity to every
//!   referring note
//!
//! Nothing here is transactional. Each file is rewritten on its own and
//! failures are reported per reference or per file while the batch continues.
//!
//! ## Quick Start
//!
//! ```no_run
//! use linkweave_batch::{IntegrityChecker, LinkRewriter};
//! use linkweave_core::{EngineConfig, NoteIdentity, Result};
//! use linkweave_vault::{FsStorage, GraphBuilder};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<()> {
//! let storage = Arc::new(FsStorage::new("/path/to/vault")?);
//! let config = EngineConfig::default();
//!
//! let graph = GraphBuilder::new(storage.clone(), config.clone()).build().await?;
//! let report = IntegrityChecker::new(storage.clone(), config.clone())
//!     .auto_fix(&graph)
//!     .await;
//! println!("fixed {}/{}", report.fixed, report.total);
//!
//! let rename = LinkRewriter::new(storage, config)
//!     .move_note(&NoteIdentity::new("Notes/Old"), &NoteIdentity::new("Notes/New"))
//!     .await?;
//! println!("{} files updated", rename.files_updated);
//! # Ok(())
//! # }
//! ```

pub mod integrity;
pub mod report;
pub mod rewrite;

pub use integrity::{IntegrityChecker, MissingFragment, rank_candidates};
pub use report::{BatchMoveReport, FileFailure, FixOutcome, FixReport, MoveRecord, RenameReport};
pub use rewrite::LinkRewriter;
