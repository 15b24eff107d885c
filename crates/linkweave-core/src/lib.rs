//! # Linkweave Core
//!
//! Core data models, error types and configuration for the vault link engine.
//! This crate defines the canonical types that all other crates depend on.
//!
//! ## Architecture Principles
//!
//! - **Type-Driven Design**: note identities, references and edges are strong types
//! - **Zero Panic in Libraries**: all hard failures are `Result<T, Error>`
//! - **Partial failure is data**: per-file problems are reported, not raised
//! - **Builder Pattern for Complex Types**: configuration structs use builders
//!
//! ## Core Modules
//!
//! - [`models`] - Note identities, references, edges, nodes
//! - [`error`] - Error enum and Result alias
//! - [`config`] - Vault and engine configuration
//! - [`profiles`] - Configuration profiles for different vault sizes
//! - [`utils`] - Serialization, path validation, operation tracking
//!
//! ## Usage Examples
//!
//! ```
//! use linkweave_core::prelude::*;
//!
//! let id = NoteIdentity::new("Notes/Bee-Keeping");
//! let node = NoteNode::new(id.clone(), id.file_path("md"));
//! assert_eq!(node.title, "Bee-Keeping");
//! ```
//!
//! ### Error Handling
//!
//! ```
//! use linkweave_core::prelude::*;
//!
//! fn check() -> Result<()> {
//!     let _err = Error::parse_error("unterminated frontmatter");
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod models;
pub mod profiles;
pub mod utils;

pub use config::*;
pub use error::{Error, Result};
pub use models::*;
pub use profiles::ConfigProfile;
pub use utils::{PathValidator, TransactionBuilder, to_json_string};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{EngineConfig, ExclusionSet, VaultConfig};
    pub use crate::error::{Error, Result};
    pub use crate::models::{
        AmbiguousReference, BrokenReference, Frontmatter, Heading, LinkEdge, NoteIdentity,
        NoteNode, RawReference, ReferenceKind,
    };
    pub use crate::profiles::ConfigProfile;
}
