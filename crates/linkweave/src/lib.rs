//! # Linkweave
//!
//! Link graph and integrity engine for Markdown note vaults, with a thin tool
//! façade ([`LinkTools`]) and the `linkweave` CLI.

pub mod tools;

pub use linkweave_batch::{
    BatchMoveReport, FileFailure, FixOutcome, FixReport, IntegrityChecker, LinkRewriter,
    MissingFragment, MoveRecord, RenameReport,
};
pub use linkweave_core::prelude::*;
pub use linkweave_graph::{ConnectedNote, GraphAnalytics, GraphStats, LinkGraph, TagCluster};
pub use linkweave_vault::{FsStorage, GraphBuilder, MemoryStorage, Storage};
pub use tools::{
    AmbiguousLinkInfo, BrokenLinkInfo, BrokenLinkReport, GraphSummary, LinkInfo, LinkTools,
};
