//! Result records for repair, rename and move batches.
//!
//! Partial success is the normal outcome, so failures are carried as data
//! instead of aborting the batch.

use chrono::{DateTime, Utc};
use linkweave_core::{AmbiguousReference, NoteIdentity, RawReference, TransactionBuilder};
use serde::{Deserialize, Serialize};

/// Outcome of repairing one broken reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixOutcome {
    pub source: NoteIdentity,
    pub line: usize,
    /// Span as it was found by the scan
    pub link_text: String,
    pub candidate: NoteIdentity,
    /// Span written in its place, when fixed
    pub new_text: Option<String>,
    pub fixed: bool,
    pub error: Option<String>,
}

impl FixOutcome {
    pub(crate) fn pending(reference: &RawReference, candidate: &NoteIdentity) -> Self {
        Self {
            source: reference.source.clone(),
            line: reference.line,
            link_text: reference.link_text.clone(),
            candidate: candidate.clone(),
            new_text: None,
            fixed: false,
            error: None,
        }
    }

    pub(crate) fn fail(&mut self, error: impl Into<String>) {
        self.fixed = false;
        self.new_text = None;
        self.error = Some(error.into());
    }
}

/// Result of one repair batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixReport {
    /// Unique transaction ID
    pub transaction_id: String,
    pub started_at: DateTime<Utc>,
    /// Execution duration in milliseconds
    pub duration_ms: u64,
    pub total: usize,
    pub fixed: usize,
    /// Files written
    pub files_written: usize,
    /// One record per requested fix, in request order
    pub outcomes: Vec<FixOutcome>,
    /// References settled by the bare-name tie-break, left as written
    #[serde(default)]
    pub ambiguous: Vec<AmbiguousReference>,
}

impl FixReport {
    pub(crate) fn finish(
        transaction: &TransactionBuilder,
        outcomes: Vec<FixOutcome>,
        files_written: usize,
    ) -> Self {
        Self {
            transaction_id: transaction.transaction_id().to_string(),
            started_at: transaction.started_at(),
            duration_ms: transaction.elapsed_ms(),
            total: outcomes.len(),
            fixed: outcomes.iter().filter(|o| o.fixed).count(),
            files_written,
            outcomes,
            ambiguous: Vec::new(),
        }
    }

    /// Every requested fix succeeded
    pub fn is_complete(&self) -> bool {
        self.fixed == self.total
    }
}

/// A file the rewriter could not update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFailure {
    /// Vault-relative path with extension
    pub path: String,
    pub error: String,
}

/// Result of propagating one identity change
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenameReport {
    pub transaction_id: String,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub old: NoteIdentity,
    pub new: NoteIdentity,
    /// Count of files rewritten
    pub files_updated: usize,
    pub references_updated: usize,
    /// Rewritten files, sorted
    pub updated_files: Vec<String>,
    pub failures: Vec<FileFailure>,
}

impl RenameReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Record of a single move within a batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveRecord {
    /// Index in the batch
    pub operation_index: usize,
    pub from: NoteIdentity,
    pub to: NoteIdentity,
    /// The file itself was moved
    pub success: bool,
    pub error: Option<String>,
    /// Link propagation for this move, when the file moved
    pub rename: Option<RenameReport>,
}

/// Result of moving several notes in order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchMoveReport {
    pub transaction_id: String,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub total: usize,
    pub succeeded: usize,
    pub records: Vec<MoveRecord>,
}

impl BatchMoveReport {
    pub(crate) fn finish(transaction: &TransactionBuilder, records: Vec<MoveRecord>) -> Self {
        Self {
            transaction_id: transaction.transaction_id().to_string(),
            started_at: transaction.started_at(),
            duration_ms: transaction.elapsed_ms(),
            total: records.len(),
            succeeded: records.iter().filter(|r| r.success).count(),
            records,
        }
    }

    /// Files rewritten across all moves
    pub fn files_updated(&self) -> usize {
        self.records
            .iter()
            .filter_map(|r| r.rename.as_ref())
            .map(|r| r.files_updated)
            .sum()
    }
}
