//! Span-level edits against one in-memory copy of a note.
//!
//! Every edit names a 1-based line, a byte column inside that line and the
//! exact text expected there. Matching cascades:
//! 1. Exact match at the recorded column
//! 2. The same text elsewhere on the recorded line (nearest to the column)
//! 3. Otherwise the edit is stale and left unapplied
//!
//! Edits on one line are applied right to left so earlier columns stay valid.
//! Line terminators are never touched.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use unicode_normalization::UnicodeNormalization;

/// Replace `original` at `line:column` with `replacement`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineEdit {
    /// 1-based
    pub line: usize,
    /// Byte offset inside the line
    pub column: usize,
    pub original: String,
    pub replacement: String,
}

/// How one edit was matched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditStatus {
    /// Found at the recorded column
    Exact,
    /// Found elsewhere on the recorded line
    Relocated,
    /// Not on the recorded line anymore
    Stale,
}

impl EditStatus {
    pub fn is_applied(self) -> bool {
        !matches!(self, Self::Stale)
    }

    fn description(self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Relocated => "relocated",
            Self::Stale => "stale",
        }
    }
}

/// Result of [`apply_line_edits`]
#[derive(Debug, Clone)]
pub struct EditResult {
    pub content: String,
    /// One status per input edit, same order
    pub statuses: Vec<EditStatus>,
}

impl EditResult {
    pub fn applied(&self) -> usize {
        self.statuses.iter().filter(|s| s.is_applied()).count()
    }

    /// True if the content differs from the input
    pub fn changed(&self) -> bool {
        self.applied() > 0
    }
}

/// Apply `edits` to `content` in one pass
pub fn apply_line_edits(content: &str, edits: &[LineEdit]) -> EditResult {
    let mut statuses = vec![EditStatus::Stale; edits.len()];

    let mut by_line: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for (i, edit) in edits.iter().enumerate() {
        if edit.line > 0 && !edit.original.is_empty() {
            by_line.entry(edit.line).or_default().push(i);
        }
    }

    let mut lines: Vec<String> = content.split_inclusive('\n').map(str::to_string).collect();

    for (line_no, mut indices) in by_line {
        let Some(line) = lines.get_mut(line_no - 1) else {
            log::debug!("Edit line {} is past end of file", line_no);
            continue;
        };
        // right to left
        indices.sort_by(|&a, &b| edits[b].column.cmp(&edits[a].column));
        // text already replaced on this line, as byte ranges
        let mut touched: Vec<(usize, usize)> = Vec::new();

        for i in indices {
            let edit = &edits[i];
            let found = find_span(line, edit, &touched);
            if let Some((pos, status)) = found {
                let end = pos + edit.original.len();
                line.replace_range(pos..end, &edit.replacement);
                let delta = edit.replacement.len() as isize - edit.original.len() as isize;
                for range in touched.iter_mut() {
                    if range.0 >= end {
                        range.0 = (range.0 as isize + delta) as usize;
                        range.1 = (range.1 as isize + delta) as usize;
                    }
                }
                touched.push((pos, pos + edit.replacement.len()));
                statuses[i] = status;
            }
            log::trace!(
                "Edit {}:{} {}",
                edit.line,
                edit.column,
                statuses[i].description()
            );
        }
    }

    EditResult {
        content: lines.concat(),
        statuses,
    }
}

fn find_span(line: &str, edit: &LineEdit, touched: &[(usize, usize)]) -> Option<(usize, EditStatus)> {
    let len = edit.original.len();
    let free = |pos: usize| touched.iter().all(|&(s, e)| pos + len <= s || pos >= e);

    if line
        .get(edit.column..)
        .is_some_and(|rest| rest.starts_with(&edit.original))
        && free(edit.column)
    {
        return Some((edit.column, EditStatus::Exact));
    }

    line.match_indices(edit.original.as_str())
        .map(|(pos, _)| pos)
        .filter(|&pos| free(pos))
        .min_by_key(|&pos| pos.abs_diff(edit.column))
        .map(|pos| (pos, EditStatus::Relocated))
}

/// Compute SHA-256 hash of content (with Unicode NFC normalization)
pub fn compute_hash(content: &str) -> String {
    let normalized: String = content.nfc().collect();
    let hash = Sha256::digest(normalized.as_bytes());
    format!("{:x}", hash)
}
