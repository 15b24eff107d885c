//! Core data models for the vault link graph.
//!
//! These types are designed to be:
//! - **Serializable**: All types derive Serialize/Deserialize
//! - **Ordered**: identities sort by vault-relative path, which every
//!   deterministic tie-break in the engine relies on
//! - **Immutable by convention**: built once per graph snapshot, then only read

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::path::{Path, PathBuf};

/// Stable name of a note: vault-relative path without extension plus the bare
/// file name used by short-form references.
///
/// Paths always use `/` separators regardless of platform.
///
/// # Example
/// ```
/// use linkweave_core::NoteIdentity;
///
/// let id = NoteIdentity::new("Projects/Garden/Bee-Keeping");
/// assert_eq!(id.name, "Bee-Keeping");
/// assert_eq!(id.folder(), Some("Projects/Garden"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NoteIdentity {
    /// Vault-relative path without extension (`folder/sub/note`)
    pub path: String,
    /// Bare file name without extension (`note`)
    pub name: String,
}

impl NoteIdentity {
    /// Create an identity from a vault-relative path without extension
    pub fn new(path: impl AsRef<str>) -> Self {
        let normalized = normalize_separators(path.as_ref());
        let name = normalized
            .rsplit('/')
            .next()
            .unwrap_or(normalized.as_str())
            .to_string();
        Self {
            path: normalized,
            name,
        }
    }

    /// Derive an identity from a vault-relative file path.
    ///
    /// Returns `None` when the file does not carry `extension`.
    pub fn from_file_path(relative: &Path, extension: &str) -> Option<Self> {
        let raw = relative.to_string_lossy();
        let normalized = normalize_separators(&raw);
        let suffix = format!(".{}", extension);
        normalized
            .strip_suffix(suffix.as_str())
            .filter(|stem| !stem.is_empty() && !stem.ends_with('/'))
            .map(NoteIdentity::new)
    }

    /// Vault-relative file path with the given extension
    pub fn file_path(&self, extension: &str) -> PathBuf {
        PathBuf::from(format!("{}.{}", self.path, extension))
    }

    /// Folder part of the path, if the note is not at the vault root
    pub fn folder(&self) -> Option<&str> {
        self.path.rsplit_once('/').map(|(folder, _)| folder)
    }

    /// True if the identity carries no name (programmer error upstream)
    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }
}

impl fmt::Display for NoteIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

fn normalize_separators(raw: &str) -> String {
    let replaced = raw.replace('\\', "/");
    let mut trimmed = replaced.as_str();
    loop {
        if let Some(rest) = trimmed.strip_prefix("./") {
            trimmed = rest;
        } else if let Some(rest) = trimmed.strip_prefix('/') {
            trimmed = rest;
        } else {
            break;
        }
    }
    trimmed.to_string()
}

/// Syntax a reference was written in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceKind {
    /// `[[target]]`, `[[target|alias]]`, `[[target#fragment]]`
    Bracketed,
    /// `[alias](target.md)`
    Inline,
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bracketed => f.write_str("bracketed"),
            Self::Inline => f.write_str("inline"),
        }
    }
}

/// One outbound mention parsed out of a note body
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RawReference {
    /// Note containing the reference
    pub source: NoteIdentity,
    /// 1-based line number in the source file
    pub line: usize,
    /// Byte offset of `link_text` inside its line
    pub column: usize,
    /// Exact original span, e.g. `[[Old|alias]]`
    pub link_text: String,
    /// Target as written, fragment removed
    pub target: String,
    /// Display alias (`|alias` or the inline link text)
    pub alias: Option<String>,
    /// Text after `#`, preserved for rewriting
    pub fragment: Option<String>,
    pub kind: ReferenceKind,
    /// `![[...]]` transclusion
    pub embed: bool,
}

/// A reference that resolved to an existing note
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LinkEdge {
    pub source: NoteIdentity,
    pub target: NoteIdentity,
    pub kind: ReferenceKind,
    pub line: usize,
    pub fragment: Option<String>,
}

impl LinkEdge {
    /// A note referencing itself
    pub fn is_self_edge(&self) -> bool {
        self.source == self.target
    }

    /// Block references (`#^id`) point at a block, not a heading
    pub fn is_block_ref(&self) -> bool {
        self.fragment.as_deref().is_some_and(|f| f.starts_with('^'))
    }
}

/// A reference whose target does not resolve to any note
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrokenReference {
    pub reference: RawReference,
    /// Ranked replacement suggestions, best first
    pub candidates: Vec<NoteIdentity>,
    /// True iff at least one candidate exists
    pub auto_fixable: bool,
}

impl BrokenReference {
    /// Broken reference without candidates (plain graph build)
    pub fn unranked(reference: RawReference) -> Self {
        Self {
            reference,
            candidates: Vec::new(),
            auto_fixable: false,
        }
    }

    /// Attach ranked candidates; keeps `auto_fixable` consistent with them
    pub fn with_candidates(mut self, candidates: Vec<NoteIdentity>) -> Self {
        self.auto_fixable = !candidates.is_empty();
        self.candidates = candidates;
        self
    }

    /// First-ranked candidate, used for automatic repair
    pub fn suggested_fix(&self) -> Option<&NoteIdentity> {
        self.candidates.first()
    }
}

/// A bare-name reference that matched several notes and was settled by the
/// lexicographic tie-break
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmbiguousReference {
    pub reference: RawReference,
    pub chosen: NoteIdentity,
    /// The other notes sharing the name, sorted by path
    pub alternatives: Vec<NoteIdentity>,
}

/// A heading in note content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    pub text: String,
    pub level: u8, // 1-6
    pub line: usize,
}

/// YAML frontmatter
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Frontmatter {
    pub data: HashMap<String, serde_json::Value>,
    /// Number of lines the block occupies, delimiters included
    pub line_count: usize,
}

impl Frontmatter {
    /// Extract tags from frontmatter (`tags`, also the legacy `tag` key).
    ///
    /// Accepts a list, a single string or a comma/space separated string.
    /// Leading `#` is dropped.
    pub fn tags(&self) -> Vec<String> {
        let mut tags = Vec::new();
        for key in ["tags", "tag"] {
            match self.data.get(key) {
                Some(serde_json::Value::String(s)) => tags.extend(
                    s.split([',', ' '])
                        .map(|t| t.trim().trim_start_matches('#'))
                        .filter(|t| !t.is_empty())
                        .map(str::to_string),
                ),
                Some(serde_json::Value::Array(arr)) => tags.extend(
                    arr.iter()
                        .filter_map(|v| v.as_str())
                        .map(|t| t.trim().trim_start_matches('#'))
                        .filter(|t| !t.is_empty())
                        .map(str::to_string),
                ),
                _ => {}
            }
        }
        tags
    }

    /// Extract aliases from frontmatter
    pub fn aliases(&self) -> Vec<String> {
        match self.data.get("aliases") {
            Some(serde_json::Value::String(s)) => vec![s.clone()],
            Some(serde_json::Value::Array(arr)) => arr
                .iter()
                .filter_map(|v| v.as_str().map(|s| s.to_string()))
                .collect(),
            _ => vec![],
        }
    }

    /// Explicit `title` property
    pub fn title(&self) -> Option<&str> {
        self.data
            .get("title")
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

/// One vertex of the link graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteNode {
    pub id: NoteIdentity,
    /// Vault-relative path with extension
    pub path: PathBuf,
    /// Display name; defaults to the bare file name
    pub title: String,
    pub tags: BTreeSet<String>,
    /// Word count of the note body
    pub size: usize,
    /// Heading texts, in document order
    pub headings: Vec<String>,
    /// SHA-256 of the text as scanned
    pub checksum: String,
}

impl NoteNode {
    /// Node with default title and no tags, headings or content
    pub fn new(id: NoteIdentity, path: impl Into<PathBuf>) -> Self {
        let title = id.name.clone();
        Self {
            id,
            path: path.into(),
            title,
            tags: BTreeSet::new(),
            size: 0,
            headings: Vec::new(),
            checksum: String::new(),
        }
    }

    /// Replace the tag set
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Check if the note carries a tag
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Whether a heading fragment exists in this note (case-insensitive)
    pub fn has_heading(&self, fragment: &str) -> bool {
        let wanted = fragment.trim().to_lowercase();
        self.headings
            .iter()
            .any(|h| h.trim().to_lowercase() == wanted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference(target: &str, fragment: Option<&str>) -> RawReference {
        RawReference {
            source: NoteIdentity::new("A"),
            line: 1,
            column: 0,
            link_text: format!("[[{}]]", target),
            target: target.to_string(),
            alias: None,
            fragment: fragment.map(str::to_string),
            kind: ReferenceKind::Bracketed,
            embed: false,
        }
    }

    #[test]
    fn test_identity_from_path() {
        let id = NoteIdentity::new("folder/sub/note");
        assert_eq!(id.path, "folder/sub/note");
        assert_eq!(id.name, "note");
        assert_eq!(id.folder(), Some("folder/sub"));

        let root = NoteIdentity::new("note");
        assert_eq!(root.folder(), None);
    }

    #[test]
    fn test_identity_normalizes_separators() {
        let id = NoteIdentity::new("./folder\\note");
        assert_eq!(id.path, "folder/note");
        assert_eq!(id.name, "note");
    }

    #[test]
    fn test_identity_from_file_path() {
        let id = NoteIdentity::from_file_path(Path::new("Notes/Old.md"), "md").unwrap();
        assert_eq!(id, NoteIdentity::new("Notes/Old"));
        assert_eq!(id.file_path("md"), PathBuf::from("Notes/Old.md"));

        assert!(NoteIdentity::from_file_path(Path::new("image.png"), "md").is_none());
        assert!(NoteIdentity::from_file_path(Path::new(".md"), "md").is_none());
    }

    #[test]
    fn test_identity_ordering_by_path() {
        let mut ids = vec![NoteIdentity::new("B/x"), NoteIdentity::new("A/x")];
        ids.sort();
        assert_eq!(ids[0].path, "A/x");
    }

    #[test]
    fn test_broken_reference_candidates() {
        let broken = BrokenReference::unranked(reference("Bee", None));
        assert!(!broken.auto_fixable);
        assert!(broken.suggested_fix().is_none());

        let broken = broken.with_candidates(vec![NoteIdentity::new("Bee-Keeping")]);
        assert!(broken.auto_fixable);
        assert_eq!(broken.suggested_fix().unwrap().name, "Bee-Keeping");
    }

    #[test]
    fn test_block_ref_detection() {
        let edge = |fragment: Option<&str>| LinkEdge {
            source: NoteIdentity::new("A"),
            target: NoteIdentity::new("B"),
            kind: ReferenceKind::Bracketed,
            line: 1,
            fragment: fragment.map(str::to_string),
        };
        assert!(edge(Some("^abc")).is_block_ref());
        assert!(!edge(Some("Heading")).is_block_ref());
        assert!(!edge(None).is_block_ref());
    }

    #[test]
    fn test_frontmatter_tags() {
        let mut data = HashMap::new();
        data.insert(
            "tags".to_string(),
            serde_json::json!(["rust", "#mcp"]),
        );
        let fm = Frontmatter { data, line_count: 3 };
        assert_eq!(fm.tags(), vec!["rust".to_string(), "mcp".to_string()]);

        let mut data = HashMap::new();
        data.insert("tags".to_string(), serde_json::json!("garden, bees"));
        let fm = Frontmatter { data, line_count: 3 };
        assert_eq!(fm.tags(), vec!["garden".to_string(), "bees".to_string()]);
    }

    #[test]
    fn test_node_heading_lookup() {
        let mut node = NoteNode::new(NoteIdentity::new("A"), "A.md");
        node.headings = vec!["Setup Guide".to_string()];
        assert!(node.has_heading("setup guide"));
        assert!(!node.has_heading("Teardown"));
        assert_eq!(node.title, "A");
    }
}
