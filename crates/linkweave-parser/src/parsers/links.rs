//! Reference grammar: one pattern for bracketed links, one for inline links.
//!
//! Both patterns are single-line. Anything unbalanced simply does not match.
//!
//! ```
//! use linkweave_parser::parsers::links::{BRACKETED, INLINE};
//!
//! assert!(BRACKETED.is_match("see [[Note#Heading|alias]]"));
//! assert!(INLINE.is_match("see [alias](Folder/Note.md)"));
//! assert!(!BRACKETED.is_match("see [[Note"));
//! ```

use regex::Regex;
use std::sync::LazyLock;

/// `[[target]]`, `[[target#fragment|alias]]`; group 1 captures the embed `!`
pub static BRACKETED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(!?)\[\[([^\[\]\n]+)\]\]").unwrap());

/// `[alias](target.md#fragment)` or `[alias](<target with spaces.md>)`;
/// group 1 captures a leading `!` (images)
pub static INLINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(!?)\[([^\[\]\n]*)\]\((<[^<>\n]+>|[^()\s<>]+)\)").unwrap()
});

/// `scheme:` prefix of an absolute URL
static SCHEME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9+.\-]*:").unwrap());

/// Extensions that name attachments rather than notes
const ATTACHMENT_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "svg", "webp", "bmp", "avif", "pdf", "mp3", "wav", "ogg",
    "m4a", "flac", "mp4", "webm", "mov", "mkv", "canvas", "excalidraw", "csv", "zip",
];

/// Target, fragment and alias split out of a link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkParts {
    pub target: String,
    pub fragment: Option<String>,
    pub alias: Option<String>,
}

/// Split the inside of `[[...]]`.
///
/// Returns `None` for same-note anchors (`[[#Heading]]`) and attachments.
pub fn split_bracketed(inner: &str, note_extension: &str) -> Option<LinkParts> {
    let (target_part, alias) = match inner.split_once('|') {
        // `\|` is the escaped pipe used inside tables
        Some((target, alias)) => (target.trim_end_matches('\\'), non_empty(alias)),
        None => (inner, None),
    };

    let (target, fragment) = split_fragment(target_part);
    let target = target.trim();
    if target.is_empty() || is_attachment(target, note_extension) {
        return None;
    }

    Some(LinkParts {
        target: target.to_string(),
        fragment,
        alias,
    })
}

/// Split the destination of `[text](destination)`.
///
/// Returns `None` for URLs, pure anchors and anything not ending in the note
/// extension. `%20` in the path and fragment is decoded.
pub fn split_inline(text: &str, destination: &str, note_extension: &str) -> Option<LinkParts> {
    let destination = destination
        .strip_prefix('<')
        .and_then(|d| d.strip_suffix('>'))
        .unwrap_or(destination);

    if is_external(destination) {
        return None;
    }

    let (path, fragment) = split_fragment(destination);
    let path = decode_spaces(path.trim());
    if !has_extension(&path, note_extension) {
        return None;
    }

    Some(LinkParts {
        target: path,
        fragment: fragment.map(|f| decode_spaces(&f)),
        alias: non_empty(text),
    })
}

/// Absolute URL (`https:`, `mailto:`, `obsidian:` ...)
pub fn is_external(target: &str) -> bool {
    SCHEME.is_match(target)
}

/// Target names a known non-note file type
pub fn is_attachment(target: &str, note_extension: &str) -> bool {
    let file_name = target.rsplit('/').next().unwrap_or(target);
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => {
            let ext = ext.to_ascii_lowercase();
            ext != note_extension && ATTACHMENT_EXTENSIONS.contains(&ext.as_str())
        }
        _ => false,
    }
}

/// Path ends in `.<note_extension>` (case-insensitive) with a non-empty stem
pub fn has_extension(path: &str, note_extension: &str) -> bool {
    let suffix = format!(".{}", note_extension.to_ascii_lowercase());
    path.len() > suffix.len() && path.to_ascii_lowercase().ends_with(&suffix)
}

fn split_fragment(raw: &str) -> (&str, Option<String>) {
    match raw.split_once('#') {
        Some((target, fragment)) => (target, non_empty(fragment)),
        None => (raw, None),
    }
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn decode_spaces(s: &str) -> String {
    s.replace("%20", " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bracketed_plain() {
        let parts = split_bracketed("Note", "md").unwrap();
        assert_eq!(parts.target, "Note");
        assert_eq!(parts.fragment, None);
        assert_eq!(parts.alias, None);
    }

    #[test]
    fn test_bracketed_fragment_and_alias() {
        let parts = split_bracketed("Folder/Note#Setup Guide|Read this", "md").unwrap();
        assert_eq!(parts.target, "Folder/Note");
        assert_eq!(parts.fragment.as_deref(), Some("Setup Guide"));
        assert_eq!(parts.alias.as_deref(), Some("Read this"));
    }

    #[test]
    fn test_bracketed_table_escaped_pipe() {
        let parts = split_bracketed("Note\\|shown", "md").unwrap();
        assert_eq!(parts.target, "Note");
        assert_eq!(parts.alias.as_deref(), Some("shown"));
    }

    #[test]
    fn test_bracketed_block_ref() {
        let parts = split_bracketed("Note#^abc123", "md").unwrap();
        assert_eq!(parts.fragment.as_deref(), Some("^abc123"));
    }

    #[test]
    fn test_bracketed_skips_anchor_and_attachment() {
        assert!(split_bracketed("#Heading", "md").is_none());
        assert!(split_bracketed("diagram.png", "md").is_none());
        assert!(split_bracketed("Scan.PDF", "md").is_none());
        assert!(split_bracketed("v1.2 Release", "md").is_some());
        assert!(split_bracketed("Note.md", "md").is_some());
    }

    #[test]
    fn test_inline_requires_note_extension() {
        assert!(split_inline("a", "Note.md", "md").is_some());
        assert!(split_inline("a", "Note", "md").is_none());
        assert!(split_inline("a", "#section", "md").is_none());
        assert!(split_inline("a", "https://example.com/x.md", "md").is_none());
        assert!(split_inline("a", "mailto:me@example.com", "md").is_none());
    }

    #[test]
    fn test_inline_decoding() {
        let parts = split_inline("Plan", "Projects/My%20Plan.md#Next%20Steps", "md").unwrap();
        assert_eq!(parts.target, "Projects/My Plan.md");
        assert_eq!(parts.fragment.as_deref(), Some("Next Steps"));
        assert_eq!(parts.alias.as_deref(), Some("Plan"));

        let parts = split_inline("", "<My Plan.md>", "md").unwrap();
        assert_eq!(parts.target, "My Plan.md");
        assert_eq!(parts.alias, None);
    }

    #[test]
    fn test_patterns_ignore_unbalanced() {
        assert!(!BRACKETED.is_match("[[broken"));
        assert!(!BRACKETED.is_match("broken]]"));
        assert!(!INLINE.is_match("[text](no-close.md"));
        // `[[x]](y.md)` is a bracketed link followed by text, not an inline link
        assert!(!INLINE.is_match("[[x]](y.md)"));
    }

    #[test]
    fn test_embed_marker_captured() {
        let caps = BRACKETED.captures("![[Note]]").unwrap();
        assert_eq!(&caps[1], "!");
        let caps = INLINE.captures("![img](pic.md)").unwrap();
        assert_eq!(&caps[1], "!");
    }
}
