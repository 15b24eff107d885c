//! # Linkweave Parser
//!
//! Extracts the parts of a Markdown note the link engine cares about:
//! outbound references, headings, tags and frontmatter. It is not a general
//! Markdown parser.
//!
//! ## Architecture
//!
//! ### Phase 1: pulldown-cmark pass
//! - Frontmatter block (YAML, parsed with `serde_yaml`)
//! - Headings
//! - Excluded ranges: fenced/indented code, inline code, raw HTML
//!
//! ### Phase 2: regex pass
//! - Bracketed references `[[target#fragment|alias]]`, embeds `![[...]]`
//! - Inline references `[alias](target.md)`
//! - Tags `#tag`
//! - Matches that start inside an excluded range are skipped
//!
//! ## Quick Start
//!
//! ```
//! use linkweave_core::{NoteIdentity, ReferenceKind};
//! use linkweave_parser::extract_references;
//!
//! let refs = extract_references(
//!     &NoteIdentity::new("Journal/Today"),
//!     "See [[Bee-Keeping|bees]] and [plan](../Projects/Plan.md).\n`[[not a link]]`",
//! );
//! assert_eq!(refs.len(), 2);
//! assert_eq!(refs[0].target, "Bee-Keeping");
//! assert_eq!(refs[0].alias.as_deref(), Some("bees"));
//! assert_eq!(refs[1].kind, ReferenceKind::Inline);
//! assert_eq!(refs[1].target, "../Projects/Plan.md");
//! ```

mod engine;
mod note;
pub mod parsers;
pub mod render;

pub use note::{ParseOptions, ParsedNote};
pub use parsers::Parser;
pub use render::render_reference;

use linkweave_core::{Heading, NoteIdentity, RawReference};

/// Extract outbound references from a `.md` note.
///
/// # Example
/// ```
/// use linkweave_core::NoteIdentity;
/// use linkweave_parser::extract_references;
///
/// let refs = extract_references(&NoteIdentity::new("A"), "line one\n[[B]] [[C#Part]]");
/// assert_eq!(refs.len(), 2);
/// assert_eq!(refs[1].line, 2);
/// assert_eq!(refs[1].fragment.as_deref(), Some("Part"));
/// ```
pub fn extract_references(source: &NoteIdentity, content: &str) -> Vec<RawReference> {
    Parser::default().extract(source, content)
}

/// Parse everything from a `.md` note.
pub fn parse_note(source: &NoteIdentity, content: &str) -> ParsedNote {
    Parser::default().parse_note(source, content)
}

/// Parse headings from content.
///
/// # Example
/// ```
/// use linkweave_parser::parse_headings;
///
/// let headings = parse_headings("# H1\n## H2\n### H3");
/// assert_eq!(headings.len(), 3);
/// assert_eq!(headings[0].level, 1);
/// ```
pub fn parse_headings(content: &str) -> Vec<Heading> {
    let opts = ParseOptions {
        parse_headings: true,
        ..ParseOptions::none()
    };
    Parser::default()
        .parse(&NoteIdentity::default(), content, &opts)
        .headings
}

/// Parse inline tags from content.
///
/// # Example
/// ```
/// use linkweave_parser::parse_tags;
///
/// let tags = parse_tags("Has #tag and #nested/tag");
/// assert_eq!(tags, vec!["tag", "nested/tag"]);
/// ```
pub fn parse_tags(content: &str) -> Vec<String> {
    let opts = ParseOptions {
        parse_tags: true,
        ..ParseOptions::none()
    };
    Parser::default()
        .parse(&NoteIdentity::default(), content, &opts)
        .inline_tags
}

/// Convenient prelude for common imports.
pub mod prelude {
    pub use crate::{
        ParseOptions, ParsedNote, Parser, extract_references, parse_headings, parse_note,
        parse_tags, render_reference,
    };
    pub use linkweave_core::{Frontmatter, Heading, RawReference, ReferenceKind};
}
