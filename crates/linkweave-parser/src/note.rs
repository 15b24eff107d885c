//! Parse options and the per-note parse result.
//!
//! # Example
//!
//! ```
//! use linkweave_core::NoteIdentity;
//! use linkweave_parser::parse_note;
//!
//! let content = r#"---
//! title: Bee Keeping
//! tags: [garden]
//! ---
//!
//! # Hives
//!
//! See [[Flowers]] and [the plan](Projects/Plan.md) #bees
//! "#;
//!
//! let parsed = parse_note(&NoteIdentity::new("Bee-Keeping"), content);
//! assert_eq!(parsed.title(), Some("Bee Keeping"));
//! assert_eq!(parsed.references.len(), 2);
//! assert!(parsed.tags().contains("garden"));
//! assert!(parsed.tags().contains("bees"));
//! ```

use linkweave_core::{Frontmatter, Heading, RawReference};
use std::collections::BTreeSet;

/// Options for selective parsing.
///
/// The graph build needs everything; rename propagation only needs references.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Parse YAML frontmatter (the block is always skipped)
    pub parse_frontmatter: bool,
    /// Extract bracketed and inline references
    pub parse_references: bool,
    /// Parse headings (H1-H6)
    pub parse_headings: bool,
    /// Parse inline tags (#tag)
    pub parse_tags: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self::all()
    }
}

impl ParseOptions {
    /// Parse everything.
    pub fn all() -> Self {
        Self {
            parse_frontmatter: true,
            parse_references: true,
            parse_headings: true,
            parse_tags: true,
        }
    }

    /// Parse nothing - starting point for selective parsing.
    pub fn none() -> Self {
        Self {
            parse_frontmatter: false,
            parse_references: false,
            parse_headings: false,
            parse_tags: false,
        }
    }

    /// References only.
    pub fn links_only() -> Self {
        Self {
            parse_references: true,
            ..Self::none()
        }
    }
}

/// Everything the engine needs from one note
#[derive(Debug, Clone, Default)]
pub struct ParsedNote {
    pub frontmatter: Option<Frontmatter>,
    /// Outbound references in document order
    pub references: Vec<RawReference>,
    pub headings: Vec<Heading>,
    /// Tags written in the body, without `#`
    pub inline_tags: Vec<String>,
    /// Whitespace-separated words of the body
    pub word_count: usize,
}

impl ParsedNote {
    /// Frontmatter tags plus inline tags
    pub fn tags(&self) -> BTreeSet<String> {
        self.frontmatter
            .iter()
            .flat_map(Frontmatter::tags)
            .chain(self.inline_tags.iter().cloned())
            .collect()
    }

    /// Explicit frontmatter title
    pub fn title(&self) -> Option<&str> {
        self.frontmatter.as_ref().and_then(Frontmatter::title)
    }

    pub fn heading_texts(&self) -> Vec<String> {
        self.headings.iter().map(|h| h.text.clone()).collect()
    }
}
