//! Note parser and the grammar modules it drives

use linkweave_core::{NoteIdentity, RawReference};

use crate::engine::ParseEngine;
use crate::{ParseOptions, ParsedNote};

pub mod frontmatter;
pub mod links;
pub mod tags;

/// Parser bound to a note extension
#[derive(Debug, Clone)]
pub struct Parser {
    note_extension: String,
}

impl Parser {
    /// Create a parser for notes with the given extension (without the dot)
    pub fn new(note_extension: impl Into<String>) -> Self {
        Self {
            note_extension: note_extension.into(),
        }
    }

    pub fn note_extension(&self) -> &str {
        &self.note_extension
    }

    /// Parse a note body with the given options
    pub fn parse(&self, source: &NoteIdentity, content: &str, options: &ParseOptions) -> ParsedNote {
        ParseEngine::new(content, &self.note_extension).parse(source, options)
    }

    /// Parse everything
    pub fn parse_note(&self, source: &NoteIdentity, content: &str) -> ParsedNote {
        self.parse(source, content, &ParseOptions::all())
    }

    /// Outbound references only
    pub fn extract(&self, source: &NoteIdentity, content: &str) -> Vec<RawReference> {
        self.parse(source, content, &ParseOptions::links_only())
            .references
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new("md")
    }
}
