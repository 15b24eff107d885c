//! Parsing engine shared by every public parsing entry point.
//!
//! Two phases:
//! 1. pulldown-cmark pass: frontmatter block, headings, and the byte ranges of
//!    code blocks, inline code and raw HTML
//! 2. Regex pass over the body: bracketed links, inline links and tags, skipping
//!    anything that starts inside an excluded range
//!
//! Positions are reported as 1-based line plus byte column inside that line.

use linkweave_core::{Frontmatter, Heading, NoteIdentity, RawReference, ReferenceKind};
use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use std::ops::Range;

use crate::ParseOptions;
use crate::ParsedNote;
use crate::parsers::frontmatter::parse_frontmatter;
use crate::parsers::links::{BRACKETED, INLINE, split_bracketed, split_inline};
use crate::parsers::tags::{TAG, normalize_tag};

#[inline]
fn has_bracketed(content: &str) -> bool {
    content.contains("[[")
}

#[inline]
fn has_inline(content: &str) -> bool {
    content.contains("](")
}

/// Byte offsets where each line starts
#[derive(Debug, Clone)]
struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    fn new(content: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(content.match_indices('\n').map(|(i, _)| i + 1));
        Self { starts }
    }

    /// (1-based line, byte column) of an offset
    fn locate(&self, offset: usize) -> (usize, usize) {
        // starts[0] == 0, so the partition point is at least 1
        let line = self.starts.partition_point(|&start| start <= offset);
        (line, offset - self.starts[line - 1])
    }
}

/// Byte ranges that link and tag patterns must not look into
#[derive(Debug, Default, Clone)]
struct ExcludedRanges {
    ranges: Vec<Range<usize>>,
}

impl ExcludedRanges {
    fn contains(&self, offset: usize) -> bool {
        let idx = self.ranges.partition_point(|r| r.start <= offset);
        idx > 0 && offset < self.ranges[idx - 1].end
    }

    fn add(&mut self, range: Range<usize>) {
        self.ranges.push(range);
    }

    /// Sort and merge so `contains` can binary search
    fn optimize(&mut self) {
        self.ranges.sort_by_key(|r| r.start);
        let mut merged: Vec<Range<usize>> = Vec::with_capacity(self.ranges.len());
        for range in self.ranges.drain(..) {
            match merged.last_mut() {
                Some(last) if range.start <= last.end => last.end = last.end.max(range.end),
                _ => merged.push(range),
            }
        }
        self.ranges = merged;
    }
}

/// Result of the CommonMark pass
#[derive(Debug, Default)]
struct StructurePass {
    excluded: ExcludedRanges,
    body_start: usize,
    frontmatter: Option<Frontmatter>,
    headings: Vec<Heading>,
}

pub(crate) struct ParseEngine<'a> {
    content: &'a str,
    index: LineIndex,
    note_extension: &'a str,
}

impl<'a> ParseEngine<'a> {
    pub(crate) fn new(content: &'a str, note_extension: &'a str) -> Self {
        Self {
            content,
            index: LineIndex::new(content),
            note_extension,
        }
    }

    pub(crate) fn parse(&self, source: &NoteIdentity, options: &ParseOptions) -> ParsedNote {
        let structure = self.structure_pass(options);
        let body_start = structure.body_start;
        let body = &self.content[body_start..];

        let mut references = Vec::new();
        if options.parse_references {
            self.bracketed_references(source, body, body_start, &structure.excluded, &mut references);
            self.inline_references(source, body, body_start, &structure.excluded, &mut references);
            references.sort_by_key(|r| (r.line, r.column));
        }

        let inline_tags = if options.parse_tags {
            self.inline_tags(body, body_start, &structure.excluded)
        } else {
            Vec::new()
        };

        ParsedNote {
            frontmatter: structure.frontmatter,
            references,
            headings: structure.headings,
            inline_tags,
            word_count: body.split_whitespace().count(),
        }
    }

    /// Phase 1: frontmatter, headings and excluded ranges
    fn structure_pass(&self, options: &ParseOptions) -> StructurePass {
        let mut pass = StructurePass::default();

        let mut opts = Options::empty();
        opts.insert(Options::ENABLE_YAML_STYLE_METADATA_BLOCKS);
        opts.insert(Options::ENABLE_TABLES);
        opts.insert(Options::ENABLE_STRIKETHROUGH);

        let mut code_block_start = 0;
        let mut in_metadata = false;
        let mut metadata = String::new();
        let mut current_heading: Option<(u8, usize)> = None;
        let mut heading_text = String::new();

        for (event, range) in Parser::new_ext(self.content, opts).into_offset_iter() {
            match event {
                Event::Start(Tag::CodeBlock(_)) => code_block_start = range.start,
                Event::End(TagEnd::CodeBlock) => pass.excluded.add(code_block_start..range.end),
                Event::Code(code) => {
                    if current_heading.is_some() {
                        heading_text.push_str(&code);
                    }
                    pass.excluded.add(range);
                }
                Event::Html(_) | Event::InlineHtml(_) => pass.excluded.add(range),

                Event::Start(Tag::MetadataBlock(_)) => {
                    in_metadata = true;
                    metadata.clear();
                }
                Event::End(TagEnd::MetadataBlock(_)) => {
                    in_metadata = false;
                    pass.body_start = range.end;
                    if options.parse_frontmatter {
                        let line_count = self.index.locate(range.end.saturating_sub(1)).0;
                        pass.frontmatter = parse_frontmatter(&metadata, line_count);
                    }
                }
                Event::Text(text) if in_metadata => metadata.push_str(&text),

                Event::Start(Tag::Heading { level, .. }) if options.parse_headings => {
                    current_heading = Some((heading_level(level), range.start));
                    heading_text.clear();
                }
                Event::End(TagEnd::Heading(_)) => {
                    if let Some((level, start)) = current_heading.take() {
                        pass.headings.push(Heading {
                            text: heading_text.trim().to_string(),
                            level,
                            line: self.index.locate(start).0,
                        });
                    }
                }
                Event::Text(text) if current_heading.is_some() => heading_text.push_str(&text),

                _ => {}
            }
        }

        pass.excluded.optimize();
        pass
    }

    /// Phase 2a: `[[...]]` and `![[...]]`
    fn bracketed_references(
        &self,
        source: &NoteIdentity,
        body: &str,
        body_offset: usize,
        excluded: &ExcludedRanges,
        out: &mut Vec<RawReference>,
    ) {
        if !has_bracketed(body) {
            return;
        }

        for caps in BRACKETED.captures_iter(body) {
            let (Some(full), Some(inner)) = (caps.get(0), caps.get(2)) else {
                continue;
            };
            let offset = body_offset + full.start();
            if excluded.contains(offset) {
                continue;
            }
            let Some(parts) = split_bracketed(inner.as_str(), self.note_extension) else {
                continue;
            };

            let (line, column) = self.index.locate(offset);
            out.push(RawReference {
                source: source.clone(),
                line,
                column,
                link_text: full.as_str().to_string(),
                target: parts.target,
                alias: parts.alias,
                fragment: parts.fragment,
                kind: ReferenceKind::Bracketed,
                embed: caps.get(1).is_some_and(|m| !m.is_empty()),
            });
        }
    }

    /// Phase 2b: `[text](note.md)`; images are not references
    fn inline_references(
        &self,
        source: &NoteIdentity,
        body: &str,
        body_offset: usize,
        excluded: &ExcludedRanges,
        out: &mut Vec<RawReference>,
    ) {
        if !has_inline(body) {
            return;
        }

        for caps in INLINE.captures_iter(body) {
            let (Some(full), Some(text), Some(destination)) = (caps.get(0), caps.get(2), caps.get(3))
            else {
                continue;
            };
            if caps.get(1).is_some_and(|m| !m.is_empty()) {
                continue;
            }
            let offset = body_offset + full.start();
            if excluded.contains(offset) {
                continue;
            }
            let Some(parts) = split_inline(text.as_str(), destination.as_str(), self.note_extension)
            else {
                continue;
            };

            let (line, column) = self.index.locate(offset);
            out.push(RawReference {
                source: source.clone(),
                line,
                column,
                link_text: full.as_str().to_string(),
                target: parts.target,
                alias: parts.alias,
                fragment: parts.fragment,
                kind: ReferenceKind::Inline,
                embed: false,
            });
        }
    }

    /// Phase 2c: `#tags` outside code
    fn inline_tags(&self, body: &str, body_offset: usize, excluded: &ExcludedRanges) -> Vec<String> {
        if !body.contains('#') {
            return Vec::new();
        }

        TAG.captures_iter(body)
            .filter_map(|caps| {
                let name = caps.get(1)?;
                // offset of the `#`
                if excluded.contains(body_offset + name.start() - 1) {
                    return None;
                }
                normalize_tag(name.as_str())
            })
            .collect()
    }
}

fn heading_level(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}
