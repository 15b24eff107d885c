//! Rebuild a reference's text around a new target.
//!
//! Only the target inside the original span is replaced; alias, fragment,
//! embed marker, whitespace and inline bracket style are kept byte for byte.
//!
//! ```
//! use linkweave_core::NoteIdentity;
//! use linkweave_parser::{extract_references, render::render_reference};
//!
//! let refs = extract_references(&NoteIdentity::new("A"), "[[Old#Intro| read me ]]");
//! assert_eq!(render_reference(&refs[0], "New"), "[[New#Intro| read me ]]");
//! ```

use linkweave_core::{RawReference, ReferenceKind};
use std::ops::Range;

/// Text for `reference` pointing at `target`.
///
/// For bracketed references `target` is the identity text (bare name or path);
/// for inline references it is the path with extension.
pub fn render_reference(reference: &RawReference, target: &str) -> String {
    let text = &reference.link_text;
    match reference.kind {
        ReferenceKind::Bracketed => match bracketed_target_span(text) {
            Some(span) => splice(text, span, target),
            None => rebuild_bracketed(reference, target),
        },
        ReferenceKind::Inline => match inline_target_span(text) {
            Some(span) if uses_angle_brackets(reference) => splice(text, span, target),
            Some(span) => splice(text, span, &target.replace(' ', "%20")),
            None => rebuild_inline(reference, target),
        },
    }
}

/// `[text](<dest>)` form
pub fn uses_angle_brackets(reference: &RawReference) -> bool {
    reference.kind == ReferenceKind::Inline && reference.link_text.contains("](<")
}

fn splice(text: &str, span: Range<usize>, replacement: &str) -> String {
    let mut out = String::with_capacity(text.len() + replacement.len());
    out.push_str(&text[..span.start]);
    out.push_str(replacement);
    out.push_str(&text[span.end..]);
    out
}

/// Byte range of the target in `[[target#fragment|alias]]`, surrounding
/// whitespace excluded
fn bracketed_target_span(text: &str) -> Option<Range<usize>> {
    let start = text.find("[[")? + 2;
    let end = text.rfind("]]").filter(|&end| end >= start)?;
    let inner = &text[start..end];

    let raw_end = inner.find(['#', '|']).unwrap_or(inner.len());
    let mut raw = &inner[..raw_end];
    // `\|` is the escaped pipe used inside tables
    if inner[raw_end..].starts_with('|') {
        raw = raw.strip_suffix('\\').unwrap_or(raw);
    }
    Some(trimmed_span(raw, start))
}

/// Byte range of the path in `[text](path#fragment)` or `[text](<path>)`
fn inline_target_span(text: &str) -> Option<Range<usize>> {
    let open = text.find("](")? + 2;
    let close = text.rfind(')').filter(|&close| close >= open)?;
    let mut start = open;
    let mut dest = &text[open..close];
    if let Some(inner) = dest.strip_prefix('<').and_then(|d| d.strip_suffix('>')) {
        start += 1;
        dest = inner;
    }
    let raw = &dest[..dest.find('#').unwrap_or(dest.len())];
    Some(trimmed_span(raw, start))
}

/// Range of `raw.trim()` given that `raw` starts at `offset`
fn trimmed_span(raw: &str, offset: usize) -> Range<usize> {
    let lead = raw.len() - raw.trim_start().len();
    let trail = raw.len() - raw.trim_end().len();
    let start = offset + lead;
    start..(offset + raw.len() - trail).max(start)
}

fn rebuild_bracketed(reference: &RawReference, target: &str) -> String {
    let mut out = String::with_capacity(target.len() + 8);
    if reference.embed {
        out.push('!');
    }
    out.push_str("[[");
    out.push_str(target);
    if let Some(fragment) = &reference.fragment {
        out.push('#');
        out.push_str(fragment);
    }
    if let Some(alias) = &reference.alias {
        out.push('|');
        out.push_str(alias);
    }
    out.push_str("]]");
    out
}

fn rebuild_inline(reference: &RawReference, target: &str) -> String {
    let text = reference.alias.as_deref().unwrap_or_default();
    let fragment = reference
        .fragment
        .as_deref()
        .map(|f| format!("#{}", f.replace(' ', "%20")))
        .unwrap_or_default();
    format!("[{}]({}{})", text, target.replace(' ', "%20"), fragment)
}
