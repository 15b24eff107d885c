//! Link resolution against the set of existing notes.
//!
//! Tiers, tried in order, first hit wins:
//! 1. exact vault-relative path (without extension)
//! 2. exact bare name; several matches pick the lexicographically first path
//!    and report the rest as alternatives
//! 3. case-insensitive path, then case-insensitive bare name (Unicode NFC
//!    before lowercasing)
//! 4. unresolved
//!
//! Inline references are first tried relative to the folder of the note that
//! contains them, then vault-relative through the tiers.

use linkweave_core::{NoteIdentity, PathValidator, RawReference, ReferenceKind};
use std::collections::{BTreeMap, BTreeSet};
use unicode_normalization::UnicodeNormalization;

/// Outcome of resolving one target
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved(NoteIdentity),
    /// Settled by the tie-break; `alternatives` are the other matches
    Ambiguous {
        chosen: NoteIdentity,
        alternatives: Vec<NoteIdentity>,
    },
    Unresolved,
}

impl Resolution {
    /// The identity the reference points at, if any
    pub fn identity(&self) -> Option<&NoteIdentity> {
        match self {
            Self::Resolved(id) | Self::Ambiguous { chosen: id, .. } => Some(id),
            Self::Unresolved => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        !matches!(self, Self::Unresolved)
    }

    /// Pick the first of a sorted candidate set
    fn from_matches(matches: &BTreeSet<NoteIdentity>) -> Self {
        let mut iter = matches.iter();
        match iter.next() {
            None => Self::Unresolved,
            Some(first) if matches.len() == 1 => Self::Resolved(first.clone()),
            Some(first) => Self::Ambiguous {
                chosen: first.clone(),
                alternatives: iter.cloned().collect(),
            },
        }
    }
}

/// Case folding used by the case-insensitive tier
pub fn fold_case(s: &str) -> String {
    s.nfc().collect::<String>().to_lowercase()
}

/// Lookup tables over a set of note identities
#[derive(Debug, Clone, Default)]
pub struct NoteIndex {
    note_extension: String,
    by_path: BTreeMap<String, NoteIdentity>,
    by_name: BTreeMap<String, BTreeSet<NoteIdentity>>,
    by_folded_path: BTreeMap<String, BTreeSet<NoteIdentity>>,
    by_folded_name: BTreeMap<String, BTreeSet<NoteIdentity>>,
}

impl NoteIndex {
    /// Empty index for notes with the given extension
    pub fn new(note_extension: impl Into<String>) -> Self {
        Self {
            note_extension: note_extension.into(),
            ..Self::default()
        }
    }

    /// Index over an existing identity set
    pub fn from_identities<I>(identities: I, note_extension: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = NoteIdentity>,
    {
        let mut index = Self::new(note_extension);
        for id in identities {
            index.insert(id);
        }
        index
    }

    pub fn note_extension(&self) -> &str {
        &self.note_extension
    }

    pub fn insert(&mut self, id: NoteIdentity) {
        if self.by_path.contains_key(&id.path) {
            return;
        }
        self.by_name
            .entry(id.name.clone())
            .or_default()
            .insert(id.clone());
        self.by_folded_path
            .entry(fold_case(&id.path))
            .or_default()
            .insert(id.clone());
        self.by_folded_name
            .entry(fold_case(&id.name))
            .or_default()
            .insert(id.clone());
        self.by_path.insert(id.path.clone(), id);
    }

    pub fn remove(&mut self, id: &NoteIdentity) {
        if self.by_path.remove(&id.path).is_none() {
            return;
        }
        remove_from(&mut self.by_name, &id.name, id);
        remove_from(&mut self.by_folded_path, &fold_case(&id.path), id);
        remove_from(&mut self.by_folded_name, &fold_case(&id.name), id);
    }

    pub fn contains(&self, id: &NoteIdentity) -> bool {
        self.by_path.contains_key(&id.path)
    }

    pub fn len(&self) -> usize {
        self.by_path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_path.is_empty()
    }

    /// All identities, sorted by path
    pub fn identities(&self) -> impl Iterator<Item = &NoteIdentity> {
        self.by_path.values()
    }

    /// Exactly one note carries this bare name
    pub fn is_unique_name(&self, name: &str) -> bool {
        self.by_name.get(name).is_some_and(|ids| ids.len() == 1)
    }

    /// Text a bracketed reference should use for `id`: the bare name when it is
    /// unique in this index, otherwise the full path
    pub fn link_text_for(&self, id: &NoteIdentity) -> String {
        if self.is_unique_name(&id.name) {
            id.name.clone()
        } else {
            id.path.clone()
        }
    }

    /// Normalize a raw target: trim, `\` to `/`, drop leading `/` and `./`,
    /// drop a trailing note extension.
    pub fn normalize_target(&self, raw: &str) -> String {
        let replaced = raw.trim().replace('\\', "/");
        let mut target = replaced.as_str();
        loop {
            if let Some(rest) = target.strip_prefix("./") {
                target = rest;
            } else if let Some(rest) = target.strip_prefix('/') {
                target = rest;
            } else {
                break;
            }
        }

        let suffix = format!(".{}", self.note_extension);
        if target.len() > suffix.len()
            && target
                .get(target.len() - suffix.len()..)
                .is_some_and(|ext| ext.eq_ignore_ascii_case(&suffix))
        {
            target = &target[..target.len() - suffix.len()];
        }
        target.trim().to_string()
    }

    /// Resolve a target string through the tiers
    pub fn resolve(&self, raw_target: &str) -> Resolution {
        let target = self.normalize_target(raw_target);
        if target.is_empty() {
            return Resolution::Unresolved;
        }

        // `..` segments only make sense relative to a note; fold them lexically
        let target = if target.contains("./") {
            PathValidator::normalize_relative(&target).unwrap_or(target)
        } else {
            target
        };

        if let Some(id) = self.by_path.get(&target) {
            return Resolution::Resolved(id.clone());
        }

        if let Some(ids) = self.by_name.get(&target) {
            return Resolution::from_matches(ids);
        }

        let folded = fold_case(&target);
        if let Some(ids) = self.by_folded_path.get(&folded) {
            return Resolution::from_matches(ids);
        }
        if let Some(ids) = self.by_folded_name.get(&folded) {
            return Resolution::from_matches(ids);
        }

        Resolution::Unresolved
    }

    /// Resolve a parsed reference, honoring folder-relative inline targets
    pub fn resolve_reference(&self, reference: &RawReference) -> Resolution {
        match reference.kind {
            ReferenceKind::Inline => self.resolve_inline(&reference.source, &reference.target),
            ReferenceKind::Bracketed => self.resolve(&reference.target),
        }
    }

    /// Resolve an inline target written in `source`: the source note's folder
    /// first, then vault-relative through the tiers
    pub fn resolve_inline(&self, source: &NoteIdentity, raw_target: &str) -> Resolution {
        if let Some(relative) = self.relative_path(source, raw_target) {
            if let Some(id) = self.by_path.get(&relative) {
                return Resolution::Resolved(id.clone());
            }
            if let Some(ids) = self.by_folded_path.get(&fold_case(&relative)) {
                return Resolution::from_matches(ids);
            }
        }

        self.resolve(raw_target)
    }

    /// Target text (with extension) an inline reference in `source` should use
    /// for `id`.
    ///
    /// The vault-relative path when it resolves back to `id` from `source`,
    /// otherwise the path relative to the source note's folder.
    pub fn inline_text_for(&self, source: &NoteIdentity, id: &NoteIdentity) -> String {
        let vault_relative = format!("{}.{}", id.path, self.note_extension);
        if self.resolve_inline(source, &vault_relative).identity() == Some(id) {
            return vault_relative;
        }
        format!(
            "{}.{}",
            relative_from(source.folder(), &id.path),
            self.note_extension
        )
    }

    /// Inline target joined onto the source note's folder
    fn relative_path(&self, source: &NoteIdentity, raw_target: &str) -> Option<String> {
        let target = self.normalize_target(raw_target);
        if target.is_empty() || raw_target.trim_start().starts_with('/') {
            return None;
        }
        let joined = match source.folder() {
            Some(folder) => format!("{}/{}", folder, target),
            None => target,
        };
        PathValidator::normalize_relative(&joined)
    }
}

/// `path` written relative to `folder` (`None` is the vault root)
fn relative_from(folder: Option<&str>, path: &str) -> String {
    let from: Vec<&str> = folder
        .map(|f| f.split('/').filter(|s| !s.is_empty()).collect())
        .unwrap_or_default();
    let to: Vec<&str> = path.split('/').collect();

    // the file name itself is never shared
    let common = from
        .iter()
        .zip(&to)
        .take_while(|(a, b)| a == b)
        .count()
        .min(to.len().saturating_sub(1));

    let mut parts = vec![".."; from.len() - common];
    parts.extend_from_slice(&to[common..]);
    parts.join("/")
}

fn remove_from(
    map: &mut BTreeMap<String, BTreeSet<NoteIdentity>>,
    key: &str,
    id: &NoteIdentity,
) {
    if let Some(ids) = map.get_mut(key) {
        ids.remove(id);
        if ids.is_empty() {
            map.remove(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(paths: &[&str]) -> NoteIndex {
        NoteIndex::from_identities(paths.iter().map(NoteIdentity::new), "md")
    }

    fn inline(source: &str, target: &str) -> RawReference {
        RawReference {
            source: NoteIdentity::new(source),
            line: 1,
            column: 0,
            link_text: format!("[x]({})", target),
            target: target.to_string(),
            alias: Some("x".to_string()),
            fragment: None,
            kind: ReferenceKind::Inline,
            embed: false,
        }
    }

    #[test]
    fn test_exact_path_beats_name() {
        let idx = index(&["Notes/Old", "Old"]);
        assert_eq!(
            idx.resolve("Notes/Old"),
            Resolution::Resolved(NoteIdentity::new("Notes/Old"))
        );
        // "Old" is the exact path of the root note
        assert_eq!(idx.resolve("Old"), Resolution::Resolved(NoteIdentity::new("Old")));
    }

    #[test]
    fn test_bare_name_collision_is_deterministic() {
        let idx = index(&["B/x", "A/x"]);
        let resolution = idx.resolve("x");
        assert_eq!(
            resolution,
            Resolution::Ambiguous {
                chosen: NoteIdentity::new("A/x"),
                alternatives: vec![NoteIdentity::new("B/x")],
            }
        );
        // same answer every time
        assert_eq!(idx.resolve("x"), resolution);
    }

    #[test]
    fn test_case_insensitive_tier() {
        let idx = index(&["Projects/Bee-Keeping"]);
        assert_eq!(
            idx.resolve("projects/bee-keeping").identity(),
            Some(&NoteIdentity::new("Projects/Bee-Keeping"))
        );
        assert_eq!(
            idx.resolve("BEE-KEEPING").identity(),
            Some(&NoteIdentity::new("Projects/Bee-Keeping"))
        );
    }

    #[test]
    fn test_nfc_folding() {
        // "é" precomposed vs "e" + combining acute
        let idx = index(&["Caf\u{e9}"]);
        assert!(idx.resolve("CAFE\u{301}").is_resolved());
    }

    #[test]
    fn test_normalization() {
        let idx = index(&["Notes/Plan"]);
        assert!(idx.resolve("  /Notes/Plan.md ").is_resolved());
        assert!(idx.resolve("./Notes/Plan.MD").is_resolved());
        assert!(idx.resolve("Notes\\Plan").is_resolved());
        assert_eq!(idx.resolve(""), Resolution::Unresolved);
        assert_eq!(idx.resolve("Nope"), Resolution::Unresolved);
    }

    #[test]
    fn test_inline_relative_to_source_folder() {
        let idx = index(&["Journal/Plan", "Plan", "Projects/Roadmap"]);
        assert_eq!(
            idx.resolve_reference(&inline("Journal/Today", "Plan.md")).identity(),
            Some(&NoteIdentity::new("Journal/Plan"))
        );
        assert_eq!(
            idx.resolve_reference(&inline("Journal/Today", "../Projects/Roadmap.md"))
                .identity(),
            Some(&NoteIdentity::new("Projects/Roadmap"))
        );
        // vault-relative fallback
        assert_eq!(
            idx.resolve_reference(&inline("Journal/Today", "Projects/Roadmap.md"))
                .identity(),
            Some(&NoteIdentity::new("Projects/Roadmap"))
        );
    }

    #[test]
    fn test_inline_text_round_trips() {
        let idx = index(&["Archive/Plan", "Journal/Archive/Plan", "Journal/Today"]);
        let source = NoteIdentity::new("Journal/Today");
        let wanted = NoteIdentity::new("Archive/Plan");

        // `Archive/Plan.md` from Journal/ would land on Journal/Archive/Plan
        let text = idx.inline_text_for(&source, &wanted);
        assert_eq!(text, "../Archive/Plan.md");
        assert_eq!(idx.resolve_inline(&source, &text).identity(), Some(&wanted));

        // no shadowing note: plain vault path
        let idx = index(&["Archive/Plan", "Journal/Today"]);
        assert_eq!(idx.inline_text_for(&source, &wanted), "Archive/Plan.md");
    }

    #[test]
    fn test_relative_from() {
        assert_eq!(relative_from(None, "A/B"), "A/B");
        assert_eq!(relative_from(Some("Journal"), "Archive/Plan"), "../Archive/Plan");
        assert_eq!(relative_from(Some("A/B"), "A/C"), "../C");
        assert_eq!(relative_from(Some("A"), "A/B/C"), "B/C");
        assert_eq!(relative_from(Some("A/B"), "A/B"), "../B");
    }

    #[test]
    fn test_link_text_and_remove() {
        let mut idx = index(&["A/x", "B/x", "Solo"]);
        assert_eq!(idx.link_text_for(&NoteIdentity::new("Solo")), "Solo");
        assert_eq!(idx.link_text_for(&NoteIdentity::new("A/x")), "A/x");

        idx.remove(&NoteIdentity::new("B/x"));
        assert_eq!(idx.link_text_for(&NoteIdentity::new("A/x")), "x");
        assert_eq!(idx.len(), 2);
        assert!(!idx.contains(&NoteIdentity::new("B/x")));
    }
}
