//! Tag pattern: #tag, #parent/child

use regex::Regex;
use std::sync::LazyLock;

/// Tag preceded by start of line, whitespace or an opening bracket; the name
/// must start with a letter so `#1` and `#` headings do not count
pub static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|[\s\[(])#([\p{L}_][\p{L}\p{N}_\-/]*)").unwrap());

/// Trim what the pattern may over-capture (`#parent/` at end of a sentence)
pub fn normalize_tag(raw: &str) -> Option<String> {
    let tag = raw.trim_end_matches('/');
    (!tag.is_empty()).then(|| tag.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(content: &str) -> Vec<String> {
        TAG.captures_iter(content)
            .filter_map(|c| normalize_tag(&c[1]))
            .collect()
    }

    #[test]
    fn test_simple_and_nested() {
        assert_eq!(names("This is #rust code"), vec!["rust"]);
        assert_eq!(names("Tagged #project/garden/"), vec!["project/garden"]);
        assert_eq!(names("#rust #async #mcp").len(), 3);
    }

    #[test]
    fn test_not_a_tag() {
        assert!(names("# Heading").is_empty());
        assert!(names("issue #42").is_empty());
        assert!(names("page.md#section").is_empty());
    }

    #[test]
    fn test_unicode_tag() {
        assert_eq!(names("über #Bienen"), vec!["Bienen"]);
    }
}
