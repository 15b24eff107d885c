//! Frontmatter codec: YAML between `---` delimiters.

use linkweave_core::Frontmatter;

/// Parse the YAML text of a metadata block.
///
/// Only mappings are accepted; anything else (or invalid YAML) yields `None`
/// and the block is still skipped by the caller.
pub fn parse_frontmatter(yaml: &str, line_count: usize) -> Option<Frontmatter> {
    match serde_yaml::from_str::<serde_json::Value>(yaml) {
        Ok(serde_json::Value::Object(map)) => Some(Frontmatter {
            data: map.into_iter().collect(),
            line_count,
        }),
        Ok(_) => None,
        Err(e) => {
            log::debug!("Ignoring unparsable frontmatter: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_frontmatter() {
        let fm = parse_frontmatter("title: Test\ntags: [a, b]", 4).unwrap();
        assert_eq!(fm.title(), Some("Test"));
        assert_eq!(fm.tags(), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(fm.line_count, 4);
    }

    #[test]
    fn test_non_mapping_frontmatter() {
        assert!(parse_frontmatter("- just\n- a list", 4).is_none());
        assert!(parse_frontmatter("", 2).is_none());
    }

    #[test]
    fn test_malformed_frontmatter() {
        assert!(parse_frontmatter("title: [unclosed", 3).is_none());
    }
}
