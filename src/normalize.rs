//! Name and tag normalization
//!
//! Language names are stored and queried in a canonical form: the first
//! character is uppercased and the rest is left untouched. Feature tags use
//! `_` as the word separator internally, while API callers write `-`.

use crate::{Error, Result};

/// Canonical form of a language name, used as the store's lookup key.
pub fn capitalize_name(input: &str) -> String {
    let mut chars = input.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Stored form of a feature tag: words separated by `_`.
pub fn normalize_feature_tag(tag: &str) -> String {
    tag.replace('-', "_")
}

/// Parse the `tags` query value into a set of stored feature tags.
///
/// Tags are joined with `+`. A literal `+` in a form-encoded query string
/// arrives as a space, so both are accepted as separators.
pub fn parse_feature_tags(raw: &str) -> Result<Vec<String>> {
    let mut tags: Vec<String> = Vec::new();
    for segment in raw.split(|c: char| c == '+' || c.is_whitespace()) {
        if segment.is_empty() {
            continue;
        }
        let tag = normalize_feature_tag(segment);
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }

    if tags.is_empty() {
        return Err(Error::BadRequest("no feature tags supplied".to_string()));
    }
    Ok(tags)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capitalize_first_letter_only() {
        assert_eq!(capitalize_name("python"), "Python");
        assert_eq!(capitalize_name("javaScript"), "JavaScript");
        assert_eq!(capitalize_name("C"), "C");
        assert_eq!(capitalize_name(""), "");
    }

    #[test]
    fn test_capitalize_is_idempotent() {
        for name in ["rust", "Rust", "élixir", "c++", "f#"] {
            let once = capitalize_name(name);
            assert_eq!(capitalize_name(&once), once);
        }
    }

    #[test]
    fn test_parse_tags_plus_and_space() {
        let tags = parse_feature_tags("pattern-matching+null-safety").unwrap();
        assert_eq!(tags, vec!["pattern_matching", "null_safety"]);

        let decoded = parse_feature_tags("pattern-matching null-safety").unwrap();
        assert_eq!(decoded, tags);
    }

    #[test]
    fn test_parse_tags_dedup_and_empty_segments() {
        let tags = parse_feature_tags("+gc++gc+closures+").unwrap();
        assert_eq!(tags, vec!["gc", "closures"]);
    }

    #[test]
    fn test_parse_tags_rejects_empty() {
        assert!(matches!(parse_feature_tags(""), Err(Error::BadRequest(_))));
        assert!(matches!(parse_feature_tags(" + "), Err(Error::BadRequest(_))));
    }
}
