//! File-name convention for content entries.
//!
//! Game descriptors live in `games/NNN-slug.toml`. The optional numeric
//! prefix orders the arcade index; the rest of the stem is the game's URL
//! slug, which is also the key used by `labs/<slug>.toml`.
//!
//! - `010-beam.toml` → listed, number 10, slug `beam`
//! - `030-cat-tower.toml` → listed, number 30, slug `cat-tower`
//! - `proto-snake.toml` → unlisted, slug `proto-snake`
//!
//! Slugs appear verbatim in routes, so they are restricted to lowercase
//! ASCII letters, digits and single dashes.

/// Result of parsing a content file stem like `030-cat-tower`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedName {
    /// Number prefix if present (e.g. `30` from `030-cat-tower`).
    pub number: Option<u32>,
    /// Route slug after `NNN-`. For unnumbered entries, the full stem.
    pub slug: String,
    /// Slug with dashes converted to spaces.
    pub display_title: String,
}

/// Parse a content file stem following the `NNN-slug` convention.
///
/// - `"030-cat-tower"` → number=Some(30), slug="cat-tower", display_title="cat tower"
/// - `"010-beam"` → number=Some(10), slug="beam"
/// - `"001"` / `"001-"` → number=Some(1), slug=""
/// - `"proto-snake"` → number=None, slug="proto-snake"
pub fn parse_entry_name(stem: &str) -> ParsedName {
    if let Some((prefix, rest)) = stem.split_once('-')
        && let Ok(num) = prefix.parse::<u32>()
    {
        return ParsedName {
            number: Some(num),
            slug: rest.to_string(),
            display_title: rest.replace('-', " "),
        };
    }
    if let Ok(num) = stem.parse::<u32>() {
        return ParsedName {
            number: Some(num),
            slug: String::new(),
            display_title: String::new(),
        };
    }
    ParsedName {
        number: None,
        slug: stem.to_string(),
        display_title: stem.replace('-', " "),
    }
}

/// Whether a slug is safe to drop into a route segment unescaped.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && !slug.contains("--")
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbered_multi_word_slug() {
        let p = parse_entry_name("030-cat-tower");
        assert_eq!(p.number, Some(30));
        assert_eq!(p.slug, "cat-tower");
        assert_eq!(p.display_title, "cat tower");
    }

    #[test]
    fn numbered_single_word() {
        let p = parse_entry_name("010-beam");
        assert_eq!(p.number, Some(10));
        assert_eq!(p.slug, "beam");
    }

    #[test]
    fn number_only() {
        let p = parse_entry_name("001");
        assert_eq!(p.number, Some(1));
        assert_eq!(p.slug, "");

        let p = parse_entry_name("001-");
        assert_eq!(p.number, Some(1));
        assert_eq!(p.slug, "");
    }

    #[test]
    fn unnumbered_keeps_full_stem() {
        let p = parse_entry_name("proto-snake");
        assert_eq!(p.number, None);
        assert_eq!(p.slug, "proto-snake");
        assert_eq!(p.display_title, "proto snake");
    }

    #[test]
    fn zero_prefix() {
        let p = parse_entry_name("000-first");
        assert_eq!(p.number, Some(0));
        assert_eq!(p.slug, "first");
    }

    #[test]
    fn valid_slugs() {
        assert!(is_valid_slug("beam"));
        assert!(is_valid_slug("cat-tower"));
        assert!(is_valid_slug("2048"));
    }

    #[test]
    fn invalid_slugs() {
        assert!(!is_valid_slug(""));
        assert!(!is_valid_slug("Beam"));
        assert!(!is_valid_slug("-beam"));
        assert!(!is_valid_slug("beam-"));
        assert!(!is_valid_slug("cat--tower"));
        assert!(!is_valid_slug("cat tower"));
        assert!(!is_valid_slug("cat/tower"));
    }
}
