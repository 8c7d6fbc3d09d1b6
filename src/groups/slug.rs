//! Group name slugs
//!
//! Slugs are compared against the blacklist, so spellings of a reserved
//! word such as "Admin", "ADMIN!", "Ádmin" and " admin " all map to the
//! same slug:
//! - Transliterate to ASCII
//! - Lowercase the text
//! - Drop quote characters
//! - Replace every run of non-alphanumeric characters with `-`
//! - Trim leading/trailing `-`

use deunicode::deunicode;
use regex::Regex;
use std::sync::OnceLock;

fn separator_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[^a-z0-9]+").expect("valid slug pattern"))
}

/// Slugify a group name
pub fn slugify(text: &str) -> String {
    let lowered: String = deunicode(text)
        .to_lowercase()
        .chars()
        .filter(|c| !matches!(c, '\'' | '"' | '\u{2019}'))
        .collect();

    separator_pattern()
        .replace_all(&lowered, "-")
        .trim_matches('-')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Readers Club"), "readers-club");
        assert_eq!(slugify("  ADMIN!! "), "admin");
        assert_eq!(slugify("don't panic"), "dont-panic");
        assert_eq!(slugify("a--b__c"), "a-b-c");
    }

    #[test]
    fn test_slugify_transliterates() {
        assert_eq!(slugify("Café Lecteurs"), "cafe-lecteurs");
        assert_eq!(slugify("Ádmin"), "admin");
        assert_eq!(slugify("Straße"), "strasse");
    }

    #[test]
    fn test_slugify_empty() {
        assert_eq!(slugify("!!!"), "");
        assert_eq!(slugify(""), "");
    }
}
