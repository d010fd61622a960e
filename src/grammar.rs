//! Token patterns for values, compiled once per process and shared
//! read-only by every parse.

use regex::Regex;
use std::sync::LazyLock;

/// A compiled pattern with the name reported when it fails to match.
pub struct NamedPattern {
    pub name: &'static str,
    regex: Regex,
}

impl NamedPattern {
    fn new(name: &'static str, pattern: &str) -> Self {
        // All patterns are literals below; a failure here is a typo.
        let regex = Regex::new(pattern).expect("shorthand token pattern must compile");
        NamedPattern { name, regex }
    }

    /// Length in bytes of the match anchored at the start of `haystack`.
    pub fn match_len(&self, haystack: &str) -> Option<usize> {
        self.regex.find(haystack).map(|m| m.end())
    }
}

/// Characters that may begin an unquoted value. Excludes whitespace,
/// quotes, `,`, `=`, `[` and `{`.
const START_WORD: &str = r"!\x23-\x26\x28-\x2B\x2D-\x3C\x3E-\x5A\x5C-\x7A\x7C-\x{10FFFF}";

/// Continuation of a first value. Excludes quotes, `,`, `]` and `}`.
const FIRST_FOLLOW: &str = r"\s!\x23-\x26\x28-\x2B\x2D-\x5C\x5E-\x7C\x7E-\x{10FFFF}";

/// Continuation of a list-continuation value. Excludes quotes, `,` and `=`.
const SECOND_FOLLOW: &str = r"\s!\x23-\x26\x28-\x2B\x2D-\x3C\x3E-\x{10FFFF}";

const ESCAPED_COMMA: &str = r"\\,";

fn word_pattern(follow: &str) -> String {
    format!(
        r"^(?:{esc}|[{start}])(?:{esc}|[{follow}])*",
        esc = ESCAPED_COMMA,
        start = START_WORD,
        follow = follow,
    )
}

pub struct Patterns {
    pub single_quoted: NamedPattern,
    pub double_quoted: NamedPattern,
    pub first_value: NamedPattern,
    pub second_value: NamedPattern,
}

static PATTERNS: LazyLock<Patterns> = LazyLock::new(|| Patterns {
    single_quoted: NamedPattern::new("single quoted", r#"^'(?:\\\\|\\'|[^'])*'"#),
    double_quoted: NamedPattern::new("double quoted", r#"^"(?:\\\\|\\"|[^"])*""#),
    first_value: NamedPattern::new("first", &word_pattern(FIRST_FOLLOW)),
    second_value: NamedPattern::new("second", &word_pattern(SECOND_FOLLOW)),
});

pub fn patterns() -> &'static Patterns {
    &PATTERNS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_value_stops_at_structural_chars() {
        let p = patterns();
        assert_eq!(p.first_value.match_len("abc,def"), Some(3));
        assert_eq!(p.first_value.match_len("a b]"), Some(3));
        assert_eq!(p.first_value.match_len("x}"), Some(1));
        assert_eq!(p.first_value.match_len("a\\,b,c"), Some(4));
        assert_eq!(p.first_value.match_len(",a"), None);
        assert_eq!(p.first_value.match_len("=a"), None);
    }

    #[test]
    fn second_value_stops_at_equals() {
        let p = patterns();
        assert_eq!(p.second_value.match_len("bar=c"), Some(3));
        assert_eq!(p.second_value.match_len("b]c"), Some(3));
        assert_eq!(p.second_value.match_len("[b"), None);
    }

    #[test]
    fn quoted_values_honor_escapes() {
        let p = patterns();
        assert_eq!(p.single_quoted.match_len("'a,b',c"), Some(5));
        assert_eq!(p.double_quoted.match_len(r#""a\"b",c"#), Some(6));
        assert_eq!(p.double_quoted.match_len(r#""open"#), None);
    }

    #[test]
    fn non_ascii_values_match() {
        let p = patterns();
        assert_eq!(p.first_value.match_len("\u{2713}"), Some(3));
        assert_eq!(p.first_value.match_len("\u{1F600}x"), Some(5));
    }
}
