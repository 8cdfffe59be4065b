//! Glob translation for pattern deletion.
//!
//! Only `*` is a wildcard. Every other character matches itself, so a
//! pattern built from user input cannot smuggle in regex or Redis glob syntax.

use regex::Regex;

/// Anchored regex equivalent of a `*`-only glob.
pub(crate) fn glob_to_regex(pattern: &str) -> Result<Regex, regex::Error> {
    let body = pattern
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");
    // `(?s)` so `*` also spans newlines, as Redis MATCH does
    Regex::new(&format!("(?s)^{body}$"))
}

/// Redis `MATCH` pattern with every glob metacharacter except `*` escaped.
#[cfg_attr(not(feature = "redis"), allow(dead_code))]
pub(crate) fn glob_to_redis(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        if matches!(c, '?' | '[' | ']' | '\\' | '^') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_star_matches_any_suffix() {
        let re = glob_to_regex("user:*").unwrap();
        assert!(re.is_match("user:1"));
        assert!(re.is_match("user:"));
        assert!(re.is_match("user:1:profile"));
        assert!(!re.is_match("other:key"));
        assert!(!re.is_match("xuser:1"));
    }

    #[test]
    fn test_regex_metacharacters_are_literal() {
        let re = glob_to_regex("a.b+(c)*").unwrap();
        assert!(re.is_match("a.b+(c)-tail"));
        assert!(!re.is_match("axb+(c)-tail"));

        let question = glob_to_regex("k?").unwrap();
        assert!(question.is_match("k?"));
        assert!(!question.is_match("ka"));
    }

    #[test]
    fn test_inner_wildcard() {
        let re = glob_to_regex("ratelimit:*:10.0.0.1").unwrap();
        assert!(re.is_match("ratelimit:api:10.0.0.1"));
        assert!(!re.is_match("ratelimit:api:10.0.0.10"));
    }

    #[test]
    fn test_star_matches_newline() {
        let re = glob_to_regex("prefix:*").unwrap();
        assert!(re.is_match("prefix:a\nb"));
        assert!(!re.is_match("other\nprefix:a"));
    }

    #[test]
    fn test_redis_escaping() {
        assert_eq!(glob_to_redis("app:*"), "app:*");
        assert_eq!(glob_to_redis("a?[b]"), "a\\?\\[b\\]");
        assert_eq!(glob_to_redis("back\\slash"), "back\\\\slash");
    }
}
