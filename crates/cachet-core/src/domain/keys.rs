//! Cache key namespace.
//!
//! Every key is a flat `kind:hash:suffix` string. Long inputs such as
//! repository URLs are folded into a short base-36 hash.

/// Length commit identifiers are truncated to before they enter a key.
pub const COMMIT_PREFIX_LEN: usize = 8;

const LATEST: &str = "latest";

/// Resource kinds whose results are memoized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultKind {
    Analysis,
    Canvas,
    Gaps,
    Competitors,
}

impl ResultKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ResultKind::Analysis => "analysis",
            ResultKind::Canvas => "canvas",
            ResultKind::Gaps => "gaps",
            ResultKind::Competitors => "competitors",
        }
    }
}

/// Rolling multiplicative hash (`h * 31 + c` over UTF-16 units, wrapped
/// to 32 bits) rendered as the base-36 form of its absolute value.
///
/// The empty string hashes to `"0"`.
pub fn hash_key(input: &str) -> String {
    let mut hash: i32 = 0;
    for unit in input.encode_utf16() {
        hash = (hash << 5).wrapping_sub(hash).wrapping_add(i32::from(unit));
    }
    to_base36(i64::from(hash).unsigned_abs())
}

fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

    if n == 0 {
        return "0".to_string();
    }

    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

/// First [`COMMIT_PREFIX_LEN`] characters of a commit identifier.
pub fn short_commit(commit: &str) -> &str {
    match commit.char_indices().nth(COMMIT_PREFIX_LEN) {
        Some((idx, _)) => &commit[..idx],
        None => commit,
    }
}

/// Key for a memoized result of `kind` computed for `repo_url` at `commit`.
/// Without a commit the key points at the latest result.
pub fn result_key(kind: ResultKind, repo_url: &str, commit: Option<&str>) -> String {
    let suffix = commit.map(short_commit).unwrap_or(LATEST);
    format!("{}:{}:{}", kind.as_str(), hash_key(repo_url), suffix)
}

pub fn analysis_key(repo_url: &str, commit: Option<&str>) -> String {
    result_key(ResultKind::Analysis, repo_url, commit)
}

pub fn canvas_key(repo_url: &str, commit: Option<&str>) -> String {
    result_key(ResultKind::Canvas, repo_url, commit)
}

pub fn gaps_key(repo_url: &str, commit: Option<&str>) -> String {
    result_key(ResultKind::Gaps, repo_url, commit)
}

pub fn competitors_key(repo_url: &str, commit: Option<&str>) -> String {
    result_key(ResultKind::Competitors, repo_url, commit)
}

/// Counter key for a rate limit identifier and client.
pub fn rate_limit_key(identifier: &str, client_key: &str) -> String {
    format!("ratelimit:{identifier}:{client_key}")
}

/// Usage record key for a demo client.
pub fn demo_usage_key(client_key: &str) -> String {
    format!("demo:usage:{client_key}")
}

/// Glob matching every memoized result of `kind`, for bulk invalidation.
pub fn result_pattern(kind: ResultKind) -> String {
    format!("{}:*", kind.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_hash_is_zero() {
        assert_eq!(hash_key(""), "0");
    }

    #[test]
    fn test_hash_is_deterministic() {
        let url = "https://github.com/rust-lang/rust";
        assert_eq!(hash_key(url), hash_key(url));
    }

    #[test]
    fn test_known_hash_values() {
        // "a" = 97 = 2p in base 36; "ab" = 97 * 31 + 98 = 3105 = 2e9
        assert_eq!(hash_key("a"), "2p");
        assert_eq!(hash_key("ab"), "2e9");
    }

    #[test]
    fn test_distinct_inputs_distinct_hashes() {
        let hashes: std::collections::HashSet<String> = (0..1000)
            .map(|i| hash_key(&format!("https://github.com/org/repo-{i}")))
            .collect();
        assert!(hashes.len() > 995);
    }

    #[test]
    fn test_hash_handles_overflow() {
        let long = "x".repeat(10_000);
        let hash = hash_key(&long);
        assert!(!hash.is_empty());
        assert!(hash.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_commit_truncated() {
        assert_eq!(short_commit("0123456789abcdef"), "01234567");
        assert_eq!(short_commit("abc"), "abc");
        assert_eq!(
            analysis_key("https://x", Some("0123456789abcdef")),
            format!("analysis:{}:01234567", hash_key("https://x"))
        );
    }

    #[test]
    fn test_key_shapes() {
        let url = "https://github.com/acme/widgets";
        let hash = hash_key(url);

        assert_eq!(analysis_key(url, None), format!("analysis:{hash}:latest"));
        assert_eq!(canvas_key(url, None), format!("canvas:{hash}:latest"));
        assert_eq!(gaps_key(url, Some("deadbeef")), format!("gaps:{hash}:deadbeef"));
        assert_eq!(
            competitors_key(url, None),
            format!("competitors:{hash}:latest")
        );
        assert_eq!(rate_limit_key("api", "10.0.0.1"), "ratelimit:api:10.0.0.1");
        assert_eq!(demo_usage_key("10.0.0.1"), "demo:usage:10.0.0.1");
        assert_eq!(result_pattern(ResultKind::Gaps), "gaps:*");
    }

    #[test]
    fn test_empty_client_is_distinct_identity() {
        assert_eq!(rate_limit_key("api", ""), "ratelimit:api:");
        assert_ne!(rate_limit_key("api", ""), rate_limit_key("api", "x"));
    }
}
