//! Route matching logic.
//!
//! # Responsibilities
//! - Match host header (exact match, case-insensitive)
//! - Match path prefix (case-sensitive)
//! - Combine conditions with AND semantics
//!
//! # Design Decisions
//! - Host matching is case-insensitive (per HTTP spec)
//! - Path matching is case-sensitive
//! - Empty condition set = always matches (wildcard)

/// Trait for matching requests against conditions.
///
/// Matchers operate on the already-extracted host and path rather than the
/// full request, so the router extracts both exactly once per lookup.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns true if the request matches this condition.
    fn matches(&self, host: Option<&str>, path: &str) -> bool;
}

/// Matches the Host header.
#[derive(Debug, Clone)]
pub struct HostMatcher {
    expected_host: String,
}

impl HostMatcher {
    /// Create a new host matcher.
    /// The host is normalized to lowercase for case-insensitive matching.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            expected_host: host.into().to_lowercase(),
        }
    }
}

impl Matcher for HostMatcher {
    fn matches(&self, host: Option<&str>, _path: &str) -> bool {
        host.map(|h| h.to_lowercase() == self.expected_host)
            .unwrap_or(false)
    }
}

/// Matches the request path prefix.
#[derive(Debug, Clone)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    /// Create a new path prefix matcher.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Matcher for PathPrefixMatcher {
    fn matches(&self, _host: Option<&str>, path: &str) -> bool {
        path.starts_with(&self.prefix)
    }
}

/// Combines multiple matchers with AND semantics.
#[derive(Debug)]
pub struct AndMatcher {
    matchers: Vec<Box<dyn Matcher>>,
}

impl AndMatcher {
    pub fn new(matchers: Vec<Box<dyn Matcher>>) -> Self {
        Self { matchers }
    }
}

impl Matcher for AndMatcher {
    fn matches(&self, host: Option<&str>, path: &str) -> bool {
        // All matchers must pass (AND); an empty set matches everything
        self.matchers.iter().all(|m| m.matches(host, path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_matcher() {
        let matcher = HostMatcher::new("bucket.example.com");

        assert!(matcher.matches(Some("bucket.example.com"), "/"));
        assert!(matcher.matches(Some("BUCKET.EXAMPLE.COM"), "/")); // Case insensitive
        assert!(!matcher.matches(Some("other.example.com"), "/"));
        assert!(!matcher.matches(None, "/"));
    }

    #[test]
    fn test_path_matcher() {
        let matcher = PathPrefixMatcher::new("/objects");

        assert!(matcher.matches(None, "/objects/key1"));
        assert!(!matcher.matches(None, "/buckets"));
        assert!(!matcher.matches(None, "/Objects/key1")); // Case sensitive
    }

    #[test]
    fn test_and_matcher() {
        let matcher = AndMatcher::new(vec![
            Box::new(HostMatcher::new("s3.example.com")),
            Box::new(PathPrefixMatcher::new("/data")),
        ]);

        assert!(matcher.matches(Some("s3.example.com"), "/data/key"));
        assert!(!matcher.matches(Some("s3.example.com"), "/other"));
        assert!(!matcher.matches(Some("other.com"), "/data/key"));
    }

    #[test]
    fn test_empty_and_matcher_is_wildcard() {
        let matcher = AndMatcher::new(vec![]);
        assert!(matcher.matches(None, "/anything"));
    }
}
