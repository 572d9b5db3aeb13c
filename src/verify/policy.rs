//! Per-domain fetch policy.
//!
//! Major social platforms block scrapers outright, so their URLs
//! short-circuit to `unverifiable` without a network call. Access-restricted
//! academic publishers are fetched but classified by HTTP status alone:
//! reachability matters there, content does not.

use serde::{Deserialize, Serialize};

/// How a URL should be verified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchPolicy {
    /// No network call; record as unverifiable.
    Skip,
    /// Fetch, but classify on status alone.
    StatusOnly,
    /// Fetch and extract title/snippet.
    Full,
}

/// Domains that refuse scrapers.
const UNSCRAPABLE: &[&str] = &[
    "twitter.com",
    "x.com",
    "facebook.com",
    "instagram.com",
    "linkedin.com",
    "tiktok.com",
    "reddit.com",
    "threads.net",
];

/// Paywalled academic publishers where only reachability is checked.
const RESTRICTED: &[&str] = &[
    "sciencedirect.com",
    "springer.com",
    "link.springer.com",
    "jstor.org",
    "ieeexplore.ieee.org",
    "onlinelibrary.wiley.com",
    "tandfonline.com",
    "academic.oup.com",
    "dl.acm.org",
    "nature.com",
];

/// Domain-based fetch policy table.
#[derive(Debug, Clone)]
pub struct DomainPolicy {
    unscrapable: Vec<String>,
    restricted: Vec<String>,
}

impl Default for DomainPolicy {
    fn default() -> Self {
        Self {
            unscrapable: UNSCRAPABLE.iter().map(|s| s.to_string()).collect(),
            restricted: RESTRICTED.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl DomainPolicy {
    /// Add a domain to the unscrapable set.
    pub fn with_unscrapable(mut self, domain: impl Into<String>) -> Self {
        self.unscrapable.push(domain.into().to_lowercase());
        self
    }

    /// Add a domain to the status-only set.
    pub fn with_restricted(mut self, domain: impl Into<String>) -> Self {
        self.restricted.push(domain.into().to_lowercase());
        self
    }

    /// Decide the policy for one URL.
    pub fn classify(&self, url: &str) -> FetchPolicy {
        let Some(domain) = domain_of(url) else {
            return FetchPolicy::Skip;
        };
        if self.unscrapable.iter().any(|d| domain_matches(&domain, d)) {
            FetchPolicy::Skip
        } else if self.restricted.iter().any(|d| domain_matches(&domain, d)) {
            FetchPolicy::StatusOnly
        } else {
            FetchPolicy::Full
        }
    }
}

/// Host part of a URL, lowercased, `www.` stripped.
pub fn domain_of(url: &str) -> Option<String> {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))?;
    let host = rest.split(['/', '?', '#']).next()?;
    let host = host.split('@').last()?.split(':').next()?;
    if host.is_empty() {
        return None;
    }
    Some(
        host.to_lowercase()
            .strip_prefix("www.")
            .map(str::to_string)
            .unwrap_or_else(|| host.to_lowercase()),
    )
}

/// True when `domain` is `entry` or a subdomain of it.
fn domain_matches(domain: &str, entry: &str) -> bool {
    domain == entry || domain.ends_with(&format!(".{}", entry))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_extraction() {
        assert_eq!(
            domain_of("https://www.Example.com/path?q=1"),
            Some("example.com".to_string())
        );
        assert_eq!(
            domain_of("http://sub.example.com:8080/x"),
            Some("sub.example.com".to_string())
        );
        assert_eq!(domain_of("not a url"), None);
    }

    #[test]
    fn test_social_platforms_skip() {
        let policy = DomainPolicy::default();
        assert_eq!(
            policy.classify("https://twitter.com/user/status/1"),
            FetchPolicy::Skip
        );
        assert_eq!(
            policy.classify("https://www.reddit.com/r/science"),
            FetchPolicy::Skip
        );
    }

    #[test]
    fn test_publishers_status_only() {
        let policy = DomainPolicy::default();
        assert_eq!(
            policy.classify("https://www.sciencedirect.com/science/article/pii/S1"),
            FetchPolicy::StatusOnly
        );
        assert_eq!(
            policy.classify("https://link.springer.com/article/10.1007/x"),
            FetchPolicy::StatusOnly
        );
    }

    #[test]
    fn test_subdomains_inherit_policy() {
        let policy = DomainPolicy::default();
        assert_eq!(
            policy.classify("https://mobile.twitter.com/user"),
            FetchPolicy::Skip
        );
    }

    #[test]
    fn test_everything_else_full() {
        let policy = DomainPolicy::default();
        assert_eq!(
            policy.classify("https://arxiv.org/abs/1706.03762"),
            FetchPolicy::Full
        );
    }

    #[test]
    fn test_unparseable_url_skips() {
        let policy = DomainPolicy::default();
        assert_eq!(policy.classify("ftp://example.com"), FetchPolicy::Skip);
    }
}
