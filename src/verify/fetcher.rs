//! Single-URL source fetching and classification.

use chrono::{DateTime, Utc};
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::Duration;
use tracing::debug;

use crate::error::{Error, Result};
use crate::store::CitationContentRecord;

use super::policy::{DomainPolicy, FetchPolicy};

/// Verification status of one citation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CitationStatus {
    Verified,
    Broken,
    Unverifiable,
    Pending,
}

impl std::fmt::Display for CitationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Verified => write!(f, "verified"),
            Self::Broken => write!(f, "broken"),
            Self::Unverifiable => write!(f, "unverifiable"),
            Self::Pending => write!(f, "pending"),
        }
    }
}

/// Verification result for one citation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitationRecord {
    pub footnote: u32,
    pub url: String,
    pub status: CitationStatus,
    pub http_status: Option<u16>,
    pub title: Option<String>,
    pub snippet: Option<String>,
    pub content_length: Option<usize>,
    pub note: Option<String>,
    pub checked_at: DateTime<Utc>,
}

/// Fetcher configuration.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Per-fetch deadline in seconds.
    pub timeout_secs: u64,
    /// Descriptive user agent sent on every request.
    pub user_agent: String,
    /// Snippet length taken from extracted text.
    pub snippet_chars: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 15,
            user_agent: "citeguard/0.1 (citation verification; +https://github.com/rand/citeguard)"
                .to_string(),
            snippet_chars: 500,
        }
    }
}

impl FetchConfig {
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn with_user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = ua.into();
        self
    }
}

/// Resolves one citation URL to a verification status with per-domain policy.
pub struct SourceFetcher {
    http: Client,
    config: FetchConfig,
    policy: DomainPolicy,
}

impl SourceFetcher {
    pub fn new(config: FetchConfig, policy: DomainPolicy) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            http,
            config,
            policy,
        })
    }

    /// Verify one citation URL.
    ///
    /// Returns the classification record and, for full fetches that returned
    /// a body, a content record for the URL-keyed cache.
    pub async fn verify(
        &self,
        footnote: u32,
        url: &str,
    ) -> (CitationRecord, Option<CitationContentRecord>) {
        match self.policy.classify(url) {
            FetchPolicy::Skip => (
                record(footnote, url, CitationStatus::Unverifiable)
                    .with_note("known unscrapable domain; skipped without fetch"),
                None,
            ),
            FetchPolicy::StatusOnly => (self.fetch_status_only(footnote, url).await, None),
            FetchPolicy::Full => self.fetch_full(footnote, url).await,
        }
    }

    async fn fetch_status_only(&self, footnote: u32, url: &str) -> CitationRecord {
        match self.http.get(url).send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                record(footnote, url, classify_status(status))
                    .with_http_status(status)
                    .with_note("access-restricted publisher; classified by status only")
            }
            Err(e) => transport_failure(footnote, url, &e, self.config.timeout_secs),
        }
    }

    async fn fetch_full(
        &self,
        footnote: u32,
        url: &str,
    ) -> (CitationRecord, Option<CitationContentRecord>) {
        let response = match self.http.get(url).send().await {
            Ok(r) => r,
            Err(e) => {
                return (
                    transport_failure(footnote, url, &e, self.config.timeout_secs),
                    None,
                )
            }
        };

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_lowercase();

        if !matches!(classify_status(status), CitationStatus::Verified) {
            return (
                record(footnote, url, CitationStatus::Broken).with_http_status(status),
                None,
            );
        }

        if content_type.contains("application/pdf") || url.to_lowercase().ends_with(".pdf") {
            debug!(url, "accepting PDF source without text extraction");
            return (
                record(footnote, url, CitationStatus::Verified)
                    .with_http_status(status)
                    .with_note("PDF source accepted without text extraction"),
                None,
            );
        }

        let body = match response.text().await {
            Ok(b) => b,
            Err(e) => {
                return (
                    transport_failure(footnote, url, &e, self.config.timeout_secs),
                    None,
                )
            }
        };

        if !content_type.contains("text/html") && !content_type.is_empty() {
            let rec = record(footnote, url, CitationStatus::Verified)
                .with_http_status(status)
                .with_length(body.len())
                .with_note(format!("non-HTML content ({}); accepted", content_type));
            return (rec, Some(content_record(url, status, None, None, &body)));
        }

        let title = extract_title(&body);
        let text = strip_html(&body);
        let snippet = snippet_of(&text, self.config.snippet_chars);

        let rec = record(footnote, url, CitationStatus::Verified)
            .with_http_status(status)
            .with_length(text.len())
            .with_title(title.clone())
            .with_snippet(snippet);

        let content = CitationContentRecord {
            url: url.to_string(),
            html: Some(body.clone()),
            text: Some(text),
            title,
            status: Some(status),
            content_hash: Some(content_hash(&body)),
            fetched_at: Utc::now(),
        };
        (rec, Some(content))
    }
}

fn record(footnote: u32, url: &str, status: CitationStatus) -> CitationRecord {
    CitationRecord {
        footnote,
        url: url.to_string(),
        status,
        http_status: None,
        title: None,
        snippet: None,
        content_length: None,
        note: None,
        checked_at: Utc::now(),
    }
}

impl CitationRecord {
    fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    fn with_http_status(mut self, status: u16) -> Self {
        self.http_status = Some(status);
        self
    }

    fn with_length(mut self, len: usize) -> Self {
        self.content_length = Some(len);
        self
    }

    fn with_title(mut self, title: Option<String>) -> Self {
        self.title = title;
        self
    }

    fn with_snippet(mut self, snippet: String) -> Self {
        self.snippet = Some(snippet);
        self
    }
}

fn transport_failure(
    footnote: u32,
    url: &str,
    error: &reqwest::Error,
    timeout_secs: u64,
) -> CitationRecord {
    if error.is_timeout() {
        record(footnote, url, CitationStatus::Unverifiable)
            .with_note(format!("fetch timed out after {}s", timeout_secs))
    } else {
        record(footnote, url, CitationStatus::Broken).with_note(error.to_string())
    }
}

fn content_record(
    url: &str,
    status: u16,
    title: Option<String>,
    text: Option<String>,
    body: &str,
) -> CitationContentRecord {
    CitationContentRecord {
        url: url.to_string(),
        html: Some(body.to_string()),
        text,
        title,
        status: Some(status),
        content_hash: Some(content_hash(body)),
        fetched_at: Utc::now(),
    }
}

/// Map an HTTP status to a citation status: 2xx-3xx verified, else broken.
pub fn classify_status(status: u16) -> CitationStatus {
    if (200..400).contains(&status) {
        CitationStatus::Verified
    } else {
        CitationStatus::Broken
    }
}

/// Hex sha-256 of a fetched body.
pub fn content_hash(body: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(body.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Extract the `<title>` of an HTML document.
pub fn extract_title(html: &str) -> Option<String> {
    let re = Regex::new(r"(?is)<title[^>]*>(.*?)</title>").unwrap();
    re.captures(html)
        .map(|cap| cap[1].split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|t| !t.is_empty())
}

/// Strip script/style/nav/header/footer blocks and all remaining tags,
/// collapsing whitespace.
pub fn strip_html(html: &str) -> String {
    let block_re =
        Regex::new(r"(?is)<(script|style|nav|header|footer)[^>]*>.*?</(script|style|nav|header|footer)>")
            .unwrap();
    let without_blocks = block_re.replace_all(html, " ");
    let tag_re = Regex::new(r"(?s)<[^>]+>").unwrap();
    let without_tags = tag_re.replace_all(&without_blocks, " ");
    without_tags.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// First `chars` characters of extracted text.
pub fn snippet_of(text: &str, chars: usize) -> String {
    text.chars().take(chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_status_classification() {
        assert_eq!(classify_status(200), CitationStatus::Verified);
        assert_eq!(classify_status(301), CitationStatus::Verified);
        assert_eq!(classify_status(404), CitationStatus::Broken);
        assert_eq!(classify_status(500), CitationStatus::Broken);
        assert_eq!(classify_status(403), CitationStatus::Broken);
    }

    #[test]
    fn test_strip_html_removes_chrome() {
        let html = r#"<html><head><title>Paper</title><style>.x{}</style></head>
            <body><nav>Menu Menu</nav><p>Real   content here.</p>
            <script>var x = 1;</script><footer>(c) 2025</footer></body></html>"#;
        let text = strip_html(html);
        assert!(text.contains("Real content here."));
        assert!(!text.contains("Menu"));
        assert!(!text.contains("var x"));
        assert!(!text.contains("(c) 2025"));
    }

    #[test]
    fn test_extract_title() {
        assert_eq!(
            extract_title("<html><title>A  Fine\n Paper</title></html>"),
            Some("A Fine Paper".to_string())
        );
        assert_eq!(extract_title("<html><body>no title</body></html>"), None);
        assert_eq!(extract_title("<title></title>"), None);
    }

    #[test]
    fn test_snippet_truncation() {
        let text = "x".repeat(1000);
        assert_eq!(snippet_of(&text, 500).len(), 500);
        assert_eq!(snippet_of("short", 500), "short");
    }

    #[test]
    fn test_content_hash_stable() {
        assert_eq!(content_hash("abc"), content_hash("abc"));
        assert_ne!(content_hash("abc"), content_hash("abd"));
    }
}
