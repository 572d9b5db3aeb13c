//! Source-verification fetch pipeline.
//!
//! Resolves each cited URL to verified / broken / unverifiable with bounded
//! concurrency and per-domain policy, caches fetched content, and writes one
//! atomically-replaced archive file per page.

pub mod archive;
pub mod fetcher;
pub mod pipeline;
pub mod policy;

pub use archive::{ArchiveTotals, CitationArchive};
pub use fetcher::{
    classify_status, content_hash, extract_title, snippet_of, strip_html, CitationRecord,
    CitationStatus, FetchConfig, SourceFetcher,
};
pub use pipeline::{VerificationPipeline, VerifyConfig, DEFAULT_BATCH_DELAY_MS, DEFAULT_CONCURRENCY};
pub use policy::{domain_of, DomainPolicy, FetchPolicy};
