//! Batch verification with bounded concurrency.
//!
//! Citations are fetched in windows of `concurrency` with an inter-batch
//! delay so source servers are never hammered. The page archive is written
//! only after every citation completes. Failures classify individual
//! citations; they never abort the page.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{debug, info};

use crate::error::Result;
use crate::footnote::extract_citations;
use crate::store::StoreHandle;

use super::archive::CitationArchive;
use super::fetcher::SourceFetcher;

/// Default in-flight fetch window.
pub const DEFAULT_CONCURRENCY: usize = 5;
/// Default delay between fetch windows.
pub const DEFAULT_BATCH_DELAY_MS: u64 = 1_000;

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct VerifyConfig {
    /// Concurrent fetches per window.
    pub concurrency: usize,
    /// Pause between windows.
    pub batch_delay_ms: u64,
    /// Directory archives are written into; None disables archive output.
    pub archive_dir: Option<PathBuf>,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            batch_delay_ms: DEFAULT_BATCH_DELAY_MS,
            archive_dir: None,
        }
    }
}

impl VerifyConfig {
    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.concurrency = n.max(1);
        self
    }

    pub fn with_batch_delay_ms(mut self, ms: u64) -> Self {
        self.batch_delay_ms = ms;
        self
    }

    pub fn with_archive_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.archive_dir = Some(dir.into());
        self
    }
}

/// Resolves every citation on a page to a verification status.
pub struct VerificationPipeline {
    fetcher: Arc<SourceFetcher>,
    store: StoreHandle,
    config: VerifyConfig,
}

impl VerificationPipeline {
    pub fn new(fetcher: SourceFetcher, store: StoreHandle, config: VerifyConfig) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            store,
            config,
        }
    }

    /// Verify every cited URL in a page and assemble its archive.
    ///
    /// Fetched content is written through to the URL-keyed cache when a store
    /// is connected. The archive file (when configured) is written atomically
    /// after all citations complete, never incrementally.
    pub async fn verify_page(&self, page_id: &str, text: &str) -> Result<CitationArchive> {
        let citations = extract_citations(text);
        info!(page_id, citations = citations.len(), "verifying page sources");

        let mut records = Vec::with_capacity(citations.len());
        let semaphore = Arc::new(Semaphore::new(self.config.concurrency));

        for (window_idx, window) in citations.chunks(self.config.concurrency).enumerate() {
            if window_idx > 0 && self.config.batch_delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.config.batch_delay_ms)).await;
            }

            let tasks: Vec<_> = window
                .iter()
                .filter_map(|citation| {
                    let url = citation.url.clone()?;
                    let fetcher = Arc::clone(&self.fetcher);
                    let semaphore = Arc::clone(&semaphore);
                    let footnote = citation.footnote;
                    Some(async move {
                        let _permit = semaphore
                            .acquire()
                            .await
                            .expect("Semaphore closed unexpectedly");
                        fetcher.verify(footnote, &url).await
                    })
                })
                .collect();

            for (record, content) in join_all(tasks).await {
                debug!(
                    footnote = record.footnote,
                    status = %record.status,
                    "citation classified"
                );
                if let Some(content) = content {
                    self.store.upsert_content(&content);
                }
                records.push(record);
            }
        }

        records.sort_by_key(|r| r.footnote);
        let archive = CitationArchive::from_records(page_id, records);

        if let Some(ref dir) = self.config.archive_dir {
            let path = archive.save(dir)?;
            info!(page_id, path = %path.display(), "archive written");
        }

        Ok(archive)
    }
}
