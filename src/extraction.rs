//! Claim/quote extraction and accuracy checking for a page's citations.
//!
//! Extraction resolves each cited URL to source text through the URL-keyed
//! content cache (fetching on a miss), asks the judgment service for the
//! supporting quote, and upserts the `(page, footnote)` row, overwriting
//! claim/quote fields while preserving any accuracy fields already recorded.
//! Accuracy checking is the independent second pass that fills those fields.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::footnote::{extract_citations, ExtractedCitation};
use crate::judgment::{FlaggedCitation, JudgmentService};
use crate::store::{ExtractionUpdate, StoreHandle};
use crate::verify::SourceFetcher;

/// Cap on cached source text passed as accuracy evidence.
const EVIDENCE_CHARS: usize = 4_000;

/// Counts from one extraction pass over a page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionSummary {
    /// Citations whose quote row was written.
    pub processed: usize,
    /// Citations skipped because a row already existed and `recheck` was off.
    pub skipped: usize,
    /// Citations whose judgment call or source fetch failed.
    pub failed: usize,
}

/// Counts from one accuracy pass over a page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccuracyRunSummary {
    pub checked: usize,
    pub flagged: usize,
    pub failed: usize,
}

/// Quote-extraction and accuracy-check pipeline for one store/judgment pair.
pub struct ExtractionPipeline {
    judgment: Arc<dyn JudgmentService>,
    fetcher: Arc<SourceFetcher>,
    store: StoreHandle,
}

impl ExtractionPipeline {
    pub fn new(
        judgment: Arc<dyn JudgmentService>,
        fetcher: Arc<SourceFetcher>,
        store: StoreHandle,
    ) -> Self {
        Self {
            judgment,
            fetcher,
            store,
        }
    }

    /// Extract supporting quotes for every cited URL on a page.
    ///
    /// With `recheck` off, citations that already have a row are left
    /// untouched, so re-running on an already-processed page changes nothing.
    /// With `recheck` on, every row is recomputed.
    pub async fn extract_page(
        &self,
        page_id: &str,
        text: &str,
        recheck: bool,
    ) -> ExtractionSummary {
        let mut summary = ExtractionSummary::default();

        for citation in extract_citations(text) {
            if !recheck && self.store.get_quote(page_id, citation.footnote).is_some() {
                summary.skipped += 1;
                continue;
            }

            match self.extract_one(page_id, &citation).await {
                Ok(()) => summary.processed += 1,
                Err(e) => {
                    warn!(
                        page_id,
                        footnote = citation.footnote,
                        error = %e,
                        "quote extraction failed; citation skipped"
                    );
                    summary.failed += 1;
                }
            }
        }

        info!(
            page_id,
            processed = summary.processed,
            skipped = summary.skipped,
            failed = summary.failed,
            "extraction pass complete"
        );
        summary
    }

    async fn extract_one(
        &self,
        page_id: &str,
        citation: &ExtractedCitation,
    ) -> crate::error::Result<()> {
        let url = citation.url.as_deref().unwrap_or_default();
        let source_text = self.resolve_source_text(citation.footnote, url).await;

        let extraction = self
            .judgment
            .extract_quote(&citation.claim_context, &source_text)
            .await?;

        let (method, score) = if extraction.quote.is_empty() {
            ("none", 0.0)
        } else if source_text.contains(&extraction.quote) {
            ("exact", 1.0)
        } else {
            ("model", 0.7)
        };

        self.store.upsert_extraction(
            page_id,
            citation.footnote,
            &ExtractionUpdate {
                claim: citation.claim_context.clone(),
                quote: Some(extraction.quote),
                quote_location: extraction.location,
                verification_method: Some(method.to_string()),
                verification_score: Some(score),
                source_url: citation.url.clone(),
                source_title: Some(citation.link_text.clone()),
            },
        );
        Ok(())
    }

    /// Source text for a URL: cache hit, else fetch and write through.
    async fn resolve_source_text(&self, footnote: u32, url: &str) -> String {
        if let Some(cached) = self.store.get_content(url) {
            if let Some(text) = cached.text.filter(|t| !t.is_empty()) {
                debug!(url, "source text served from cache");
                return text;
            }
        }

        let (_, content) = self.fetcher.verify(footnote, url).await;
        match content {
            Some(record) => {
                let text = record.text.clone().unwrap_or_default();
                self.store.upsert_content(&record);
                text
            }
            None => String::new(),
        }
    }

    /// Run the accuracy check over every stored quote row for a page.
    pub async fn check_page_accuracy(&self, page_id: &str) -> AccuracyRunSummary {
        let mut summary = AccuracyRunSummary::default();

        for row in self.store.page_quotes(page_id) {
            let evidence = self.build_evidence(row.quote.as_deref(), row.source_url.as_deref());
            match self.judgment.check_accuracy(&row.claim, &evidence).await {
                Ok(check) => {
                    summary.checked += 1;
                    if check.verdict.is_flagged() {
                        summary.flagged += 1;
                    }
                    self.store.record_accuracy(page_id, row.footnote, &check);
                }
                Err(e) => {
                    warn!(
                        page_id,
                        footnote = row.footnote,
                        error = %e,
                        "accuracy check failed; citation skipped"
                    );
                    summary.failed += 1;
                }
            }
        }

        summary
    }

    /// Re-derive the flagged set directly from the current page text.
    ///
    /// Used by re-verification after repair: citations are re-extracted and
    /// re-checked fresh, independent of any stale stored verdicts. Works with
    /// an absent store (evidence degrades to the extracted quote alone).
    pub async fn flagged_after_check(&self, page_id: &str, text: &str) -> Vec<FlaggedCitation> {
        let mut flagged = Vec::new();

        for citation in extract_citations(text) {
            let url = citation.url.as_deref().unwrap_or_default();
            let source_text = self.resolve_source_text(citation.footnote, url).await;

            let quote = match self
                .judgment
                .extract_quote(&citation.claim_context, &source_text)
                .await
            {
                Ok(q) => q.quote,
                Err(e) => {
                    warn!(footnote = citation.footnote, error = %e, "quote extraction failed during re-check");
                    continue;
                }
            };

            let evidence = join_evidence(Some(&quote), &source_text);
            let check = match self
                .judgment
                .check_accuracy(&citation.claim_context, &evidence)
                .await
            {
                Ok(c) => c,
                Err(e) => {
                    warn!(footnote = citation.footnote, error = %e, "accuracy check failed during re-check");
                    continue;
                }
            };

            self.store
                .record_accuracy(page_id, citation.footnote, &check);

            if check.verdict.is_flagged() {
                flagged.push(FlaggedCitation {
                    page_id: page_id.to_string(),
                    footnote: citation.footnote,
                    claim: citation.claim_context.clone(),
                    verdict: check.verdict,
                    score: check.score,
                    issues: check.issues,
                    quote: Some(quote),
                    supporting_quotes: check.supporting_quotes,
                    source_url: citation.url.clone(),
                });
            }
        }

        flagged
    }

    fn build_evidence(&self, quote: Option<&str>, source_url: Option<&str>) -> String {
        let cached_text = source_url
            .and_then(|url| self.store.get_content(url))
            .and_then(|c| c.text)
            .unwrap_or_default();
        join_evidence(quote, &cached_text)
    }
}

/// Quote first, then truncated source text.
fn join_evidence(quote: Option<&str>, source_text: &str) -> String {
    let truncated: String = source_text.chars().take(EVIDENCE_CHARS).collect();
    match quote {
        Some(q) if !q.is_empty() => {
            if truncated.is_empty() {
                q.to_string()
            } else {
                format!("{}\n\n{}", q, truncated)
            }
        }
        _ => truncated,
    }
}
