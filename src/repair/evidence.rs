//! Evidence assembly for repair prompts.
//!
//! Best-available source evidence per citation, in priority order:
//! supporting quotes from the accuracy check, then the extracted quote, then
//! truncated cached full text. Escalation gathers evidence for every
//! footnote in a section, not only the flagged ones.

use std::collections::BTreeSet;

use crate::footnote::reference_pattern;
use crate::judgment::FlaggedCitation;
use crate::store::StoreHandle;

/// Cap on cached full text used as fallback evidence.
const FALLBACK_CHARS: usize = 1_500;

/// Best-available evidence string for one flagged citation.
pub fn evidence_for(flagged: &FlaggedCitation, store: &StoreHandle) -> String {
    if !flagged.supporting_quotes.is_empty() {
        return flagged.supporting_quotes.join("\n");
    }
    if let Some(quote) = flagged.quote.as_deref().filter(|q| !q.is_empty()) {
        return quote.to_string();
    }
    cached_text_fallback(flagged.source_url.as_deref(), store)
}

/// Fill in missing evidence on flagged citations from the store, so the
/// fix-generation prompt always has something to work from.
pub fn enrich_flagged(flagged: &[FlaggedCitation], store: &StoreHandle) -> Vec<FlaggedCitation> {
    flagged
        .iter()
        .map(|f| {
            let mut enriched = f.clone();
            if enriched.supporting_quotes.is_empty()
                && enriched.quote.as_deref().unwrap_or("").is_empty()
            {
                let fallback = cached_text_fallback(enriched.source_url.as_deref(), store);
                if !fallback.is_empty() {
                    enriched.quote = Some(fallback);
                }
            }
            enriched
        })
        .collect()
}

/// Footnote numbers referenced anywhere in a section's text.
pub fn section_footnotes(section_text: &str) -> BTreeSet<u32> {
    crate::footnote::referenced_numbers(section_text)
}

/// Evidence for every footnote in a section, keyed by footnote number.
pub fn section_evidence(
    page_id: &str,
    section_text: &str,
    store: &StoreHandle,
) -> Vec<(u32, String)> {
    section_footnotes(section_text)
        .into_iter()
        .map(|n| {
            let evidence = store
                .get_quote(page_id, n)
                .map(|row| {
                    if !row.supporting_quotes.is_empty() {
                        row.supporting_quotes.join("\n")
                    } else if let Some(quote) = row.quote.filter(|q| !q.is_empty()) {
                        quote
                    } else {
                        cached_text_fallback(row.source_url.as_deref(), store)
                    }
                })
                .unwrap_or_default();
            (n, evidence)
        })
        .collect()
}

/// Footnotes in a section that may be removed by a rewrite: flagged verdicts
/// only. Everything else must be preserved.
pub fn removable_footnotes(
    section_text: &str,
    flagged: &[FlaggedCitation],
) -> (BTreeSet<u32>, BTreeSet<u32>) {
    let present = section_footnotes(section_text);
    let flagged_numbers: BTreeSet<u32> = flagged
        .iter()
        .filter(|f| f.verdict.is_flagged())
        .map(|f| f.footnote)
        .collect();

    let removable: BTreeSet<u32> = present.intersection(&flagged_numbers).copied().collect();
    let preserved: BTreeSet<u32> = present.difference(&removable).copied().collect();
    (removable, preserved)
}

/// True when the section references any flagged footnote.
pub fn section_is_flagged(section_text: &str, flagged: &[FlaggedCitation]) -> bool {
    flagged
        .iter()
        .any(|f| reference_pattern(f.footnote).is_match(section_text))
}

fn cached_text_fallback(source_url: Option<&str>, store: &StoreHandle) -> String {
    source_url
        .and_then(|url| store.get_content(url))
        .and_then(|c| c.text)
        .map(|t| t.chars().take(FALLBACK_CHARS).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::judgment::Verdict;
    use crate::store::{CitationContentRecord, CitationStore};
    use chrono::Utc;

    fn flagged(footnote: u32, verdict: Verdict) -> FlaggedCitation {
        FlaggedCitation {
            page_id: "page".to_string(),
            footnote,
            claim: "claim".to_string(),
            verdict,
            score: 0.1,
            issues: vec![],
            quote: None,
            supporting_quotes: vec![],
            source_url: Some("https://a.example/x".to_string()),
        }
    }

    #[test]
    fn test_evidence_priority() {
        let store = StoreHandle::Absent;

        let mut f = flagged(1, Verdict::Inaccurate);
        f.supporting_quotes = vec!["best".to_string()];
        f.quote = Some("second".to_string());
        assert_eq!(evidence_for(&f, &store), "best");

        f.supporting_quotes.clear();
        assert_eq!(evidence_for(&f, &store), "second");

        f.quote = None;
        assert_eq!(evidence_for(&f, &store), "");
    }

    #[test]
    fn test_cached_fallback() {
        let store = CitationStore::in_memory().unwrap();
        store
            .upsert_content(&CitationContentRecord {
                url: "https://a.example/x".to_string(),
                html: None,
                text: Some("cached source body".to_string()),
                title: None,
                status: Some(200),
                content_hash: None,
                fetched_at: Utc::now(),
            })
            .unwrap();
        let handle = StoreHandle::connected(store);

        let f = flagged(1, Verdict::Unsupported);
        assert_eq!(evidence_for(&f, &handle), "cached source body");

        let enriched = enrich_flagged(&[f], &handle);
        assert_eq!(enriched[0].quote.as_deref(), Some("cached source body"));
    }

    #[test]
    fn test_removable_versus_preserved() {
        let section = "## S\n\nA[^1] B[^2] C[^3].";
        let flagged = vec![flagged(2, Verdict::Unsupported)];
        let (removable, preserved) = removable_footnotes(section, &flagged);
        assert_eq!(removable.into_iter().collect::<Vec<_>>(), vec![2]);
        assert_eq!(preserved.into_iter().collect::<Vec<_>>(), vec![1, 3]);
    }

    #[test]
    fn test_section_is_flagged_respects_boundaries() {
        let section = "## S\n\nOnly [^12] here.";
        assert!(!section_is_flagged(section, &[flagged(1, Verdict::Inaccurate)]));
        assert!(section_is_flagged(section, &[flagged(12, Verdict::Inaccurate)]));
    }
}
