//! Persistent citation store and the degradable handle around it.
//!
//! Repair is expected to run in environments where no store is provisioned,
//! so consumers never hold a raw [`CitationStore`]: they receive a
//! [`StoreHandle`] with an explicit absent variant. Every read on an absent
//! (or failing) store degrades to empty/None and every write becomes a no-op
//! with a warning, never an error.

pub mod schema;
pub mod sqlite;

use tracing::warn;

pub use sqlite::{
    CitationContentRecord, CitationQuoteRecord, CitationStore, EditLogEntry, ExtractionUpdate,
};

use crate::judgment::{AccuracyCheck, FlaggedCitation};

/// Explicit two-state store handle injected into every component that
/// persists anything.
#[derive(Clone)]
pub enum StoreHandle {
    Connected(CitationStore),
    Absent,
}

impl StoreHandle {
    /// Wrap a connected store.
    pub fn connected(store: CitationStore) -> Self {
        Self::Connected(store)
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected(_))
    }

    fn degrade<T: Default>(result: crate::error::Result<T>, op: &str) -> T {
        match result {
            Ok(value) => value,
            Err(e) => {
                warn!(op, error = %e, "store operation failed; degrading to empty");
                T::default()
            }
        }
    }

    /// Get one quote row; None when absent or on failure.
    pub fn get_quote(&self, page_id: &str, footnote: u32) -> Option<CitationQuoteRecord> {
        match self {
            Self::Connected(store) => Self::degrade(store.get_quote(page_id, footnote), "get_quote"),
            Self::Absent => None,
        }
    }

    /// All quote rows for a page; empty when absent.
    pub fn page_quotes(&self, page_id: &str) -> Vec<CitationQuoteRecord> {
        match self {
            Self::Connected(store) => Self::degrade(store.page_quotes(page_id), "page_quotes"),
            Self::Absent => Vec::new(),
        }
    }

    /// Flagged citations for a page; empty when absent.
    pub fn flagged_citations(&self, page_id: &str) -> Vec<FlaggedCitation> {
        match self {
            Self::Connected(store) => {
                Self::degrade(store.flagged_citations(page_id), "flagged_citations")
            }
            Self::Absent => Vec::new(),
        }
    }

    /// Upsert extraction fields; no-op when absent.
    pub fn upsert_extraction(&self, page_id: &str, footnote: u32, update: &ExtractionUpdate) {
        if let Self::Connected(store) = self {
            Self::degrade(
                store.upsert_extraction(page_id, footnote, update),
                "upsert_extraction",
            );
        }
    }

    /// Record an accuracy check; no-op when absent.
    pub fn record_accuracy(&self, page_id: &str, footnote: u32, check: &AccuracyCheck) {
        if let Self::Connected(store) = self {
            Self::degrade(
                store.record_accuracy(page_id, footnote, check),
                "record_accuracy",
            );
        }
    }

    /// Get a cached fetched page; None when absent.
    pub fn get_content(&self, url: &str) -> Option<CitationContentRecord> {
        match self {
            Self::Connected(store) => Self::degrade(store.get_content(url), "get_content"),
            Self::Absent => None,
        }
    }

    /// Upsert a cached fetched page; no-op when absent.
    pub fn upsert_content(&self, record: &CitationContentRecord) {
        if let Self::Connected(store) = self {
            Self::degrade(store.upsert_content(record), "upsert_content");
        }
    }

    /// Append an audit-trail entry; no-op when absent.
    pub fn log_edit(&self, page_id: &str, tool: &str, agency: &str, note: &str) {
        if let Self::Connected(store) = self {
            Self::degrade(store.log_edit(page_id, tool, agency, note), "log_edit");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_store_degrades_everywhere() {
        let handle = StoreHandle::Absent;
        assert!(handle.get_quote("page", 1).is_none());
        assert!(handle.page_quotes("page").is_empty());
        assert!(handle.flagged_citations("page").is_empty());
        assert!(handle.get_content("https://a.example").is_none());
        // Writes are silent no-ops.
        handle.upsert_extraction("page", 1, &ExtractionUpdate::default());
        handle.log_edit("page", "tool", "automated", "note");
    }

    #[test]
    fn test_connected_round_trip() {
        let handle = StoreHandle::connected(CitationStore::in_memory().unwrap());
        handle.upsert_extraction(
            "page",
            1,
            &ExtractionUpdate {
                claim: "claim".to_string(),
                ..ExtractionUpdate::default()
            },
        );
        assert!(handle.get_quote("page", 1).is_some());
        assert!(handle.is_connected());
    }
}
