//! Per-page verification archives.
//!
//! One JSON file per page holding the full verification result, overwritten
//! wholesale on each run. Writes go to a temp file and rename into place so a
//! partially-completed run never corrupts a prior full archive.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;

use super::fetcher::{CitationRecord, CitationStatus};

/// Status tallies across one page's citations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveTotals {
    pub verified: usize,
    pub broken: usize,
    pub unverifiable: usize,
    pub pending: usize,
}

/// Full verification result for one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CitationArchive {
    pub page_id: String,
    pub verified_at: DateTime<Utc>,
    pub totals: ArchiveTotals,
    pub citations: Vec<CitationRecord>,
}

impl CitationArchive {
    /// Build an archive from a completed set of records.
    pub fn from_records(page_id: impl Into<String>, citations: Vec<CitationRecord>) -> Self {
        let mut totals = ArchiveTotals::default();
        for record in &citations {
            match record.status {
                CitationStatus::Verified => totals.verified += 1,
                CitationStatus::Broken => totals.broken += 1,
                CitationStatus::Unverifiable => totals.unverifiable += 1,
                CitationStatus::Pending => totals.pending += 1,
            }
        }
        Self {
            page_id: page_id.into(),
            verified_at: Utc::now(),
            totals,
            citations,
        }
    }

    fn file_name(page_id: &str) -> String {
        // Page ids may contain path separators; flatten them.
        format!("{}.json", page_id.replace(['/', '\\'], "_"))
    }

    /// Write the archive atomically: temp file, then whole-file rename.
    pub fn save(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let path = dir.join(Self::file_name(&self.page_id));
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(self)?)?;
        std::fs::rename(&tmp, &path)?;
        Ok(path)
    }

    /// Load a page's archive, if one exists.
    pub fn load(dir: impl AsRef<Path>, page_id: &str) -> Result<Option<Self>> {
        let path = dir.as_ref().join(Self::file_name(page_id));
        if !path.exists() {
            return Ok(None);
        }
        let bytes = std::fs::read(path)?;
        Ok(Some(serde_json::from_slice(&bytes)?))
    }
}
