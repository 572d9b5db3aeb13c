//! Repair run summaries.

use serde::{Deserialize, Serialize};

/// Before/after flagged-count comparison from re-verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReverifyDelta {
    Improved,
    Unchanged,
    /// More citations flagged after "fixing": the repair made things worse.
    Regressed,
}

impl ReverifyDelta {
    pub fn classify(before: usize, after: usize) -> Self {
        use std::cmp::Ordering;
        match after.cmp(&before) {
            Ordering::Less => Self::Improved,
            Ordering::Equal => Self::Unchanged,
            Ordering::Greater => Self::Regressed,
        }
    }
}

/// Proposed/applied/skipped counts for one targeted-fix stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageCounts {
    pub proposed: usize,
    pub applied: usize,
    pub skipped: usize,
}

/// Full summary of one page's repair run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepairReport {
    pub page_id: String,
    /// Final page text after all stages.
    pub text: String,
    /// True when any stage changed the page.
    pub changed: bool,
    /// Targeted-fix counts, summed across passes.
    pub targeted: StageCounts,
    pub escalations_attempted: usize,
    pub escalations_applied: usize,
    pub escalations_rejected: usize,
    pub orphans_removed: usize,
    pub sources_replaced: usize,
    /// Flagged citations going in.
    pub flagged_before: usize,
    /// Flagged citations after re-verification; None when nothing changed
    /// and re-verification was skipped.
    pub flagged_after: Option<usize>,
    pub delta: Option<ReverifyDelta>,
    /// Fix passes executed (1 or 2).
    pub passes: usize,
}

impl RepairReport {
    pub fn new(page_id: impl Into<String>, text: impl Into<String>, flagged_before: usize) -> Self {
        Self {
            page_id: page_id.into(),
            text: text.into(),
            changed: false,
            targeted: StageCounts::default(),
            escalations_attempted: 0,
            escalations_applied: 0,
            escalations_rejected: 0,
            orphans_removed: 0,
            sources_replaced: 0,
            flagged_before,
            flagged_after: None,
            delta: None,
            passes: 0,
        }
    }
}

/// Aggregate result of a multi-page repair batch.
///
/// Per-page failures are contained inside each page's stages and show up as
/// skip counts in its report; the batch itself never aborts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchRepairReport {
    /// Per-page reports, in request order.
    pub pages: Vec<RepairReport>,
}

impl BatchRepairReport {
    pub fn changed_pages(&self) -> usize {
        self.pages.iter().filter(|p| p.changed).count()
    }

    pub fn total_applied(&self) -> usize {
        self.pages.iter().map(|p| p.targeted.applied).sum()
    }

    /// Pages whose re-verification regressed; surfaced loudly by callers.
    pub fn regressed_pages(&self) -> Vec<&str> {
        self.pages
            .iter()
            .filter(|p| p.delta == Some(ReverifyDelta::Regressed))
            .map(|p| p.page_id.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delta_classification() {
        assert_eq!(ReverifyDelta::classify(3, 1), ReverifyDelta::Improved);
        assert_eq!(ReverifyDelta::classify(2, 2), ReverifyDelta::Unchanged);
        assert_eq!(ReverifyDelta::classify(1, 4), ReverifyDelta::Regressed);
    }

    #[test]
    fn test_regressed_pages_surfaced() {
        let mut batch = BatchRepairReport::default();
        let mut ok = RepairReport::new("good", "", 2);
        ok.delta = Some(ReverifyDelta::Improved);
        let mut bad = RepairReport::new("worse", "", 1);
        bad.delta = Some(ReverifyDelta::Regressed);
        batch.pages.push(ok);
        batch.pages.push(bad);

        assert_eq!(batch.regressed_pages(), vec!["worse"]);
    }
}
