//! Content-integrity checks over document body text.
//!
//! Four independent, pure checks run against body text with frontmatter
//! already stripped: orphaned inline references, duplicate definitions,
//! sequential fabricated arXiv-style identifiers, and unsourced definitions.
//! Each check reports raw counts and ratios; point scoring lives in
//! [`super::risk`].

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::footnote::{parse_definitions, referenced_numbers, CitationFormat};

/// Tunable thresholds for the integrity checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegrityConfig {
    /// Minimum length of a consecutive-serial run flagged as suspicious.
    /// Real arXiv ids are sparse; a fabricating model emits consecutive
    /// serials. Genuinely sequential citation ranges exist, so this is a
    /// heuristic knob, not a hard rule.
    pub min_sequential_run: usize,
    /// Ratio above which orphaned/unsourced severity escalates.
    pub severe_ratio: f64,
}

impl Default for IntegrityConfig {
    fn default() -> Self {
        Self {
            min_sequential_run: 3,
            severe_ratio: 0.5,
        }
    }
}

impl IntegrityConfig {
    /// Set the suspicious-run threshold.
    pub fn with_min_sequential_run(mut self, run: usize) -> Self {
        self.min_sequential_run = run.max(2);
        self
    }
}

/// Result of the sequential-identifier scan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SequentialIdScan {
    /// Distinct plausible arXiv-style ids found, sorted.
    pub ids: Vec<String>,
    /// Longest run of consecutive serials sharing a YYMM prefix.
    pub longest_run: usize,
    /// True when the longest run meets the configured threshold.
    pub suspicious: bool,
}

/// Aggregate result of all integrity checks on one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntegrityReport {
    /// Distinct footnote numbers referenced inline.
    pub total_references: usize,
    /// Distinct footnote numbers with a definition.
    pub total_definitions: usize,
    /// Inline-referenced numbers with no definition.
    pub orphaned_footnotes: Vec<u32>,
    /// orphaned / total distinct references.
    pub orphaned_ratio: f64,
    /// Numbers defined more than once.
    pub duplicate_definitions: Vec<u32>,
    /// Sequential fabricated-identifier scan.
    pub sequential_arxiv: SequentialIdScan,
    /// Defined numbers whose definition carries no URL at all.
    pub unsourced_footnotes: Vec<u32>,
    /// unsourced / total definitions.
    pub unsourced_ratio: f64,
}

impl IntegrityReport {
    /// True when any check found something.
    pub fn has_issues(&self) -> bool {
        !self.orphaned_footnotes.is_empty()
            || !self.duplicate_definitions.is_empty()
            || self.sequential_arxiv.suspicious
            || !self.unsourced_footnotes.is_empty()
    }
}

/// Run all integrity checks against body text.
pub fn analyze(text: &str, config: &IntegrityConfig) -> IntegrityReport {
    let referenced = referenced_numbers(text);
    let defs = parse_definitions(text);

    let defined: BTreeSet<u32> = defs.iter().map(|d| d.number).collect();

    let orphaned_footnotes: Vec<u32> = referenced.difference(&defined).copied().collect();
    let orphaned_ratio = if referenced.is_empty() {
        0.0
    } else {
        orphaned_footnotes.len() as f64 / referenced.len() as f64
    };

    let mut def_counts: BTreeMap<u32, usize> = BTreeMap::new();
    for def in &defs {
        *def_counts.entry(def.number).or_default() += 1;
    }
    let duplicate_definitions: Vec<u32> = def_counts
        .iter()
        .filter(|(_, &count)| count > 1)
        .map(|(&n, _)| n)
        .collect();

    let unsourced_footnotes: Vec<u32> = {
        let mut unsourced: BTreeSet<u32> = defs
            .iter()
            .filter(|d| d.format == CitationFormat::NoUrl)
            .map(|d| d.number)
            .collect();
        // A number is unsourced only if none of its definitions has a URL.
        for def in &defs {
            if def.format.url().is_some() {
                unsourced.remove(&def.number);
            }
        }
        unsourced.into_iter().collect()
    };
    let unsourced_ratio = if defined.is_empty() {
        0.0
    } else {
        unsourced_footnotes.len() as f64 / defined.len() as f64
    };

    IntegrityReport {
        total_references: referenced.len(),
        total_definitions: defined.len(),
        orphaned_footnotes,
        orphaned_ratio,
        duplicate_definitions,
        sequential_arxiv: scan_sequential_ids(text, config.min_sequential_run),
        unsourced_footnotes,
        unsourced_ratio,
    }
}

/// Scan for arXiv-style `YYMM.NNNNN` tokens and measure the longest run of
/// consecutive serials sharing a YYMM prefix.
///
/// Tokens are filtered to plausible prefixes (arXiv switched to this scheme
/// in 2007; months 01-12) so version strings like `10.13039` don't count, and
/// deduplicated so repeated mentions of one id never inflate the run.
pub fn scan_sequential_ids(text: &str, min_run: usize) -> SequentialIdScan {
    let id_re = Regex::new(r"\b(\d{2})(\d{2})\.(\d{4,5})\b").unwrap();
    let max_year = (Utc::now().year() % 100 + 1) as u32;

    let mut seen: BTreeSet<(u32, u32, String)> = BTreeSet::new();
    for cap in id_re.captures_iter(text) {
        let year: u32 = cap[1].parse().unwrap_or(0);
        let month: u32 = cap[2].parse().unwrap_or(0);
        if !(7..=max_year).contains(&year) || !(1..=12).contains(&month) {
            continue;
        }
        let yymm = year * 100 + month;
        let serial: u32 = cap[3].parse().unwrap_or(0);
        seen.insert((yymm, serial, cap[0].to_string()));
    }

    let mut longest_run = 0usize;
    let mut current_run = 0usize;
    let mut prev: Option<(u32, u32)> = None;
    for &(yymm, serial, _) in &seen {
        current_run = match prev {
            Some((py, ps)) if py == yymm && serial == ps + 1 => current_run + 1,
            _ => 1,
        };
        longest_run = longest_run.max(current_run);
        prev = Some((yymm, serial));
    }

    SequentialIdScan {
        ids: seen.into_iter().map(|(_, _, raw)| raw).collect(),
        longest_run,
        suspicious: longest_run >= min_run,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_fully_orphaned_document() {
        let report = analyze("Claim[^1] and[^2] and[^3].\n", &IntegrityConfig::default());
        assert_eq!(report.orphaned_footnotes, vec![1, 2, 3]);
        assert_eq!(report.orphaned_ratio, 1.0);
        assert_eq!(report.total_definitions, 0);
    }

    #[test]
    fn test_partial_orphans() {
        let doc = "One[^1] two[^2] three[^3] four[^4].\n\n[^1]: https://a.example\n[^2]: https://b.example\n[^3]: https://c.example\n";
        let report = analyze(doc, &IntegrityConfig::default());
        assert_eq!(report.orphaned_footnotes, vec![4]);
        assert_eq!(report.orphaned_ratio, 0.25);
    }

    #[test]
    fn test_duplicate_definitions() {
        let doc = "A claim.[^1]\n\n[^1]: https://a.example\n[^1]: https://b.example\n";
        let report = analyze(doc, &IntegrityConfig::default());
        assert_eq!(report.duplicate_definitions, vec![1]);
    }

    #[test]
    fn test_unsourced_definitions() {
        let doc = "A[^1] B[^2].\n\n[^1]: Interview notes, unpublished.\n[^2]: https://b.example\n";
        let report = analyze(doc, &IntegrityConfig::default());
        assert_eq!(report.unsourced_footnotes, vec![1]);
        assert_eq!(report.unsourced_ratio, 0.5);
    }

    #[test]
    fn test_sequential_arxiv_run() {
        let doc = "See 2506.00001, 2506.00002, 2506.00003 for details.";
        let scan = scan_sequential_ids(doc, 3);
        assert_eq!(scan.longest_run, 3);
        assert!(scan.suspicious);
    }

    #[test]
    fn test_duplicate_ids_do_not_inflate_run() {
        let doc = "2506.00001 2506.00002 2506.00003 2506.00001 2506.00002 2506.00003";
        let scan = scan_sequential_ids(doc, 4);
        assert_eq!(scan.longest_run, 3);
        assert!(!scan.suspicious);
    }

    #[test]
    fn test_run_does_not_cross_yymm_prefixes() {
        // Consecutive serials but different months: two runs of one.
        let doc = "2505.00001 and 2506.00002";
        let scan = scan_sequential_ids(doc, 2);
        assert_eq!(scan.longest_run, 1);
    }

    #[test]
    fn test_implausible_prefixes_filtered() {
        // Year 99 and month 13 are not plausible arXiv prefixes.
        let doc = "version 9913.00001 and doi 0613.12345 but real 2401.10001 2401.10002";
        let scan = scan_sequential_ids(doc, 2);
        assert_eq!(scan.ids.len(), 2);
        assert_eq!(scan.longest_run, 2);
        assert!(scan.suspicious);
    }

    #[test]
    fn test_sparse_ids_not_suspicious() {
        let doc = "Cites 2301.00234 and 2410.07123.";
        let scan = scan_sequential_ids(doc, 3);
        assert_eq!(scan.longest_run, 1);
        assert!(!scan.suspicious);
    }

    #[test]
    fn test_clean_document() {
        let doc = "A claim.[^1]\n\n[^1]: https://a.example\n";
        let report = analyze(doc, &IntegrityConfig::default());
        assert!(!report.has_issues());
    }
}
