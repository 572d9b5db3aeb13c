//! Hallucination risk scoring.
//!
//! Composes entity-type, citation-density, editorial-quality, human-review,
//! integrity, and externally-supplied accuracy signals into one bounded score.
//! Scoring is additive and bidirectional rather than multiplicative or
//! learned: every point is traceable to a named factor, so a human editor can
//! contest any verdict factor by factor.

use serde::{Deserialize, Serialize};

use super::checks::{analyze, IntegrityConfig, IntegrityReport};

/// All content is machine-generated, so baseline risk is non-zero.
const BASELINE: f64 = 25.0;

/// Level thresholds on the clamped 0-100 score.
const HIGH_THRESHOLD: f64 = 65.0;
const MEDIUM_THRESHOLD: f64 = 35.0;

/// Citation-density tiers, citations per 1000 words.
const LOW_DENSITY: f64 = 2.0;
const GOOD_DENSITY: f64 = 5.0;
const HIGH_DENSITY: f64 = 10.0;

/// Pages shorter than this are stubs with little room to fabricate.
const STUB_WORDS: usize = 150;
/// Pages longer than this with zero citations are the worst signal.
const UNCITED_LONG_WORDS: usize = 300;

/// A single named contribution to the risk score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFactor {
    /// Stable factor name surfaced to editors.
    pub name: String,
    /// Signed point delta.
    pub points: f64,
}

impl RiskFactor {
    pub fn new(name: impl Into<String>, points: f64) -> Self {
        Self {
            name: name.into(),
            points,
        }
    }
}

/// Risk level bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

/// Externally-supplied accuracy counts for a page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccuracySummary {
    /// Citations that went through an accuracy check.
    pub checked: usize,
    /// Citations whose verdict was inaccurate or unsupported.
    pub inaccurate: usize,
}

impl AccuracySummary {
    pub fn failure_rate(&self) -> f64 {
        if self.checked == 0 {
            0.0
        } else {
            self.inaccurate as f64 / self.checked as f64
        }
    }
}

/// Snapshot of everything the scorer looks at for one page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RiskInput {
    /// Entity type before alias resolution (e.g. "researcher").
    pub entity_type: String,
    pub word_count: usize,
    pub footnote_count: usize,
    /// Citations outside the footnote system (reference lists etc.).
    pub aux_citation_count: usize,
    pub external_link_count: usize,
    /// Editorial rigor rating, 0-10.
    pub rigor: u8,
    /// Editorial quality rating, 0-100.
    pub quality: u8,
    pub has_human_review: bool,
    /// Accuracy-check counts when an external check has run.
    pub accuracy: Option<AccuracySummary>,
    /// Raw body text; integrity checks run only when supplied.
    pub body: Option<String>,
}

impl RiskInput {
    pub fn new(entity_type: impl Into<String>, word_count: usize) -> Self {
        Self {
            entity_type: entity_type.into(),
            word_count,
            ..Self::default()
        }
    }

    pub fn with_citations(mut self, footnotes: usize, aux: usize) -> Self {
        self.footnote_count = footnotes;
        self.aux_citation_count = aux;
        self
    }

    pub fn with_external_links(mut self, count: usize) -> Self {
        self.external_link_count = count;
        self
    }

    pub fn with_ratings(mut self, rigor: u8, quality: u8) -> Self {
        self.rigor = rigor.min(10);
        self.quality = quality.min(100);
        self
    }

    pub fn with_human_review(mut self, reviewed: bool) -> Self {
        self.has_human_review = reviewed;
        self
    }

    pub fn with_accuracy(mut self, checked: usize, inaccurate: usize) -> Self {
        self.accuracy = Some(AccuracySummary {
            checked,
            inaccurate,
        });
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    fn citation_count(&self) -> usize {
        self.footnote_count + self.aux_citation_count
    }

    /// Citations per 1000 words.
    fn citation_density(&self) -> f64 {
        if self.word_count == 0 {
            0.0
        } else {
            self.citation_count() as f64 * 1000.0 / self.word_count as f64
        }
    }
}

/// Scored risk for one page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub level: RiskLevel,
    /// Clamped to [0, 100].
    pub score: f64,
    /// Every applied delta, in application order.
    pub factors: Vec<RiskFactor>,
    /// Present when body text was supplied.
    pub integrity: Option<IntegrityReport>,
}

/// Resolve an entity-type alias to its canonical form.
pub fn canonical_entity_type(entity_type: &str) -> &'static str {
    match entity_type.trim().to_lowercase().as_str() {
        "person" | "researcher" | "scientist" | "engineer" | "author" | "founder" => "person",
        "organization" | "company" | "lab" | "university" | "institute" | "agency" => {
            "organization"
        }
        "publication" | "paper" | "book" | "article" | "journal" => "publication",
        "event" | "conference" | "workshop" => "event",
        "concept" | "method" | "algorithm" | "field" | "theory" => "concept",
        "table" | "diagram" | "index" | "glossary" | "timeline" | "list" => "structured",
        _ => "other",
    }
}

/// Map an integrity report to its named point deltas.
///
/// Deltas are summed, never individually capped; only the aggregate score is
/// clamped by the caller. The mapping is order-independent.
pub fn integrity_factors(report: &IntegrityReport, config: &IntegrityConfig) -> Vec<RiskFactor> {
    let mut factors = Vec::new();

    if !report.orphaned_footnotes.is_empty() {
        if report.orphaned_ratio > config.severe_ratio {
            // The main signal of a document truncated mid-generation.
            factors.push(RiskFactor::new("severe-truncation", 25.0));
        } else {
            factors.push(RiskFactor::new("orphaned-footnotes", 10.0));
        }
    }

    if !report.duplicate_definitions.is_empty() {
        factors.push(RiskFactor::new("duplicate-definitions", 8.0));
    }

    if report.sequential_arxiv.suspicious {
        factors.push(RiskFactor::new("sequential-arxiv-ids", 20.0));
    }

    if !report.unsourced_footnotes.is_empty() {
        if report.unsourced_ratio > config.severe_ratio {
            factors.push(RiskFactor::new("mostly-unsourced", 15.0));
        } else {
            factors.push(RiskFactor::new("unsourced-footnotes", 8.0));
        }
    }

    factors
}

/// Score one page's hallucination risk.
pub fn score_risk(input: &RiskInput, config: &IntegrityConfig) -> RiskAssessment {
    let mut factors = vec![RiskFactor::new("machine-generated-baseline", BASELINE)];

    match canonical_entity_type(&input.entity_type) {
        // Biographical pages invite fabricated specifics.
        "person" => factors.push(RiskFactor::new("biographical-entity", 12.0)),
        "organization" | "publication" | "event" => {
            factors.push(RiskFactor::new("factual-entity", 8.0))
        }
        "concept" => factors.push(RiskFactor::new("conceptual-entity", -6.0)),
        "structured" => factors.push(RiskFactor::new("structured-format", -8.0)),
        _ => {}
    }

    if input.word_count < STUB_WORDS {
        factors.push(RiskFactor::new("stub-page", -5.0));
    }

    let density = input.citation_density();
    if input.citation_count() == 0 {
        if input.word_count > UNCITED_LONG_WORDS {
            factors.push(RiskFactor::new("no-citations", 15.0));
        }
    } else if density < LOW_DENSITY {
        factors.push(RiskFactor::new("low-citation-density", 8.0));
    } else if density >= HIGH_DENSITY {
        factors.push(RiskFactor::new("high-citation-density", -12.0));
    } else if density >= GOOD_DENSITY {
        factors.push(RiskFactor::new("good-citation-density", -8.0));
    }

    if input.rigor <= 3 {
        factors.push(RiskFactor::new("low-rigor", 10.0));
    } else if input.rigor >= 8 {
        factors.push(RiskFactor::new("high-rigor", -8.0));
    }

    if input.quality < 50 {
        factors.push(RiskFactor::new("low-quality", 8.0));
    } else if input.quality >= 85 {
        factors.push(RiskFactor::new("high-quality", -6.0));
    }

    if input.external_link_count < 2 {
        factors.push(RiskFactor::new("few-external-sources", 6.0));
    }

    if input.has_human_review {
        factors.push(RiskFactor::new("human-reviewed", -10.0));
    } else {
        factors.push(RiskFactor::new("no-human-review", 7.0));
    }

    // Only the single highest applicable accuracy tier applies.
    if let Some(accuracy) = input.accuracy {
        if accuracy.inaccurate > 0 {
            let rate = accuracy.failure_rate();
            if rate > 0.5 {
                factors.push(RiskFactor::new("accuracy-failures-critical", 30.0));
            } else if rate > 0.3 {
                factors.push(RiskFactor::new("accuracy-failures-high", 22.0));
            } else {
                factors.push(RiskFactor::new("accuracy-failures", 12.0));
            }
        }
    }

    // Integrity deltas are added last, when body text was supplied.
    let integrity = input.body.as_deref().map(|body| analyze(body, config));
    if let Some(ref report) = integrity {
        factors.extend(integrity_factors(report, config));
    }

    let score = factors
        .iter()
        .map(|f| f.points)
        .sum::<f64>()
        .clamp(0.0, 100.0);

    let level = if score >= HIGH_THRESHOLD {
        RiskLevel::High
    } else if score >= MEDIUM_THRESHOLD {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    };

    RiskAssessment {
        level,
        score,
        factors,
        integrity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_input() -> RiskInput {
        RiskInput::new("concept", 1000)
            .with_citations(5, 0)
            .with_external_links(3)
            .with_ratings(6, 70)
    }

    #[test]
    fn test_alias_resolution() {
        assert_eq!(canonical_entity_type("Researcher"), "person");
        assert_eq!(canonical_entity_type("university"), "organization");
        assert_eq!(canonical_entity_type("timeline"), "structured");
        assert_eq!(canonical_entity_type("widget"), "other");
    }

    #[test]
    fn test_score_bounded() {
        let worst = RiskInput::new("person", 5000)
            .with_ratings(0, 10)
            .with_accuracy(10, 8)
            .with_body("Claim[^1] and[^2] and[^3]. 2506.00001 2506.00002 2506.00003");
        let assessment = score_risk(&worst, &IntegrityConfig::default());
        assert!(assessment.score <= 100.0);
        assert_eq!(assessment.level, RiskLevel::High);

        let best = RiskInput::new("table", 100)
            .with_citations(10, 0)
            .with_external_links(8)
            .with_ratings(10, 95)
            .with_human_review(true);
        let assessment = score_risk(&best, &IntegrityConfig::default());
        assert!(assessment.score >= 0.0);
        assert_eq!(assessment.level, RiskLevel::Low);
    }

    #[test]
    fn test_density_monotonicity() {
        // Holding everything else fixed, more citations never raises the score.
        let config = IntegrityConfig::default();
        let mut prev = f64::INFINITY;
        for citations in [0usize, 1, 3, 6, 12, 20] {
            let input = base_input().with_citations(citations, 0);
            let score = score_risk(&input, &config).score;
            assert!(
                score <= prev,
                "score rose from {} to {} at {} citations",
                prev,
                score,
                citations
            );
            prev = score;
        }
    }

    #[test]
    fn test_human_review_monotonicity() {
        let config = IntegrityConfig::default();
        let without = score_risk(&base_input(), &config).score;
        let with = score_risk(&base_input().with_human_review(true), &config).score;
        assert!(with <= without);
    }

    #[test]
    fn test_accuracy_tiers_pick_highest_only() {
        let config = IntegrityConfig::default();

        let any = score_risk(&base_input().with_accuracy(10, 1), &config);
        assert!(any.factors.iter().any(|f| f.name == "accuracy-failures"));

        let high = score_risk(&base_input().with_accuracy(10, 4), &config);
        assert!(high
            .factors
            .iter()
            .any(|f| f.name == "accuracy-failures-high"));
        assert!(!high.factors.iter().any(|f| f.name == "accuracy-failures"));

        let critical = score_risk(&base_input().with_accuracy(10, 6), &config);
        assert!(critical
            .factors
            .iter()
            .any(|f| f.name == "accuracy-failures-critical"));
        assert_eq!(
            critical
                .factors
                .iter()
                .filter(|f| f.name.starts_with("accuracy-failures"))
                .count(),
            1
        );
    }

    #[test]
    fn test_severe_truncation_contribution() {
        let config = IntegrityConfig::default();
        let report = analyze("Claim[^1] and[^2] and[^3].\n", &config);
        assert_eq!(report.orphaned_ratio, 1.0);

        let factors = integrity_factors(&report, &config);
        assert_eq!(factors.len(), 1);
        assert_eq!(factors[0].name, "severe-truncation");
        assert_eq!(factors[0].points, 25.0);
    }

    #[test]
    fn test_integrity_factors_order_independent() {
        let config = IntegrityConfig::default();
        let doc = "One[^1] two[^2] three[^9].\n\n[^1]: no url here\n[^1]: still none\n[^2]: https://b.example\n";
        let report = analyze(doc, &config);

        let factors = integrity_factors(&report, &config);
        let total: f64 = factors.iter().map(|f| f.points).sum();

        let mut reversed = factors.clone();
        reversed.reverse();
        let reversed_total: f64 = reversed.iter().map(|f| f.points).sum();
        assert_eq!(total, reversed_total);
    }

    #[test]
    fn test_every_point_is_named() {
        let config = IntegrityConfig::default();
        let assessment = score_risk(&base_input().with_accuracy(4, 2), &config);
        let sum: f64 = assessment.factors.iter().map(|f| f.points).sum();
        assert_eq!(assessment.score, sum.clamp(0.0, 100.0));
    }
}
