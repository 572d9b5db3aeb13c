//! Types exchanged with the external judgment services.

use serde::{Deserialize, Serialize};

/// External classification of a citation's factual support.
///
/// Verdicts are advisory signals, not guarantees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Accurate,
    MinorIssues,
    Inaccurate,
    Unsupported,
    NotVerifiable,
}

impl Verdict {
    /// True for verdicts that flag a citation for repair.
    pub fn is_flagged(&self) -> bool {
        matches!(self, Self::Inaccurate | Self::Unsupported)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accurate => "accurate",
            Self::MinorIssues => "minor_issues",
            Self::Inaccurate => "inaccurate",
            Self::Unsupported => "unsupported",
            Self::NotVerifiable => "not_verifiable",
        }
    }

    /// Parse the wire form; unknown strings map to `NotVerifiable`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "accurate" => Self::Accurate,
            "minor_issues" => Self::MinorIssues,
            "inaccurate" => Self::Inaccurate,
            "unsupported" => Self::Unsupported,
            _ => Self::NotVerifiable,
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of the quote-extraction judgment call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuoteExtraction {
    /// Supporting quote found in the source text, empty when none.
    pub quote: String,
    /// Where in the source the quote was found (free-form locator).
    pub location: Option<String>,
}

/// Result of the accuracy-check judgment call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccuracyCheck {
    pub verdict: Verdict,
    /// Support score in [0, 1].
    pub score: f64,
    /// Issues the checker identified.
    pub issues: Vec<String>,
    /// Quotes from the evidence that support the claim.
    pub supporting_quotes: Vec<String>,
    /// How hard the check was (free-form, e.g. "easy", "ambiguous").
    pub difficulty: Option<String>,
}

impl AccuracyCheck {
    pub fn new(verdict: Verdict, score: f64) -> Self {
        Self {
            verdict,
            score: score.clamp(0.0, 1.0),
            issues: Vec::new(),
            supporting_quotes: Vec::new(),
            difficulty: None,
        }
    }
}

/// One proposed string replacement from the fix-generation judgment call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixProposal {
    /// Footnote the fix targets.
    pub footnote: u32,
    /// Exact text to replace; must exist verbatim in the page.
    pub original: String,
    pub replacement: String,
    pub explanation: String,
    /// Kind of fix, e.g. "correction", "hedge", "removal".
    pub fix_type: String,
}

impl FixProposal {
    /// A proposal is usable only when it would actually change text.
    pub fn is_actionable(&self) -> bool {
        !self.original.is_empty() && self.original != self.replacement
    }
}

/// One result from the source-discovery service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceHit {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// A citation flagged for repair: the stored quote row joined with its
/// accuracy data. Derived on demand, never separately owned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlaggedCitation {
    pub page_id: String,
    pub footnote: u32,
    /// Claim text the citation supports.
    pub claim: String,
    pub verdict: Verdict,
    pub score: f64,
    pub issues: Vec<String>,
    /// Quote previously extracted from the source.
    pub quote: Option<String>,
    /// Supporting quotes from the accuracy check.
    pub supporting_quotes: Vec<String>,
    pub source_url: Option<String>,
}
