//! External judgment and source-discovery interfaces.
//!
//! The generative calls that produce quotes, accuracy verdicts, fixes, and
//! section rewrites are black boxes behind these traits: their reasoning is
//! not reproducible and not reimplemented here. Implementations wrap an LLM
//! provider or a human review queue; tests use scripted stubs.

pub mod types;

use async_trait::async_trait;

use crate::error::Result;

pub use types::{
    AccuracyCheck, FixProposal, FlaggedCitation, QuoteExtraction, SourceHit, Verdict,
};

/// Black-box judgment calls used across the pipeline.
#[async_trait]
pub trait JudgmentService: Send + Sync {
    /// Extract the quote from `source_text` that best supports `claim`.
    async fn extract_quote(&self, claim: &str, source_text: &str) -> Result<QuoteExtraction>;

    /// Judge whether `evidence` supports `claim`.
    async fn check_accuracy(&self, claim: &str, evidence: &str) -> Result<AccuracyCheck>;

    /// Propose targeted string replacements for flagged citations.
    async fn propose_fixes(
        &self,
        flagged: &[FlaggedCitation],
        page_text: &str,
    ) -> Result<Vec<FixProposal>>;

    /// Rewrite a full section given per-footnote evidence, returning the new
    /// section text.
    async fn rewrite_section(
        &self,
        section_text: &str,
        evidence: &[(u32, String)],
    ) -> Result<String>;
}

/// Source-discovery service: a search query to ranked result hits.
#[async_trait]
pub trait SourceSearch: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<SourceHit>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_round_trip() {
        for v in [
            Verdict::Accurate,
            Verdict::MinorIssues,
            Verdict::Inaccurate,
            Verdict::Unsupported,
            Verdict::NotVerifiable,
        ] {
            assert_eq!(Verdict::parse(v.as_str()), v);
        }
        assert_eq!(Verdict::parse("garbage"), Verdict::NotVerifiable);
    }

    #[test]
    fn test_flagged_verdicts() {
        assert!(Verdict::Inaccurate.is_flagged());
        assert!(Verdict::Unsupported.is_flagged());
        assert!(!Verdict::Accurate.is_flagged());
        assert!(!Verdict::MinorIssues.is_flagged());
        assert!(!Verdict::NotVerifiable.is_flagged());
    }

    #[test]
    fn test_proposal_actionability() {
        let good = FixProposal {
            footnote: 1,
            original: "costs $50".to_string(),
            replacement: "costs $45".to_string(),
            explanation: String::new(),
            fix_type: "correction".to_string(),
        };
        assert!(good.is_actionable());

        let noop = FixProposal {
            original: "same".to_string(),
            replacement: "same".to_string(),
            ..good.clone()
        };
        assert!(!noop.is_actionable());

        let empty = FixProposal {
            original: String::new(),
            ..good
        };
        assert!(!empty.is_actionable());
    }
}
