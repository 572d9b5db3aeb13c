//! # citeguard
//!
//! Citation integrity and auto-repair for AI-authored knowledge bases. Every
//! factual claim in a page is expected to carry a footnote pointing at a
//! source; this crate parses those footnotes, fetches and caches the cited
//! sources, scores each page's risk of fabricated or unsupported claims, and
//! autonomously rewrites text to fix citations an external judgment step has
//! flagged.
//!
//! ## Core Components
//!
//! - **Footnote**: definition/reference parsing and claim-context extraction
//! - **Integrity**: structural corruption checks and risk scoring
//! - **Verify**: the source-fetch pipeline and per-page archives
//! - **Extraction**: quote extraction and accuracy checking against sources
//! - **Repair**: the staged auto-repair engine
//!
//! ## Example
//!
//! ```rust,ignore
//! use citeguard::{score_risk, IntegrityConfig, RiskInput};
//!
//! let input = RiskInput::new("researcher", 1200)
//!     .with_citations(3, 0)
//!     .with_ratings(4, 60)
//!     .with_body(page_text);
//!
//! let assessment = score_risk(&input, &IntegrityConfig::default());
//! println!("{}: {} ({:?})", assessment.level, assessment.score, assessment.factors);
//! ```

pub mod document;
pub mod error;
pub mod extraction;
pub mod footnote;
pub mod integrity;
pub mod judgment;
pub mod repair;
pub mod store;
pub mod verify;

// Re-exports for convenience
pub use document::{
    apply_edits, normalize_blank_lines, reassemble, renumber_footnotes, resolve_edit,
    split_document, EditOutcome, Section, SplitDocument, TextEdit,
};
pub use error::{Error, Result};
pub use extraction::{AccuracyRunSummary, ExtractionPipeline, ExtractionSummary};
pub use footnote::{
    claim_section, claim_window, classify_definition, extract_citations, inline_references,
    parse_definitions, CitationFormat, ExtractedCitation, FootnoteDef, InlineRef,
};
pub use integrity::{
    analyze, canonical_entity_type, integrity_factors, scan_sequential_ids, score_risk,
    AccuracySummary, IntegrityConfig, IntegrityReport, RiskAssessment, RiskFactor, RiskInput,
    RiskLevel, SequentialIdScan,
};
pub use judgment::{
    AccuracyCheck, FixProposal, FlaggedCitation, JudgmentService, QuoteExtraction, SourceHit,
    SourceSearch, Verdict,
};
pub use repair::{
    BatchRepairReport, LengthBounds, RepairConfig, RepairEngine, RepairReport, RepairRequest,
    RepairStage, ReverifyDelta, RewriteRejection, StageCounts, StageOutcome,
};
pub use store::{
    CitationContentRecord, CitationQuoteRecord, CitationStore, EditLogEntry, ExtractionUpdate,
    StoreHandle,
};
pub use verify::{
    CitationArchive, CitationRecord, CitationStatus, DomainPolicy, FetchConfig, FetchPolicy,
    SourceFetcher, VerificationPipeline, VerifyConfig,
};
