//! Staged auto-repair of flagged citations.
//!
//! Targeted fixes first; section-level rewrite escalation when no fixes come
//! back; orphaned-definition cleanup; source replacement for unsupported
//! citations; and a re-verification loop that classifies the run as improved,
//! unchanged, or regressed.

pub mod engine;
pub mod evidence;
pub mod report;
pub mod safety;

pub use engine::{
    build_search_query, next_stage, remove_orphaned_definitions, replace_source_in_definition,
    RepairConfig, RepairEngine, RepairRequest, RepairStage, StageOutcome,
};
pub use evidence::{enrich_flagged, evidence_for, removable_footnotes, section_evidence};
pub use report::{BatchRepairReport, RepairReport, ReverifyDelta, StageCounts};
pub use safety::{check_section_rewrite, entity_markers, LengthBounds, RewriteRejection};
