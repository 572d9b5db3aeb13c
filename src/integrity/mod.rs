//! Content-integrity analysis and hallucination risk scoring.
//!
//! [`checks`] holds the pure structural checks (orphaned references,
//! duplicate definitions, sequential fabricated identifiers, unsourced
//! definitions); [`risk`] composes those with entity, density, editorial, and
//! accuracy signals into a single auditable score.

pub mod checks;
pub mod risk;

pub use checks::{analyze, scan_sequential_ids, IntegrityConfig, IntegrityReport, SequentialIdScan};
pub use risk::{
    canonical_entity_type, integrity_factors, score_risk, AccuracySummary, RiskAssessment,
    RiskFactor, RiskInput, RiskLevel,
};
