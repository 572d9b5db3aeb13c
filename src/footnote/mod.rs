//! Footnote parsing: definitions, inline references, and claim context.
//!
//! Recognizes the four definition shapes on `[^N]: ...` lines, locates inline
//! `[^N]` markers with digit-safe boundaries, and extracts the claim text
//! surrounding a reference at two granularities (coarse window and
//! heading-bounded section).

pub mod context;
pub mod parser;
pub mod types;

pub use context::{claim_section, claim_window};
pub use parser::{
    classify_definition, defined_numbers, extract_citations, first_reference_line,
    has_inline_reference, inline_references, parse_definitions, reference_pattern,
    referenced_numbers,
};
pub use types::{CitationFormat, ExtractedCitation, FootnoteDef, InlineRef};
