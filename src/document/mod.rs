//! Document structure: section splitting, footnote renumbering, and
//! offset-safe text edits.

pub mod edits;
pub mod renumber;
pub mod sections;

#[cfg(test)]
mod proptest;

pub use edits::{apply_edits, resolve_edit, EditOutcome, TextEdit};
pub use renumber::renumber_footnotes;
pub use sections::{normalize_blank_lines, reassemble, split_document, Section, SplitDocument};
