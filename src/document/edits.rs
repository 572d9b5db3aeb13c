//! Offset-safe text edits.
//!
//! Edits are an explicit list of `(offset, original, replacement)` triples
//! resolved against the immutable source buffer and applied in one pass from
//! the end of the buffer backward, so applying one edit never shifts the
//! offset recorded for another. This is the core correctness invariant of the
//! repair engine: positional edits are never applied in ascending order when
//! earlier edits can change the length of the text.

use serde::{Deserialize, Serialize};

/// One pending string replacement at a fixed offset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextEdit {
    /// Byte offset of `original` in the source buffer.
    pub start: usize,
    /// Exact text expected at `start`.
    pub original: String,
    /// Replacement text.
    pub replacement: String,
}

impl TextEdit {
    pub fn new(start: usize, original: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            start,
            original: original.into(),
            replacement: replacement.into(),
        }
    }

    /// End offset (exclusive) of the edited span.
    pub fn end(&self) -> usize {
        self.start + self.original.len()
    }
}

/// Locate `original` in `text` by exact substring match and build an edit.
///
/// Returns None when the text is not present (a stale proposal).
pub fn resolve_edit(text: &str, original: &str, replacement: &str) -> Option<TextEdit> {
    text.find(original)
        .map(|start| TextEdit::new(start, original, replacement))
}

/// Outcome of applying a batch of edits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditOutcome {
    /// The edited text.
    pub text: String,
    /// Edits applied.
    pub applied: usize,
    /// Edits whose expected text no longer matched; reported, never silently
    /// dropped.
    pub skipped: Vec<TextEdit>,
}

impl EditOutcome {
    pub fn changed(&self) -> bool {
        self.applied > 0
    }
}

/// Apply a set of non-overlapping edits in strictly descending offset order.
///
/// Each edit is verified against the current buffer before splicing: the
/// expected `original` must still sit at its recorded offset. Overlapping or
/// stale edits are skipped and reported. For any set of non-overlapping valid
/// edits the result is independent of the input order.
pub fn apply_edits(text: &str, mut edits: Vec<TextEdit>) -> EditOutcome {
    edits.sort_by(|a, b| b.start.cmp(&a.start));

    let mut out = text.to_string();
    let mut applied = 0usize;
    let mut skipped = Vec::new();
    // Start of the previously applied (lower-offset-bound) edit; in
    // descending order every subsequent edit must end at or before it.
    let mut floor = out.len();

    for edit in edits {
        let end = edit.end();
        let valid = end <= floor
            && end <= out.len()
            && out.is_char_boundary(edit.start)
            && out.is_char_boundary(end)
            && out[edit.start..end] == *edit.original;
        if !valid {
            skipped.push(edit);
            continue;
        }
        floor = edit.start;
        out.replace_range(edit.start..end, &edit.replacement);
        applied += 1;
    }

    EditOutcome {
        text: out,
        applied,
        skipped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_single_fix() {
        let doc = "The widget costs $50[^1] at launch.";
        let edit = resolve_edit(doc, "costs $50[^1]", "costs approximately $45[^1]").unwrap();
        let outcome = apply_edits(doc, vec![edit]);
        assert_eq!(outcome.applied, 1);
        assert!(outcome.skipped.is_empty());
        assert_eq!(outcome.text, "The widget costs approximately $45[^1] at launch.");
        assert!(!outcome.text.contains("costs $50"));
    }

    #[test]
    fn test_ascending_input_order_is_safe() {
        let doc = "aaa bbb ccc";
        let edits = vec![
            TextEdit::new(0, "aaa", "A-LONGER"),
            TextEdit::new(4, "bbb", "B"),
            TextEdit::new(8, "ccc", "C-ALSO-LONGER"),
        ];
        let outcome = apply_edits(doc, edits);
        assert_eq!(outcome.applied, 3);
        assert_eq!(outcome.text, "A-LONGER B C-ALSO-LONGER");
    }

    #[test]
    fn test_stale_edit_skipped_and_reported() {
        let doc = "alpha beta gamma";
        let edits = vec![
            TextEdit::new(0, "alpha", "ALPHA"),
            TextEdit::new(6, "DRIFTED", "nope"),
        ];
        let outcome = apply_edits(doc, edits);
        assert_eq!(outcome.applied, 1);
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.skipped[0].original, "DRIFTED");
        assert_eq!(outcome.text, "ALPHA beta gamma");
    }

    #[test]
    fn test_overlapping_edit_skipped() {
        let doc = "overlapping spans here";
        let edits = vec![
            TextEdit::new(0, "overlapping spans", "X"),
            TextEdit::new(12, "spans here", "Y"),
        ];
        let outcome = apply_edits(doc, edits);
        assert_eq!(outcome.applied, 1);
        assert_eq!(outcome.skipped.len(), 1);
    }

    #[test]
    fn test_resolve_missing_text() {
        assert_eq!(resolve_edit("some text", "absent", "x"), None);
    }

    #[test]
    fn test_out_of_bounds_edit_skipped() {
        let outcome = apply_edits("short", vec![TextEdit::new(10, "x", "y")]);
        assert_eq!(outcome.applied, 0);
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.text, "short");
    }
}
