//! Property-based tests for offset-safe edits and renumbering.
//!
//! Validates the structural invariants the repair engine relies on:
//!
//! - Applying non-overlapping edits is independent of input order
//! - Applied edit counts are exact (nothing silently dropped)
//! - Renumbering is idempotent

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use crate::document::edits::{apply_edits, TextEdit};
    use crate::document::renumber::renumber_footnotes;

    /// Strategy: a base string plus a set of disjoint (start, len) spans with
    /// replacement strings.
    fn edit_batch() -> impl Strategy<Value = (String, Vec<TextEdit>)> {
        ("[a-z ]{40,120}", proptest::collection::vec(("[A-Z]{0,8}", 1usize..6), 1..6)).prop_map(
            |(base, seeds)| {
                // Carve disjoint spans left to right from the seeds.
                let mut edits = Vec::new();
                let mut cursor = 0usize;
                for (replacement, len) in seeds {
                    let start = cursor + 2;
                    let end = start + len;
                    if end >= base.len() {
                        break;
                    }
                    edits.push(TextEdit::new(start, &base[start..end], replacement));
                    cursor = end + 1;
                }
                (base, edits)
            },
        )
    }

    proptest! {
        /// Non-overlapping edits produce identical output regardless of the
        /// input array's order.
        #[test]
        fn edit_application_is_order_independent(
            (base, edits) in edit_batch(),
            seed in any::<u64>()
        ) {
            let forward = apply_edits(&base, edits.clone());

            let mut shuffled = edits.clone();
            // Deterministic pseudo-shuffle from the seed.
            if shuffled.len() > 1 {
                let k = (seed as usize) % shuffled.len();
                shuffled.rotate_left(k);
                if seed % 2 == 0 {
                    shuffled.reverse();
                }
            }
            let other = apply_edits(&base, shuffled);

            prop_assert_eq!(&forward.text, &other.text);
            prop_assert_eq!(forward.applied, other.applied);
        }

        /// Every valid edit is applied; none disappear.
        #[test]
        fn all_disjoint_edits_apply((base, edits) in edit_batch()) {
            let expected = edits.len();
            let outcome = apply_edits(&base, edits);
            prop_assert_eq!(outcome.applied, expected);
            prop_assert!(outcome.skipped.is_empty());
        }

        /// Renumbering twice is the same as renumbering once.
        #[test]
        fn renumbering_is_idempotent(refs in proptest::collection::vec(1u32..40, 1..8)) {
            let mut doc = String::new();
            for (i, n) in refs.iter().enumerate() {
                doc.push_str(&format!("Claim {} cites[^{}].\n", i, n));
            }
            doc.push('\n');
            let mut seen = std::collections::BTreeSet::new();
            for n in &refs {
                if seen.insert(*n) {
                    doc.push_str(&format!("[^{}]: https://example.org/{}\n", n, n));
                }
            }

            let once = renumber_footnotes(&doc);
            let twice = renumber_footnotes(&once);
            prop_assert_eq!(once, twice);
        }
    }
}
