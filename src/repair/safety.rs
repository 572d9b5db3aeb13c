//! Structural safety checks for section rewrites.
//!
//! A rewrite that fails any check is discarded whole, never partially
//! applied: length must stay within bounds, every non-removable footnote
//! reference must survive, and the set of embedded entity-link markers must
//! be byte-for-byte unchanged.

use std::collections::BTreeSet;

use regex::Regex;

use crate::footnote::reference_pattern;

/// Why a rewrite was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewriteRejection {
    /// New length below the minimum fraction of the original.
    TooShort { original: usize, rewritten: usize },
    /// New length above the maximum fraction of the original.
    TooLong { original: usize, rewritten: usize },
    /// A footnote that must be preserved lost its inline reference.
    LostFootnote(u32),
    /// The embedded entity-link markers changed.
    MarkerSetChanged,
}

impl std::fmt::Display for RewriteRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TooShort {
                original,
                rewritten,
            } => write!(
                f,
                "rewrite too short ({} chars from {})",
                rewritten, original
            ),
            Self::TooLong {
                original,
                rewritten,
            } => write!(f, "rewrite too long ({} chars from {})", rewritten, original),
            Self::LostFootnote(n) => write!(f, "non-removable footnote [^{}] disappeared", n),
            Self::MarkerSetChanged => write!(f, "entity-link markers changed"),
        }
    }
}

/// Length bounds as fractions of the original section length.
#[derive(Debug, Clone, Copy)]
pub struct LengthBounds {
    pub min_ratio: f64,
    pub max_ratio: f64,
}

impl Default for LengthBounds {
    fn default() -> Self {
        Self {
            min_ratio: 0.3,
            max_ratio: 3.0,
        }
    }
}

/// All `<EntityLink .../>` markers in a text, as exact byte sequences,
/// sorted so comparison is order-insensitive but count-sensitive.
pub fn entity_markers(text: &str) -> Vec<String> {
    let re = Regex::new(r"<EntityLink\b[^>]*/>").unwrap();
    let mut markers: Vec<String> = re.find_iter(text).map(|m| m.as_str().to_string()).collect();
    markers.sort();
    markers
}

/// Validate a proposed section rewrite against the structural invariants.
pub fn check_section_rewrite(
    original: &str,
    rewritten: &str,
    preserved: &BTreeSet<u32>,
    bounds: LengthBounds,
) -> Result<(), RewriteRejection> {
    let orig_len = original.len();
    let new_len = rewritten.len();

    if (new_len as f64) < orig_len as f64 * bounds.min_ratio {
        return Err(RewriteRejection::TooShort {
            original: orig_len,
            rewritten: new_len,
        });
    }
    if (new_len as f64) > orig_len as f64 * bounds.max_ratio {
        return Err(RewriteRejection::TooLong {
            original: orig_len,
            rewritten: new_len,
        });
    }

    for &n in preserved {
        let re = reference_pattern(n);
        if re.is_match(original) && !re.is_match(rewritten) {
            return Err(RewriteRejection::LostFootnote(n));
        }
    }

    if entity_markers(original) != entity_markers(rewritten) {
        return Err(RewriteRejection::MarkerSetChanged);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn preserved(ns: &[u32]) -> BTreeSet<u32> {
        ns.iter().copied().collect()
    }

    #[test]
    fn test_accepts_reasonable_rewrite() {
        let original = "## S\n\nThe project began in 2019.[^1] It has <EntityLink id=\"acme\"/> backing.[^2]";
        let rewritten = "## S\n\nThe project began in early 2019.[^1] It has <EntityLink id=\"acme\"/> backing.[^2]";
        assert_eq!(
            check_section_rewrite(original, rewritten, &preserved(&[1, 2]), LengthBounds::default()),
            Ok(())
        );
    }

    #[test]
    fn test_rejects_dropped_accurate_footnote() {
        // Footnote 2 is not removable; a rewrite that drops it is rejected
        // even though everything else passes.
        let original = "## S\n\nClaim one.[^1] Claim two.[^2]";
        let rewritten = "## S\n\nClaim one.[^1] Claim two, restated.";
        assert_eq!(
            check_section_rewrite(original, rewritten, &preserved(&[2]), LengthBounds::default()),
            Err(RewriteRejection::LostFootnote(2))
        );
    }

    #[test]
    fn test_removable_footnote_may_disappear() {
        let original = "## S\n\nClaim one.[^1] Bogus claim.[^2]";
        let rewritten = "## S\n\nClaim one.[^1] The bogus claim is gone entirely now.";
        assert_eq!(
            check_section_rewrite(original, rewritten, &preserved(&[1]), LengthBounds::default()),
            Ok(())
        );
    }

    #[test]
    fn test_rejects_length_violations() {
        let original = "## S\n\nA reasonably long section body with several sentences in it.";
        assert!(matches!(
            check_section_rewrite(original, "## S", &preserved(&[]), LengthBounds::default()),
            Err(RewriteRejection::TooShort { .. })
        ));
        let bloated = format!("## S\n\n{}", "padding ".repeat(100));
        assert!(matches!(
            check_section_rewrite(original, &bloated, &preserved(&[]), LengthBounds::default()),
            Err(RewriteRejection::TooLong { .. })
        ));
    }

    #[test]
    fn test_rejects_marker_mutation() {
        let original = "## S\n\nBody <EntityLink id=\"a\"/> text.";
        let changed = "## S\n\nBody <EntityLink id=\"b\"/> text.";
        assert_eq!(
            check_section_rewrite(original, changed, &preserved(&[]), LengthBounds::default()),
            Err(RewriteRejection::MarkerSetChanged)
        );

        let dropped = "## S\n\nBody with no marker text here.";
        assert_eq!(
            check_section_rewrite(original, dropped, &preserved(&[]), LengthBounds::default()),
            Err(RewriteRejection::MarkerSetChanged)
        );
    }

    #[test]
    fn test_marker_comparison_is_order_insensitive() {
        let original = "A <EntityLink id=\"x\"/> B <EntityLink id=\"y\"/>";
        let reordered = "A <EntityLink id=\"y\"/> B <EntityLink id=\"x\"/>";
        assert_eq!(
            check_section_rewrite(original, reordered, &preserved(&[]), LengthBounds::default()),
            Ok(())
        );
    }

    #[test]
    fn test_footnote_boundary_in_preservation_check() {
        // [^1] preserved; rewrite keeps only [^12]. Must reject.
        let original = "Claims.[^1] More.[^12]";
        let rewritten = "Claims and more together.[^12]";
        assert_eq!(
            check_section_rewrite(original, rewritten, &preserved(&[1, 12]), LengthBounds::default()),
            Err(RewriteRejection::LostFootnote(1))
        );
    }
}
