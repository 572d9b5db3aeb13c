//! Footnote renumbering after restructuring edits.
//!
//! Accepts both numeric and alphanumeric markers, assigns new sequential
//! integers in order of first inline appearance (not definition order),
//! rewrites every inline reference, and rebuilds the definition block sorted
//! by new number. A reference with no matching definition keeps its new
//! number but emits no definition line, so no content is invented.

use std::collections::HashMap;

use regex::{Captures, Regex};

use super::sections::normalize_blank_lines;

fn marker_pattern() -> Regex {
    Regex::new(r"\[\^([A-Za-z0-9]+)\]").unwrap()
}

fn definition_pattern() -> Regex {
    Regex::new(r"^\[\^([A-Za-z0-9]+)\]:\s*(.*)$").unwrap()
}

/// Renumber every footnote in the document.
pub fn renumber_footnotes(text: &str) -> String {
    let marker_re = marker_pattern();
    let def_re = definition_pattern();
    let lines: Vec<&str> = text.lines().collect();

    // Definitions with their continuation lines folded, keyed by old marker.
    let mut definitions: HashMap<String, String> = HashMap::new();
    let mut body_lines: Vec<&str> = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        if let Some(cap) = def_re.captures(lines[i]) {
            let marker = cap[1].to_string();
            let mut body = cap[2].trim().to_string();
            let mut j = i + 1;
            while j < lines.len() {
                let next = lines[j];
                if next.trim().is_empty()
                    || !next.starts_with([' ', '\t'])
                    || def_re.is_match(next)
                {
                    break;
                }
                if !body.is_empty() {
                    body.push(' ');
                }
                body.push_str(next.trim());
                j += 1;
            }
            definitions.entry(marker).or_insert(body);
            i = j;
        } else {
            body_lines.push(lines[i]);
            i += 1;
        }
    }

    // New numbers in order of first inline appearance.
    let body = body_lines.join("\n");
    let mut numbering: HashMap<String, u32> = HashMap::new();
    let mut next = 1u32;
    for cap in marker_re.captures_iter(&body) {
        numbering.entry(cap[1].to_string()).or_insert_with(|| {
            let n = next;
            next += 1;
            n
        });
    }

    let renumbered = marker_re.replace_all(&body, |cap: &Captures| {
        match numbering.get(&cap[1]) {
            Some(n) => format!("[^{}]", n),
            None => cap[0].to_string(),
        }
    });

    // Definition block sorted by new number; definitions whose marker no
    // longer appears inline emit nothing.
    let mut block: Vec<(u32, String)> = numbering
        .iter()
        .filter_map(|(marker, &n)| {
            definitions
                .get(marker)
                .map(|body| (n, format!("[^{}]: {}", n, body)))
        })
        .collect();
    block.sort_by_key(|&(n, _)| n);

    let mut out = renumbered.trim_end().to_string();
    if !block.is_empty() {
        out.push_str("\n\n");
        out.push_str(
            &block
                .into_iter()
                .map(|(_, line)| line)
                .collect::<Vec<_>>()
                .join("\n"),
        );
    }
    normalize_blank_lines(&out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_renumber_by_first_appearance() {
        let doc = "Second[^7] then first[^2] then seventh again[^7].\n\n[^2]: https://b.example\n[^7]: https://a.example\n";
        let out = renumber_footnotes(doc);
        assert_eq!(
            out,
            "Second[^1] then first[^2] then seventh again[^1].\n\n[^1]: https://a.example\n[^2]: https://b.example\n"
        );
    }

    #[test]
    fn test_alphanumeric_markers() {
        let doc = "Claim[^note9] and claim[^a].\n\n[^a]: https://a.example\n[^note9]: https://n.example\n";
        let out = renumber_footnotes(doc);
        assert!(out.contains("Claim[^1] and claim[^2]."));
        assert!(out.contains("[^1]: https://n.example"));
        assert!(out.contains("[^2]: https://a.example"));
    }

    #[test]
    fn test_reference_without_definition_keeps_number() {
        let doc = "Known[^1] and unknown[^9].\n\n[^1]: https://a.example\n";
        let out = renumber_footnotes(doc);
        assert!(out.contains("Known[^1] and unknown[^2]."));
        assert!(out.contains("[^1]: https://a.example"));
        // No invented definition for the orphan.
        assert!(!out.contains("[^2]:"));
    }

    #[test]
    fn test_unreferenced_definition_dropped() {
        let doc = "Only one ref[^3].\n\n[^3]: https://a.example\n[^4]: https://never.example\n";
        let out = renumber_footnotes(doc);
        assert!(out.contains("Only one ref[^1]."));
        assert!(out.contains("[^1]: https://a.example"));
        assert!(!out.contains("never.example"));
    }

    #[test]
    fn test_definition_continuations_folded() {
        let doc = "Ref[^5].\n\n[^5]: A citation\n    with continuation https://a.example\n";
        let out = renumber_footnotes(doc);
        assert!(out.contains("[^1]: A citation with continuation https://a.example"));
    }

    #[test]
    fn test_already_sequential_is_stable() {
        let doc = "A[^1] B[^2].\n\n[^1]: https://a.example\n[^2]: https://b.example\n";
        assert_eq!(renumber_footnotes(doc), doc);
    }
}
