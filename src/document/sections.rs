//! Heading-bounded document splitting and reassembly.
//!
//! A document decomposes into an optional `---`-delimited frontmatter block,
//! a preamble (everything before the first `##` heading), and a list of
//! sections each starting at a `##` heading. `###`+ headings do not start
//! sections, and open code fences suppress heading detection entirely.

use regex::Regex;
use serde::{Deserialize, Serialize};

/// One `##`-headed section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// Heading text without the `##` marker.
    pub heading: String,
    /// Full section text, heading line included.
    pub text: String,
    /// 0-based first line of the section in the source document.
    pub start_line: usize,
    /// 0-based line just past the section.
    pub end_line: usize,
}

/// A document split into frontmatter, preamble, and sections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitDocument {
    /// Raw frontmatter block including both `---` delimiter lines.
    pub frontmatter: Option<String>,
    /// Everything between frontmatter and the first section heading.
    pub preamble: String,
    pub sections: Vec<Section>,
}

fn section_heading_pattern() -> Regex {
    Regex::new(r"^##\s+(.*)$").unwrap()
}

fn fence_pattern() -> Regex {
    Regex::new(r"^(```|~~~)").unwrap()
}

/// Split a document into frontmatter, preamble, and `##`-bounded sections.
pub fn split_document(text: &str) -> SplitDocument {
    let lines: Vec<&str> = text.lines().collect();
    let heading_re = section_heading_pattern();
    let fence_re = fence_pattern();

    let mut cursor = 0usize;

    // Frontmatter must start at the very first line.
    let frontmatter = if lines.first() == Some(&"---") {
        lines
            .iter()
            .skip(1)
            .position(|&l| l == "---")
            .map(|close| {
                let end = close + 2;
                let block = lines[..end].join("\n");
                cursor = end;
                block
            })
    } else {
        None
    };

    let mut in_fence = false;
    let mut boundaries = Vec::new();
    for (i, line) in lines.iter().enumerate().skip(cursor) {
        if fence_re.is_match(line) {
            in_fence = !in_fence;
            continue;
        }
        if !in_fence {
            if let Some(cap) = heading_re.captures(line) {
                boundaries.push((i, cap[1].trim().to_string()));
            }
        }
    }

    let preamble_end = boundaries.first().map(|&(i, _)| i).unwrap_or(lines.len());
    let preamble = lines[cursor..preamble_end].join("\n");

    let mut sections = Vec::new();
    for (idx, (start, heading)) in boundaries.iter().enumerate() {
        let end = boundaries
            .get(idx + 1)
            .map(|&(next, _)| next)
            .unwrap_or(lines.len());
        sections.push(Section {
            heading: heading.clone(),
            text: lines[*start..end].join("\n"),
            start_line: *start,
            end_line: end,
        });
    }

    SplitDocument {
        frontmatter,
        preamble,
        sections,
    }
}

/// Collapse runs of 3+ newlines to exactly 2 and end with one trailing
/// newline.
pub fn normalize_blank_lines(text: &str) -> String {
    let collapsed = Regex::new(r"\n{3,}").unwrap().replace_all(text, "\n\n");
    let mut out = collapsed.trim_end_matches('\n').to_string();
    out.push('\n');
    out
}

/// Reassemble a split document, joining parts with blank-line separators.
pub fn reassemble(doc: &SplitDocument) -> String {
    let mut parts = Vec::new();
    if let Some(ref fm) = doc.frontmatter {
        parts.push(fm.trim_end().to_string());
    }
    if !doc.preamble.trim().is_empty() {
        parts.push(doc.preamble.trim_end().to_string());
    }
    for section in &doc.sections {
        parts.push(section.text.trim_end().to_string());
    }
    normalize_blank_lines(&parts.join("\n\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const DOC: &str = "\
---
title: Page
---

Lead paragraph.

## First

Alpha.

### Subsection stays inside

Beta.

```
## fenced pseudo-heading
```

## Second

Gamma.
";

    #[test]
    fn test_split_frontmatter_and_sections() {
        let doc = split_document(DOC);
        assert_eq!(doc.frontmatter.as_deref(), Some("---\ntitle: Page\n---"));
        assert!(doc.preamble.contains("Lead paragraph."));
        assert_eq!(doc.sections.len(), 2);
        assert_eq!(doc.sections[0].heading, "First");
        assert_eq!(doc.sections[1].heading, "Second");
    }

    #[test]
    fn test_subheadings_do_not_split() {
        let doc = split_document(DOC);
        assert!(doc.sections[0].text.contains("### Subsection stays inside"));
        assert!(doc.sections[0].text.contains("Beta."));
    }

    #[test]
    fn test_fenced_heading_is_not_a_boundary() {
        let doc = split_document(DOC);
        assert!(doc.sections[0].text.contains("## fenced pseudo-heading"));
    }

    #[test]
    fn test_no_frontmatter() {
        let doc = split_document("Plain text.\n\n## Only\n\nBody.\n");
        assert_eq!(doc.frontmatter, None);
        assert_eq!(doc.preamble.trim(), "Plain text.");
        assert_eq!(doc.sections.len(), 1);
    }

    #[test]
    fn test_reassemble_round_trip_structure() {
        let doc = split_document(DOC);
        let out = reassemble(&doc);
        let again = split_document(&out);
        assert_eq!(again.sections.len(), 2);
        assert_eq!(again.frontmatter, doc.frontmatter);
        assert!(out.ends_with('\n'));
        assert!(!out.ends_with("\n\n"));
    }

    #[test]
    fn test_normalize_blank_lines() {
        assert_eq!(normalize_blank_lines("a\n\n\n\nb"), "a\n\nb\n");
        assert_eq!(normalize_blank_lines("a\nb\n\n\n"), "a\nb\n");
    }

    #[test]
    fn test_section_line_ranges() {
        let doc = split_document("## A\none\n## B\ntwo\n");
        assert_eq!(doc.sections[0].start_line, 0);
        assert_eq!(doc.sections[0].end_line, 2);
        assert_eq!(doc.sections[1].start_line, 2);
        assert_eq!(doc.sections[1].end_line, 4);
    }
}
