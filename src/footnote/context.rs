//! Claim-context extraction around inline footnote references.
//!
//! Two granularities: a coarse ±10-line window used for judgment prompts, and
//! a heading-bounded section used when escalating to a full section rewrite.
//! When the reference sits inside a markdown list item, the window includes
//! only that item and its indented continuation lines, because sibling items
//! bleed wrong context into prompts and produce wrong fixes.

use regex::Regex;

use super::parser::{first_reference_line, is_definition_line};

/// Lines included above and below the reference line in the coarse window.
const WINDOW_RADIUS: usize = 10;

fn list_item_pattern() -> Regex {
    Regex::new(r"^(\s*)(?:[-*+]|\d{1,3}[.)])\s+").unwrap()
}

fn heading_pattern() -> Regex {
    Regex::new(r"^#{2,3}\s").unwrap()
}

fn fence_pattern() -> Regex {
    Regex::new(r"^(```|~~~)").unwrap()
}

/// Coarse claim context: ±10 lines around the first inline reference to `n`,
/// or just the containing list item when the reference is inside one.
pub fn claim_window(text: &str, n: u32) -> Option<String> {
    let lines: Vec<&str> = text.lines().collect();
    let ref_line = first_reference_line(text, n)?;

    if let Some(item) = containing_list_item(&lines, ref_line) {
        return Some(item);
    }

    let start = ref_line.saturating_sub(WINDOW_RADIUS);
    let end = (ref_line + WINDOW_RADIUS + 1).min(lines.len());
    Some(lines[start..end].join("\n"))
}

/// The list item containing `line`, including its indented continuation
/// lines, or None when the line is not part of a list item.
fn containing_list_item(lines: &[&str], line: usize) -> Option<String> {
    let item_re = list_item_pattern();

    // Walk up to the item marker. The reference line itself may be a
    // continuation line of an item started above it.
    let mut start = line;
    let indent = loop {
        if let Some(cap) = item_re.captures(lines[start]) {
            break cap[1].len();
        }
        let is_continuation = start > 0
            && !lines[start].trim().is_empty()
            && lines[start].starts_with([' ', '\t']);
        if !is_continuation {
            return None;
        }
        start -= 1;
    };

    // Extend through continuation lines indented deeper than the marker.
    let mut end = line + 1;
    while end < lines.len() {
        let next = lines[end];
        if next.trim().is_empty() {
            break;
        }
        let next_indent = next.len() - next.trim_start().len();
        if next_indent <= indent {
            break;
        }
        end += 1;
    }

    Some(lines[start..end].join("\n"))
}

/// Heading-bounded claim context for footnote `n`: from the nearest preceding
/// `##`/`###` heading down to the next heading or the footnote-definition
/// block, with code fences suppressing heading detection and bounding the
/// section.
pub fn claim_section(text: &str, n: u32) -> Option<String> {
    let lines: Vec<&str> = text.lines().collect();
    let ref_line = first_reference_line(text, n)?;

    let heading_re = heading_pattern();
    let fence_re = fence_pattern();

    // Fence-open state at the start of each line.
    let mut in_fence = vec![false; lines.len()];
    let mut open = false;
    for (i, line) in lines.iter().enumerate() {
        in_fence[i] = open;
        if fence_re.is_match(line) {
            open = !open;
        }
    }

    let mut start = 0;
    for i in (0..=ref_line).rev() {
        if in_fence[i] {
            continue;
        }
        if fence_re.is_match(lines[i]) && i < ref_line {
            // The fence boundary caps the climb.
            start = i + 1;
            break;
        }
        if heading_re.is_match(lines[i]) {
            start = i;
            break;
        }
    }

    let mut end = lines.len();
    for (i, line) in lines.iter().enumerate().skip(ref_line + 1) {
        if in_fence[i] {
            continue;
        }
        if heading_re.is_match(line) || is_definition_line(line) || fence_re.is_match(line) {
            end = i;
            break;
        }
    }

    Some(lines[start..end].join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const DOC: &str = "\
# Title

## Early section

Intro paragraph with a fact.[^1]

## Later section

Alpha paragraph.

- first item with a claim[^2]
  continuing the first item
- second item, unrelated[^3]

Closing paragraph.

```
## not a heading, inside a fence
```

## Final section

Tail claim.[^4]

[^1]: https://a.example
[^2]: https://b.example
[^3]: https://c.example
[^4]: https://d.example
";

    #[test]
    fn test_window_around_plain_reference() {
        let window = claim_window(DOC, 1).unwrap();
        assert!(window.contains("Intro paragraph with a fact.[^1]"));
        assert!(window.contains("## Early section"));
    }

    #[test]
    fn test_window_inside_list_item_excludes_siblings() {
        let window = claim_window(DOC, 2).unwrap();
        assert!(window.contains("first item with a claim[^2]"));
        assert!(window.contains("continuing the first item"));
        assert!(!window.contains("second item"));
    }

    #[test]
    fn test_window_from_continuation_line() {
        let doc = "- item start\n  tail of item with ref[^5]\n- sibling\n\n[^5]: https://e.example\n";
        let window = claim_window(doc, 5).unwrap();
        assert_eq!(window, "- item start\n  tail of item with ref[^5]");
    }

    #[test]
    fn test_section_bounded_by_headings() {
        let section = claim_section(DOC, 2).unwrap();
        assert!(section.starts_with("## Later section"));
        assert!(section.contains("second item"));
        assert!(section.contains("Closing paragraph."));
        // Stops at the fence before "## Final section".
        assert!(!section.contains("## Final section"));
        assert!(!section.contains("not a heading"));
    }

    #[test]
    fn test_section_ignores_heading_inside_fence() {
        let section = claim_section(DOC, 4).unwrap();
        assert!(section.starts_with("## Final section"));
        assert!(section.contains("Tail claim.[^4]"));
        // Bounded below by the definition block.
        assert!(!section.contains("[^1]: https://a.example"));
    }

    #[test]
    fn test_no_reference_no_context() {
        assert_eq!(claim_window(DOC, 99), None);
        assert_eq!(claim_section(DOC, 99), None);
    }
}
