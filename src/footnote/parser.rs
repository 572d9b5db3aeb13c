//! Footnote definition and inline-reference parsing.
//!
//! Footnote syntax is `[^N]` inline and `[^N]: ...` on a definition line.
//! Number matching always goes through [`reference_pattern`], which bounds the
//! marker with its closing bracket so `[^1]` can never match inside `[^10]`.

use std::collections::BTreeSet;

use regex::Regex;

use super::context::claim_window;
use super::types::{CitationFormat, ExtractedCitation, FootnoteDef, InlineRef};

/// Pattern for a definition line: `[^N]: body`.
pub(crate) fn definition_pattern() -> Regex {
    Regex::new(r"^\[\^(\d+)\]:\s*(.*)$").unwrap()
}

/// Pattern matching every inline footnote marker on a line.
pub(crate) fn any_reference_pattern() -> Regex {
    Regex::new(r"\[\^(\d+)\]").unwrap()
}

/// Pattern matching exactly footnote `n` and no other number.
///
/// The closing `]` is mandatory and cannot be a digit, so this carries the
/// same guarantee as a trailing negative-lookahead for digits.
pub fn reference_pattern(n: u32) -> Regex {
    Regex::new(&format!(r"\[\^{}\]", n)).unwrap()
}

/// True if `line` is a footnote definition line.
pub(crate) fn is_definition_line(line: &str) -> bool {
    definition_pattern().is_match(line)
}

/// Classify a definition body into its [`CitationFormat`].
///
/// Ordered dispatch, first match wins: embedded markdown link, text followed
/// by a URL, bare URL, no URL.
pub fn classify_definition(raw: &str) -> CitationFormat {
    let raw = raw.trim();

    // Embedded markdown link, anywhere in the body.
    let link_re = Regex::new(r"\[([^\]]+)\]\((https?://[^)\s]+)\)").unwrap();
    if let Some(cap) = link_re.captures(raw) {
        return CitationFormat::MarkdownLink {
            url: cap[2].to_string(),
            link_text: cap[1].trim().to_string(),
        };
    }

    // Descriptive text followed by a trailing bare URL.
    let text_url_re = Regex::new(r"^(.+?)\s+(https?://\S+)\s*$").unwrap();
    if let Some(cap) = text_url_re.captures(raw) {
        let text = cap[1].trim();
        if !text.is_empty() {
            return CitationFormat::TextThenUrl {
                url: cap[2].trim_end_matches(['.', ',']).to_string(),
                title: synthesize_title(text),
            };
        }
    }

    // Bare URL and nothing else.
    let bare_re = Regex::new(r"^(https?://\S+)$").unwrap();
    if let Some(cap) = bare_re.captures(raw) {
        return CitationFormat::BareUrl {
            url: cap[1].trim_end_matches(['.', ',']).to_string(),
        };
    }

    CitationFormat::NoUrl
}

/// Synthesize a human-readable title from descriptive text: a quoted
/// substring if present, else the stripped text itself.
fn synthesize_title(text: &str) -> String {
    let quoted_re = Regex::new(r#""([^"]+)""#).unwrap();
    if let Some(cap) = quoted_re.captures(text) {
        return cap[1].trim().to_string();
    }
    text.trim_matches(|c: char| c.is_whitespace() || matches!(c, ':' | ',' | '.' | '-'))
        .to_string()
}

/// Parse every footnote definition in the document, folding indented
/// continuation lines into the definition body.
pub fn parse_definitions(text: &str) -> Vec<FootnoteDef> {
    let def_re = definition_pattern();
    let lines: Vec<&str> = text.lines().collect();
    let mut defs = Vec::new();

    let mut i = 0;
    while i < lines.len() {
        if let Some(cap) = def_re.captures(lines[i]) {
            let number: u32 = match cap[1].parse() {
                Ok(n) => n,
                Err(_) => {
                    i += 1;
                    continue;
                }
            };
            let mut body = cap[2].trim().to_string();
            let line = i;

            // Indented continuation lines belong to this definition.
            let mut j = i + 1;
            while j < lines.len() {
                let next = lines[j];
                if next.trim().is_empty() || !next.starts_with([' ', '\t']) || is_definition_line(next)
                {
                    break;
                }
                if !body.is_empty() {
                    body.push(' ');
                }
                body.push_str(next.trim());
                j += 1;
            }

            let format = classify_definition(&body);
            defs.push(FootnoteDef {
                number,
                raw: body,
                format,
                line,
            });
            i = j;
        } else {
            i += 1;
        }
    }

    defs
}

/// All inline footnote references, in document order, skipping definition
/// lines.
pub fn inline_references(text: &str) -> Vec<InlineRef> {
    let ref_re = any_reference_pattern();
    let mut refs = Vec::new();

    for (line_no, line) in text.lines().enumerate() {
        if is_definition_line(line) {
            continue;
        }
        for cap in ref_re.captures_iter(line) {
            if let Ok(number) = cap[1].parse() {
                refs.push(InlineRef {
                    number,
                    line: line_no,
                });
            }
        }
    }

    refs
}

/// Distinct footnote numbers referenced inline.
pub fn referenced_numbers(text: &str) -> BTreeSet<u32> {
    inline_references(text).into_iter().map(|r| r.number).collect()
}

/// Distinct footnote numbers that have a definition.
pub fn defined_numbers(text: &str) -> BTreeSet<u32> {
    parse_definitions(text).into_iter().map(|d| d.number).collect()
}

/// True if footnote `n` is referenced inline anywhere (definitions skipped).
pub fn has_inline_reference(text: &str, n: u32) -> bool {
    let re = reference_pattern(n);
    text.lines()
        .filter(|line| !is_definition_line(line))
        .any(|line| re.is_match(line))
}

/// Line of the first inline reference to footnote `n`.
pub fn first_reference_line(text: &str, n: u32) -> Option<usize> {
    let re = reference_pattern(n);
    text.lines()
        .enumerate()
        .filter(|(_, line)| !is_definition_line(line))
        .find(|(_, line)| re.is_match(line))
        .map(|(i, _)| i)
}

/// Extract one citation per footnote definition that carries a URL.
pub fn extract_citations(text: &str) -> Vec<ExtractedCitation> {
    parse_definitions(text)
        .into_iter()
        .filter(|def| def.format.url().is_some())
        .map(|def| {
            let ref_line = first_reference_line(text, def.number);
            let claim_context = ref_line
                .and_then(|_| claim_window(text, def.number))
                .unwrap_or_default();
            ExtractedCitation {
                footnote: def.number,
                url: def.format.url().map(str::to_string),
                link_text: def.format.link_text().to_string(),
                claim_context,
                ref_line: ref_line.unwrap_or(def.line),
            }
        })
        .collect()
}
