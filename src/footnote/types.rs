//! Core types for footnote parsing.

use serde::{Deserialize, Serialize};

/// Classified shape of a footnote definition body.
///
/// Definitions come in four shapes, classified by an ordered list of
/// `(predicate, normalizer)` regex passes where the first match wins:
/// embedded markdown link, text followed by a bare URL, bare URL, no URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "format", rename_all = "snake_case")]
pub enum CitationFormat {
    /// A markdown link `[Title](URL)`, possibly embedded in surrounding prose
    /// (e.g. `Author, "[Title](URL)," Journal, Year.`).
    MarkdownLink { url: String, link_text: String },
    /// Descriptive text followed by a trailing bare URL (`Description: URL`).
    TextThenUrl { url: String, title: String },
    /// The definition body is a bare URL and nothing else.
    BareUrl { url: String },
    /// No URL anywhere in the definition.
    NoUrl,
}

impl CitationFormat {
    /// The URL carried by this format, if any.
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::MarkdownLink { url, .. } => Some(url),
            Self::TextThenUrl { url, .. } => Some(url),
            Self::BareUrl { url } => Some(url),
            Self::NoUrl => None,
        }
    }

    /// Human-readable link text for this format.
    ///
    /// Bare URLs fall back to the URL itself; `NoUrl` yields an empty string.
    pub fn link_text(&self) -> &str {
        match self {
            Self::MarkdownLink { link_text, .. } => link_text,
            Self::TextThenUrl { title, .. } => title,
            Self::BareUrl { url } => url,
            Self::NoUrl => "",
        }
    }
}

/// A parsed footnote definition line, including indented continuation lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FootnoteDef {
    /// Footnote number.
    pub number: u32,
    /// Definition body (after `[^N]:`), continuation lines joined with spaces.
    pub raw: String,
    /// Classified shape of the definition body.
    pub format: CitationFormat,
    /// 0-based line of the definition in the document.
    pub line: usize,
}

/// An inline `[^N]` reference occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InlineRef {
    /// Footnote number.
    pub number: u32,
    /// 0-based line the reference appears on.
    pub line: usize,
}

/// One citation extracted from a document: a definition that carries a URL,
/// joined with the claim context around its first inline reference.
///
/// Ephemeral: recomputed on every parse, never persisted directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedCitation {
    /// Footnote number.
    pub footnote: u32,
    /// Source URL from the definition.
    pub url: Option<String>,
    /// Human-readable link text or synthesized title.
    pub link_text: String,
    /// Text surrounding the first inline reference (±10 lines, list-item
    /// bounded). Empty when the footnote is never referenced inline.
    pub claim_context: String,
    /// 0-based line of the first inline reference, or of the definition when
    /// the footnote is never referenced.
    pub ref_line: usize,
}
