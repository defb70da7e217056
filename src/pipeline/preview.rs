//! Abstract preview and the minimum-text gate.
//!
//! Both run on the extracted text before any model is contacted. The gate
//! is what stops scanned, image-only PDFs from burning two LLM calls on an
//! empty prompt.

use crate::error::RoadmapError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Characters shown in a preview.
pub const PREVIEW_CHARS: usize = 500;

// Heading, optional separator, then everything up to the first blank line.
static RE_ABSTRACT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)(摘要|Abstract)[\s:：]*(.*?)(\n\s*\n|\z)").unwrap());

/// What the user is shown before the model runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbstractPreview {
    /// Text of the abstract section.
    Abstract(String),
    /// No abstract heading found: start of the document instead.
    DocumentStart(String),
}

impl AbstractPreview {
    /// The preview text regardless of where it came from.
    pub fn text(&self) -> &str {
        match self {
            AbstractPreview::Abstract(s) | AbstractPreview::DocumentStart(s) => s,
        }
    }

    pub fn is_abstract(&self) -> bool {
        matches!(self, AbstractPreview::Abstract(_))
    }
}

/// Locate the abstract section, if any.
///
/// Matches the first `摘要` or `Abstract` (case-insensitive) and returns the
/// text after it up to the next blank line. An empty match counts as absent.
pub fn find_abstract(text: &str) -> Option<&str> {
    RE_ABSTRACT
        .captures(text)
        .and_then(|caps| caps.get(2))
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
}

/// Build the preview shown before step extraction.
pub fn abstract_preview(text: &str) -> AbstractPreview {
    match find_abstract(text) {
        Some(abs) => AbstractPreview::Abstract(truncate_chars(abs, PREVIEW_CHARS)),
        None => {
            let head: String = text.chars().take(PREVIEW_CHARS).collect();
            AbstractPreview::DocumentStart(format!("{head}..."))
        }
    }
}

/// Reject text that is too short to describe a paper.
///
/// Counts characters, not bytes, of the trimmed text.
pub fn check_text_quality(text: &str, min_chars: usize) -> Result<usize, RoadmapError> {
    let chars = text.trim().chars().count();
    if chars < min_chars {
        return Err(RoadmapError::TooLittleText {
            chars,
            min: min_chars,
        });
    }
    Ok(chars)
}

/// First `max` characters, with `...` appended when anything was cut.
fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((byte_idx, _)) => format!("{}...", &s[..byte_idx]),
        None => s.to_string(),
    }
}
