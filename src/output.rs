//! Result types produced by a roadmap run.

use crate::pipeline::preview::AbstractPreview;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Everything produced for one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoadmapOutput {
    /// Characters of extracted text (after trimming).
    pub text_chars: usize,
    /// Abstract section, or the start of the document when none was found.
    pub abstract_preview: AbstractPreview,
    /// Paper-specific research-content steps, top to bottom.
    pub content_steps: Vec<String>,
    /// The fixed research-process steps.
    pub process_steps: Vec<String>,
    /// Mermaid description exactly as returned by the model (trimmed).
    pub description: String,
    /// Where the description was persisted.
    pub description_path: PathBuf,
    /// Rendered image; None when rendering was disabled.
    pub image_path: Option<PathBuf>,
    /// Timings and token usage.
    pub stats: RoadmapStats,
}

/// Timings and token usage of one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoadmapStats {
    /// Pages in the source document (0 for text input).
    pub total_pages: usize,
    /// Pages whose text was read.
    pub pages_read: usize,
    pub extract_duration_ms: u64,
    pub steps_duration_ms: u64,
    pub diagram_duration_ms: u64,
    pub render_duration_ms: u64,
    pub total_duration_ms: u64,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
}

/// PDF document metadata, as returned by [`crate::inspect`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<String>,
    pub modification_date: Option<String>,
    pub page_count: usize,
    pub pdf_version: String,
}
