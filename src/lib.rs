//! # pdf2roadmap
//!
//! Turn a research paper (PDF) into a technical-roadmap diagram.
//!
//! The paper's text is sent to an LLM, which names the key steps of the
//! research content. A second call lays those steps out next to a fixed
//! research-process track as a Mermaid flowchart, and the external
//! mermaid-cli renders it to SVG.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input    resolve local file, URL download or upload
//!  ├─ 2. Text     extract page text via pdfium (spawn_blocking)
//!  ├─ 3. Gate     abstract preview + minimum-length check
//!  ├─ 4. Steps    LLM #1 → JSON list of content steps
//!  ├─ 5. Diagram  LLM #2 → Mermaid description (outputs/diagram.mmd)
//!  └─ 6. Render   mmdc → outputs/diagram.svg
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2roadmap::{generate, RoadmapConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from DEEPSEEK_API_KEY / OPENAI_API_KEY / ...
//!     let config = RoadmapConfig::default();
//!     let output = generate("paper.pdf", &config).await?;
//!     println!("{}", output.description);
//!     if let Some(svg) = output.image_path {
//!         eprintln!("rendered: {}", svg.display());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2roadmap` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pdf2roadmap = { version = "0.1", default-features = false }
//! ```
//!
//! ## External tools
//!
//! Rendering needs `mmdc` from `@mermaid-js/mermaid-cli`. When it is not on
//! PATH, `npx mmdc` is tried. Set [`RoadmapConfig::render`] to `false` to stop
//! after the description is written.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod roadmap;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{PageSelection, RendererConfig, RoadmapConfig, RoadmapConfigBuilder};
pub use error::{ParseFailure, RoadmapError};
pub use output::{DocumentMetadata, RoadmapOutput, RoadmapStats};
pub use pipeline::preview::AbstractPreview;
pub use pipeline::render::strip_mermaid_fence;
pub use pipeline::steps::{parse_content_steps, StepExtraction};
pub use progress::{NoopProgressCallback, ProgressCallback, RoadmapProgressCallback, Stage};
pub use prompts::PROCESS_STEPS;
pub use roadmap::{generate, generate_from_bytes, generate_from_text, generate_sync, inspect};
