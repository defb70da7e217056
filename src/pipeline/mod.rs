//! Pipeline stages for PDF-to-roadmap generation.
//!
//! Each submodule implements exactly one step, so each can be tested
//! without the others.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ text ──▶ preview ──▶ steps ──▶ diagram ──▶ render
//! (path/URL) (pdfium) (gate)    (LLM #1)  (LLM #2)    (mmdc)
//! ```
//!
//! 1. [`input`]   — canonicalise the path, URL or upload to a local file
//! 2. [`text`]    — extract page text; runs in `spawn_blocking` because
//!    pdfium is not async-safe
//! 3. [`preview`] — abstract preview and the minimum-length gate
//! 4. [`steps`]   — content steps from the model, parsed defensively
//! 5. [`diagram`] — Mermaid description from the model
//! 6. [`render`]  — run the external renderer to produce the SVG

pub mod diagram;
pub mod input;
pub mod preview;
pub mod render;
pub mod steps;
pub mod text;
