//! Error types for the pdf2roadmap library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`RoadmapError`] — **Fatal**: the current document cannot be turned into
//!   a roadmap (bad input file, too little text, renderer rejected the
//!   diagram). Returned as `Err(RoadmapError)` from the top-level
//!   `generate*` functions.
//!
//! * [`ParseFailure`] — **Non-fatal**: the model's step reply could not be
//!   parsed. It never propagates on its own; it is carried inside
//!   [`crate::pipeline::steps::StepExtraction::Unparseable`] and only becomes
//!   a [`RoadmapError::ExtractionIncomplete`] when the orchestrator decides
//!   the run cannot continue.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the pdf2roadmap library.
#[derive(Debug, Error)]
pub enum RoadmapError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}\nTry repairing with: qpdf --decrypt input.pdf output.pdf")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// The page selection matched no page of the document.
    #[error("Page {page} is out of range (document has {total} pages)")]
    PageOutOfRange { page: usize, total: usize },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Text extraction needs the pdfium shared library. You can:\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium (or pass --pdfium-lib).\n\
  • Place libpdfium next to the binary or in the working directory.\n\
  • Install it system-wide from https://github.com/bblanchon/pdfium-binaries.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Pipeline errors ───────────────────────────────────────────────────
    /// The extracted text is too short to describe a paper.
    #[error(
        "Extracted text is too short ({chars} characters, need at least {min}).\n\
The PDF is probably scanned or image-only. Provide a text-based PDF."
    )]
    TooLittleText { chars: usize, min: usize },

    /// No usable content steps came back from the model.
    #[error("Roadmap extraction incomplete: {reason}\nCheck the paper content or the extraction prompt.")]
    ExtractionIncomplete { reason: String },

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// The LLM API returned an error.
    #[error("LLM API error during {stage}: {message}")]
    LlmApiError { stage: &'static str, message: String },

    // ── Renderer errors ───────────────────────────────────────────────────
    /// The diagram renderer ran but exited unsuccessfully.
    #[error(
        "Diagram rendering failed ({status})\nCommand: {command}\n{stderr}",
        status = exit_status_label(.exit_code)
    )]
    RendererFailed {
        command: String,
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    /// The diagram renderer could not be started at all.
    #[error("Failed to launch diagram renderer: {command}: {source}\nInstall it with: npm install -g @mermaid-js/mermaid-cli")]
    RendererLaunchFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output artifact.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

fn exit_status_label(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("exit {c}"),
        None => "terminated by signal".to_string(),
    }
}

/// Why a step-extraction reply could not be used.
///
/// Stored in [`crate::pipeline::steps::StepExtraction::Unparseable`] rather
/// than returned as an error.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum ParseFailure {
    /// No `{...}` span in the reply.
    #[error("no JSON object found in model reply")]
    NoJsonObject,

    /// A `{...}` span was found but is not valid JSON.
    #[error("model reply is not valid JSON: {0}")]
    InvalidJson(String),

    /// Valid JSON without a `content_steps` key.
    #[error("model reply has no \"content_steps\" field")]
    MissingContentSteps,

    /// `content_steps` is present but not a list of strings.
    #[error("\"content_steps\" is not a list of strings: {0}")]
    MalformedContentSteps(String),
}
