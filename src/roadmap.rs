//! Roadmap generation entry points.
//!
//! Every entry point funnels into the same linear run:
//!
//! ```text
//! text ─▶ preview + gate ─▶ provider ─▶ steps ─▶ gate ─▶ description ─▶ diagram.mmd ─▶ diagram.svg
//! ```
//!
//! Each stage is awaited in turn. The first failure ends the run; nothing
//! is retried.

use crate::config::RoadmapConfig;
use crate::error::RoadmapError;
use crate::output::{DocumentMetadata, RoadmapOutput, RoadmapStats};
use crate::pipeline::{diagram, input, preview, render, steps, text};
use crate::progress::Stage;
use edgequake_llm::{LLMProvider, ProviderFactory};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Generate a roadmap for a PDF file or URL.
///
/// This is the primary entry point for the library.
///
/// # Arguments
/// * `input_str` — Local file path or HTTP/HTTPS URL to a PDF
/// * `config` — Generation configuration
///
/// # Errors
/// - input errors (not found, not a PDF, download failed)
/// - [`RoadmapError::TooLittleText`] for scanned or empty PDFs
/// - [`RoadmapError::ExtractionIncomplete`] when no content steps came back
/// - [`RoadmapError::RendererFailed`] when `mmdc` rejects the description
pub async fn generate(
    input_str: impl AsRef<str>,
    config: &RoadmapConfig,
) -> Result<RoadmapOutput, RoadmapError> {
    let start = Instant::now();
    let input_str = input_str.as_ref();
    info!("Starting roadmap generation: {}", input_str);

    let resolved = input::resolve_input(input_str, config.download_timeout_secs).await?;
    run_from_pdf(resolved.path(), config, start).await
}

/// Generate a roadmap for PDF bytes held in memory (an upload).
///
/// The bytes are written to a managed temp file that is removed on return.
pub async fn generate_from_bytes(
    bytes: &[u8],
    config: &RoadmapConfig,
) -> Result<RoadmapOutput, RoadmapError> {
    let start = Instant::now();
    let resolved = input::resolve_bytes(bytes)?;
    run_from_pdf(resolved.path(), config, start).await
}

/// Generate a roadmap from already-extracted text.
///
/// The length gate runs before any provider is resolved, so text that is
/// too short fails without network access and writes nothing.
pub async fn generate_from_text(
    text: &str,
    config: &RoadmapConfig,
) -> Result<RoadmapOutput, RoadmapError> {
    let source = SourceText {
        text: text.to_string(),
        total_pages: 0,
        pages_read: 0,
        extract_duration_ms: 0,
    };
    run_from_text(source, config, Instant::now()).await
}

/// Synchronous wrapper around [`generate`].
///
/// Creates a temporary tokio runtime internally.
pub fn generate_sync(
    input_str: impl AsRef<str>,
    config: &RoadmapConfig,
) -> Result<RoadmapOutput, RoadmapError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| RoadmapError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(generate(input_str, config))
}

/// Read PDF metadata without extracting text or calling a model.
pub async fn inspect(
    input_str: impl AsRef<str>,
    config: &RoadmapConfig,
) -> Result<DocumentMetadata, RoadmapError> {
    let resolved = input::resolve_input(input_str.as_ref(), config.download_timeout_secs).await?;
    text::extract_metadata(
        resolved.path(),
        config.password.as_deref(),
        config.pdfium_lib_path.as_deref(),
    )
    .await
}

// ── Internal helpers ─────────────────────────────────────────────────────

struct SourceText {
    text: String,
    total_pages: usize,
    pages_read: usize,
    extract_duration_ms: u64,
}

async fn run_from_pdf(
    pdf_path: &Path,
    config: &RoadmapConfig,
    start: Instant,
) -> Result<RoadmapOutput, RoadmapError> {
    stage_start(config, Stage::ExtractText);
    let extract_start = Instant::now();
    let extracted = report(config, Stage::ExtractText, text::extract_text(pdf_path, config).await)?;
    info!(
        "Extracted {} chars from {}/{} pages",
        extracted.text.chars().count(),
        extracted.pages_read,
        extracted.total_pages
    );

    let source = SourceText {
        text: extracted.text,
        total_pages: extracted.total_pages,
        pages_read: extracted.pages_read,
        extract_duration_ms: extract_start.elapsed().as_millis() as u64,
    };
    run_from_text(source, config, start).await
}

async fn run_from_text(
    source: SourceText,
    config: &RoadmapConfig,
    start: Instant,
) -> Result<RoadmapOutput, RoadmapError> {
    // ── Preview + length gate ────────────────────────────────────────────
    let abstract_preview = preview::abstract_preview(&source.text);
    if !abstract_preview.is_abstract() {
        debug!("No abstract heading found; previewing document start");
    }
    let text_chars = report(
        config,
        Stage::ExtractText,
        preview::check_text_quality(&source.text, config.min_text_chars),
    )?;
    stage_complete(config, Stage::ExtractText, &format!("{text_chars} chars"));

    let provider = resolve_provider(config)?;

    // ── LLM #1: content steps ────────────────────────────────────────────
    stage_start(config, Stage::ExtractSteps);
    let steps_start = Instant::now();
    let extracted = report(
        config,
        Stage::ExtractSteps,
        steps::extract_steps(&provider, &source.text, config).await,
    )?;
    let steps_duration_ms = steps_start.elapsed().as_millis() as u64;
    let mut input_tokens = extracted.input_tokens as u64;
    let mut output_tokens = extracted.output_tokens as u64;
    let process_steps = extracted.process_steps.clone();
    let content_steps = report(config, Stage::ExtractSteps, extracted.into_content_steps())?;
    info!(
        "Extracted {} content steps, {} process steps",
        content_steps.len(),
        process_steps.len()
    );
    stage_complete(
        config,
        Stage::ExtractSteps,
        &format!(
            "{} content steps, {} process steps",
            content_steps.len(),
            process_steps.len()
        ),
    );

    // ── LLM #2: diagram description ──────────────────────────────────────
    stage_start(config, Stage::GenerateDiagram);
    let diagram_start = Instant::now();
    let generated = report(
        config,
        Stage::GenerateDiagram,
        diagram::generate_description(&provider, &content_steps, &process_steps, config).await,
    )?;
    let diagram_duration_ms = diagram_start.elapsed().as_millis() as u64;
    input_tokens += generated.input_tokens as u64;
    output_tokens += generated.output_tokens as u64;

    let description_path = config.description_path();
    report(
        config,
        Stage::GenerateDiagram,
        write_atomic(&description_path, &generated.description).await,
    )?;
    stage_complete(
        config,
        Stage::GenerateDiagram,
        &description_path.display().to_string(),
    );

    // ── Render ───────────────────────────────────────────────────────────
    let render_start = Instant::now();
    let image_path = if config.render {
        stage_start(config, Stage::Render);
        let path = report(
            config,
            Stage::Render,
            render::render_diagram(&generated.description, &config.output_dir, &config.renderer)
                .await,
        )?;
        stage_complete(config, Stage::Render, &path.display().to_string());
        Some(path)
    } else {
        debug!("Rendering disabled; stopping after {}", description_path.display());
        None
    };
    let render_duration_ms = render_start.elapsed().as_millis() as u64;

    let stats = RoadmapStats {
        total_pages: source.total_pages,
        pages_read: source.pages_read,
        extract_duration_ms: source.extract_duration_ms,
        steps_duration_ms,
        diagram_duration_ms,
        render_duration_ms,
        total_duration_ms: start.elapsed().as_millis() as u64,
        total_input_tokens: input_tokens,
        total_output_tokens: output_tokens,
    };

    info!("Roadmap complete in {}ms", stats.total_duration_ms);

    Ok(RoadmapOutput {
        text_chars,
        abstract_preview,
        content_steps,
        process_steps,
        description: generated.description,
        description_path,
        image_path,
        stats,
    })
}

fn stage_start(config: &RoadmapConfig, stage: Stage) {
    if let Some(ref cb) = config.progress_callback {
        cb.on_stage_start(stage);
    }
}

fn stage_complete(config: &RoadmapConfig, stage: Stage, summary: &str) {
    if let Some(ref cb) = config.progress_callback {
        cb.on_stage_complete(stage, summary);
    }
}

/// Forward a stage failure to the progress callback, then return the result.
fn report<T>(
    config: &RoadmapConfig,
    stage: Stage,
    result: Result<T, RoadmapError>,
) -> Result<T, RoadmapError> {
    if let (Err(e), Some(cb)) = (&result, config.progress_callback.as_ref()) {
        cb.on_stage_error(stage, &e.to_string());
    }
    result
}

/// Write through a sibling temp file and rename, so readers never see a
/// half-written description.
async fn write_atomic(path: &Path, contents: &str) -> Result<(), RoadmapError> {
    let write_err = |e| RoadmapError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let tmp_path = tmp_sibling(path);
    tokio::fs::write(&tmp_path, contents).await.map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;
    debug!("Wrote {}", path.display());
    Ok(())
}

fn tmp_sibling(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Instantiate a named provider with the given model.
fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, RoadmapError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        RoadmapError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the LLM provider, from most-specific to least-specific.
///
/// 1. **Pre-built provider** (`config.provider`) — used as-is.
/// 2. **Named provider** (`config.provider_name`) with the configured model.
/// 3. **Environment pair** (`EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`);
///    an explicit `config.model` still wins over the env model.
/// 4. **DeepSeek** when `DEEPSEEK_API_KEY` is set.
/// 5. **Full auto-detection** (`ProviderFactory::from_env`).
fn resolve_provider(config: &RoadmapConfig) -> Result<Arc<dyn LLMProvider>, RoadmapError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    let model = config.model_or_default();

    if let Some(ref name) = config.provider_name {
        return create_provider(name, model);
    }

    if let (Ok(prov), Ok(env_model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !env_model.is_empty() {
            let model = config.model.as_deref().unwrap_or(&env_model);
            return create_provider(&prov, model);
        }
    }

    if let Ok(key) = std::env::var("DEEPSEEK_API_KEY") {
        if !key.is_empty() {
            return create_provider("deepseek", model);
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| RoadmapError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set DEEPSEEK_API_KEY (or OPENAI_API_KEY, ANTHROPIC_API_KEY), or pass --provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tmp_sibling_keeps_directory() {
        assert_eq!(
            tmp_sibling(Path::new("outputs/diagram.mmd")),
            PathBuf::from("outputs/diagram.mmd.tmp")
        );
    }

    #[tokio::test]
    async fn write_atomic_creates_parent_and_leaves_no_tmp() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested/diagram.mmd");
        write_atomic(&target, "graph TD\nA-->B").await.unwrap();
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "graph TD\nA-->B");
        assert!(!tmp_sibling(&target).exists());
    }

    #[tokio::test]
    async fn short_text_halts_before_provider_resolution() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("outputs");
        let config = RoadmapConfig::builder().output_dir(&out).build().unwrap();

        let err = generate_from_text("Too short to be a paper.", &config)
            .await
            .err()
            .expect("short text must fail");
        assert!(matches!(err, RoadmapError::TooLittleText { min: 100, .. }));
        assert!(!out.exists());
    }
}
