//! Configuration types for PDF-to-roadmap generation.
//!
//! All behaviour is controlled through [`RoadmapConfig`], built via its
//! [`RoadmapConfigBuilder`]. Every knob lives in one struct so a run can be
//! logged, cloned, and compared against another run.

use crate::error::RoadmapError;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Default model for both LLM calls.
pub const DEFAULT_MODEL: &str = "deepseek-reasoner";

/// Default artifact directory, relative to the working directory.
pub const DEFAULT_OUTPUT_DIR: &str = "outputs";

/// Configuration for one PDF-to-roadmap run.
///
/// Built via [`RoadmapConfig::builder()`] or using
/// [`RoadmapConfig::default()`].
///
/// # Example
/// ```rust
/// use pdf2roadmap::RoadmapConfig;
///
/// let config = RoadmapConfig::builder()
///     .model("deepseek-reasoner")
///     .output_dir("outputs")
///     .min_text_chars(200)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct RoadmapConfig {
    /// LLM model identifier. Default: `deepseek-reasoner`.
    pub model: Option<String>,

    /// LLM provider name (e.g. "deepseek", "openai", "ollama").
    /// If None along with `provider`, the provider is auto-detected.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature for the step-extraction call. Default: None
    /// (provider default).
    pub step_temperature: Option<f32>,

    /// Sampling temperature for the diagram-description call. Default: 0.0.
    ///
    /// The description must follow a fixed template, so sampling is kept
    /// deterministic.
    pub diagram_temperature: f32,

    /// Maximum tokens per LLM reply. Default: None (provider default).
    pub max_tokens: Option<usize>,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Pages whose text is sent to the model. Default: all pages.
    pub pages: PageSelection,

    /// Explicit path to the pdfium shared library.
    /// Falls back to `PDFIUM_LIB_PATH`, the working directory, then the system.
    pub pdfium_lib_path: Option<PathBuf>,

    /// Directory receiving `diagram.mmd` and `diagram.svg`. Default: `outputs`.
    pub output_dir: PathBuf,

    /// Minimum number of characters of extracted text. Default: 100.
    ///
    /// Scanned PDFs yield little or no text; anything shorter than this is
    /// rejected before any LLM call is made.
    pub min_text_chars: usize,

    /// Run the renderer after writing the description. Default: true.
    pub render: bool,

    /// Diagram renderer settings.
    pub renderer: RendererConfig,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Optional stage-progress callback.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for RoadmapConfig {
    fn default() -> Self {
        Self {
            model: None,
            provider_name: None,
            provider: None,
            step_temperature: None,
            diagram_temperature: 0.0,
            max_tokens: None,
            password: None,
            pages: PageSelection::default(),
            pdfium_lib_path: None,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            min_text_chars: 100,
            render: true,
            renderer: RendererConfig::default(),
            download_timeout_secs: 120,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for RoadmapConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoadmapConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("step_temperature", &self.step_temperature)
            .field("diagram_temperature", &self.diagram_temperature)
            .field("max_tokens", &self.max_tokens)
            .field("pages", &self.pages)
            .field("pdfium_lib_path", &self.pdfium_lib_path)
            .field("output_dir", &self.output_dir)
            .field("min_text_chars", &self.min_text_chars)
            .field("render", &self.render)
            .field("renderer", &self.renderer)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn RoadmapProgressCallback>"),
            )
            .finish()
    }
}

impl RoadmapConfig {
    /// Create a new builder for `RoadmapConfig`.
    pub fn builder() -> RoadmapConfigBuilder {
        RoadmapConfigBuilder {
            config: Self::default(),
        }
    }

    /// The model used for both LLM calls.
    pub fn model_or_default(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    /// Where the diagram description is persisted.
    pub fn description_path(&self) -> PathBuf {
        self.output_dir.join(&self.renderer.description_file_name)
    }

    /// Where the rendered image is written.
    pub fn image_path(&self) -> PathBuf {
        self.output_dir.join(&self.renderer.image_file_name)
    }
}

/// Builder for [`RoadmapConfig`].
#[derive(Debug)]
pub struct RoadmapConfigBuilder {
    config: RoadmapConfig,
}

impl RoadmapConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn step_temperature(mut self, t: f32) -> Self {
        self.config.step_temperature = Some(t.clamp(0.0, 2.0));
        self
    }

    pub fn diagram_temperature(mut self, t: f32) -> Self {
        self.config.diagram_temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = Some(n);
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn pages(mut self, selection: PageSelection) -> Self {
        self.config.pages = selection;
        self
    }

    pub fn pdfium_lib_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_lib_path = Some(path.into());
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn min_text_chars(mut self, n: usize) -> Self {
        self.config.min_text_chars = n;
        self
    }

    pub fn render(mut self, v: bool) -> Self {
        self.config.render = v;
        self
    }

    pub fn renderer(mut self, renderer: RendererConfig) -> Self {
        self.config.renderer = renderer;
        self
    }

    /// Use this executable instead of looking up `mmdc`.
    pub fn renderer_command(mut self, command: impl Into<PathBuf>) -> Self {
        self.config.renderer.command = Some(command.into());
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<RoadmapConfig, RoadmapError> {
        let c = &self.config;
        if c.output_dir.as_os_str().is_empty() {
            return Err(RoadmapError::InvalidConfig(
                "Output directory must not be empty".into(),
            ));
        }
        let r = &c.renderer;
        if r.image_file_name.is_empty() || r.description_file_name.is_empty() {
            return Err(RoadmapError::InvalidConfig(
                "Artifact file names must not be empty".into(),
            ));
        }
        if r.image_file_name == r.description_file_name {
            return Err(RoadmapError::InvalidConfig(format!(
                "Image and description would both be written to '{}'",
                r.image_file_name
            )));
        }
        if let Some(ref m) = c.model {
            if m.trim().is_empty() {
                return Err(RoadmapError::InvalidConfig("Model must not be empty".into()));
            }
        }
        Ok(self.config)
    }
}

// ── Renderer settings ────────────────────────────────────────────────────

/// How the external Mermaid renderer is located and what it writes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RendererConfig {
    /// Explicit renderer executable. When None, `mmdc` is looked up on PATH.
    pub command: Option<PathBuf>,

    /// Package runner used when `mmdc` is not on PATH. Default: `npx`.
    pub runner: String,

    /// Fixed name of the rendered image. Default: `diagram.svg`.
    ///
    /// `mmdc` picks the output format from this extension.
    pub image_file_name: String,

    /// Fixed name of the persisted description. Default: `diagram.mmd`.
    pub description_file_name: String,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            command: None,
            runner: "npx".to_string(),
            image_file_name: "diagram.svg".to_string(),
            description_file_name: "diagram.mmd".to_string(),
        }
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Specifies which pages of the PDF contribute text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageSelection {
    /// Every page (default).
    #[default]
    All,
    /// A single page (1-indexed).
    Single(usize),
    /// A contiguous range of pages (1-indexed, inclusive).
    Range(usize, usize),
    /// Specific pages (1-indexed, deduplicated).
    Set(Vec<usize>),
}

impl PageSelection {
    /// Expand the selection into a sorted, deduplicated list of 0-indexed page numbers.
    pub fn to_indices(&self, total_pages: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = match self {
            PageSelection::All => (0..total_pages).collect(),
            PageSelection::Single(p) => {
                if *p >= 1 && *p <= total_pages {
                    vec![p - 1]
                } else {
                    vec![]
                }
            }
            PageSelection::Range(start, end) => {
                let s = (*start).max(1) - 1;
                let e = (*end).min(total_pages);
                (s..e).collect()
            }
            PageSelection::Set(pages) => pages
                .iter()
                .filter(|&&p| p >= 1 && p <= total_pages)
                .map(|p| p - 1)
                .collect(),
        };
        indices.sort_unstable();
        indices.dedup();
        indices
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_pipeline_contract() {
        let c = RoadmapConfig::default();
        assert_eq!(c.model_or_default(), "deepseek-reasoner");
        assert_eq!(c.diagram_temperature, 0.0);
        assert_eq!(c.min_text_chars, 100);
        assert!(c.render);
        assert_eq!(c.description_path(), PathBuf::from("outputs/diagram.mmd"));
        assert_eq!(c.image_path(), PathBuf::from("outputs/diagram.svg"));
    }

    #[test]
    fn builder_rejects_colliding_artifact_names() {
        let renderer = RendererConfig {
            image_file_name: "diagram.mmd".into(),
            ..RendererConfig::default()
        };
        let err = RoadmapConfig::builder().renderer(renderer).build().unwrap_err();
        assert!(matches!(err, RoadmapError::InvalidConfig(_)));
    }

    #[test]
    fn builder_rejects_blank_model() {
        assert!(RoadmapConfig::builder().model("  ").build().is_err());
    }

    #[test]
    fn builder_clamps_temperature() {
        let c = RoadmapConfig::builder()
            .diagram_temperature(5.0)
            .build()
            .unwrap();
        assert_eq!(c.diagram_temperature, 2.0);
    }

    #[test]
    fn page_selection_to_indices() {
        assert_eq!(PageSelection::All.to_indices(3), vec![0, 1, 2]);
        assert_eq!(PageSelection::Single(4).to_indices(3), Vec::<usize>::new());
        assert_eq!(PageSelection::Range(2, 10).to_indices(3), vec![1, 2]);
        assert_eq!(PageSelection::Set(vec![3, 1, 3]).to_indices(5), vec![0, 2]);
    }
}
