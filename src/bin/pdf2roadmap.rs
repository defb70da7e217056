//! CLI binary for pdf2roadmap.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `RoadmapConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf2roadmap::{
    generate, inspect, AbstractPreview, PageSelection, ProgressCallback, RoadmapConfig,
    RoadmapOutput, RoadmapProgressCallback, Stage,
};
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one spinner for the running stage and a log
/// line per finished stage.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Start time of the running stage.
    started: Mutex<Option<Instant>>,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            started: Mutex::new(None),
        })
    }

    fn elapsed_secs(&self) -> f64 {
        self.started
            .lock()
            .ok()
            .and_then(|mut s| s.take())
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }

    fn position(stage: Stage) -> usize {
        Stage::ALL.iter().position(|s| *s == stage).unwrap_or(0) + 1
    }
}

impl RoadmapProgressCallback for CliProgressCallback {
    fn on_stage_start(&self, stage: Stage) {
        if let Ok(mut s) = self.started.lock() {
            *s = Some(Instant::now());
        }
        self.bar.reset_elapsed();
        self.bar.set_prefix(format!(
            "[{}/{}]",
            Self::position(stage),
            Stage::ALL.len()
        ));
        self.bar.set_message(format!("{stage}…"));
    }

    fn on_stage_complete(&self, stage: Stage, summary: &str) {
        let secs = self.elapsed_secs();
        self.bar.println(format!(
            "  {} {:<28}  {}  {}",
            green("✓"),
            stage.to_string(),
            dim(summary),
            dim(&format!("{secs:.1}s")),
        ));
    }

    fn on_stage_error(&self, stage: Stage, error: &str) {
        let secs = self.elapsed_secs();
        // First line only; the full chain is printed on exit.
        let first = error.lines().next().unwrap_or(error);
        self.bar.println(format!(
            "  {} {:<28}  {}  {}",
            red("✗"),
            stage.to_string(),
            red(first),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Generate outputs/diagram.mmd and outputs/diagram.svg
  pdf2roadmap paper.pdf

  # Another output directory
  pdf2roadmap paper.pdf -o roadmaps/attention

  # Only the first three pages, description only (no mmdc needed)
  pdf2roadmap --pages 1-3 --no-render paper.pdf

  # From a URL, with an explicit provider and model
  pdf2roadmap --provider openai --model gpt-4.1-mini https://arxiv.org/pdf/1706.03762

  # Inspect PDF metadata (no API key needed)
  pdf2roadmap --inspect-only paper.pdf

  # JSON output with steps, description and stats
  pdf2roadmap --json paper.pdf > roadmap.json

ENVIRONMENT VARIABLES:
  DEEPSEEK_API_KEY        DeepSeek API key (default provider)
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (deepseek, openai, anthropic, ollama)
  EDGEQUAKE_MODEL         Override model ID
  PDFIUM_LIB_PATH         Path to the pdfium shared library

SETUP:
  1. Set API key:       export DEEPSEEK_API_KEY=sk-...
  2. Install renderer:  npm install -g @mermaid-js/mermaid-cli
  3. Generate:          pdf2roadmap paper.pdf

  Without a global mmdc, `npx mmdc` is used (downloads mermaid-cli on first run).
"#;

/// Generate a technical-roadmap diagram from a research paper PDF.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2roadmap",
    version,
    about = "Generate a technical-roadmap diagram from a research paper PDF",
    long_about = "Extract the research-content steps of a paper (local PDF or URL) with an LLM, \
lay them out next to the generic research process as a Mermaid flowchart, and render it \
to SVG with mermaid-cli.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path or HTTP/HTTPS URL.
    input: String,

    /// Directory receiving diagram.mmd and diagram.svg.
    #[arg(short, long, env = "PDF2ROADMAP_OUTPUT_DIR", default_value = "outputs")]
    output_dir: PathBuf,

    /// LLM model ID (default: deepseek-reasoner).
    #[arg(long, env = "PDF2ROADMAP_MODEL")]
    model: Option<String>,

    /// LLM provider: deepseek, openai, anthropic, gemini, ollama.
    #[arg(
        long,
        env = "PDF2ROADMAP_PROVIDER",
        long_help = "LLM provider. Auto-detected from API key env vars if not set.\n\
          DEEPSEEK_API_KEY selects deepseek; otherwise edgequake-llm auto-detection applies."
    )]
    provider: Option<String>,

    /// Page selection: all, 5, 3-15, or 1,3,5,7.
    #[arg(long, env = "PDF2ROADMAP_PAGES", default_value = "all")]
    pages: String,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDF2ROADMAP_PASSWORD")]
    password: Option<String>,

    /// Path to the pdfium shared library.
    #[arg(long, env = "PDF2ROADMAP_PDFIUM_LIB")]
    pdfium_lib: Option<PathBuf>,

    /// Renderer executable to use instead of mmdc / npx mmdc.
    #[arg(long, env = "PDF2ROADMAP_RENDERER")]
    renderer: Option<PathBuf>,

    /// Minimum characters of extracted text.
    #[arg(long, env = "PDF2ROADMAP_MIN_CHARS", default_value_t = 100)]
    min_chars: usize,

    /// Max LLM output tokens per call.
    #[arg(long, env = "PDF2ROADMAP_MAX_TOKENS")]
    max_tokens: Option<usize>,

    /// Stop after writing diagram.mmd.
    #[arg(long, env = "PDF2ROADMAP_NO_RENDER")]
    no_render: bool,

    /// Output structured JSON (RoadmapOutput).
    #[arg(long, env = "PDF2ROADMAP_JSON")]
    json: bool,

    /// Disable progress spinner.
    #[arg(long, env = "PDF2ROADMAP_NO_PROGRESS")]
    no_progress: bool,

    /// Print PDF metadata only, no generation.
    #[arg(long)]
    inspect_only: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF2ROADMAP_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and the diagram.
    #[arg(short, long, env = "PDF2ROADMAP_QUIET")]
    quiet: bool,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "PDF2ROADMAP_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner replaces INFO logs; --verbose always wins.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.inspect_only;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let progress: Option<Arc<CliProgressCallback>> = show_progress.then(CliProgressCallback::new);
    let config = build_config(
        &cli,
        progress.clone().map(|cb| cb as ProgressCallback),
    )?;

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let meta = inspect(&cli.input, &config)
            .await
            .context("Failed to inspect PDF")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&meta).context("Failed to serialize metadata")?
            );
        } else {
            println!("File:         {}", cli.input);
            if let Some(ref t) = meta.title {
                println!("Title:        {}", t);
            }
            if let Some(ref a) = meta.author {
                println!("Author:       {}", a);
            }
            if let Some(ref s) = meta.subject {
                println!("Subject:      {}", s);
            }
            println!("Pages:        {}", meta.page_count);
            println!("PDF Version:  {}", meta.pdf_version);
            if let Some(ref p) = meta.producer {
                println!("Producer:     {}", p);
            }
        }
        return Ok(());
    }

    // ── Run ──────────────────────────────────────────────────────────────
    let result = generate(&cli.input, &config).await;
    if let Some(ref cb) = progress {
        cb.bar.finish_and_clear();
    }
    let output = result.context("Roadmap generation failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
        return Ok(());
    }

    print_report(&output, cli.quiet);
    Ok(())
}

/// Human-readable result: preview, step counts, Mermaid code, artifacts.
fn print_report(output: &RoadmapOutput, quiet: bool) {
    if !quiet {
        match &output.abstract_preview {
            AbstractPreview::Abstract(text) => {
                eprintln!("{}", bold("Abstract"));
                eprintln!("{}\n", dim(text));
            }
            AbstractPreview::DocumentStart(text) => {
                eprintln!(
                    "{} {}",
                    yellow("⚠"),
                    yellow("No abstract found; showing the start of the document instead")
                );
                eprintln!("{}\n", dim(text));
            }
        }

        eprintln!(
            "{} {} content steps  /  {} process steps",
            cyan("◆"),
            bold(&output.content_steps.len().to_string()),
            output.process_steps.len()
        );
        for (i, step) in output.content_steps.iter().enumerate() {
            eprintln!("   {}. {}", i + 1, step);
        }
        eprintln!();
    }

    // The diagram goes to stdout so it can be piped.
    println!("{}", output.description);

    if !quiet {
        eprintln!();
        eprintln!(
            "{}  {}",
            green("✔"),
            bold(&output.description_path.display().to_string())
        );
        match &output.image_path {
            Some(svg) => eprintln!("{}  {}", green("✔"), bold(&svg.display().to_string())),
            None => eprintln!("{}", dim("   rendering skipped (--no-render)")),
        }
        eprintln!(
            "   {} tokens in  /  {} tokens out  |  {}ms total",
            dim(&output.stats.total_input_tokens.to_string()),
            dim(&output.stats.total_output_tokens.to_string()),
            output.stats.total_duration_ms,
        );
    }
}

/// Map CLI args to `RoadmapConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<RoadmapConfig> {
    let pages = parse_pages(&cli.pages)?;

    let mut builder = RoadmapConfig::builder()
        .output_dir(&cli.output_dir)
        .pages(pages)
        .min_text_chars(cli.min_chars)
        .render(!cli.no_render)
        .download_timeout_secs(cli.download_timeout);

    if let Some(ref model) = cli.model {
        builder = builder.model(model);
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider);
    }
    if let Some(ref password) = cli.password {
        builder = builder.password(password);
    }
    if let Some(ref lib) = cli.pdfium_lib {
        builder = builder.pdfium_lib_path(lib);
    }
    if let Some(ref renderer) = cli.renderer {
        builder = builder.renderer_command(renderer);
    }
    if let Some(n) = cli.max_tokens {
        builder = builder.max_tokens(n);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Parse `--pages` string into `PageSelection`.
fn parse_pages(s: &str) -> Result<PageSelection> {
    let s = s.trim().to_lowercase();

    if s == "all" {
        return Ok(PageSelection::All);
    }

    // Range: "3-15"
    if let Some((start, end)) = s.split_once('-') {
        let start: usize = start
            .trim()
            .parse()
            .context("Invalid start page in range")?;
        let end: usize = end.trim().parse().context("Invalid end page in range")?;

        if start < 1 {
            anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", start);
        }
        if start > end {
            anyhow::bail!("Invalid page range '{}-{}': start must be <= end", start, end);
        }

        return Ok(PageSelection::Range(start, end));
    }

    // Set: "1,3,5,7"
    if s.contains(',') {
        let pages: Vec<usize> = s
            .split(',')
            .map(|p| {
                p.trim()
                    .parse::<usize>()
                    .with_context(|| format!("Invalid page number: '{}'", p.trim()))
            })
            .collect::<Result<Vec<_>>>()?;

        if let Some(&p) = pages.iter().find(|&&p| p < 1) {
            anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", p);
        }

        return Ok(PageSelection::Set(pages));
    }

    // Single page: "5"
    let page: usize = s.parse().context("Invalid page number")?;
    if page < 1 {
        anyhow::bail!("Pages are 1-indexed, minimum is 1 (got {})", page);
    }

    Ok(PageSelection::Single(page))
}
