//! CLI binary for edgequake-article2pdf.
//!
//! A thin shim over the library crate that maps CLI flags to an
//! `ArticleRequest` plus `GeneratorConfig`, runs one generation and writes
//! the PDF.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_article2pdf::{
    ArticleRequest, DefaultGenerator, FontFamily, GenerationProgressCallback, GeneratorConfig,
    PipelineWarning, ProgressCallback, Stage, ThemeStrategy,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
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

/// Terminal progress callback: one spinner whose message follows the current
/// stage, with warnings printed above it as they happen.
struct CliProgressCallback {
    bar: ProgressBar,
    warnings: AtomicUsize,
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
            warnings: AtomicUsize::new(0),
        })
    }
}

impl GenerationProgressCallback for CliProgressCallback {
    fn on_run_start(&self, topic: &str) {
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Writing an article about '{topic}'…"))
        ));
    }

    fn on_stage_start(&self, stage: Stage) {
        self.bar.set_prefix(stage.to_string());
        self.bar.set_message("");
    }

    fn on_image_fetch(&self, slot: usize, url: &str) {
        self.bar.set_message(format!("image {} {}", slot + 1, dim(url)));
    }

    fn on_warning(&self, warning: &PipelineWarning) {
        self.warnings.fetch_add(1, Ordering::SeqCst);
        self.bar
            .println(format!("  {} {}", yellow("⚠"), yellow(&warning.to_string())));
    }

    fn on_run_complete(&self, page_count: usize, byte_len: usize) {
        self.bar.finish_and_clear();
        let warnings = self.warnings.load(Ordering::SeqCst);
        eprintln!(
            "{} {} page(s), {} KiB{}",
            if warnings == 0 { green("✔") } else { yellow("⚠") },
            bold(&page_count.to_string()),
            byte_len.div_ceil(1024),
            if warnings == 0 {
                String::new()
            } else {
                format!("  ({warnings} warning(s))")
            }
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Three paragraphs, two images, written to generated_article.pdf
  article2pdf volcanoes

  # Longer text-only article in Times
  article2pdf "deep sea vents" --paragraphs 6 --images 0 --font times -o vents.pdf

  # Fail instead of rendering text-only when no image can be found
  article2pdf glaciers --require-images

  # Random dark theme, print the article text too
  article2pdf "northern lights" --theme random --print-article

  # Machine-readable summary
  article2pdf tides --json > summary.json

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  GEMINI_API_KEY          Google Gemini API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID
  PEXELS_API_KEY          Pexels image-search key

SETUP:
  1. Set API keys:    export OPENAI_API_KEY=sk-...  PEXELS_API_KEY=...
  2. Generate:        article2pdf volcanoes

  Without PEXELS_API_KEY the article is still produced, without images.
"#;

/// Generate an illustrated article about a topic as a PDF.
#[derive(Parser, Debug)]
#[command(
    name = "article2pdf",
    version,
    about = "Generate a short illustrated article about a topic as a PDF",
    long_about = "Ask an LLM for a short article about a topic, find matching photographs \
on Pexels, and typeset both into a themed A4 PDF. Supports OpenAI, Anthropic, Google Gemini, \
Azure OpenAI, and any OpenAI-compatible endpoint (Ollama, vLLM, LiteLLM, etc.).",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Article topic; also the document title.
    topic: String,

    /// Number of paragraphs (1–10).
    #[arg(long, env = "ARTICLE2PDF_PARAGRAPHS", default_value_t = 3,
          value_parser = clap::value_parser!(u8).range(1..=10))]
    paragraphs: u8,

    /// Number of images (0–5). At most two are ever found.
    #[arg(long, env = "ARTICLE2PDF_IMAGES", default_value_t = 2,
          value_parser = clap::value_parser!(u8).range(0..=5))]
    images: u8,

    /// Body font size in points (8–24).
    #[arg(long, env = "ARTICLE2PDF_FONT_SIZE", default_value_t = 12,
          value_parser = clap::value_parser!(u8).range(8..=24))]
    font_size: u8,

    /// Body font.
    #[arg(long, env = "ARTICLE2PDF_FONT", value_enum, default_value = "arial")]
    font: FontArg,

    /// Colour theme.
    #[arg(long, env = "ARTICLE2PDF_THEME", value_enum, default_value = "deterministic")]
    theme: ThemeArg,

    /// Fail when image search fails or finds nothing.
    #[arg(long, env = "ARTICLE2PDF_REQUIRE_IMAGES")]
    require_images: bool,

    /// Where to write the PDF.
    #[arg(short, long, env = "ARTICLE2PDF_OUTPUT", default_value = "generated_article.pdf")]
    output: PathBuf,

    /// Print the generated article text to stdout.
    #[arg(long)]
    print_article: bool,

    /// Print the PDF as a base64 data URI to stdout.
    #[arg(long)]
    data_uri: bool,

    /// Print a JSON run summary to stdout.
    #[arg(long, env = "ARTICLE2PDF_JSON")]
    json: bool,

    /// LLM model ID (e.g. gpt-4.1-nano, gpt-4.1-mini, claude-sonnet-4-20250514).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(
        long,
        env = "EDGEQUAKE_PROVIDER",
        long_help = "LLM provider. Auto-detected from API key env vars if not set.\n\
          Supported: openai, anthropic, gemini, azure, ollama, or any OpenAI-compatible URL."
    )]
    provider: Option<String>,

    /// Pexels API key for image search.
    #[arg(long, env = "PEXELS_API_KEY", hide_env_values = true)]
    pexels_api_key: Option<String>,

    /// Path to a text file containing a custom system prompt.
    #[arg(long, env = "ARTICLE2PDF_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "ARTICLE2PDF_TEMPERATURE", default_value_t = 0.7)]
    temperature: f32,

    /// Max LLM output tokens.
    #[arg(long, env = "ARTICLE2PDF_MAX_TOKENS", default_value_t = 2048)]
    max_tokens: usize,

    /// LLM call timeout in seconds.
    #[arg(long, env = "ARTICLE2PDF_API_TIMEOUT", default_value_t = 30)]
    api_timeout: u64,

    /// Image search and download timeout in seconds.
    #[arg(long, env = "ARTICLE2PDF_HTTP_TIMEOUT", default_value_t = 30)]
    http_timeout: u64,

    /// Disable the provider cache.
    #[arg(long)]
    no_cache: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "ARTICLE2PDF_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "ARTICLE2PDF_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "ARTICLE2PDF_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FontArg {
    Arial,
    Times,
    Courier,
    Verdana,
}

impl From<FontArg> for FontFamily {
    fn from(v: FontArg) -> Self {
        match v {
            FontArg::Arial => FontFamily::Arial,
            FontArg::Times => FontFamily::TimesNewRoman,
            FontArg::Courier => FontFamily::Courier,
            FontArg::Verdana => FontFamily::Verdana,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ThemeArg {
    Deterministic,
    Random,
}

impl From<ThemeArg> for ThemeStrategy {
    fn from(v: ThemeArg) -> Self {
        match v {
            ThemeArg::Deterministic => ThemeStrategy::Deterministic,
            ThemeArg::Random => ThemeStrategy::Randomized,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner provides the feedback that matters; keep library INFO logs
    // out of its way unless asked.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
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

    // ── Build request + config ───────────────────────────────────────────
    let request = ArticleRequest::builder(cli.topic.clone())
        .paragraph_count(cli.paragraphs)
        .image_count(cli.images)
        .font_size(cli.font_size)
        .font_family(cli.font.into())
        .build()
        .context("Invalid request")?;

    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn GenerationProgressCallback>)
    } else {
        None
    };
    let config = build_config(&cli, progress_cb).await?;

    // ── Run ──────────────────────────────────────────────────────────────
    let generator = DefaultGenerator::from_config(config).context("Failed to set up providers")?;
    let output = generator
        .run(&request)
        .await
        .context("Article generation failed")?;

    output
        .pdf
        .write_to(&cli.output)
        .await
        .context("Failed to save PDF")?;

    if cli.print_article {
        println!("{}", output.article.text.trim_end());
    }
    if cli.data_uri {
        println!("{}", output.pdf.data_uri());
    }
    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    }

    if !cli.quiet {
        if !show_progress {
            for w in &output.warnings {
                eprintln!("warning: {w}");
            }
        }
        eprintln!(
            "{}  {} paragraph(s), {}/{} image(s)  {}ms  →  {}",
            if output.warnings.is_empty() {
                green("✔")
            } else {
                yellow("⚠")
            },
            output.paragraphs_rendered,
            output.images_rendered,
            request.image_count(),
            output.stats.total_duration_ms,
            bold(&cli.output.display().to_string()),
        );
    }

    Ok(())
}

/// Map CLI args to `GeneratorConfig`.
async fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<GeneratorConfig> {
    let mut builder = GeneratorConfig::builder()
        .temperature(cli.temperature)
        .max_tokens(cli.max_tokens)
        .api_timeout_secs(cli.api_timeout)
        .http_timeout_secs(cli.http_timeout)
        .theme(cli.theme.into())
        .require_images(cli.require_images);

    if let Some(ref path) = cli.system_prompt {
        let prompt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read system prompt from {:?}", path))?;
        builder = builder.system_prompt(prompt);
    }
    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider.clone());
    }
    if let Some(ref key) = cli.pexels_api_key {
        builder = builder.pexels_api_key(key.clone());
    }
    if cli.no_cache {
        builder = builder.cache_ttl_secs(0);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
