//! # edgequake-article2pdf
//!
//! Generate a short illustrated article about a topic and lay it out as a
//! downloadable PDF.
//!
//! ## Pipeline Overview
//!
//! ```text
//! topic
//!  │
//!  ├─ 1. Text     one LLM call: "Write a short article about {topic} …"
//!  ├─ 2. Images   Pexels search, up to two landscape photos
//!  ├─ 3. Theme    gray background from the topic, contrasting text
//!  ├─ 4. Compose  title, justified paragraphs, images; pages break as needed
//!  └─ 5. Render   pdf-writer, standard-14 fonts, JPEG images
//! ```
//!
//! Missing images never stop a run by default: a failed search or download
//! becomes a [`PipelineWarning`] and the article is rendered without it.
//! Set [`GeneratorConfig::require_images`] to make image search mandatory.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_article2pdf::{generate_to_file, ArticleRequest, GeneratorConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // LLM provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / …
//!     // Image search key read from PEXELS_API_KEY.
//!     let request = ArticleRequest::builder("volcanoes")
//!         .paragraph_count(3)
//!         .image_count(2)
//!         .build()?;
//!     let output = generate_to_file(&request, "generated_article.pdf", &GeneratorConfig::default()).await?;
//!     for w in &output.warnings {
//!         eprintln!("warning: {w}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `article2pdf` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-article2pdf = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod article;
pub mod cache;
pub mod config;
pub mod document;
pub mod error;
pub mod generate;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use article::{GeneratedArticle, ImageSet};
pub use cache::TtlCache;
pub use config::{
    ArticleRequest, ArticleRequestBuilder, ComposeConfig, FontFamily, GeneratorConfig,
    GeneratorConfigBuilder, ThemeStrategy,
};
pub use document::ComposedDocument;
pub use error::{ArticleError, FetchError, GenerationError, PipelineWarning, SearchError};
pub use generate::{
    generate, generate_sync, generate_to_file, ArticleGenerator, DefaultGenerator, SharedCaches,
};
pub use output::{DownloadArtifact, GenerationOutput, GenerationStats};
pub use pipeline::compose::{Composition, DocumentComposer};
pub use pipeline::fetch::{HttpImageFetcher, ImageFetcher};
pub use pipeline::llm::{LlmTextSource, TextSource};
pub use pipeline::render::render_pdf;
pub use pipeline::search::{ImageSearch, PexelsSearch};
pub use pipeline::theme::{ColorPolicy, Rgb, Theme};
pub use progress::{GenerationProgressCallback, NoopProgressCallback, ProgressCallback, Stage};
