//! Request and generator configuration.
//!
//! Two structs split the knobs by lifetime:
//!
//! * [`ArticleRequest`]: what one submission asks for (topic, paragraph and
//!   image counts, body font). Built per run, immutable afterwards.
//! * [`GeneratorConfig`]: how the process talks to the outside world
//!   (provider, API key, timeouts, cache TTL, theme strategy). Built once at
//!   startup and shared by every run.
//!
//! Both are built through builders; `build()` validates.

use crate::error::ArticleError;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Pexels search endpoint used when none is configured.
pub const DEFAULT_SEARCH_ENDPOINT: &str = "https://api.pexels.com/v1/search";

/// Default memoisation window for provider calls, in seconds.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 900;

// ── ArticleRequest ───────────────────────────────────────────────────────

/// One user submission.
///
/// # Example
/// ```rust
/// use edgequake_article2pdf::{ArticleRequest, FontFamily};
///
/// let request = ArticleRequest::builder("volcanoes")
///     .paragraph_count(2)
///     .image_count(1)
///     .font_family(FontFamily::TimesNewRoman)
///     .build()
///     .unwrap();
/// assert_eq!(request.topic(), "volcanoes");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRequest {
    topic: String,
    paragraph_count: u8,
    image_count: u8,
    font_size: u8,
    font_family: FontFamily,
}

impl ArticleRequest {
    pub const PARAGRAPHS: (u8, u8) = (1, 10);
    pub const IMAGES: (u8, u8) = (0, 5);
    pub const FONT_SIZES: (u8, u8) = (8, 24);

    /// Start a builder with the form defaults: 3 paragraphs, 2 images,
    /// 12 pt Arial.
    pub fn builder(topic: impl Into<String>) -> ArticleRequestBuilder {
        ArticleRequestBuilder {
            request: ArticleRequest {
                topic: topic.into(),
                paragraph_count: 3,
                image_count: 2,
                font_size: 12,
                font_family: FontFamily::default(),
            },
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn paragraph_count(&self) -> usize {
        self.paragraph_count as usize
    }

    pub fn image_count(&self) -> usize {
        self.image_count as usize
    }

    pub fn font_size(&self) -> u8 {
        self.font_size
    }

    pub fn font_family(&self) -> FontFamily {
        self.font_family
    }

    /// The subset of the request that drives layout.
    pub fn style(&self) -> ComposeConfig {
        ComposeConfig {
            paragraph_count: self.paragraph_count(),
            image_count: self.image_count(),
            font_size: self.font_size as f32,
            font_family: self.font_family,
        }
    }
}

/// Builder for [`ArticleRequest`].
#[derive(Debug)]
pub struct ArticleRequestBuilder {
    request: ArticleRequest,
}

impl ArticleRequestBuilder {
    pub fn paragraph_count(mut self, n: u8) -> Self {
        self.request.paragraph_count = n;
        self
    }

    pub fn image_count(mut self, n: u8) -> Self {
        self.request.image_count = n;
        self
    }

    pub fn font_size(mut self, size: u8) -> Self {
        self.request.font_size = size;
        self
    }

    pub fn font_family(mut self, family: FontFamily) -> Self {
        self.request.font_family = family;
        self
    }

    /// Validate and build. The topic is trimmed.
    pub fn build(mut self) -> Result<ArticleRequest, ArticleError> {
        let topic = self.request.topic.trim();
        if topic.is_empty() {
            return Err(ArticleError::EmptyTopic);
        }
        self.request.topic = topic.to_string();

        let r = &self.request;
        check_range("paragraph count", r.paragraph_count, ArticleRequest::PARAGRAPHS)?;
        check_range("image count", r.image_count, ArticleRequest::IMAGES)?;
        check_range("font size", r.font_size, ArticleRequest::FONT_SIZES)?;
        Ok(self.request)
    }
}

fn check_range(what: &str, value: u8, (min, max): (u8, u8)) -> Result<(), ArticleError> {
    if value < min || value > max {
        return Err(ArticleError::InvalidRequest(format!(
            "{what} must be {min}–{max}, got {value}"
        )));
    }
    Ok(())
}

/// Layout parameters handed to the composer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComposeConfig {
    pub paragraph_count: usize,
    pub image_count: usize,
    pub font_size: f32,
    pub font_family: FontFamily,
}

impl Default for ComposeConfig {
    fn default() -> Self {
        Self {
            paragraph_count: 3,
            image_count: 2,
            font_size: 12.0,
            font_family: FontFamily::default(),
        }
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Body font offered by the form.
///
/// Only the PDF standard-14 faces are used, so nothing is embedded:
/// Arial and Verdana map to Helvetica, Times New Roman to Times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FontFamily {
    #[default]
    Arial,
    TimesNewRoman,
    Courier,
    Verdana,
}

impl FontFamily {
    /// Form label.
    pub fn label(self) -> &'static str {
        match self {
            FontFamily::Arial => "Arial",
            FontFamily::TimesNewRoman => "Times New Roman",
            FontFamily::Courier => "Courier",
            FontFamily::Verdana => "Verdana",
        }
    }
}

impl fmt::Display for FontFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How the document colours are chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ThemeStrategy {
    /// Gray background derived from the topic; black or white text by
    /// lightness. Same topic, same colours.
    #[default]
    Deterministic,
    /// Random dark background (each channel 0–100), white text.
    Randomized,
}

// ── GeneratorConfig ──────────────────────────────────────────────────────

/// Process-wide configuration for [`crate::generate::ArticleGenerator`].
///
/// # Example
/// ```rust
/// use edgequake_article2pdf::GeneratorConfig;
///
/// let config = GeneratorConfig::builder()
///     .pexels_api_key("key")
///     .model("gpt-4.1-nano")
///     .cache_ttl_secs(0)
///     .build()
///     .unwrap();
/// assert_eq!(config.cache_ttl_secs, 0);
/// ```
#[derive(Clone)]
pub struct GeneratorConfig {
    /// LLM model identifier. If None, uses the provider default.
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature. Default: 0.7.
    pub temperature: f32,

    /// Maximum tokens for the article. Default: 2048.
    pub max_tokens: usize,

    /// Custom system prompt. If None, uses [`crate::prompts::ARTICLE_SYSTEM_PROMPT`].
    pub system_prompt: Option<String>,

    /// Pexels API key. Never logged.
    pub pexels_api_key: Option<String>,

    /// Image-search endpoint. Default: [`DEFAULT_SEARCH_ENDPOINT`].
    pub search_endpoint: String,

    /// Timeout for the text-generation call, in seconds. Default: 30.
    pub api_timeout_secs: u64,

    /// Timeout for each image search / image download, in seconds. Default: 30.
    pub http_timeout_secs: u64,

    /// Memoisation window for text and search calls; 0 disables. Default: 900.
    pub cache_ttl_secs: u64,

    /// Colour strategy. Default: deterministic.
    pub theme: ThemeStrategy,

    /// Abort the run when images were requested but none can be found.
    /// Default: false (degrade to text-only).
    pub require_images: bool,

    /// Optional stage/warning callback.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.7,
            max_tokens: 2048,
            system_prompt: None,
            pexels_api_key: None,
            search_endpoint: DEFAULT_SEARCH_ENDPOINT.to_string(),
            api_timeout_secs: 30,
            http_timeout_secs: 30,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            theme: ThemeStrategy::default(),
            require_images: false,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for GeneratorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratorConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("pexels_api_key", &self.pexels_api_key.as_ref().map(|_| "<redacted>"))
            .field("search_endpoint", &self.search_endpoint)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("cache_ttl_secs", &self.cache_ttl_secs)
            .field("theme", &self.theme)
            .field("require_images", &self.require_images)
            .finish()
    }
}

impl GeneratorConfig {
    /// Create a new builder for `GeneratorConfig`.
    pub fn builder() -> GeneratorConfigBuilder {
        GeneratorConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`GeneratorConfig`].
#[derive(Debug)]
pub struct GeneratorConfigBuilder {
    config: GeneratorConfig,
}

impl GeneratorConfigBuilder {
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

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn pexels_api_key(mut self, key: impl Into<String>) -> Self {
        self.config.pexels_api_key = Some(key.into());
        self
    }

    pub fn search_endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.search_endpoint = url.into();
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn http_timeout_secs(mut self, secs: u64) -> Self {
        self.config.http_timeout_secs = secs;
        self
    }

    pub fn cache_ttl_secs(mut self, secs: u64) -> Self {
        self.config.cache_ttl_secs = secs;
        self
    }

    pub fn theme(mut self, strategy: ThemeStrategy) -> Self {
        self.config.theme = strategy;
        self
    }

    pub fn require_images(mut self, v: bool) -> Self {
        self.config.require_images = v;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<GeneratorConfig, ArticleError> {
        let c = &self.config;
        if c.api_timeout_secs == 0 || c.http_timeout_secs == 0 {
            return Err(ArticleError::InvalidConfig(
                "Timeouts must be ≥ 1 second".into(),
            ));
        }
        if !(c.search_endpoint.starts_with("http://") || c.search_endpoint.starts_with("https://"))
        {
            return Err(ArticleError::InvalidConfig(format!(
                "Search endpoint must be an HTTP/HTTPS URL, got '{}'",
                c.search_endpoint
            )));
        }
        if c.max_tokens == 0 {
            return Err(ArticleError::InvalidConfig("max_tokens must be ≥ 1".into()));
        }
        Ok(self.config)
    }
}
