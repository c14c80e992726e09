//! Orchestration: request → article text → images → pages → PDF.
//!
//! [`ArticleGenerator`] owns its providers, so tests and embedders can swap
//! any of them. [`DefaultGenerator::from_config`] wires up the production
//! stack: an `edgequake-llm` text source and a Pexels search client, both
//! behind the shared TTL cache, plus a plain HTTP image fetcher.
//!
//! The free `generate*` functions draw their caches from a process-wide
//! registry keyed by the provider setup, so repeated calls with the same
//! [`GeneratorConfig`] reuse earlier completions and search results.
//!
//! A run is strictly sequential. Text generation failing is always fatal;
//! image trouble is fatal only with `require_images`, otherwise the article
//! is rendered with whatever images could be placed.

use crate::article::{GeneratedArticle, ImageSet};
use crate::config::{ArticleRequest, GeneratorConfig};
use crate::error::{ArticleError, GenerationError, PipelineWarning};
use crate::output::{DownloadArtifact, GenerationOutput, GenerationStats};
use crate::cache::TtlCache;
use crate::pipeline::cached::{CachedImageSearch, CachedTextSource, SearchCache, TextCache};
use crate::pipeline::compose::DocumentComposer;
use crate::pipeline::fetch::{HttpImageFetcher, ImageFetcher};
use crate::pipeline::llm::{LlmTextSource, TextSource};
use crate::pipeline::render::render_document;
use crate::pipeline::search::{ImageSearch, PexelsSearch};
use crate::pipeline::theme::ColorPolicy;
use crate::progress::{GenerationProgressCallback, NoopProgressCallback, Stage};
use crate::prompts::article_prompt;
use edgequake_llm::{LLMProvider, ProviderFactory};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Model used when a provider is named without one.
pub const DEFAULT_MODEL: &str = "gpt-4.1-nano";

/// The generator [`DefaultGenerator::from_config`] builds.
pub type DefaultGenerator = ArticleGenerator<
    CachedTextSource<LlmTextSource>,
    CachedImageSearch<PexelsSearch>,
    HttpImageFetcher,
>;

/// Runs the article pipeline with injected providers.
///
/// Keep one generator around to benefit from the TTL cache across runs.
pub struct ArticleGenerator<T, S, F> {
    text: T,
    search: S,
    fetcher: F,
    config: GeneratorConfig,
    composer: DocumentComposer,
}

impl<T, S, F> ArticleGenerator<T, S, F>
where
    T: TextSource,
    S: ImageSearch,
    F: ImageFetcher,
{
    pub fn new(text: T, search: S, fetcher: F, config: GeneratorConfig) -> Self {
        Self {
            text,
            search,
            fetcher,
            config,
            composer: DocumentComposer::new(),
        }
    }

    /// Replace the default A4 composer.
    pub fn with_composer(mut self, composer: DocumentComposer) -> Self {
        self.composer = composer;
        self
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Generate one article PDF.
    ///
    /// # Errors
    /// - [`ArticleError::Generation`] if the text call fails or yields no
    ///   paragraph
    /// - [`ArticleError::Search`] / [`ArticleError::ImagesRequired`] only
    ///   when `require_images` is set
    /// - [`ArticleError::Render`] if the PDF cannot be assembled
    pub async fn run(&self, request: &ArticleRequest) -> Result<GenerationOutput, ArticleError> {
        let total_start = Instant::now();
        let topic = request.topic();
        let progress: &dyn GenerationProgressCallback = self
            .config
            .progress_callback
            .as_deref()
            .unwrap_or(&NoopProgressCallback);
        let mut warnings: Vec<PipelineWarning> = Vec::new();
        let mut record = |w: PipelineWarning| {
            warn!("{}", w);
            progress.on_warning(&w);
            warnings.push(w);
        };

        info!(
            "Generating article: '{}' ({} paragraphs, {} images)",
            topic,
            request.paragraph_count(),
            request.image_count()
        );
        progress.on_run_start(topic);

        // ── Step 1: Article text ─────────────────────────────────────────
        progress.on_stage_start(Stage::GenerateText);
        let text_start = Instant::now();
        let prompt = article_prompt(topic, request.paragraph_count());
        let raw = self.text.generate(&prompt).await?;
        let article = GeneratedArticle::from_text(&raw);
        if article.is_empty() {
            return Err(GenerationError::EmptyResponse.into());
        }
        let text_duration_ms = text_start.elapsed().as_millis() as u64;
        debug!(
            "Article has {} paragraph(s), {} chars",
            article.paragraphs.len(),
            article.text.len()
        );

        // ── Step 2: Image search ─────────────────────────────────────────
        let search_start = Instant::now();
        let image_urls: ImageSet = if request.image_count() == 0 {
            Vec::new()
        } else {
            progress.on_stage_start(Stage::SearchImages);
            match self.search.search(topic, request.image_count()).await {
                Ok(urls) if urls.is_empty() => {
                    if self.config.require_images {
                        return Err(ArticleError::ImagesRequired {
                            query: topic.to_string(),
                        });
                    }
                    record(PipelineWarning::NoImagesFound {
                        query: topic.to_string(),
                    });
                    urls
                }
                Ok(urls) => urls,
                Err(e) => {
                    if self.config.require_images {
                        return Err(e.into());
                    }
                    record(PipelineWarning::ImageSearchFailed {
                        detail: e.to_string(),
                    });
                    Vec::new()
                }
            }
        };
        let search_duration_ms = search_start.elapsed().as_millis() as u64;

        // ── Step 3: Theme + layout ───────────────────────────────────────
        let theme = ColorPolicy::new(self.config.theme).pick_theme(Some(topic));
        progress.on_stage_start(Stage::Compose);
        let compose_start = Instant::now();
        let composition = self
            .composer
            .compose(
                topic,
                &article,
                &image_urls,
                &theme,
                &request.style(),
                &self.fetcher,
                progress,
            )
            .await;
        let compose_duration_ms = compose_start.elapsed().as_millis() as u64;
        // Already reported to the callback by the composer.
        warnings.extend(composition.warnings);

        let document = composition.document;
        let page_count = document.page_count();
        let paragraphs_rendered = document.rendered_paragraphs().len();
        let images_rendered = document.image_blocks().count();

        // ── Step 4: PDF ──────────────────────────────────────────────────
        progress.on_stage_start(Stage::Render);
        let render_start = Instant::now();
        let bytes = render_document(document).await?;
        let render_duration_ms = render_start.elapsed().as_millis() as u64;

        let stats = GenerationStats {
            text_duration_ms,
            search_duration_ms,
            compose_duration_ms,
            render_duration_ms,
            total_duration_ms: total_start.elapsed().as_millis() as u64,
        };
        info!(
            "Generation complete: {} page(s), {} image(s), {} warning(s), {}ms total",
            page_count,
            images_rendered,
            warnings.len(),
            stats.total_duration_ms
        );
        progress.on_run_complete(page_count, bytes.len());

        Ok(GenerationOutput {
            article,
            theme,
            pdf: DownloadArtifact::pdf(bytes),
            page_count,
            paragraphs_rendered,
            images_rendered,
            image_urls,
            warnings,
            stats,
        })
    }
}

impl DefaultGenerator {
    /// Build the production stack from `config`.
    ///
    /// The Pexels key falls back to `PEXELS_API_KEY`. A missing key is not
    /// an error here; searches then fail with
    /// [`crate::error::SearchError::MissingApiKey`] and the image policy decides.
    pub fn from_config(config: GeneratorConfig) -> Result<Self, ArticleError> {
        Self::assemble(config, None)
    }

    /// Like [`from_config`](Self::from_config), but reuse `caches` instead of
    /// creating fresh ones. Ignored when `cache_ttl_secs` is zero.
    pub fn from_config_with_caches(
        config: GeneratorConfig,
        caches: SharedCaches,
    ) -> Result<Self, ArticleError> {
        Self::assemble(config, Some(caches))
    }

    fn assemble(
        config: GeneratorConfig,
        caches: Option<SharedCaches>,
    ) -> Result<Self, ArticleError> {
        let provider = resolve_provider(&config)?;
        let mut text = LlmTextSource::new(provider)
            .temperature(config.temperature)
            .max_tokens(config.max_tokens)
            .timeout_secs(config.api_timeout_secs);
        if let Some(ref prompt) = config.system_prompt {
            text = text.system_prompt(prompt.clone());
        }

        let api_key = config.pexels_api_key.clone().or_else(|| {
            std::env::var("PEXELS_API_KEY")
                .ok()
                .filter(|k| !k.is_empty())
        });
        if api_key.is_none() {
            debug!("No Pexels API key configured");
        }
        let search = PexelsSearch::new(
            config.search_endpoint.clone(),
            api_key,
            config.http_timeout_secs,
        )
        .map_err(|e| ArticleError::Internal(format!("HTTP client: {e}")))?;
        let fetcher = HttpImageFetcher::new(config.http_timeout_secs)
            .map_err(|e| ArticleError::Internal(format!("HTTP client: {e}")))?;

        let ttl = Duration::from_secs(config.cache_ttl_secs);
        let (text, search) = match caches {
            Some(caches) if !ttl.is_zero() => (
                CachedTextSource::with_cache(text, caches.text),
                CachedImageSearch::with_cache(search, caches.search),
            ),
            _ => (
                CachedTextSource::new(text, ttl),
                CachedImageSearch::new(search, ttl),
            ),
        };
        Ok(Self::new(text, search, fetcher, config))
    }
}

// ── Shared caches ────────────────────────────────────────────────────────

/// A text cache and a search cache used together by one generator.
#[derive(Debug, Clone)]
pub struct SharedCaches {
    pub text: Arc<TextCache>,
    pub search: Arc<SearchCache>,
}

impl SharedCaches {
    pub fn new(ttl: Duration) -> Self {
        Self {
            text: Arc::new(TtlCache::new(ttl)),
            search: Arc::new(TtlCache::new(ttl)),
        }
    }
}

/// Everything in a [`GeneratorConfig`] that changes what a cached entry
/// would contain. Completions from one model never answer for another.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheScope {
    ttl_secs: u64,
    provider: Option<usize>,
    provider_name: Option<String>,
    model: Option<String>,
    system_prompt: Option<String>,
    temperature_bits: u32,
    max_tokens: usize,
    search_endpoint: String,
}

impl CacheScope {
    fn of(config: &GeneratorConfig) -> Self {
        Self {
            ttl_secs: config.cache_ttl_secs,
            provider: config
                .provider
                .as_ref()
                .map(|p| Arc::as_ptr(p) as *const () as usize),
            provider_name: config.provider_name.clone(),
            model: config.model.clone(),
            system_prompt: config.system_prompt.clone(),
            temperature_bits: config.temperature.to_bits(),
            max_tokens: config.max_tokens,
            search_endpoint: config.search_endpoint.clone(),
        }
    }
}

static SHARED_CACHES: Lazy<Mutex<HashMap<CacheScope, SharedCaches>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Process-wide caches for `config`, or `None` when caching is disabled.
fn shared_caches(config: &GeneratorConfig) -> Option<SharedCaches> {
    if config.cache_ttl_secs == 0 {
        return None;
    }
    let mut registry = SHARED_CACHES
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    let caches = registry
        .entry(CacheScope::of(config))
        .or_insert_with(|| SharedCaches::new(Duration::from_secs(config.cache_ttl_secs)));
    Some(caches.clone())
}

/// Generate an article PDF with the production stack.
///
/// Calls with equal provider settings share one TTL cache, so asking for
/// the same topic twice within `cache_ttl_secs` skips both outbound calls.
///
/// # Example
/// ```rust,no_run
/// use edgequake_article2pdf::{generate, ArticleRequest, GeneratorConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let request = ArticleRequest::builder("volcanoes").build()?;
/// let output = generate(&request, &GeneratorConfig::default()).await?;
/// println!("{} pages, {} bytes", output.page_count, output.pdf.len());
/// # Ok(())
/// # }
/// ```
pub async fn generate(
    request: &ArticleRequest,
    config: &GeneratorConfig,
) -> Result<GenerationOutput, ArticleError> {
    DefaultGenerator::assemble(config.clone(), shared_caches(config))?
        .run(request)
        .await
}

/// Generate and write the PDF to `output_path` (atomic temp + rename).
pub async fn generate_to_file(
    request: &ArticleRequest,
    output_path: impl AsRef<Path>,
    config: &GeneratorConfig,
) -> Result<GenerationOutput, ArticleError> {
    let output = generate(request, config).await?;
    output.pdf.write_to(output_path).await?;
    Ok(output)
}

/// Synchronous wrapper around [`generate`].
///
/// Creates a temporary tokio runtime internally.
pub fn generate_sync(
    request: &ArticleRequest,
    config: &GeneratorConfig,
) -> Result<GenerationOutput, ArticleError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ArticleError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(generate(request, config))
}

// ── Internal helpers ─────────────────────────────────────────────────────

fn create_text_provider(
    provider_name: &str,
    model: &str,
) -> Result<Arc<dyn LLMProvider>, ArticleError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        GenerationError::NotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
        .into()
    })
}

/// Resolve the LLM provider, from most-specific to least-specific.
///
/// 1. **Pre-built provider** (`config.provider`), used as-is.
/// 2. **Named provider + model** (`config.provider_name`); the factory reads
///    the matching API key from the environment.
/// 3. **Environment pair** `EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`,
///    honoured only when both are set.
/// 4. **`OPENAI_API_KEY`** present → OpenAI with the configured or default model.
/// 5. **Full auto-detection** via `ProviderFactory::from_env`.
fn resolve_provider(config: &GeneratorConfig) -> Result<Arc<dyn LLMProvider>, ArticleError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
        return create_text_provider(name, model);
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_text_provider(&prov, &model);
        }
    }

    // With several keys present, OpenAI wins unless another provider is named.
    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
            return create_text_provider("openai", model);
        }
    }

    let (llm_provider, _embedding) = ProviderFactory::from_env().map_err(|e| {
        ArticleError::from(GenerationError::NotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or configure a provider.\n\
                Error: {}",
                e
            ),
        })
    })?;

    Ok(llm_provider)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_configs_share_one_cache_pair() {
        let config = GeneratorConfig::builder()
            .model("cache-scope-test-a")
            .build()
            .unwrap();
        let a = shared_caches(&config).expect("caching on by default");
        let b = shared_caches(&config.clone()).unwrap();
        assert!(Arc::ptr_eq(&a.text, &b.text));
        assert!(Arc::ptr_eq(&a.search, &b.search));

        a.text.insert("prompt".into(), "article".into());
        assert_eq!(b.text.get(&"prompt".to_string()).as_deref(), Some("article"));
    }

    #[test]
    fn different_models_get_separate_caches() {
        let a = GeneratorConfig::builder()
            .model("cache-scope-test-b")
            .build()
            .unwrap();
        let b = GeneratorConfig::builder()
            .model("cache-scope-test-c")
            .build()
            .unwrap();
        let ca = shared_caches(&a).unwrap();
        let cb = shared_caches(&b).unwrap();
        assert!(!Arc::ptr_eq(&ca.text, &cb.text));
    }

    #[test]
    fn zero_ttl_disables_shared_caches() {
        let config = GeneratorConfig::builder()
            .cache_ttl_secs(0)
            .build()
            .unwrap();
        assert!(shared_caches(&config).is_none());
    }
}
