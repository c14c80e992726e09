//! TTL-cached wrappers around the text and image-search providers.
//!
//! Both wrappers share one rule: only successful results are stored, so a
//! transient failure is retried on the next run rather than replayed for the
//! whole TTL. A wrapper built with [`CachedTextSource::passthrough`] (or the
//! search equivalent) forwards every call.

use crate::article::ImageSet;
use crate::cache::TtlCache;
use crate::error::{GenerationError, SearchError};
use crate::pipeline::llm::TextSource;
use crate::pipeline::search::ImageSearch;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Cache for generated text, keyed by prompt.
pub type TextCache = TtlCache<String, String>;

/// Cache for search results, keyed by `(query, max_results)`.
pub type SearchCache = TtlCache<(String, usize), ImageSet>;

/// [`TextSource`] that memoises successful completions per prompt.
pub struct CachedTextSource<T> {
    inner: T,
    cache: Option<Arc<TextCache>>,
}

impl<T: TextSource> CachedTextSource<T> {
    /// Wrap `inner` with a fresh cache. A zero TTL disables caching.
    pub fn new(inner: T, ttl: Duration) -> Self {
        if ttl.is_zero() {
            return Self::passthrough(inner);
        }
        Self::with_cache(inner, Arc::new(TtlCache::new(ttl)))
    }

    /// Share an existing cache, e.g. across generators.
    pub fn with_cache(inner: T, cache: Arc<TextCache>) -> Self {
        Self {
            inner,
            cache: Some(cache),
        }
    }

    pub fn passthrough(inner: T) -> Self {
        Self { inner, cache: None }
    }

    pub fn cache(&self) -> Option<&Arc<TextCache>> {
        self.cache.as_ref()
    }
}

impl<T: TextSource> TextSource for CachedTextSource<T> {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let Some(cache) = &self.cache else {
            return self.inner.generate(prompt).await;
        };
        let key = prompt.to_string();
        if let Some(hit) = cache.get(&key) {
            debug!("Text cache hit");
            return Ok(hit);
        }
        let text = self.inner.generate(prompt).await?;
        cache.insert(key, text.clone());
        Ok(text)
    }
}

/// [`ImageSearch`] that memoises successful searches per query.
pub struct CachedImageSearch<S> {
    inner: S,
    cache: Option<Arc<SearchCache>>,
}

impl<S: ImageSearch> CachedImageSearch<S> {
    /// Wrap `inner` with a fresh cache. A zero TTL disables caching.
    pub fn new(inner: S, ttl: Duration) -> Self {
        if ttl.is_zero() {
            return Self::passthrough(inner);
        }
        Self::with_cache(inner, Arc::new(TtlCache::new(ttl)))
    }

    pub fn with_cache(inner: S, cache: Arc<SearchCache>) -> Self {
        Self {
            inner,
            cache: Some(cache),
        }
    }

    pub fn passthrough(inner: S) -> Self {
        Self { inner, cache: None }
    }

    pub fn cache(&self) -> Option<&Arc<SearchCache>> {
        self.cache.as_ref()
    }
}

impl<S: ImageSearch> ImageSearch for CachedImageSearch<S> {
    async fn search(&self, query: &str, max_results: usize) -> Result<ImageSet, SearchError> {
        let Some(cache) = &self.cache else {
            return self.inner.search(query, max_results).await;
        };
        let key = (query.to_string(), max_results);
        if let Some(hit) = cache.get(&key) {
            debug!("Search cache hit for: {}", query);
            return Ok(hit);
        }
        let urls = self.inner.search(query, max_results).await?;
        cache.insert(key, urls.clone());
        Ok(urls)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingText {
        calls: AtomicUsize,
        fail: bool,
    }

    impl TextSource for CountingText {
        async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(GenerationError::Api {
                    message: "boom".into(),
                });
            }
            Ok(format!("text for {prompt}"))
        }
    }

    #[derive(Default)]
    struct CountingSearch {
        calls: AtomicUsize,
    }

    impl ImageSearch for CountingSearch {
        async fn search(&self, query: &str, max_results: usize) -> Result<ImageSet, SearchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok((0..max_results.min(2))
                .map(|i| format!("http://img/{query}/{i}.jpg"))
                .collect())
        }
    }

    #[tokio::test]
    async fn second_prompt_call_is_served_from_cache() {
        let source = CachedTextSource::new(CountingText::default(), Duration::from_secs(900));
        let a = source.generate("volcanoes").await.unwrap();
        let b = source.generate("volcanoes").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(source.inner.calls.load(Ordering::SeqCst), 1);

        source.generate("glaciers").await.unwrap();
        assert_eq!(source.inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let inner = CountingText {
            fail: true,
            ..Default::default()
        };
        let source = CachedTextSource::new(inner, Duration::from_secs(900));
        assert!(source.generate("x").await.is_err());
        assert!(source.generate("x").await.is_err());
        assert_eq!(source.inner.calls.load(Ordering::SeqCst), 2);
        assert!(source.cache().unwrap().is_empty());
    }

    #[tokio::test]
    async fn zero_ttl_is_passthrough() {
        let source = CachedTextSource::new(CountingText::default(), Duration::ZERO);
        assert!(source.cache().is_none());
        source.generate("x").await.unwrap();
        source.generate("x").await.unwrap();
        assert_eq!(source.inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn search_key_includes_max_results() {
        let search = CachedImageSearch::new(CountingSearch::default(), Duration::from_secs(900));
        let two = search.search("volcanoes", 2).await.unwrap();
        let one = search.search("volcanoes", 1).await.unwrap();
        assert_eq!(two.len(), 2);
        assert_eq!(one.len(), 1);
        search.search("volcanoes", 2).await.unwrap();
        assert_eq!(search.inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn shared_cache_is_seen_by_both_wrappers() {
        let cache = Arc::new(SearchCache::new(Duration::from_secs(60)));
        let a = CachedImageSearch::with_cache(CountingSearch::default(), cache.clone());
        let b = CachedImageSearch::with_cache(CountingSearch::default(), cache.clone());
        a.search("tides", 2).await.unwrap();
        b.search("tides", 2).await.unwrap();
        assert_eq!(a.inner.calls.load(Ordering::SeqCst), 1);
        assert_eq!(b.inner.calls.load(Ordering::SeqCst), 0);
        assert_eq!(cache.len(), 1);
    }
}
