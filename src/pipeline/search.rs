//! Image search against the Pexels v1 API.
//!
//! The request shape is fixed: landscape photographs, first page, three
//! results per page. At most [`MAX_IMAGE_RESULTS`] URLs are kept, whatever
//! the caller eventually displays, so asking for five images still yields
//! two at most.

use crate::article::ImageSet;
use crate::error::SearchError;
use crate::pipeline::fetch::truncate;
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Results requested per search page.
pub const SEARCH_PAGE_SIZE: usize = 3;

/// Upper bound on URLs returned by one search.
pub const MAX_IMAGE_RESULTS: usize = 2;

/// Finds image URLs for a query.
pub trait ImageSearch: Send + Sync {
    /// Return up to `min(max_results, MAX_IMAGE_RESULTS)` URLs, in result order.
    fn search(
        &self,
        query: &str,
        max_results: usize,
    ) -> impl Future<Output = Result<ImageSet, SearchError>> + Send;
}

/// [`ImageSearch`] backed by the Pexels REST API.
#[derive(Clone)]
pub struct PexelsSearch {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    timeout_secs: u64,
}

impl std::fmt::Debug for PexelsSearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PexelsSearch")
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl PexelsSearch {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: Option<String>,
        timeout_secs: u64,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key,
            timeout_secs,
        })
    }
}

impl ImageSearch for PexelsSearch {
    async fn search(&self, query: &str, max_results: usize) -> Result<ImageSet, SearchError> {
        let Some(ref key) = self.api_key else {
            return Err(SearchError::MissingApiKey);
        };
        info!("Searching images for: {}", query);

        let per_page = SEARCH_PAGE_SIZE.to_string();
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("query", query),
                ("per_page", per_page.as_str()),
                ("page", "1"),
                ("orientation", "landscape"),
            ])
            .header(reqwest::header::AUTHORIZATION, key)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SearchError::Timeout {
                        secs: self.timeout_secs,
                    }
                } else {
                    SearchError::Transport {
                        detail: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| SearchError::Transport {
            detail: e.to_string(),
        })?;

        if !status.is_success() {
            warn!("Image search failed: HTTP {}", status.as_u16());
            return Err(SearchError::Status {
                status: status.as_u16(),
                body: truncate(&body, 200),
            });
        }

        let urls = parse_photos(&body, max_results)?;
        debug!("Image search returned {} URLs", urls.len());
        Ok(urls)
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    photos: Vec<Photo>,
}

#[derive(Debug, Deserialize)]
struct Photo {
    src: PhotoSources,
}

#[derive(Debug, Deserialize)]
struct PhotoSources {
    large: Option<String>,
    large2x: Option<String>,
    original: Option<String>,
}

impl PhotoSources {
    fn best(self) -> Option<String> {
        self.large.or(self.large2x).or(self.original)
    }
}

/// Extract up to `min(max_results, MAX_IMAGE_RESULTS)` URLs from a search
/// response body. Photos without a usable rendition are skipped.
pub fn parse_photos(body: &str, max_results: usize) -> Result<ImageSet, SearchError> {
    let parsed: SearchResponse =
        serde_json::from_str(body).map_err(|e| SearchError::Malformed {
            detail: e.to_string(),
        })?;
    Ok(parsed
        .photos
        .into_iter()
        .filter_map(|p| p.src.best())
        .take(max_results.min(MAX_IMAGE_RESULTS))
        .collect())
}
