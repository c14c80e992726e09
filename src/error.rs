//! Error types for the edgequake-article2pdf library.
//!
//! Failures fall into two groups:
//!
//! * **Fatal**: [`ArticleError`] and the per-service errors it wraps
//!   ([`GenerationError`], [`SearchError`]). The run cannot produce a
//!   document; the top-level `generate*` functions return `Err`.
//!
//! * **Non-fatal**: [`FetchError`] and [`PipelineWarning`]. A single image
//!   could not be downloaded, or the article came back shorter than asked.
//!   These are recorded in [`crate::output::GenerationOutput::warnings`] and
//!   forwarded to the progress callback; the document is still produced.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-article2pdf library.
#[derive(Debug, Error)]
pub enum ArticleError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The topic was empty or whitespace only.
    #[error("Topic must not be empty.\nEnter a subject for the article.")]
    EmptyTopic,

    /// A request field is outside its allowed range.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    // ── Service errors ────────────────────────────────────────────────────
    /// The text-generation service failed.
    #[error(transparent)]
    Generation(#[from] GenerationError),

    /// The image-search service failed and images are required.
    #[error(transparent)]
    Search(#[from] SearchError),

    /// Image search returned nothing and images are required.
    #[error("No images found for '{query}' and images are required.\nLower --images to 0 or drop --require-images.")]
    ImagesRequired { query: String },

    // ── Output errors ─────────────────────────────────────────────────────
    /// PDF serialisation failed.
    #[error("Failed to render PDF: {0}")]
    Render(String),

    /// Could not create or write the output PDF file.
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

/// Failure of the text-generation call.
#[derive(Debug, Clone, Error)]
pub enum GenerationError {
    /// No LLM provider could be created (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    NotConfigured { provider: String, hint: String },

    /// The provider returned an error.
    #[error("Failed to generate text: {message}")]
    Api { message: String },

    /// The provider did not answer within the configured timeout.
    #[error("Failed to generate text: no response after {secs}s")]
    Timeout { secs: u64 },

    /// The provider answered with no usable text.
    #[error("Failed to generate text: the model returned an empty article")]
    EmptyResponse,
}

/// Failure of the image-search call.
#[derive(Debug, Clone, Error)]
pub enum SearchError {
    /// No image-search key was configured.
    #[error("Image search is not configured.\nSet PEXELS_API_KEY or pass --pexels-api-key.")]
    MissingApiKey,

    /// The service answered with a non-success status.
    #[error("Failed to search for images: {status} - {body}")]
    Status { status: u16, body: String },

    /// The request never completed.
    #[error("Failed to search for images: {detail}")]
    Transport { detail: String },

    /// The request exceeded the configured timeout.
    #[error("Failed to search for images: no response after {secs}s")]
    Timeout { secs: u64 },

    /// The response body could not be parsed.
    #[error("Failed to search for images: unexpected response ({detail})")]
    Malformed { detail: String },
}

/// Failure to download or decode one image.
///
/// Never fatal: the composer skips the image and carries on.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum FetchError {
    /// Non-success HTTP status.
    #[error("Failed to download image '{url}': {status} - {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    /// Connection, TLS or body-read failure.
    #[error("Failed to download image '{url}': {detail}")]
    Transport { url: String, detail: String },

    /// Download exceeded the configured timeout.
    #[error("Image download timed out after {secs}s for '{url}'")]
    Timeout { url: String, secs: u64 },

    /// The bytes are not a supported image.
    #[error("Image '{url}' could not be decoded: {detail}")]
    Decode { url: String, detail: String },
}

/// A non-fatal event recorded during a run.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum PipelineWarning {
    /// Image search failed; the article is rendered without images.
    #[error("{detail}")]
    ImageSearchFailed { detail: String },

    /// Image search succeeded with zero results.
    #[error("No images found for '{query}'.")]
    NoImagesFound { query: String },

    /// One image was skipped.
    #[error("Image {} skipped: {}", .slot + 1, .error)]
    ImageSkipped { slot: usize, error: FetchError },

    /// The article has fewer paragraphs than requested.
    #[error("Requested {requested} paragraphs but the article has {available}")]
    FewerParagraphs { requested: usize, available: usize },

    /// Fewer images are available than requested.
    #[error("Requested {requested} images but only {available} are available")]
    FewerImages { requested: usize, available: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_status_display_carries_status_and_body() {
        let e = SearchError::Status {
            status: 401,
            body: "Unauthorized".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("401"), "got: {msg}");
        assert!(msg.contains("Unauthorized"), "got: {msg}");
    }

    #[test]
    fn generation_error_converts_into_article_error() {
        let e: ArticleError = GenerationError::Api {
            message: "rate limited".into(),
        }
        .into();
        assert!(matches!(e, ArticleError::Generation(_)));
        assert!(e.to_string().contains("rate limited"));
    }

    #[test]
    fn image_skipped_is_one_indexed() {
        let w = PipelineWarning::ImageSkipped {
            slot: 0,
            error: FetchError::Timeout {
                url: "http://img/1.jpg".into(),
                secs: 30,
            },
        };
        let msg = w.to_string();
        assert!(msg.starts_with("Image 1 skipped"), "got: {msg}");
        assert!(msg.contains("30s"));
    }

    #[test]
    fn warning_round_trips_through_json() {
        let w = PipelineWarning::FewerImages {
            requested: 5,
            available: 2,
        };
        let json = serde_json::to_string(&w).unwrap();
        let back: PipelineWarning = serde_json::from_str(&json).unwrap();
        assert_eq!(back, w);
    }
}
