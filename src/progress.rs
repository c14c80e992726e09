//! Progress-callback trait for pipeline stage events.
//!
//! Inject an [`Arc<dyn GenerationProgressCallback>`] via
//! [`crate::config::GeneratorConfigBuilder::progress_callback`] to follow a
//! run as it moves through its stages and to receive non-fatal warnings as
//! they happen (the CLI turns them into spinner messages and yellow lines).
//!
//! # Example
//!
//! ```rust
//! use edgequake_article2pdf::{GenerationProgressCallback, GeneratorConfig, PipelineWarning};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct WarningCounter(AtomicUsize);
//!
//! impl GenerationProgressCallback for WarningCounter {
//!     fn on_warning(&self, _warning: &PipelineWarning) {
//!         self.0.fetch_add(1, Ordering::SeqCst);
//!     }
//! }
//!
//! let config = GeneratorConfig::builder()
//!     .progress_callback(Arc::new(WarningCounter(AtomicUsize::new(0))))
//!     .build()
//!     .unwrap();
//! ```

use crate::error::PipelineWarning;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    GenerateText,
    SearchImages,
    Compose,
    Render,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::GenerateText => "Generating article",
            Stage::SearchImages => "Searching images",
            Stage::Compose => "Laying out pages",
            Stage::Render => "Writing PDF",
        })
    }
}

/// Called by the pipeline as a run progresses.
///
/// All methods default to no-ops so callers only override what they need.
pub trait GenerationProgressCallback: Send + Sync {
    /// Called once the request has been validated.
    fn on_run_start(&self, topic: &str) {
        let _ = topic;
    }

    /// Called before each stage starts.
    fn on_stage_start(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called when an image is about to be fetched.
    ///
    /// # Arguments
    /// * `slot`: 0-indexed paragraph slot the image belongs to
    /// * `url`: image URL
    fn on_image_fetch(&self, slot: usize, url: &str) {
        let _ = (slot, url);
    }

    /// Called for every non-fatal warning, in the order they occur.
    fn on_warning(&self, warning: &PipelineWarning) {
        let _ = warning;
    }

    /// Called once after the PDF bytes exist.
    ///
    /// # Arguments
    /// * `page_count`: pages in the document
    /// * `byte_len`: size of the PDF
    fn on_run_complete(&self, page_count: usize, byte_len: usize) {
        let _ = (page_count, byte_len);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl GenerationProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::GeneratorConfig`].
pub type ProgressCallback = Arc<dyn GenerationProgressCallback>;
