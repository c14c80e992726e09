//! Output types: the downloadable PDF and the run summary.

use crate::article::GeneratedArticle;
use crate::error::{ArticleError, PipelineWarning};
use crate::pipeline::theme::Theme;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Fixed download filename.
pub const PDF_FILENAME: &str = "generated_article.pdf";

/// MIME type of the artifact.
pub const PDF_MIME: &str = "application/pdf";

/// The finished PDF, ready to save or hand out as a download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadArtifact {
    pub filename: String,
    pub mime_type: String,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

impl DownloadArtifact {
    pub fn pdf(bytes: Vec<u8>) -> Self {
        Self {
            filename: PDF_FILENAME.to_string(),
            mime_type: PDF_MIME.to_string(),
            bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// `data:application/pdf;base64,…`, usable as a download link.
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.bytes))
    }

    /// Write the PDF to `path` atomically (temp file + rename), creating
    /// parent directories as needed.
    pub async fn write_to(&self, path: impl AsRef<Path>) -> Result<(), ArticleError> {
        let path = path.as_ref();
        let fail = |source: std::io::Error| ArticleError::OutputWriteFailed {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(fail)?;
            }
        }

        let tmp_path = path.with_extension("pdf.tmp");
        tokio::fs::write(&tmp_path, &self.bytes).await.map_err(fail)?;
        tokio::fs::rename(&tmp_path, path).await.map_err(fail)?;
        debug!("Wrote {} bytes to {}", self.bytes.len(), path.display());
        Ok(())
    }
}

/// Wall-clock time spent in each stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationStats {
    pub text_duration_ms: u64,
    pub search_duration_ms: u64,
    pub compose_duration_ms: u64,
    pub render_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Everything a run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationOutput {
    pub article: GeneratedArticle,
    pub theme: Theme,
    pub pdf: DownloadArtifact,
    pub page_count: usize,
    /// Paragraphs that made it into the document.
    pub paragraphs_rendered: usize,
    /// Images that were fetched and placed.
    pub images_rendered: usize,
    /// URLs returned by image search, whether or not they were placed.
    pub image_urls: Vec<String>,
    pub warnings: Vec<PipelineWarning>,
    pub stats: GenerationStats,
}
