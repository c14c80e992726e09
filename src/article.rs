//! Generated article text and its paragraph split.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Image URLs returned by the search stage, in result order.
pub type ImageSet = Vec<String>;

// A blank line may carry stray spaces or tabs.
static RE_PARAGRAPH_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n[ \t]*\n").unwrap());

/// Article text as returned by the model, plus its paragraphs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedArticle {
    /// Raw text, line endings normalised to `\n`.
    pub text: String,
    /// Non-empty paragraphs in order, each trimmed.
    pub paragraphs: Vec<String>,
}

impl GeneratedArticle {
    /// Split raw model output into paragraphs on blank-line boundaries.
    ///
    /// Single newlines inside a paragraph are kept; the layout stage treats
    /// them as hard line breaks.
    pub fn from_text(raw: &str) -> Self {
        let text = raw.replace("\r\n", "\n").replace('\r', "\n");
        let paragraphs = RE_PARAGRAPH_BREAK
            .split(&text)
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect();
        Self { text, paragraphs }
    }

    /// True when the model produced no usable paragraph.
    pub fn is_empty(&self) -> bool {
        self.paragraphs.is_empty()
    }
}
