//! Prompts for article generation.
//!
//! Kept in one place so the wording can change without touching the
//! provider or layout code, and so tests can inspect it directly.
//! Callers can override the system prompt via
//! [`crate::config::GeneratorConfig::system_prompt`].

/// Default system prompt sent ahead of the article request.
///
/// The layout stage splits paragraphs on blank lines, so the model is told
/// to produce exactly that shape and nothing else.
pub const ARTICLE_SYSTEM_PROMPT: &str = r#"You are a concise feature writer.

Follow these rules precisely:

1. Write plain prose only: no Markdown, no headings, no bullet lists.
2. Do NOT repeat the title or add a preamble such as "Here is an article".
3. Separate paragraphs with exactly one blank line.
4. Keep each paragraph between three and six sentences.
5. Write exactly the number of paragraphs requested."#;

/// Build the user prompt for a topic and paragraph count.
pub fn article_prompt(topic: &str, paragraphs: usize) -> String {
    format!("Write a short article about {topic} with {paragraphs} paragraphs:")
}
