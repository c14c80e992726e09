//! Text generation: one chat-completion call per article.
//!
//! This module is intentionally thin. Prompt wording lives in
//! [`crate::prompts`]; this file only builds the message list, bounds the
//! call with a timeout and maps provider failures onto [`GenerationError`].
//! There is no retry: a failed call fails the run.

use crate::error::GenerationError;
use crate::prompts::ARTICLE_SYSTEM_PROMPT;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{timeout, Duration};
use tracing::{debug, warn};

/// Produces article text from a prompt.
pub trait TextSource: Send + Sync {
    fn generate(&self, prompt: &str) -> impl Future<Output = Result<String, GenerationError>> + Send;
}

/// [`TextSource`] backed by an `edgequake-llm` provider.
#[derive(Clone)]
pub struct LlmTextSource {
    provider: Arc<dyn LLMProvider>,
    system_prompt: String,
    temperature: f32,
    max_tokens: usize,
    timeout_secs: u64,
}

impl std::fmt::Debug for LlmTextSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmTextSource")
            .field("provider", &"<dyn LLMProvider>")
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl LlmTextSource {
    pub fn new(provider: Arc<dyn LLMProvider>) -> Self {
        Self {
            provider,
            system_prompt: ARTICLE_SYSTEM_PROMPT.to_string(),
            temperature: 0.7,
            max_tokens: 2048,
            timeout_secs: 30,
        }
    }

    /// Replace the default system prompt.
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.temperature = t;
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.max_tokens = n;
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// Build `CompletionOptions` from the sampling settings.
fn build_options(temperature: f32, max_tokens: usize) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(temperature),
        max_tokens: Some(max_tokens),
        ..Default::default()
    }
}

impl TextSource for LlmTextSource {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let start = Instant::now();
        let messages = vec![
            ChatMessage::system(&self.system_prompt),
            ChatMessage::user(prompt),
        ];
        let options = build_options(self.temperature, self.max_tokens);

        let call = self.provider.chat(&messages, Some(&options));
        let response = match timeout(Duration::from_secs(self.timeout_secs), call).await {
            Err(_) => {
                warn!("Text generation timed out after {}s", self.timeout_secs);
                return Err(GenerationError::Timeout {
                    secs: self.timeout_secs,
                });
            }
            Ok(Err(e)) => {
                warn!("Text generation failed: {}", e);
                return Err(GenerationError::Api {
                    message: e.to_string(),
                });
            }
            Ok(Ok(response)) => response,
        };

        debug!(
            "Article: {} input tokens, {} output tokens, {:?}",
            response.prompt_tokens,
            response.completion_tokens,
            start.elapsed()
        );

        if response.content.trim().is_empty() {
            return Err(GenerationError::EmptyResponse);
        }
        Ok(response.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_options_carries_sampling_settings() {
        let opts = build_options(0.2, 512);
        assert_eq!(opts.temperature, Some(0.2));
        assert_eq!(opts.max_tokens, Some(512));
    }
}
