//! Generative-text providers used to translate and generate recipes.

mod fake;
mod gemini;

pub use fake::FakeProvider;
pub use gemini::GeminiProvider;

use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("API request failed: {0}")]
    RequestFailed(String),

    #[error("API returned error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Rate limited, retry after {retry_after_secs:?} seconds")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("Provider not configured: {0}")]
    NotConfigured(String),
}

/// A text-completion backend.
#[async_trait]
pub trait LlmProvider: Send + Sync + fmt::Debug {
    /// Sends `prompt` and returns the model's text.
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;

    fn provider_name(&self) -> &'static str;

    fn model_name(&self) -> &str;
}

/// Builds the Gemini provider when an API key is available.
pub fn provider_from_key(
    api_key: Option<&str>,
    base_url: Option<&str>,
) -> Result<Box<dyn LlmProvider>, LlmError> {
    let key = api_key
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| LlmError::NotConfigured("GEMINI_API_KEY not set".to_string()))?;
    let mut provider = GeminiProvider::with_default_model(key.to_string());
    if let Some(url) = base_url {
        provider = provider.with_base_url(url);
    }
    Ok(Box::new(provider))
}
