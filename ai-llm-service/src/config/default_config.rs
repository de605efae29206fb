//! Default model profiles per provider and role.
//!
//! Callers pass in model names and keys they already resolved; nothing here
//! reads the process environment.
//!
//! - **Embedding**: Gemini only, deterministic, short timeout
//! - **Generation**: Groq (default) or Gemini

use crate::config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider};

/// Google Generative Language API base.
pub const GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com";

/// Groq OpenAI-compatible API base (`/v1/...` is appended by the client).
pub const GROQ_ENDPOINT: &str = "https://api.groq.com/openai";

/// Embedding profile backed by Gemini.
///
/// # Defaults
/// - `timeout_secs = Some(30)`
pub fn config_gemini_embedding(model: impl Into<String>, api_key: impl Into<String>) -> LlmModelConfig {
    LlmModelConfig {
        provider: LlmProvider::Gemini,
        model: model.into(),
        endpoint: GEMINI_ENDPOINT.to_string(),
        api_key: Some(api_key.into()),
        max_tokens: None,
        temperature: None,
        top_p: None,
        timeout_secs: Some(30),
    }
}

/// Generation profile for the given provider.
///
/// # Defaults
/// - `temperature = Some(0.2)` when not supplied
/// - `timeout_secs = Some(60)`
pub fn config_generation(
    provider: LlmProvider,
    model: impl Into<String>,
    api_key: impl Into<String>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
) -> LlmModelConfig {
    let endpoint = match provider {
        LlmProvider::Gemini => GEMINI_ENDPOINT,
        LlmProvider::Groq => GROQ_ENDPOINT,
    };
    LlmModelConfig {
        provider,
        model: model.into(),
        endpoint: endpoint.to_string(),
        api_key: Some(api_key.into()),
        max_tokens,
        temperature: temperature.or(Some(0.2)),
        top_p: None,
        timeout_secs: Some(60),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_endpoint_follows_provider() {
        let groq = config_generation(LlmProvider::Groq, "m", "k", None, None);
        assert_eq!(groq.endpoint, GROQ_ENDPOINT);
        assert_eq!(groq.temperature, Some(0.2));

        let gemini = config_generation(LlmProvider::Gemini, "m", "k", Some(0.9), Some(256));
        assert_eq!(gemini.endpoint, GEMINI_ENDPOINT);
        assert_eq!(gemini.temperature, Some(0.9));
        assert_eq!(gemini.max_tokens, Some(256));
    }

    #[test]
    fn defaults_validate() {
        assert!(config_gemini_embedding("models/text-embedding-004", "k").validate().is_ok());
    }
}
