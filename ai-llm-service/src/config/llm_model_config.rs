use crate::{
    config::llm_provider::LlmProvider,
    error_handler::{ConfigError, Result, validate_http_endpoint, validate_range_f32},
};

/// Configuration for one model profile (embedding or generation).
///
/// # Fields
///
/// - `provider`: backend serving the model.
/// - `model`: model identifier (e.g. `"models/text-embedding-004"`, `"llama-3.3-70b-versatile"`).
/// - `endpoint`: API base URL without a version path.
/// - `api_key`: key for providers that require authentication.
/// - `max_tokens`: generation cap (ignored for embeddings).
/// - `temperature`, `top_p`: sampling knobs (ignored for embeddings).
/// - `timeout_secs`: per-request timeout.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmModelConfig {
    pub provider: LlmProvider,
    pub model: String,
    pub endpoint: String,
    pub api_key: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub timeout_secs: Option<u64>,
}

impl LlmModelConfig {
    /// Checks model name, endpoint scheme and sampling ranges.
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::EmptyModel.into());
        }
        validate_http_endpoint("endpoint", self.endpoint.trim())?;
        if let Some(t) = self.temperature {
            validate_range_f32("temperature", t, 0.0, 2.0)?;
        }
        if let Some(p) = self.top_p {
            validate_range_f32("top_p", p, 0.0, 1.0)?;
        }
        Ok(())
    }

    /// Endpoint with trailing slashes removed.
    pub(crate) fn base_url(&self) -> String {
        self.endpoint.trim().trim_end_matches('/').to_string()
    }
}
