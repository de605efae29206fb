//! Google Gemini service for embeddings and text generation.
//!
//! Endpoints are derived from `LlmModelConfig::endpoint` and the model path:
//! - POST {endpoint}/v1beta/{model}:embedContent    — single embedding
//! - POST {endpoint}/v1beta/{model}:generateContent — non-streaming generation
//! - GET  {endpoint}/v1beta/{model}                 — model metadata (health)
//!
//! Authentication uses the `x-goog-api-key` header.

use std::time::{Duration, Instant};

use reqwest::header;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::{debug, error, info, instrument};

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{
        AiLlmError, HttpError, Provider, ProviderError, ProviderErrorKind, make_snippet,
    },
};

const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// How the embedded text is going to be used.
///
/// Gemini produces slightly different vectors for stored documents and for
/// search queries; both sides of a retrieval must use the matching task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmbedTask {
    RetrievalDocument,
    RetrievalQuery,
}

/// Thin client for the Gemini REST API.
#[derive(Debug)]
pub struct GeminiService {
    client: reqwest::Client,
    cfg: LlmModelConfig,
    timeout: Duration,
    model_path: String,
    url_embed: String,
    url_generate: String,
    url_model: String,
}

impl GeminiService {
    /// Creates a new [`GeminiService`] from the given config.
    ///
    /// # Errors
    /// - [`AiLlmError::Provider`] with `InvalidProvider` if `cfg.provider` is not Gemini
    /// - [`AiLlmError::Provider`] with `MissingApiKey` if `cfg.api_key` is `None`
    /// - [`AiLlmError::Config`] if the model or endpoint is invalid
    /// - [`AiLlmError::HttpTransport`] if the HTTP client cannot be built
    pub fn new(cfg: LlmModelConfig) -> Result<Self, AiLlmError> {
        if cfg.provider != LlmProvider::Gemini {
            return Err(
                ProviderError::new(Provider::Gemini, ProviderErrorKind::InvalidProvider).into(),
            );
        }
        let api_key = cfg.api_key.clone().ok_or_else(|| {
            ProviderError::new(Provider::Gemini, ProviderErrorKind::MissingApiKey)
        })?;
        cfg.validate()?;

        let timeout = Duration::from_secs(cfg.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS));

        let mut headers = header::HeaderMap::new();
        let mut key = header::HeaderValue::from_str(&api_key).map_err(|e| {
            ProviderError::new(
                Provider::Gemini,
                ProviderErrorKind::Decode(format!("invalid API key header: {e}")),
            )
        })?;
        key.set_sensitive(true);
        headers.insert("x-goog-api-key", key);
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        let base = cfg.base_url();
        let model_path = model_path(&cfg.model);
        let url_embed = format!("{base}/v1beta/{model_path}:embedContent");
        let url_generate = format!("{base}/v1beta/{model_path}:generateContent");
        let url_model = format!("{base}/v1beta/{model_path}");

        info!(
            model = %cfg.model,
            endpoint = %cfg.endpoint,
            timeout_secs = timeout.as_secs(),
            "GeminiService initialized"
        );

        Ok(Self {
            client,
            cfg,
            timeout,
            model_path,
            url_embed,
            url_generate,
            url_model,
        })
    }

    pub fn config(&self) -> &LlmModelConfig {
        &self.cfg
    }

    /// Retrieves one embedding vector via `:embedContent`.
    ///
    /// # Errors
    /// - [`AiLlmError::Provider`] with `HttpStatus` for non-2xx responses
    /// - [`AiLlmError::Provider`] with `Decode` if `embedding.values` is missing
    /// - [`AiLlmError::Timeout`] / [`AiLlmError::HttpTransport`] for network failures
    #[instrument(skip_all, fields(model = %self.cfg.model, task = ?task))]
    pub async fn embed(&self, input: &str, task: EmbedTask) -> Result<Vec<f32>, AiLlmError> {
        let body = EmbedContentRequest {
            model: &self.model_path,
            content: Content::user(input),
            task_type: task,
        };
        debug!(input_len = input.len(), "POST {}", self.url_embed);

        let out: EmbedContentResponse = self
            .post_json(&self.url_embed, &body, "`embedding.values`")
            .await?;

        if out.embedding.values.is_empty() {
            return Err(ProviderError::new(
                Provider::Gemini,
                ProviderErrorKind::Decode("empty `embedding.values`".into()),
            )
            .into());
        }
        Ok(out.embedding.values)
    }

    /// Performs a non-streaming `:generateContent` call.
    ///
    /// The optional `system` text is sent as `systemInstruction`. Text parts of
    /// the first candidate are concatenated in order.
    ///
    /// # Errors
    /// - [`AiLlmError::Provider`] with `EmptyChoices` if no text came back
    /// - otherwise as for [`GeminiService::embed`]
    #[instrument(skip_all, fields(model = %self.cfg.model))]
    pub async fn generate(&self, prompt: &str, system: Option<&str>) -> Result<String, AiLlmError> {
        let started = Instant::now();
        let body = GenerateContentRequest::from_cfg(&self.cfg, prompt, system);
        debug!(
            prompt_len = prompt.len(),
            has_system = system.is_some(),
            "POST {}", self.url_generate
        );

        let out: GenerateContentResponse = self
            .post_json(&self.url_generate, &body, "`candidates[0].content.parts`")
            .await?;

        let text = out
            .first_text()
            .ok_or_else(|| ProviderError::new(Provider::Gemini, ProviderErrorKind::EmptyChoices))?;

        info!(
            latency_ms = started.elapsed().as_millis(),
            answer_len = text.len(),
            "generateContent completed"
        );
        Ok(text)
    }

    /// Fetches model metadata; used by the health probe.
    pub async fn probe(&self) -> Result<(), AiLlmError> {
        let resp = self
            .client
            .get(&self.url_model)
            .send()
            .await
            .map_err(|e| transport(e, self.timeout))?;
        if resp.status().is_success() {
            return Ok(());
        }
        let status = resp.status();
        let snippet = make_snippet(&resp.text().await.unwrap_or_default());
        Err(ProviderError::new(
            Provider::Gemini,
            ProviderErrorKind::HttpStatus(HttpError {
                status,
                url: self.url_model.clone(),
                snippet,
            }),
        )
        .into())
    }

    async fn post_json<B, R>(&self, url: &str, body: &B, expect: &str) -> Result<R, AiLlmError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let started = Instant::now();
        let resp = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| transport(e, self.timeout))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let snippet = make_snippet(&resp.text().await.unwrap_or_default());
            error!(
                %status,
                %url,
                %snippet,
                latency_ms = started.elapsed().as_millis(),
                "Gemini returned non-success status"
            );
            return Err(ProviderError::new(
                Provider::Gemini,
                ProviderErrorKind::HttpStatus(HttpError {
                    status,
                    url: url.to_string(),
                    snippet,
                }),
            )
            .into());
        }

        resp.json::<R>().await.map_err(|e| {
            error!(
                error = %e,
                %url,
                latency_ms = started.elapsed().as_millis(),
                "failed to decode Gemini response"
            );
            ProviderError::new(
                Provider::Gemini,
                ProviderErrorKind::Decode(format!("serde error: {e}; expected {expect}")),
            )
            .into()
        })
    }
}

/// Maps a reqwest failure, surfacing client-side timeouts explicitly.
pub(crate) fn transport(e: reqwest::Error, timeout: Duration) -> AiLlmError {
    if e.is_timeout() {
        AiLlmError::Timeout(timeout)
    } else {
        AiLlmError::HttpTransport(e)
    }
}

/// Gemini addresses models as `models/<name>`; accept bare names too.
fn model_path(model: &str) -> String {
    let m = model.trim();
    if m.starts_with("models/") || m.starts_with("tunedModels/") {
        m.to_string()
    } else {
        format!("models/{m}")
    }
}

/* ===========================================================================
HTTP payloads
======================================================================== */

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedContentRequest<'a> {
    model: &'a str,
    content: Content<'a>,
    task_type: EmbedTask,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

impl<'a> Content<'a> {
    fn user(text: &'a str) -> Self {
        Self {
            role: Some("user"),
            parts: vec![Part { text }],
        }
    }

    fn system(text: &'a str) -> Self {
        Self {
            role: None,
            parts: vec![Part { text }],
        }
    }
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbedContentResponse {
    embedding: ContentEmbedding,
}

#[derive(Debug, Deserialize)]
struct ContentEmbedding {
    #[serde(default)]
    values: Vec<f32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
    generation_config: GenerationConfig,
}

impl<'a> GenerateContentRequest<'a> {
    fn from_cfg(cfg: &LlmModelConfig, prompt: &'a str, system: Option<&'a str>) -> Self {
        Self {
            contents: vec![Content::user(prompt)],
            system_instruction: system.map(Content::system),
            generation_config: GenerationConfig {
                temperature: cfg.temperature,
                top_p: cfg.top_p,
                max_output_tokens: cfg.max_tokens,
            },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

impl GenerateContentResponse {
    fn first_text(self) -> Option<String> {
        let parts = self.candidates.into_iter().next()?.content?.parts;
        let text: String = parts.into_iter().filter_map(|p| p.text).collect();
        if text.is_empty() { None } else { Some(text) }
    }
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<PartOut>,
}

#[derive(Debug, Deserialize)]
struct PartOut {
    text: Option<String>,
}
