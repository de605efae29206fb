//! Shared LLM service with two profiles: `generation` and `embedding`.
//!
//! - Lives in the same Tokio runtime as the application.
//! - Construct once, wrap in `Arc`, and pass clones to dependents.
//! - Both HTTP clients are built eagerly in [`LlmServiceProfiles::new`], so a
//!   misconfigured profile fails at startup rather than on the first request.
//!
//! # Example
//! ```no_run
//! use std::sync::Arc;
//! use ai_llm_service::config::default_config::{config_gemini_embedding, config_generation};
//! use ai_llm_service::config::llm_provider::LlmProvider;
//! use ai_llm_service::service_profiles::LlmServiceProfiles;
//! use ai_llm_service::services::gemini_service::EmbedTask;
//!
//! # async fn run() -> Result<(), ai_llm_service::AiLlmError> {
//! let generation = config_generation(LlmProvider::Groq, "llama-3.3-70b-versatile", "gsk_...", None, None);
//! let embedding = config_gemini_embedding("models/text-embedding-004", "AIza...");
//! let svc = Arc::new(LlmServiceProfiles::new(generation, embedding)?);
//!
//! let v = svc.embed("Great budget headphone", EmbedTask::RetrievalDocument).await?;
//! let answer = svc.generate("Recommend a headphone", None).await?;
//! # let _ = (v, answer);
//! # Ok(()) }
//! ```

use tracing::info;

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{AiLlmError, ConfigError},
    health_service::{HealthStatus, check_gemini, check_groq},
    services::{
        gemini_service::{EmbedTask, GeminiService},
        groq_service::GroqService,
    },
};

enum GenerationClient {
    Gemini(GeminiService),
    Groq(GroqService),
}

/// Shared service managing the **generation** and **embedding** profiles.
pub struct LlmServiceProfiles {
    generation: Option<LlmModelConfig>,
    embedding: LlmModelConfig,
    generator: Option<GenerationClient>,
    embedder: GeminiService,
}

impl LlmServiceProfiles {
    /// Creates a new service and both underlying clients.
    ///
    /// # Errors
    /// - [`ConfigError::UnsupportedRole`] if the embedding profile is not served by Gemini
    /// - any client construction error (missing key, invalid endpoint, empty model)
    pub fn new(generation: LlmModelConfig, embedding: LlmModelConfig) -> Result<Self, AiLlmError> {
        let mut svc = Self::embedding_only(embedding)?;
        let generator = match generation.provider {
            LlmProvider::Gemini => GenerationClient::Gemini(GeminiService::new(generation.clone())?),
            LlmProvider::Groq => GenerationClient::Groq(GroqService::new(generation.clone())?),
        };

        info!(
            generation_provider = %generation.provider,
            generation_model = %generation.model,
            "generation profile ready"
        );
        svc.generation = Some(generation);
        svc.generator = Some(generator);
        Ok(svc)
    }

    /// Creates a service with only the embedding profile (offline ingestion).
    ///
    /// [`LlmServiceProfiles::generate`] then fails with
    /// [`ConfigError::ProfileNotConfigured`].
    pub fn embedding_only(embedding: LlmModelConfig) -> Result<Self, AiLlmError> {
        if !embedding.provider.supports_embeddings() {
            return Err(ConfigError::UnsupportedRole {
                provider: embedding.provider.into(),
                role: "embeddings",
            }
            .into());
        }

        let embedder = GeminiService::new(embedding.clone())?;
        info!(embedding_model = %embedding.model, "embedding profile ready");

        Ok(Self {
            generation: None,
            embedding,
            generator: None,
            embedder,
        })
    }

    /// Generates text using the **generation** profile.
    ///
    /// # Arguments
    /// - `prompt`: fully assembled user prompt.
    /// - `system`: optional system instruction.
    pub async fn generate(&self, prompt: &str, system: Option<&str>) -> Result<String, AiLlmError> {
        match &self.generator {
            Some(GenerationClient::Gemini(cli)) => cli.generate(prompt, system).await,
            Some(GenerationClient::Groq(cli)) => cli.generate(prompt, system).await,
            None => Err(ConfigError::ProfileNotConfigured { role: "generation" }.into()),
        }
    }

    /// Computes one embedding using the **embedding** profile.
    pub async fn embed(&self, input: &str, task: EmbedTask) -> Result<Vec<f32>, AiLlmError> {
        self.embedder.embed(input, task).await
    }

    /// Returns a health snapshot for every configured profile.
    pub async fn health_all(&self) -> Vec<HealthStatus> {
        let mut out = Vec::with_capacity(2);
        match &self.generator {
            Some(GenerationClient::Gemini(cli)) => out.push(check_gemini("generation", cli).await),
            Some(GenerationClient::Groq(cli)) => out.push(check_groq("generation", cli).await),
            None => {}
        }
        out.push(check_gemini("embedding", &self.embedder).await);
        out
    }

    /// Returns references to the current profiles `(generation, embedding)`.
    pub fn profiles(&self) -> (Option<&LlmModelConfig>, &LlmModelConfig) {
        (self.generation.as_ref(), &self.embedding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_config::{config_gemini_embedding, config_generation};

    #[test]
    fn groq_cannot_serve_embeddings() {
        let generation = config_generation(LlmProvider::Groq, "m", "k", None, None);
        let embedding = config_generation(LlmProvider::Groq, "m", "k", None, None);
        let err = match LlmServiceProfiles::new(generation, embedding) {
            Err(e) => e,
            Ok(_) => panic!("groq embedding profile must be rejected"),
        };
        assert!(matches!(
            err,
            AiLlmError::Config(ConfigError::UnsupportedRole { .. })
        ));
    }

    #[test]
    fn builds_with_gemini_embeddings_and_groq_generation() {
        let svc = LlmServiceProfiles::new(
            config_generation(LlmProvider::Groq, "llama", "k", None, None),
            config_gemini_embedding("models/text-embedding-004", "k"),
        )
        .unwrap();
        let (generation, embedding) = svc.profiles();
        assert_eq!(generation.map(|g| g.provider), Some(LlmProvider::Groq));
        assert_eq!(embedding.provider, LlmProvider::Gemini);
    }

    #[tokio::test]
    async fn embedding_only_refuses_generation() {
        let svc = LlmServiceProfiles::embedding_only(config_gemini_embedding(
            "models/text-embedding-004",
            "k",
        ))
        .unwrap();
        assert!(svc.profiles().0.is_none());
        let err = svc.generate("hi", None).await.unwrap_err();
        assert!(matches!(
            err,
            AiLlmError::Config(ConfigError::ProfileNotConfigured { role: "generation" })
        ));
    }
}
