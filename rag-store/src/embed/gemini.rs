//! Gemini embedding provider backed by the shared [`LlmServiceProfiles`].

use std::sync::Arc;

use ai_llm_service::{service_profiles::LlmServiceProfiles, services::gemini_service::EmbedTask};
use futures::future::BoxFuture;

use crate::{EmbeddingsProvider, RagError};

/// Embeds documents and queries through the embedding profile.
#[derive(Clone)]
pub struct GeminiEmbedder {
    svc: Arc<LlmServiceProfiles>,
}

impl GeminiEmbedder {
    pub fn new(svc: Arc<LlmServiceProfiles>) -> Self {
        Self { svc }
    }

    async fn embed_as(&self, text: &str, task: EmbedTask) -> Result<Vec<f32>, RagError> {
        self.svc
            .embed(text, task)
            .await
            .map_err(|e| RagError::Embedding(e.to_string()))
    }
}

impl EmbeddingsProvider for GeminiEmbedder {
    fn name(&self) -> &str {
        "gemini"
    }

    fn embed<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Vec<f32>, RagError>> {
        Box::pin(self.embed_as(text, EmbedTask::RetrievalDocument))
    }

    fn embed_query<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Vec<f32>, RagError>> {
        Box::pin(self.embed_as(text, EmbedTask::RetrievalQuery))
    }
}
