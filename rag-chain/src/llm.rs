//! Generation capability and its adapter over [`LlmServiceProfiles`].

use std::sync::Arc;

use ai_llm_service::service_profiles::LlmServiceProfiles;
use futures::future::BoxFuture;

use crate::error::ChainError;

/// Turns a fully assembled prompt into text.
pub trait GenerationProvider: Send + Sync {
    fn name(&self) -> &str;

    /// # Errors
    /// [`ChainError::GenerationFailure`] on transport, quota, or decode problems.
    fn generate<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String, ChainError>>;
}

/// Uses the generation profile of the shared service.
#[derive(Clone)]
pub struct ProfilesGenerator {
    svc: Arc<LlmServiceProfiles>,
}

impl ProfilesGenerator {
    pub fn new(svc: Arc<LlmServiceProfiles>) -> Self {
        Self { svc }
    }
}

impl GenerationProvider for ProfilesGenerator {
    fn name(&self) -> &str {
        "llm-service"
    }

    fn generate<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String, ChainError>> {
        Box::pin(async move {
            self.svc
                .generate(prompt, None)
                .await
                .map_err(|e| ChainError::GenerationFailure(e.to_string()))
        })
    }
}
