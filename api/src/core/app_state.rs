use std::sync::Arc;

use ai_llm_service::{health_service::HealthStatus, service_profiles::LlmServiceProfiles};
use futures::future::BoxFuture;
use rag_chain::RagChain;

/// Something that can report provider health for `GET /health`.
pub trait HealthSource: Send + Sync {
    fn check(&self) -> BoxFuture<'_, Vec<HealthStatus>>;
}

impl HealthSource for LlmServiceProfiles {
    fn check(&self) -> BoxFuture<'_, Vec<HealthStatus>> {
        Box::pin(self.health_all())
    }
}

/// Shared state for all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    /// Answers chat messages.
    pub chain: Arc<RagChain>,
    /// Probed by the health route.
    pub health: Arc<dyn HealthSource>,
}

impl AppState {
    pub fn new(chain: Arc<RagChain>, health: Arc<dyn HealthSource>) -> Self {
        Self { chain, health }
    }
}
