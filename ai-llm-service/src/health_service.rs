//! Health probes for the configured model profiles.
//!
//! - Gemini: `GET {endpoint}/v1beta/{model}` (model must exist and the key must be accepted)
//! - Groq: `GET {endpoint}/v1/models` (configured model must be listed)
//!
//! The returned [`HealthStatus`] is JSON-serializable and suitable for a `/health`
//! endpoint. Checks are resilient: failures become `ok = false`, never errors.

use std::time::Instant;

use serde::Serialize;
use tracing::{info, warn};

use crate::{
    config::llm_model_config::LlmModelConfig,
    services::{gemini_service::GeminiService, groq_service::GroqService},
};

/// A serializable health snapshot for a single profile.
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    /// Logical role of the profile (`embedding` or `generation`).
    pub role: &'static str,
    pub provider: String,
    pub endpoint: String,
    pub model: String,
    pub ok: bool,
    /// Measured HTTP latency in milliseconds for the probe.
    pub latency_ms: u128,
    pub message: String,
}

impl HealthStatus {
    fn from_outcome(
        role: &'static str,
        cfg: &LlmModelConfig,
        started: Instant,
        outcome: Result<(), String>,
    ) -> Self {
        let latency_ms = started.elapsed().as_millis();
        let (ok, message) = match outcome {
            Ok(()) => (true, "reachable".to_string()),
            Err(msg) => (false, msg),
        };
        if ok {
            info!(role, provider = %cfg.provider, model = %cfg.model, latency_ms, "health probe ok");
        } else {
            warn!(role, provider = %cfg.provider, model = %cfg.model, latency_ms, %message, "health probe failed");
        }
        Self {
            role,
            provider: cfg.provider.to_string(),
            endpoint: cfg.endpoint.clone(),
            model: cfg.model.clone(),
            ok,
            latency_ms,
            message,
        }
    }
}

/// Probes a Gemini profile.
pub async fn check_gemini(role: &'static str, svc: &GeminiService) -> HealthStatus {
    let started = Instant::now();
    let outcome = svc.probe().await.map_err(|e| e.to_string());
    HealthStatus::from_outcome(role, svc.config(), started, outcome)
}

/// Probes a Groq profile.
pub async fn check_groq(role: &'static str, svc: &GroqService) -> HealthStatus {
    let started = Instant::now();
    let outcome = match svc.probe().await {
        Ok(true) => Ok(()),
        Ok(false) => Err(format!("model `{}` is not served", svc.config().model)),
        Err(e) => Err(e.to_string()),
    };
    HealthStatus::from_outcome(role, svc.config(), started, outcome)
}
