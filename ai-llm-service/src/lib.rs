//! Remote model clients for the product assistant.
//!
//! - [`services::gemini_service`]: Google Gemini embeddings and generation
//! - [`services::groq_service`]: Groq (OpenAI-compatible) chat completions
//! - [`service_profiles::LlmServiceProfiles`]: one shared handle for both roles
//! - [`health_service`]: resilient probes for a `/health` endpoint

pub mod config;
pub mod error_handler;
pub mod health_service;
pub mod service_profiles;
pub mod services;

pub use error_handler::{AiLlmError, ConfigError, Provider, ProviderError, ProviderErrorKind};
