//! Process-level settings for the product assistant.
//!
//! Everything that used to be read ad hoc from the environment or from an
//! untyped YAML document lives here:
//! - [`AppConfig`]: typed configuration, validated once at load time
//! - [`Credentials`]: provider secrets, resolved once and passed by reference
//! - [`telemetry`]: tracing subscriber setup shared by all binaries
//!
//! Components never read process state themselves; the binaries build these
//! values at startup and hand them down.

mod config;
mod credentials;
mod errors;
pub mod telemetry;

pub use config::{
    AppConfig, ChainSettings, EmbeddingSettings, GenerationProvider, IngestionSettings,
    LlmSettings, ServerSettings, VectorBackend, DEFAULT_CONFIG_PATH, DEFAULT_TOP_K,
};
pub use credentials::{AstraCredentials, Credentials, Purpose, QdrantCredentials, VectorCredentials};
pub use errors::SettingsError;
