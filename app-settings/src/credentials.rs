//! Provider secrets, resolved once at process start.
//!
//! The set of required names depends on the configured backends and on what
//! the process is going to do: the ingestion tool never talks to the
//! generation provider, so it does not need that key.

use std::fmt;

use tracing::debug;

use crate::{
    config::{AppConfig, GenerationProvider, VectorBackend},
    errors::SettingsError,
};

pub const GOOGLE_API_KEY: &str = "GOOGLE_API_KEY";
pub const GROQ_API_KEY: &str = "GROQ_API_KEY";
pub const ASTRA_DB_API_ENDPOINT: &str = "ASTRA_DB_API_ENDPOINT";
pub const ASTRA_DB_APPLICATION_TOKEN: &str = "ASTRA_DB_APPLICATION_TOKEN";
pub const ASTRA_DB_KEYSPACE: &str = "ASTRA_DB_KEYSPACE";
pub const QDRANT_URL: &str = "QDRANT_URL";
pub const QDRANT_API_KEY: &str = "QDRANT_API_KEY";

/// What the process needs credentials for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Purpose {
    /// Offline ingestion: embeddings + vector index.
    Ingestion,
    /// Chat serving: embeddings + vector index + generation.
    Serving,
}

/// Resolved secrets. Construct with [`Credentials::resolve`] or [`Credentials::from_env`].
#[derive(Clone)]
pub struct Credentials {
    /// Google AI key used for embeddings (and for generation with the Google provider).
    pub google_api_key: String,
    /// Key for the generation provider; `None` when [`Purpose::Ingestion`].
    pub generation_api_key: Option<String>,
    pub vector: VectorCredentials,
}

#[derive(Clone)]
pub enum VectorCredentials {
    AstraDb(AstraCredentials),
    Qdrant(QdrantCredentials),
}

#[derive(Clone)]
pub struct AstraCredentials {
    pub api_endpoint: String,
    pub token: String,
    pub keyspace: String,
}

#[derive(Clone)]
pub struct QdrantCredentials {
    pub url: String,
    pub api_key: Option<String>,
}

impl Credentials {
    /// Resolves credentials from the process environment.
    pub fn from_env(cfg: &AppConfig, purpose: Purpose) -> Result<Self, SettingsError> {
        Self::resolve(cfg, purpose, |name| std::env::var(name).ok())
    }

    /// Resolves credentials through an arbitrary lookup.
    ///
    /// Blank values count as missing.
    ///
    /// # Errors
    /// [`SettingsError::Credential`] listing exactly the missing names.
    pub fn resolve<F>(cfg: &AppConfig, purpose: Purpose, lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut missing: Vec<&'static str> = Vec::new();
        let mut take = |name: &'static str| -> Option<String> {
            match lookup(name).map(|v| v.trim().to_string()) {
                Some(v) if !v.is_empty() => Some(v),
                _ => {
                    missing.push(name);
                    None
                }
            }
        };

        let google = take(GOOGLE_API_KEY);
        let generation = match (purpose, cfg.llm.provider) {
            (Purpose::Ingestion, _) => None,
            (Purpose::Serving, GenerationProvider::Groq) => take(GROQ_API_KEY),
            (Purpose::Serving, GenerationProvider::Google) => google.clone(),
        };

        let vector = match cfg.vector_backend {
            VectorBackend::AstraDb => {
                let endpoint = take(ASTRA_DB_API_ENDPOINT);
                let token = take(ASTRA_DB_APPLICATION_TOKEN);
                let keyspace = take(ASTRA_DB_KEYSPACE);
                match (endpoint, token, keyspace) {
                    (Some(api_endpoint), Some(token), Some(keyspace)) => {
                        Some(VectorCredentials::AstraDb(AstraCredentials {
                            api_endpoint,
                            token,
                            keyspace,
                        }))
                    }
                    _ => None,
                }
            }
            VectorBackend::Qdrant => take(QDRANT_URL).map(|url| {
                VectorCredentials::Qdrant(QdrantCredentials {
                    url,
                    api_key: lookup(QDRANT_API_KEY)
                        .map(|v| v.trim().to_string())
                        .filter(|v| !v.is_empty()),
                })
            }),
        };

        if !missing.is_empty() {
            debug!(missing = ?missing, "credentials incomplete");
            return Err(SettingsError::Credential(missing));
        }

        match (google, vector) {
            (Some(google_api_key), Some(vector)) => Ok(Self {
                google_api_key,
                generation_api_key: generation,
                vector,
            }),
            // `missing` is non-empty whenever one of these is `None`.
            _ => Err(SettingsError::Credential(Vec::new())),
        }
    }
}

fn redact(value: &str) -> &'static str {
    if value.is_empty() { "<empty>" } else { "<redacted>" }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("google_api_key", &redact(&self.google_api_key))
            .field(
                "generation_api_key",
                &self.generation_api_key.as_deref().map(redact),
            )
            .field("vector", &self.vector)
            .finish()
    }
}

impl fmt::Debug for VectorCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VectorCredentials::AstraDb(a) => f
                .debug_struct("AstraDb")
                .field("api_endpoint", &a.api_endpoint)
                .field("token", &redact(&a.token))
                .field("keyspace", &a.keyspace)
                .finish(),
            VectorCredentials::Qdrant(q) => f
                .debug_struct("Qdrant")
                .field("url", &q.url)
                .field("api_key", &q.api_key.as_deref().map(redact))
                .finish(),
        }
    }
}
