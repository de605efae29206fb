//! Typed configuration schema.
//!
//! The YAML document is first deserialized into a permissive raw shape where
//! every field is optional, then validated in one pass into [`AppConfig`].
//! Validation never stops at the first problem: all missing or invalid fields
//! are reported together in [`SettingsError::Config`].

use std::{
    fmt,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;
use tracing::{debug, info};

use crate::errors::SettingsError;

/// Default location of the config document, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config/config.yaml";

/// Number of units retrieved per query when `retriever.top_k` is absent.
pub const DEFAULT_TOP_K: usize = 3;

const DEFAULT_SOURCE_PATH: &str = "data/flipkart_product_review.csv";
const DEFAULT_BATCH_SIZE: usize = 20;
const DEFAULT_EMBED_CONCURRENCY: usize = 4;
const DEFAULT_PROMPT: &str = "product_bot";
const DEFAULT_RETRIEVAL_TIMEOUT_SECS: u64 = 20;
const DEFAULT_GENERATION_TIMEOUT_SECS: u64 = 60;
const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:8000";

/* ------------------------------------------------------------------------- */
/* Typed configuration                                                       */
/* ------------------------------------------------------------------------- */

/// Fully validated application configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Name of the vector collection holding the review corpus.
    pub collection_name: String,
    pub embedding: EmbeddingSettings,
    pub llm: LlmSettings,
    /// Number of units returned per retrieval. Always > 0.
    pub top_k: usize,
    pub vector_backend: VectorBackend,
    pub ingestion: IngestionSettings,
    pub chain: ChainSettings,
    pub server: ServerSettings,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingSettings {
    pub model_name: String,
    /// Vector dimension; probed from the first embedding when `None`.
    pub dimension: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LlmSettings {
    pub provider: GenerationProvider,
    pub model_name: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

/// Which remote service generates answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationProvider {
    Groq,
    Google,
}

/// Which vector database holds the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorBackend {
    AstraDb,
    Qdrant,
}

impl fmt::Display for VectorBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VectorBackend::AstraDb => f.write_str("astra_db"),
            VectorBackend::Qdrant => f.write_str("qdrant"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IngestionSettings {
    pub source_path: PathBuf,
    pub batch_size: usize,
    pub embed_concurrency: usize,
    /// Optional similarity query run after ingestion as a smoke check.
    pub sample_query: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChainSettings {
    /// Registry key of the prompt template.
    pub prompt: String,
    pub retrieval_timeout: Duration,
    pub generation_timeout: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServerSettings {
    pub address: String,
}

impl AppConfig {
    /// Reads and validates the config document at `path`.
    ///
    /// # Errors
    /// - [`SettingsError::Read`] if the file cannot be read
    /// - [`SettingsError::Parse`] if the YAML does not match the schema shape
    /// - [`SettingsError::Config`] listing every missing/invalid field
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let cfg = Self::from_yaml_str(&text)?;
        info!(
            path = %path.display(),
            collection = %cfg.collection_name,
            backend = %cfg.vector_backend,
            top_k = cfg.top_k,
            "configuration loaded"
        );
        Ok(cfg)
    }

    /// Parses and validates a YAML document.
    pub fn from_yaml_str(text: &str) -> Result<Self, SettingsError> {
        let raw: RawConfig = if text.trim().is_empty() {
            RawConfig::default()
        } else {
            serde_yaml::from_str(text)?
        };
        raw.validate()
    }
}

/* ------------------------------------------------------------------------- */
/* Raw document shape                                                        */
/* ------------------------------------------------------------------------- */

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    astra_db: Option<RawAstraDb>,
    embedding_model: Option<RawEmbedding>,
    llm: Option<RawLlm>,
    retriever: Option<RawRetriever>,
    vector_store: Option<RawVectorStore>,
    ingestion: Option<RawIngestion>,
    chain: Option<RawChain>,
    server: Option<RawServer>,
}

#[derive(Debug, Default, Deserialize)]
struct RawAstraDb {
    collection_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawEmbedding {
    provider: Option<String>,
    model_name: Option<String>,
    dimension: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
struct RawLlm {
    provider: Option<String>,
    model_name: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
struct RawRetriever {
    top_k: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
struct RawVectorStore {
    backend: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawIngestion {
    source_path: Option<PathBuf>,
    batch_size: Option<i64>,
    embed_concurrency: Option<i64>,
    sample_query: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawChain {
    prompt: Option<String>,
    retrieval_timeout_secs: Option<i64>,
    generation_timeout_secs: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
struct RawServer {
    address: Option<String>,
}

impl RawConfig {
    fn validate(self) -> Result<AppConfig, SettingsError> {
        let mut issues = Vec::new();

        let astra = self.astra_db.unwrap_or_default();
        let embedding = self.embedding_model.unwrap_or_default();
        let llm = self.llm.unwrap_or_default();
        let retriever = self.retriever.unwrap_or_default();
        let vector_store = self.vector_store.unwrap_or_default();
        let ingestion = self.ingestion.unwrap_or_default();
        let chain = self.chain.unwrap_or_default();
        let server = self.server.unwrap_or_default();

        let collection_name = required(&mut issues, "astra_db.collection_name", astra.collection_name);
        let embedding_model = required(&mut issues, "embedding_model.model_name", embedding.model_name);
        let llm_model = required(&mut issues, "llm.model_name", llm.model_name);

        if let Some(p) = embedding.provider.as_deref() {
            if !matches!(p.trim().to_ascii_lowercase().as_str(), "google" | "gemini") {
                issues.push(format!(
                    "embedding_model.provider: unsupported provider `{p}` (expected `google`)"
                ));
            }
        }

        let provider = match llm.provider.as_deref().map(|p| p.trim().to_ascii_lowercase()) {
            None => GenerationProvider::Groq,
            Some(p) if p == "groq" => GenerationProvider::Groq,
            Some(p) if p == "google" || p == "gemini" => GenerationProvider::Google,
            Some(p) => {
                issues.push(format!(
                    "llm.provider: unsupported provider `{p}` (expected `groq` or `google`)"
                ));
                GenerationProvider::Groq
            }
        };

        let vector_backend = match vector_store
            .backend
            .as_deref()
            .map(|b| b.trim().to_ascii_lowercase())
        {
            None => VectorBackend::AstraDb,
            Some(b) if b == "astra_db" || b == "astra" => VectorBackend::AstraDb,
            Some(b) if b == "qdrant" => VectorBackend::Qdrant,
            Some(b) => {
                issues.push(format!(
                    "vector_store.backend: unsupported backend `{b}` (expected `astra_db` or `qdrant`)"
                ));
                VectorBackend::AstraDb
            }
        };

        if let Some(t) = llm.temperature {
            if !(t.is_finite() && (0.0..=2.0).contains(&t)) {
                issues.push(format!("llm.temperature: {t} is out of range 0.0..=2.0"));
            }
        }

        let top_k = positive(&mut issues, "retriever.top_k", retriever.top_k, DEFAULT_TOP_K);
        let dimension = optional_positive(&mut issues, "embedding_model.dimension", embedding.dimension);
        let max_tokens = optional_positive(&mut issues, "llm.max_tokens", llm.max_tokens)
            .map(|v| u32::try_from(v).unwrap_or(u32::MAX));
        let batch_size = positive(&mut issues, "ingestion.batch_size", ingestion.batch_size, DEFAULT_BATCH_SIZE);
        let embed_concurrency = positive(
            &mut issues,
            "ingestion.embed_concurrency",
            ingestion.embed_concurrency,
            DEFAULT_EMBED_CONCURRENCY,
        );
        let retrieval_timeout = positive(
            &mut issues,
            "chain.retrieval_timeout_secs",
            chain.retrieval_timeout_secs,
            DEFAULT_RETRIEVAL_TIMEOUT_SECS as usize,
        );
        let generation_timeout = positive(
            &mut issues,
            "chain.generation_timeout_secs",
            chain.generation_timeout_secs,
            DEFAULT_GENERATION_TIMEOUT_SECS as usize,
        );

        let prompt = chain
            .prompt
            .map(|p| p.trim().to_string())
            .unwrap_or_else(|| DEFAULT_PROMPT.to_string());
        if prompt.is_empty() {
            issues.push("chain.prompt: must not be empty".to_string());
        }

        if !issues.is_empty() {
            debug!(count = issues.len(), "configuration rejected");
            return Err(SettingsError::Config(issues));
        }

        Ok(AppConfig {
            collection_name,
            embedding: EmbeddingSettings {
                model_name: embedding_model,
                dimension,
            },
            llm: LlmSettings {
                provider,
                model_name: llm_model,
                temperature: llm.temperature,
                max_tokens,
            },
            top_k,
            vector_backend,
            ingestion: IngestionSettings {
                source_path: ingestion
                    .source_path
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_SOURCE_PATH)),
                batch_size,
                embed_concurrency,
                sample_query: ingestion
                    .sample_query
                    .map(|q| q.trim().to_string())
                    .filter(|q| !q.is_empty()),
            },
            chain: ChainSettings {
                prompt,
                retrieval_timeout: Duration::from_secs(retrieval_timeout as u64),
                generation_timeout: Duration::from_secs(generation_timeout as u64),
            },
            server: ServerSettings {
                address: server
                    .address
                    .map(|a| a.trim().to_string())
                    .filter(|a| !a.is_empty())
                    .unwrap_or_else(|| DEFAULT_SERVER_ADDRESS.to_string()),
            },
        })
    }
}

/* ------------------------------------------------------------------------- */
/* Field helpers                                                             */
/* ------------------------------------------------------------------------- */

fn required(issues: &mut Vec<String>, field: &str, value: Option<String>) -> String {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => v,
        _ => {
            issues.push(format!("{field}: missing required value"));
            String::new()
        }
    }
}

fn positive(issues: &mut Vec<String>, field: &str, value: Option<i64>, default: usize) -> usize {
    match value {
        None => default,
        Some(v) if v > 0 => v as usize,
        Some(v) => {
            issues.push(format!("{field}: must be a positive integer, got {v}"));
            default
        }
    }
}

fn optional_positive(issues: &mut Vec<String>, field: &str, value: Option<i64>) -> Option<usize> {
    match value {
        None => None,
        Some(v) if v > 0 => Some(v as usize),
        Some(v) => {
            issues.push(format!("{field}: must be a positive integer, got {v}"));
            None
        }
    }
}
