//! Startup wiring shared by the `product-assistant` and `ingest` binaries.
//!
//! Settings and credentials are resolved once here and passed down; no
//! component reads the environment on its own.

pub mod bootstrap {
    use std::{path::PathBuf, sync::Arc};

    use ai_llm_service::{
        config::{
            default_config::{config_gemini_embedding, config_generation},
            llm_provider::LlmProvider,
        },
        service_profiles::LlmServiceProfiles,
    };
    use anyhow::{Context, Result};
    use app_settings::{
        AppConfig, Credentials, DEFAULT_CONFIG_PATH, GenerationProvider, Purpose, VectorCredentials,
    };
    use rag_chain::{ChainConfig, ProfilesGenerator, RagChain};
    use rag_store::{
        AstraDbConfig, AstraDbIndex, EmbeddingsProvider, GeminiEmbedder, IngestionConfig,
        QdrantConfig, QdrantIndex, Retriever, RetrieverConfig, VectorIndex,
    };
    use tracing::info;

    /// Environment variable overriding [`DEFAULT_CONFIG_PATH`].
    pub const CONFIG_PATH_ENV: &str = "APP_CONFIG";

    /// HTTP timeout for vector index calls.
    const INDEX_TIMEOUT_SECS: u64 = 30;

    /// Everything both binaries need, built in dependency order.
    pub struct Components {
        pub cfg: AppConfig,
        pub llm: Arc<LlmServiceProfiles>,
        pub index: Arc<dyn VectorIndex>,
        pub embedder: Arc<dyn EmbeddingsProvider>,
        pub retriever: Arc<Retriever>,
    }

    /// Loads `.env`, installs tracing, and reads the typed configuration.
    pub fn load_settings() -> Result<AppConfig> {
        // A missing .env is fine; real deployments set the environment directly.
        let _ = dotenvy::dotenv();
        app_settings::telemetry::init(app_settings::telemetry::DEFAULT_FILTER);

        let path = std::env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
        info!(path = %path.display(), "loading configuration");
        AppConfig::load(&path).with_context(|| format!("loading {}", path.display()))
    }

    /// Resolves credentials and builds providers, index, and retriever.
    ///
    /// Fails before any network call when settings or credentials are incomplete.
    pub fn build(cfg: AppConfig, purpose: Purpose) -> Result<Components> {
        let creds = Credentials::from_env(&cfg, purpose).context("resolving credentials")?;

        let embedding = config_gemini_embedding(&cfg.embedding.model_name, &creds.google_api_key);
        let llm = match (purpose, &creds.generation_api_key) {
            (Purpose::Serving, Some(key)) => {
                let provider = match cfg.llm.provider {
                    GenerationProvider::Groq => LlmProvider::Groq,
                    GenerationProvider::Google => LlmProvider::Gemini,
                };
                let generation = config_generation(
                    provider,
                    &cfg.llm.model_name,
                    key,
                    cfg.llm.temperature,
                    cfg.llm.max_tokens,
                );
                LlmServiceProfiles::new(generation, embedding)
            }
            _ => LlmServiceProfiles::embedding_only(embedding),
        }
        .context("building model clients")?;
        let llm = Arc::new(llm);

        let index = build_index(&creds.vector)?;
        let embedder: Arc<dyn EmbeddingsProvider> = Arc::new(GeminiEmbedder::new(llm.clone()));

        let retriever = Retriever::new(
            RetrieverConfig::new(&cfg.collection_name).with_top_k(cfg.top_k),
            index.clone(),
            embedder.clone(),
        )
        .context("building retriever")?;

        info!(
            backend = index.backend(),
            collection = %cfg.collection_name,
            top_k = cfg.top_k,
            "components ready"
        );
        Ok(Components {
            cfg,
            llm,
            index,
            embedder,
            retriever: Arc::new(retriever),
        })
    }

    /// Builds the answering chain on top of [`Components`].
    pub fn chain(c: &Components) -> Result<RagChain> {
        let cfg = ChainConfig {
            prompt: c.cfg.chain.prompt.clone(),
            retrieval_timeout: c.cfg.chain.retrieval_timeout,
            generation_timeout: c.cfg.chain.generation_timeout,
        };
        let generator = Arc::new(ProfilesGenerator::new(c.llm.clone()));
        RagChain::new(cfg, c.retriever.clone(), generator).context("building chain")
    }

    /// Ingestion settings mapped from [`AppConfig`].
    pub fn ingestion_config(cfg: &AppConfig) -> IngestionConfig {
        IngestionConfig {
            collection: cfg.collection_name.clone(),
            batch_size: cfg.ingestion.batch_size,
            embed_concurrency: cfg.ingestion.embed_concurrency,
            dimension: cfg.embedding.dimension,
        }
    }

    fn build_index(creds: &VectorCredentials) -> Result<Arc<dyn VectorIndex>> {
        let index: Arc<dyn VectorIndex> = match creds {
            VectorCredentials::AstraDb(a) => Arc::new(
                AstraDbIndex::new(&AstraDbConfig {
                    api_endpoint: a.api_endpoint.clone(),
                    token: a.token.clone(),
                    keyspace: a.keyspace.clone(),
                    timeout_secs: INDEX_TIMEOUT_SECS,
                })
                .context("building astra db client")?,
            ),
            VectorCredentials::Qdrant(q) => Arc::new(
                QdrantIndex::new(&QdrantConfig {
                    url: q.url.clone(),
                    api_key: q.api_key.clone(),
                    exact_search: false,
                })
                .context("building qdrant client")?,
            ),
        };
        Ok(index)
    }
}
