//! Retriever: query text → top-k units from one collection.

use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{debug, instrument, trace};

use crate::{
    config::RetrieverConfig,
    embed::EmbeddingsProvider,
    errors::RagError,
    index::{CollectionBinding, VectorIndex},
    record::{IndexHit, RetrievalResult},
};

/// Read-only similarity search over a configured collection.
///
/// The collection binding is resolved on the first [`Retriever::fetch`] and
/// reused afterwards; concurrent first calls share a single initialization.
pub struct Retriever {
    cfg: RetrieverConfig,
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn EmbeddingsProvider>,
    binding: OnceCell<Arc<dyn CollectionBinding>>,
}

impl Retriever {
    /// # Errors
    /// [`RagError::Config`] if `top_k` is zero or the collection name is blank.
    pub fn new(
        cfg: RetrieverConfig,
        index: Arc<dyn VectorIndex>,
        embedder: Arc<dyn EmbeddingsProvider>,
    ) -> Result<Self, RagError> {
        cfg.validate()?;
        Ok(Self {
            cfg,
            index,
            embedder,
            binding: OnceCell::new(),
        })
    }

    pub fn top_k(&self) -> usize {
        self.cfg.top_k
    }

    pub fn collection(&self) -> &str {
        &self.cfg.collection
    }

    /// Whether the collection binding has been established.
    pub fn is_bound(&self) -> bool {
        self.binding.initialized()
    }

    /// Returns at most `top_k` units, most similar first.
    ///
    /// # Errors
    /// [`RagError::RetrievalUnavailable`] if embedding or the index fails. No retry.
    pub async fn fetch(&self, query: &str) -> Result<RetrievalResult, RagError> {
        let hits = self.fetch_scored(query).await?;
        Ok(hits.into_iter().map(|h| h.unit).collect())
    }

    /// Like [`Retriever::fetch`] but keeps ids and similarity scores.
    #[instrument(skip_all, fields(collection = %self.cfg.collection, top_k = self.cfg.top_k))]
    pub async fn fetch_scored(&self, query: &str) -> Result<Vec<IndexHit>, RagError> {
        let vector = self
            .embedder
            .embed_query(query)
            .await
            .map_err(|e| RagError::RetrievalUnavailable(format!("embedding: {e}")))?;
        trace!(dim = vector.len(), "query embedded");

        let binding = self.binding().await?;
        let mut hits = binding
            .search(&vector, self.cfg.top_k)
            .await
            .map_err(|e| RagError::RetrievalUnavailable(e.to_string()))?;

        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(self.cfg.top_k);
        debug!(hits = hits.len(), "retrieval done");
        Ok(hits)
    }

    async fn binding(&self) -> Result<&Arc<dyn CollectionBinding>, RagError> {
        self.binding
            .get_or_try_init(|| async {
                debug!(collection = %self.cfg.collection, backend = self.index.backend(), "binding collection");
                self.index.open_collection(&self.cfg.collection).await
            })
            .await
            .map_err(|e| RagError::RetrievalUnavailable(e.to_string()))
    }
}
