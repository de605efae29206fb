//! Component configuration for ingestion and retrieval.

use crate::errors::RagError;

/// Result count used when none is configured.
pub const DEFAULT_TOP_K: usize = 3;

/// Configuration for [`Retriever`](crate::Retriever).
#[derive(Clone, Debug, PartialEq)]
pub struct RetrieverConfig {
    /// Target collection name.
    pub collection: String,
    /// Maximum number of units returned per query. Must be > 0.
    pub top_k: usize,
}

impl RetrieverConfig {
    /// Config with the default `top_k`.
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            top_k: DEFAULT_TOP_K,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Validates config values.
    pub fn validate(&self) -> Result<(), RagError> {
        if self.collection.trim().is_empty() {
            return Err(RagError::Config("collection is empty".into()));
        }
        if self.top_k == 0 {
            return Err(RagError::Config("top_k must be > 0".into()));
        }
        Ok(())
    }
}

/// Configuration for [`IngestionPipeline`](crate::IngestionPipeline).
#[derive(Clone, Debug, PartialEq)]
pub struct IngestionConfig {
    /// Target collection name; created on first write if absent.
    pub collection: String,
    /// Units per bulk insert.
    pub batch_size: usize,
    /// Concurrent embedding requests within a batch.
    pub embed_concurrency: usize,
    /// Expected vector dimension; probed from the first embedding when `None`.
    pub dimension: Option<usize>,
}

impl IngestionConfig {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            batch_size: 20,
            embed_concurrency: 4,
            dimension: None,
        }
    }

    /// Validates config values.
    pub fn validate(&self) -> Result<(), RagError> {
        if self.collection.trim().is_empty() {
            return Err(RagError::Config("collection is empty".into()));
        }
        if self.batch_size == 0 {
            return Err(RagError::Config("batch_size must be > 0".into()));
        }
        if self.embed_concurrency == 0 {
            return Err(RagError::Config("embed_concurrency must be > 0".into()));
        }
        if self.dimension == Some(0) {
            return Err(RagError::Config("dimension must be > 0".into()));
        }
        Ok(())
    }
}
