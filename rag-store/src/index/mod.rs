//! Vector index capability and its bindings.
//!
//! A [`VectorIndex`] hands out [`CollectionBinding`]s; a binding performs the
//! three operations the pipeline needs: create-if-absent, bulk insert with
//! metadata, and k-NN search ordered by descending similarity.
//!
//! Backends:
//! - [`astra::AstraDbIndex`]: DataStax Astra DB Data API over HTTPS
//! - [`qdrant::QdrantIndex`]: Qdrant via `qdrant-client`
//! - [`memory::InMemoryIndex`]: process-local cosine index, no persistence

use std::sync::Arc;

use futures::future::BoxFuture;
use uuid::Uuid;

use crate::{
    errors::RagError,
    record::{IndexHit, IndexPoint},
};

pub mod astra;
pub mod memory;
pub mod qdrant;

/// Entry point to a vector database.
pub trait VectorIndex: Send + Sync {
    /// Backend name for logs and errors.
    fn backend(&self) -> &'static str;

    /// Resolves a binding to the named collection.
    ///
    /// Does not create the collection; see [`CollectionBinding::ensure_created`].
    fn open_collection<'a>(
        &'a self,
        name: &'a str,
    ) -> BoxFuture<'a, Result<Arc<dyn CollectionBinding>, RagError>>;
}

/// Handle to one collection. Safe for concurrent use.
pub trait CollectionBinding: Send + Sync {
    fn name(&self) -> &str;

    /// Creates the collection with cosine similarity if it does not exist.
    fn ensure_created(&self, dimension: usize) -> BoxFuture<'_, Result<(), RagError>>;

    /// Inserts points without deduplication.
    ///
    /// Not atomic: per-point outcomes are reported in [`InsertOutcome`].
    /// `Err` means the whole call failed and nothing is known to be stored.
    fn insert_many(&self, points: Vec<IndexPoint>) -> BoxFuture<'_, Result<InsertOutcome, RagError>>;

    /// Returns up to `top_k` hits, best first.
    fn search<'a>(
        &'a self,
        vector: &'a [f32],
        top_k: usize,
    ) -> BoxFuture<'a, Result<Vec<IndexHit>, RagError>>;

    /// Number of stored units.
    fn count(&self) -> BoxFuture<'_, Result<u64, RagError>>;
}

/// Per-point result of a bulk insert.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct InsertOutcome {
    /// Ids acknowledged by the backend.
    pub inserted: Vec<String>,
    /// `(id, cause)` for points the backend refused.
    pub rejected: Vec<(String, String)>,
}

/// Fresh random point id.
///
/// Ids are never derived from content, so re-ingesting the same rows appends
/// new units instead of overwriting the old ones.
pub fn new_point_id() -> String {
    Uuid::new_v4().to_string()
}

/// Cosine similarity; `0.0` for zero-length or mismatched vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 {
        0.0
    } else {
        dot / (na * nb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_ids_are_unique() {
        assert_ne!(new_point_id(), new_point_id());
    }

    #[test]
    fn cosine_basics() {
        assert!((cosine_similarity(&[1.0, 0.0], &[2.0, 0.0]) - 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 2.0]), 0.0);
    }
}
