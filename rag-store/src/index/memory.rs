//! In-memory vector index.
//!
//! Brute-force cosine search over a `Vec` per collection. Nothing is persisted;
//! used by tests and local experiments.

use std::{collections::HashMap, sync::Arc};

use futures::future::BoxFuture;
use tokio::sync::RwLock;

use crate::{
    errors::RagError,
    index::{CollectionBinding, InsertOutcome, VectorIndex, cosine_similarity},
    record::{IndexHit, IndexPoint},
};

#[derive(Default)]
pub struct InMemoryIndex {
    collections: RwLock<HashMap<String, Arc<MemoryCollection>>>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the collection has been created by a write.
    pub async fn has_collection(&self, name: &str) -> bool {
        match self.collections.read().await.get(name) {
            Some(c) => c.dimension.read().await.is_some(),
            None => false,
        }
    }
}

impl VectorIndex for InMemoryIndex {
    fn backend(&self) -> &'static str {
        "memory"
    }

    fn open_collection<'a>(
        &'a self,
        name: &'a str,
    ) -> BoxFuture<'a, Result<Arc<dyn CollectionBinding>, RagError>> {
        Box::pin(async move {
            let mut map = self.collections.write().await;
            let coll = map
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(MemoryCollection::new(name)))
                .clone();
            Ok(coll as Arc<dyn CollectionBinding>)
        })
    }
}

struct MemoryCollection {
    name: String,
    dimension: RwLock<Option<usize>>,
    points: RwLock<Vec<IndexPoint>>,
}

impl MemoryCollection {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            dimension: RwLock::new(None),
            points: RwLock::new(Vec::new()),
        }
    }
}

impl CollectionBinding for MemoryCollection {
    fn name(&self) -> &str {
        &self.name
    }

    fn ensure_created(&self, dimension: usize) -> BoxFuture<'_, Result<(), RagError>> {
        Box::pin(async move {
            let mut dim = self.dimension.write().await;
            if dim.is_none() {
                *dim = Some(dimension);
            }
            Ok(())
        })
    }

    fn insert_many(&self, points: Vec<IndexPoint>) -> BoxFuture<'_, Result<InsertOutcome, RagError>> {
        Box::pin(async move {
            let dim = *self.dimension.read().await;
            let Some(dim) = dim else {
                return Err(RagError::index("memory", format!("collection `{}` does not exist", self.name)));
            };

            let mut outcome = InsertOutcome::default();
            let mut stored = self.points.write().await;
            for p in points {
                if p.vector.len() == dim {
                    outcome.inserted.push(p.id.clone());
                    stored.push(p);
                } else {
                    let cause = format!("vector has {} dimensions, collection expects {dim}", p.vector.len());
                    outcome.rejected.push((p.id, cause));
                }
            }
            Ok(outcome)
        })
    }

    fn search<'a>(
        &'a self,
        vector: &'a [f32],
        top_k: usize,
    ) -> BoxFuture<'a, Result<Vec<IndexHit>, RagError>> {
        Box::pin(async move {
            let stored = self.points.read().await;
            let mut hits: Vec<IndexHit> = stored
                .iter()
                .map(|p| IndexHit {
                    id: p.id.clone(),
                    score: cosine_similarity(vector, &p.vector),
                    unit: p.unit.clone(),
                })
                .collect();
            hits.sort_by(|a, b| b.score.total_cmp(&a.score));
            hits.truncate(top_k);
            Ok(hits)
        })
    }

    fn count(&self) -> BoxFuture<'_, Result<u64, RagError>> {
        Box::pin(async move { Ok(self.points.read().await.len() as u64) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{RetrievableUnit, UnitMetadata};

    fn point(id: &str, vector: Vec<f32>) -> IndexPoint {
        IndexPoint {
            id: id.into(),
            vector,
            unit: RetrievableUnit {
                body: format!("body {id}"),
                metadata: UnitMetadata {
                    product_name: id.into(),
                    product_rating: 3.0,
                    product_summary: String::new(),
                },
            },
        }
    }

    #[tokio::test]
    async fn insert_requires_created_collection() {
        let index = InMemoryIndex::new();
        let coll = index.open_collection("c").await.unwrap();
        assert!(coll.insert_many(vec![point("a", vec![1.0, 0.0])]).await.is_err());
        assert!(!index.has_collection("c").await);
    }

    #[tokio::test]
    async fn search_orders_by_similarity() {
        let index = InMemoryIndex::new();
        let coll = index.open_collection("c").await.unwrap();
        coll.ensure_created(2).await.unwrap();
        let out = coll
            .insert_many(vec![
                point("far", vec![0.0, 1.0]),
                point("near", vec![1.0, 0.1]),
                point("bad", vec![1.0]),
            ])
            .await
            .unwrap();
        assert_eq!(out.inserted, ["far", "near"]);
        assert_eq!(out.rejected.len(), 1);

        let hits = coll.search(&[1.0, 0.0], 5).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, "near");
        assert_eq!(coll.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn bindings_share_storage() {
        let index = InMemoryIndex::new();
        let a = index.open_collection("c").await.unwrap();
        a.ensure_created(1).await.unwrap();
        a.insert_many(vec![point("x", vec![1.0])]).await.unwrap();
        let b = index.open_collection("c").await.unwrap();
        assert_eq!(b.count().await.unwrap(), 1);
    }
}
