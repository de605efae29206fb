//! Qdrant backend.
//!
//! Keeps all `qdrant-client` builder usage in one place. Payloads carry the
//! unit as `{ "content": <body>, "metadata": { ... } }`.

use std::{collections::HashMap, sync::Arc};

use futures::future::BoxFuture;
use qdrant_client::{
    Payload, Qdrant,
    qdrant::{
        CountPointsBuilder, CreateCollectionBuilder, Distance, PointStruct, SearchParamsBuilder,
        SearchPointsBuilder, UpsertPointsBuilder, Value as QValue, VectorParamsBuilder,
        point_id::PointIdOptions,
    },
};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::{
    errors::RagError,
    index::{CollectionBinding, InsertOutcome, VectorIndex},
    record::{IndexHit, IndexPoint, RetrievableUnit, UnitMetadata},
};

const BACKEND: &str = "qdrant";

/// Connection settings for Qdrant.
#[derive(Clone, Debug)]
pub struct QdrantConfig {
    pub url: String,
    pub api_key: Option<String>,
    /// Force exact (brute-force) search instead of HNSW.
    pub exact_search: bool,
}

pub struct QdrantIndex {
    client: Arc<Qdrant>,
    exact: bool,
}

impl QdrantIndex {
    pub fn new(cfg: &QdrantConfig) -> Result<Self, RagError> {
        if cfg.url.trim().is_empty() {
            return Err(RagError::Config("qdrant url must not be empty".into()));
        }
        let mut builder = Qdrant::from_url(&cfg.url);
        if let Some(key) = &cfg.api_key {
            builder = builder.api_key(key.clone());
        }
        let client = builder.build().map_err(|e| RagError::index(BACKEND, e.to_string()))?;
        Ok(Self {
            client: Arc::new(client),
            exact: cfg.exact_search,
        })
    }
}

impl VectorIndex for QdrantIndex {
    fn backend(&self) -> &'static str {
        BACKEND
    }

    fn open_collection<'a>(
        &'a self,
        name: &'a str,
    ) -> BoxFuture<'a, Result<Arc<dyn CollectionBinding>, RagError>> {
        Box::pin(async move {
            if name.trim().is_empty() {
                return Err(RagError::Config("collection name must not be empty".into()));
            }
            let binding = QdrantCollection {
                client: self.client.clone(),
                name: name.to_string(),
                exact: self.exact,
            };
            Ok(Arc::new(binding) as Arc<dyn CollectionBinding>)
        })
    }
}

struct QdrantCollection {
    client: Arc<Qdrant>,
    name: String,
    exact: bool,
}

impl QdrantCollection {
    async fn ensure_created_impl(&self, dimension: usize) -> Result<(), RagError> {
        let exists = self
            .client
            .collection_exists(&self.name)
            .await
            .map_err(|e| RagError::index(BACKEND, e.to_string()))?;
        if exists {
            debug!(collection = %self.name, "qdrant: collection exists");
            return Ok(());
        }

        info!(collection = %self.name, dimension, "qdrant: creating collection (cosine)");
        self.client
            .create_collection(
                CreateCollectionBuilder::new(&self.name)
                    .vectors_config(VectorParamsBuilder::new(dimension as u64, Distance::Cosine)),
            )
            .await
            .map_err(|e| RagError::index(BACKEND, e.to_string()))?;
        Ok(())
    }

    async fn insert_many_impl(&self, points: Vec<IndexPoint>) -> Result<InsertOutcome, RagError> {
        if points.is_empty() {
            return Ok(InsertOutcome::default());
        }

        let mut outcome = InsertOutcome::default();
        let mut batch = Vec::with_capacity(points.len());
        let mut ids = Vec::with_capacity(points.len());
        for p in points {
            let payload = json!({
                "content": p.unit.body,
                "metadata": p.unit.metadata,
            });
            match Payload::try_from(payload) {
                Ok(payload) => {
                    ids.push(p.id.clone());
                    batch.push(PointStruct::new(p.id, p.vector, payload));
                }
                Err(e) => outcome.rejected.push((p.id, e.to_string())),
            }
        }

        debug!(collection = %self.name, points = batch.len(), "qdrant: upsert");
        // Upserts are all-or-nothing per request.
        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.name, batch).wait(true))
            .await
            .map_err(|e| RagError::index(BACKEND, e.to_string()))?;

        outcome.inserted = ids;
        Ok(outcome)
    }

    async fn search_impl(&self, vector: &[f32], top_k: usize) -> Result<Vec<IndexHit>, RagError> {
        let mut builder =
            SearchPointsBuilder::new(&self.name, vector.to_vec(), top_k as u64).with_payload(true);
        if self.exact {
            builder = builder.params(SearchParamsBuilder::default().exact(true));
        }

        let res = self
            .client
            .search_points(builder)
            .await
            .map_err(|e| RagError::index(BACKEND, e.to_string()))?;

        let mut hits = Vec::with_capacity(res.result.len());
        for r in res.result {
            let id = match r.id.and_then(|p| p.point_id_options) {
                Some(PointIdOptions::Uuid(s)) => s,
                Some(PointIdOptions::Num(n)) => n.to_string(),
                None => String::new(),
            };
            match payload_to_unit(r.payload) {
                Some(unit) => hits.push(IndexHit {
                    id,
                    score: r.score,
                    unit,
                }),
                None => warn!(collection = %self.name, %id, "qdrant: skipping hit with malformed payload"),
            }
        }
        Ok(hits)
    }

    async fn count_impl(&self) -> Result<u64, RagError> {
        let res = self
            .client
            .count(CountPointsBuilder::new(&self.name).exact(true))
            .await
            .map_err(|e| RagError::index(BACKEND, e.to_string()))?;
        Ok(res.result.map(|r| r.count).unwrap_or(0))
    }
}

impl CollectionBinding for QdrantCollection {
    fn name(&self) -> &str {
        &self.name
    }

    fn ensure_created(&self, dimension: usize) -> BoxFuture<'_, Result<(), RagError>> {
        Box::pin(self.ensure_created_impl(dimension))
    }

    fn insert_many(&self, points: Vec<IndexPoint>) -> BoxFuture<'_, Result<InsertOutcome, RagError>> {
        Box::pin(self.insert_many_impl(points))
    }

    fn search<'a>(
        &'a self,
        vector: &'a [f32],
        top_k: usize,
    ) -> BoxFuture<'a, Result<Vec<IndexHit>, RagError>> {
        Box::pin(self.search_impl(vector, top_k))
    }

    fn count(&self) -> BoxFuture<'_, Result<u64, RagError>> {
        Box::pin(self.count_impl())
    }
}

/// Rebuilds a unit from a stored payload; `None` if fields are missing.
fn payload_to_unit(payload: HashMap<String, QValue>) -> Option<RetrievableUnit> {
    let mut obj = serde_json::Map::new();
    for (k, v) in payload {
        obj.insert(k, qvalue_to_json(v));
    }
    let body = obj.get("content")?.as_str()?.to_string();
    let metadata: UnitMetadata = serde_json::from_value(obj.remove("metadata")?).ok()?;
    Some(RetrievableUnit { body, metadata })
}

fn qvalue_to_json(v: QValue) -> serde_json::Value {
    use qdrant_client::qdrant::value::Kind as K;
    match v.kind {
        Some(K::StringValue(s)) => serde_json::Value::String(s),
        Some(K::IntegerValue(i)) => serde_json::Value::Number(i.into()),
        Some(K::DoubleValue(f)) => json!(f),
        Some(K::BoolValue(b)) => serde_json::Value::Bool(b),
        Some(K::StructValue(s)) => serde_json::Value::Object(
            s.fields
                .into_iter()
                .map(|(k, v)| (k, qvalue_to_json(v)))
                .collect(),
        ),
        Some(K::ListValue(l)) => {
            serde_json::Value::Array(l.values.into_iter().map(qvalue_to_json).collect())
        }
        Some(K::NullValue(_)) | None => serde_json::Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qdrant_client::qdrant::value::Kind;

    fn s(v: &str) -> QValue {
        QValue {
            kind: Some(Kind::StringValue(v.into())),
        }
    }

    #[test]
    fn payload_round_trips_through_json() {
        let payload = Payload::try_from(json!({
            "content": "great sound",
            "metadata": {
                "product_name": "Headphone X",
                "product_rating": 5.0,
                "product_summary": "Loved it",
            },
        }))
        .unwrap();
        let map: HashMap<String, QValue> = payload.into();
        let unit = payload_to_unit(map).unwrap();
        assert_eq!(unit.body, "great sound");
        assert_eq!(unit.metadata.product_name, "Headphone X");
        assert_eq!(unit.metadata.product_rating, 5.0);
    }

    #[test]
    fn malformed_payload_is_rejected() {
        let mut map = HashMap::new();
        map.insert("content".to_string(), s("only body"));
        assert!(payload_to_unit(map).is_none());
    }

    #[test]
    fn empty_url_is_config_error() {
        let cfg = QdrantConfig {
            url: " ".into(),
            api_key: None,
            exact_search: false,
        };
        assert!(matches!(QdrantIndex::new(&cfg), Err(RagError::Config(_))));
    }
}
