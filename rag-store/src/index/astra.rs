//! Astra DB backend over the Data API (JSON commands on HTTPS).
//!
//! Documents are stored as
//! `{ "_id", "$vector", "content", "metadata": { product_name, product_rating, product_summary } }`.

use std::{sync::Arc, time::Duration};

use futures::future::BoxFuture;
use reqwest::{
    Client,
    header::{CONTENT_TYPE, HeaderMap, HeaderValue},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::{
    errors::RagError,
    index::{CollectionBinding, InsertOutcome, VectorIndex},
    record::{IndexHit, IndexPoint, RetrievableUnit, UnitMetadata},
};

const BACKEND: &str = "astra_db";

/// Largest `insertMany` the Data API accepts.
pub const MAX_INSERT_BATCH: usize = 100;

#[derive(Clone, Debug)]
pub struct AstraDbConfig {
    /// Database API endpoint, e.g. `https://<id>-<region>.apps.astra.datastax.com`.
    pub api_endpoint: String,
    pub token: String,
    pub keyspace: String,
    pub timeout_secs: u64,
}

pub struct AstraDbIndex {
    http: Client,
    /// `{endpoint}/api/json/v1/{keyspace}`
    base: Arc<str>,
}

impl AstraDbIndex {
    pub fn new(cfg: &AstraDbConfig) -> Result<Self, RagError> {
        let endpoint = cfg.api_endpoint.trim().trim_end_matches('/');
        if !(endpoint.starts_with("https://") || endpoint.starts_with("http://")) {
            return Err(RagError::Config(format!(
                "astra db endpoint must start with http:// or https://, got `{endpoint}`"
            )));
        }
        if cfg.keyspace.trim().is_empty() {
            return Err(RagError::Config("astra db keyspace must not be empty".into()));
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let token = HeaderValue::from_str(&cfg.token)
            .map_err(|_| RagError::Config("astra db token contains invalid header characters".into()))?;
        headers.insert("token", token);

        let http = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(cfg.timeout_secs.max(1)))
            .build()
            .map_err(|e| RagError::index(BACKEND, e.to_string()))?;

        Ok(Self {
            http,
            base: format!("{endpoint}/api/json/v1/{}", cfg.keyspace.trim()).into(),
        })
    }
}

impl VectorIndex for AstraDbIndex {
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
            let binding = AstraCollection {
                http: self.http.clone(),
                keyspace_url: self.base.clone(),
                url: format!("{}/{name}", self.base),
                name: name.to_string(),
            };
            Ok(Arc::new(binding) as Arc<dyn CollectionBinding>)
        })
    }
}

/// Data API response envelope.
#[derive(Debug, Default, Deserialize)]
struct CommandResponse {
    #[serde(default)]
    status: Option<Value>,
    #[serde(default)]
    data: Option<FindData>,
    #[serde(default)]
    errors: Vec<CommandError>,
}

#[derive(Debug, Default, Deserialize)]
struct FindData {
    #[serde(default)]
    documents: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct CommandError {
    #[serde(default)]
    message: String,
    #[serde(default, rename = "errorCode")]
    error_code: Option<String>,
}

fn join_errors(errors: &[CommandError]) -> String {
    errors
        .iter()
        .map(|e| match &e.error_code {
            Some(code) => format!("{code}: {}", e.message),
            None => e.message.clone(),
        })
        .collect::<Vec<_>>()
        .join("; ")
}

struct AstraCollection {
    http: Client,
    keyspace_url: Arc<str>,
    url: String,
    name: String,
}

impl AstraCollection {
    async fn command(&self, url: &str, body: Value) -> Result<CommandResponse, RagError> {
        let resp = self
            .http
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| RagError::index(BACKEND, e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            let snippet: String = text.chars().take(240).collect();
            return Err(RagError::index(BACKEND, format!("HTTP {status}: {snippet}")));
        }

        resp.json::<CommandResponse>()
            .await
            .map_err(|e| RagError::index(BACKEND, format!("decode: {e}")))
    }

    /// Runs a command where any reported error fails the whole call.
    async fn strict_command(&self, url: &str, body: Value) -> Result<CommandResponse, RagError> {
        let out = self.command(url, body).await?;
        if !out.errors.is_empty() {
            return Err(RagError::index(BACKEND, join_errors(&out.errors)));
        }
        Ok(out)
    }

    async fn ensure_created_impl(&self, dimension: usize) -> Result<(), RagError> {
        let found = self
            .strict_command(&self.keyspace_url, json!({ "findCollections": {} }))
            .await?;
        let exists = found
            .status
            .as_ref()
            .and_then(|s| s.get("collections"))
            .and_then(Value::as_array)
            .is_some_and(|names| names.iter().any(|n| n.as_str() == Some(self.name.as_str())));
        if exists {
            debug!(collection = %self.name, "astra: collection exists");
            return Ok(());
        }

        info!(collection = %self.name, dimension, "astra: creating collection (cosine)");
        self.strict_command(
            &self.keyspace_url,
            json!({
                "createCollection": {
                    "name": self.name,
                    "options": { "vector": { "dimension": dimension, "metric": "cosine" } }
                }
            }),
        )
        .await?;
        Ok(())
    }

    /// Sends one `insertMany`. Nothing is recorded in `outcome` when it errors.
    async fn insert_chunk(
        &self,
        chunk: Vec<IndexPoint>,
        ids: &[String],
        outcome: &mut InsertOutcome,
    ) -> Result<(), RagError> {
        let documents: Vec<Value> = chunk
            .into_iter()
            .map(|p| {
                json!({
                    "_id": p.id,
                    "$vector": p.vector,
                    "content": p.unit.body,
                    "metadata": p.unit.metadata,
                })
            })
            .collect();

        let out = self
            .command(
                &self.url,
                json!({ "insertMany": { "documents": documents, "options": { "ordered": false } } }),
            )
            .await?;

        let acked: Vec<String> = out
            .status
            .as_ref()
            .and_then(|s| s.get("insertedIds"))
            .and_then(Value::as_array)
            .map(|ids| {
                ids.iter()
                    .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()))
                    .collect()
            })
            .unwrap_or_default();

        if acked.is_empty() && !out.errors.is_empty() {
            return Err(RagError::index(BACKEND, join_errors(&out.errors)));
        }

        let cause = if out.errors.is_empty() {
            "not acknowledged by astra db".to_string()
        } else {
            join_errors(&out.errors)
        };
        for id in ids {
            if acked.contains(id) {
                outcome.inserted.push(id.clone());
            } else {
                outcome.rejected.push((id.clone(), cause.clone()));
            }
        }
        Ok(())
    }

    /// Inserts in chunks of [`MAX_INSERT_BATCH`].
    ///
    /// A failed chunk rejects its own ids and the remaining chunks are still
    /// sent, so acknowledgements from earlier chunks are never lost. The call
    /// only errors when a chunk failed and nothing was acknowledged.
    async fn insert_many_impl(&self, points: Vec<IndexPoint>) -> Result<InsertOutcome, RagError> {
        let mut outcome = InsertOutcome::default();
        let mut first_error = None;
        let mut rest = points;
        while !rest.is_empty() {
            let tail = rest.split_off(rest.len().min(MAX_INSERT_BATCH));
            let chunk = std::mem::replace(&mut rest, tail);
            let ids: Vec<String> = chunk.iter().map(|p| p.id.clone()).collect();
            debug!(collection = %self.name, docs = chunk.len(), "astra: insertMany");
            if let Err(e) = self.insert_chunk(chunk, &ids, &mut outcome).await {
                warn!(collection = %self.name, docs = ids.len(), error = %e, "astra: insertMany failed");
                let cause = e.to_string();
                outcome
                    .rejected
                    .extend(ids.into_iter().map(|id| (id, cause.clone())));
                first_error.get_or_insert(e);
            }
        }
        if outcome.inserted.is_empty() {
            if let Some(e) = first_error {
                return Err(e);
            }
        }
        if !outcome.rejected.is_empty() {
            warn!(
                collection = %self.name,
                rejected = outcome.rejected.len(),
                "astra: some documents were not inserted"
            );
        }
        Ok(outcome)
    }

    async fn search_impl(&self, vector: &[f32], top_k: usize) -> Result<Vec<IndexHit>, RagError> {
        let out = self
            .strict_command(
                &self.url,
                json!({
                    "find": {
                        "sort": { "$vector": vector },
                        "projection": { "$vector": 0 },
                        "options": { "limit": top_k, "includeSimilarity": true }
                    }
                }),
            )
            .await?;

        let docs = out.data.map(|d| d.documents).unwrap_or_default();
        let mut hits = Vec::with_capacity(docs.len());
        for doc in docs {
            match document_to_hit(doc) {
                Some(hit) => hits.push(hit),
                None => warn!(collection = %self.name, "astra: skipping malformed document"),
            }
        }
        Ok(hits)
    }

    async fn count_impl(&self) -> Result<u64, RagError> {
        let out = self
            .strict_command(&self.url, json!({ "countDocuments": {} }))
            .await?;
        Ok(out
            .status
            .as_ref()
            .and_then(|s| s.get("count"))
            .and_then(Value::as_u64)
            .unwrap_or(0))
    }
}

impl CollectionBinding for AstraCollection {
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

fn document_to_hit(mut doc: Value) -> Option<IndexHit> {
    let id = match doc.get("_id")? {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    let score = doc.get("$similarity").and_then(Value::as_f64).unwrap_or(0.0) as f32;
    let body = doc.get("content")?.as_str()?.to_string();
    let metadata: UnitMetadata = serde_json::from_value(doc.get_mut("metadata")?.take()).ok()?;
    Some(IndexHit {
        id,
        score,
        unit: RetrievableUnit { body, metadata },
    })
}
