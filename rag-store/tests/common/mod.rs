//! Test doubles shared by the integration tests.
#![allow(dead_code)]

use std::{
    io::Write,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use futures::future::BoxFuture;
use rag_store::{
    AstraDbConfig, AstraDbIndex, CollectionBinding, EmbeddingsProvider, InMemoryIndex, IndexHit,
    IndexPoint, InsertOutcome, RagError, RetrievableUnit, UnitMetadata, VectorIndex,
};
use serde_json::{Value, json};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
};

pub const DIM: usize = 64;

pub const HEADER: &str = "product_title,rating,summary,review\n";

/// Writes `HEADER` + `rows` to a temp CSV file.
pub fn csv_file(rows: &str) -> tempfile::NamedTempFile {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    f.write_all(HEADER.as_bytes()).unwrap();
    f.write_all(rows.as_bytes()).unwrap();
    f
}

/// Deterministic bag-of-words embedder: each lowercase token bumps one bucket.
#[derive(Default)]
pub struct HashEmbedder {
    pub calls: AtomicUsize,
    /// Bodies containing this marker fail to embed.
    pub fail_on: Option<&'static str>,
}

impl HashEmbedder {
    pub fn failing_on(marker: &'static str) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_on: Some(marker),
        }
    }

    fn vectorize(text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; DIM];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let mut h: u64 = 0xcbf29ce484222325;
            for b in token.to_lowercase().bytes() {
                h ^= b as u64;
                h = h.wrapping_mul(0x100000001b3);
            }
            v[(h % DIM as u64) as usize] += 1.0;
        }
        v
    }
}

impl EmbeddingsProvider for HashEmbedder {
    fn name(&self) -> &str {
        "hash"
    }

    fn embed<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Vec<f32>, RagError>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(marker) = self.fail_on {
                if text.contains(marker) {
                    return Err(RagError::Embedding(format!("refused `{marker}`")));
                }
            }
            Ok(Self::vectorize(text))
        })
    }
}

/// Always fails, as if the provider were unreachable.
pub struct DownEmbedder;

impl EmbeddingsProvider for DownEmbedder {
    fn name(&self) -> &str {
        "down"
    }

    fn embed<'a>(&'a self, _text: &'a str) -> BoxFuture<'a, Result<Vec<f32>, RagError>> {
        Box::pin(async { Err(RagError::Embedding("connection refused".into())) })
    }
}

/// Wraps an index and counts `open_collection` calls.
pub struct CountingIndex {
    pub inner: Arc<dyn VectorIndex>,
    pub opens: AtomicUsize,
}

impl CountingIndex {
    pub fn new(inner: Arc<dyn VectorIndex>) -> Self {
        Self {
            inner,
            opens: AtomicUsize::new(0),
        }
    }
}

impl VectorIndex for CountingIndex {
    fn backend(&self) -> &'static str {
        "counting"
    }

    fn open_collection<'a>(
        &'a self,
        name: &'a str,
    ) -> BoxFuture<'a, Result<Arc<dyn CollectionBinding>, RagError>> {
        Box::pin(async move {
            self.opens.fetch_add(1, Ordering::SeqCst);
            // Widen the init window so concurrent first calls overlap.
            tokio::task::yield_now().await;
            self.inner.open_collection(name).await
        })
    }
}

/// Index whose collections reject points whose body contains a marker,
/// or fail every search.
pub struct FaultyIndex {
    pub inner: InMemoryIndex,
    pub reject_marker: Option<&'static str>,
    pub search_down: bool,
}

impl VectorIndex for FaultyIndex {
    fn backend(&self) -> &'static str {
        "faulty"
    }

    fn open_collection<'a>(
        &'a self,
        name: &'a str,
    ) -> BoxFuture<'a, Result<Arc<dyn CollectionBinding>, RagError>> {
        Box::pin(async move {
            let inner = self.inner.open_collection(name).await?;
            Ok(Arc::new(FaultyCollection {
                inner,
                reject_marker: self.reject_marker,
                search_down: self.search_down,
            }) as Arc<dyn CollectionBinding>)
        })
    }
}

struct FaultyCollection {
    inner: Arc<dyn CollectionBinding>,
    reject_marker: Option<&'static str>,
    search_down: bool,
}

impl CollectionBinding for FaultyCollection {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn ensure_created(&self, dimension: usize) -> BoxFuture<'_, Result<(), RagError>> {
        self.inner.ensure_created(dimension)
    }

    fn insert_many(&self, points: Vec<IndexPoint>) -> BoxFuture<'_, Result<InsertOutcome, RagError>> {
        Box::pin(async move {
            let (bad, good): (Vec<_>, Vec<_>) = points.into_iter().partition(|p| {
                self.reject_marker
                    .is_some_and(|m| p.unit.body.contains(m))
            });
            let mut outcome = self.inner.insert_many(good).await?;
            outcome
                .rejected
                .extend(bad.into_iter().map(|p| (p.id, "document rejected".to_string())));
            Ok(outcome)
        })
    }

    fn search<'a>(
        &'a self,
        vector: &'a [f32],
        top_k: usize,
    ) -> BoxFuture<'a, Result<Vec<IndexHit>, RagError>> {
        if self.search_down {
            return Box::pin(async {
                Err(RagError::VectorIndex {
                    backend: "faulty",
                    message: "unreachable".into(),
                })
            });
        }
        self.inner.search(vector, top_k)
    }

    fn count(&self) -> BoxFuture<'_, Result<u64, RagError>> {
        self.inner.count()
    }
}

/// A point with a fixed vector and the given body.
pub fn point(id: impl Into<String>, body: &str) -> IndexPoint {
    IndexPoint {
        id: id.into(),
        vector: vec![1.0, 0.0],
        unit: RetrievableUnit {
            body: body.into(),
            metadata: UnitMetadata {
                product_name: "Headphone X".into(),
                product_rating: 4.0,
                product_summary: "Good bass".into(),
            },
        },
    }
}

type Responder = dyn Fn(&Value) -> (u16, Value) + Send + Sync;

/// Local HTTP server standing in for the Astra Data API.
///
/// Every request body is recorded; `respond` maps a command to a status and
/// a JSON reply. Connections are closed after one exchange.
pub struct DataApiStub {
    pub endpoint: String,
    commands: Arc<Mutex<Vec<Value>>>,
}

impl DataApiStub {
    pub async fn start<F>(respond: F) -> Self
    where
        F: Fn(&Value) -> (u16, Value) + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = format!("http://{}", listener.local_addr().unwrap());
        let commands = Arc::new(Mutex::new(Vec::new()));
        let respond: Arc<Responder> = Arc::new(respond);

        let log = commands.clone();
        tokio::spawn(async move {
            while let Ok((mut sock, _)) = listener.accept().await {
                let respond = respond.clone();
                let log = log.clone();
                tokio::spawn(async move {
                    let Some(body) = read_json_body(&mut sock).await else {
                        return;
                    };
                    let (status, reply) = respond(&body);
                    log.lock().unwrap().push(body);
                    let payload = reply.to_string();
                    let head = format!(
                        "HTTP/1.1 {status} Stub\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n",
                        payload.len()
                    );
                    let _ = sock.write_all(head.as_bytes()).await;
                    let _ = sock.write_all(payload.as_bytes()).await;
                    let _ = sock.shutdown().await;
                });
            }
        });

        Self { endpoint, commands }
    }

    pub fn index(&self) -> AstraDbIndex {
        AstraDbIndex::new(&AstraDbConfig {
            api_endpoint: self.endpoint.clone(),
            token: "AstraCS:test".into(),
            keyspace: "default_keyspace".into(),
            timeout_secs: 5,
        })
        .unwrap()
    }

    /// Request bodies received so far, in arrival order.
    pub fn commands(&self) -> Vec<Value> {
        self.commands.lock().unwrap().clone()
    }

    /// Received `insertMany` commands.
    pub fn inserts(&self) -> Vec<Value> {
        self.commands()
            .into_iter()
            .filter(|c| c.get("insertMany").is_some())
            .collect()
    }
}

/// `_id`s of the documents in an `insertMany` command.
pub fn sent_ids(cmd: &Value) -> Vec<String> {
    cmd["insertMany"]["documents"]
        .as_array()
        .map(|docs| {
            docs.iter()
                .filter_map(|d| d["_id"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

/// Reply acknowledging the given ids.
pub fn inserted(ids: &[String]) -> Value {
    json!({ "status": { "insertedIds": ids } })
}

async fn read_json_body(sock: &mut TcpStream) -> Option<Value> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 8192];
    let header_end = loop {
        let n = sock.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_ascii_lowercase();
    let len = head
        .lines()
        .find_map(|l| l.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(0);
    while buf.len() < header_end + len {
        let n = sock.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    serde_json::from_slice(&buf[header_end..header_end + len]).ok()
}
