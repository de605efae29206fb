//! Unified error types for the crate.

use std::path::PathBuf;

use thiserror::Error;

use crate::ingest::IngestionReport;

/// Top-level error for rag-store operations.
#[derive(Debug, Error)]
pub enum RagError {
    /// Invalid or unsupported configuration (e.g. `top_k = 0`, empty collection name).
    #[error("config error: {0}")]
    Config(String),

    /// The tabular source could not be opened or read.
    #[error("source unavailable: {}: {source}", .path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// The tabular source lacks one or more required columns.
    #[error("schema error: missing required column(s): {}", .missing.join(", "))]
    Schema { missing: Vec<String> },

    /// Some rows could not be indexed; successful rows were still committed.
    #[error(
        "ingestion partially failed: {} of {} row(s) failed",
        .report.failed_rows.len(),
        .report.total_rows
    )]
    IngestionPartialFailure { report: IngestionReport },

    /// The vector index or the embedding provider failed while serving a query.
    #[error("retrieval unavailable: {0}")]
    RetrievalUnavailable(String),

    /// Embedding provider failure.
    #[error("embedding error: {0}")]
    Embedding(String),

    /// Vector index backend failure.
    #[error("vector index error ({backend}): {message}")]
    VectorIndex {
        backend: &'static str,
        message: String,
    },

    /// Mismatch in vector dimensionality.
    #[error("vector size mismatch: got {got}, want {want}")]
    VectorSizeMismatch { got: usize, want: usize },
}

impl RagError {
    pub(crate) fn index(backend: &'static str, message: impl Into<String>) -> Self {
        RagError::VectorIndex {
            backend,
            message: message.into(),
        }
    }
}
