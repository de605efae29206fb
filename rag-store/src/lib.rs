//! Review corpus ingestion and retrieval over a vector index.
//!
//! This crate provides:
//! - a fixed-schema CSV reader and row → unit mapping
//! - the [`EmbeddingsProvider`] and [`VectorIndex`] capabilities with concrete bindings
//! - [`IngestionPipeline`] to populate a collection
//! - [`Retriever`] to fetch the top-k units for a query
//!
//! The design is flat and splits responsibilities into focused modules.

mod config;
pub mod embed;
mod embed_pool;
mod errors;
pub mod index;
mod ingest;
mod mappers;
mod record;
mod retrieve;
mod source;

pub use config::{DEFAULT_TOP_K, IngestionConfig, RetrieverConfig};
pub use embed::{EmbeddingsProvider, gemini::GeminiEmbedder};
pub use errors::RagError;
pub use index::{
    CollectionBinding, InsertOutcome, VectorIndex,
    astra::{AstraDbConfig, AstraDbIndex},
    memory::InMemoryIndex,
    qdrant::{QdrantConfig, QdrantIndex},
};
pub use ingest::{IngestionPipeline, IngestionReport, RowFailure};
pub use mappers::to_unit;
pub use record::{
    IndexHit, IndexPoint, REQUIRED_COLUMNS, RetrievableUnit, RetrievalResult, SourceRecord,
    UnitMetadata,
};
pub use retrieve::Retriever;
pub use source::CsvSource;
