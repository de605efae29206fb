//! Typed error for the rag-chain crate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChainError {
    /// Invalid chain configuration (unknown template, zero timeout).
    #[error("config error: {0}")]
    Config(String),

    /// Retrieval failed or timed out; generation was not attempted.
    #[error("retrieval failed: {0}")]
    RetrievalUnavailable(#[source] rag_store::RagError),

    /// The generation provider failed, timed out, or returned nothing usable.
    #[error("generation failed: {0}")]
    GenerationFailure(String),
}
