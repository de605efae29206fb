use futures::future::BoxFuture;

use crate::errors::RagError;

/// Provider interface for embedding generation.
///
/// Async because real providers perform HTTP requests. Implement this trait to
/// plug in another backend; tests use deterministic in-process embedders.
pub trait EmbeddingsProvider: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &str;

    /// Embeds a unit body for storage.
    fn embed<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Vec<f32>, RagError>>;

    /// Embeds a search query. Defaults to [`EmbeddingsProvider::embed`].
    fn embed_query<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Vec<f32>, RagError>> {
        self.embed(text)
    }
}

pub mod gemini;
