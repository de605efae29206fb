//! Embedding executor with bounded concurrency.

use futures::stream::{self, StreamExt};
use tracing::debug;

use crate::{embed::EmbeddingsProvider, errors::RagError, record::RetrievableUnit};

/// Embeds the body of every unit, keeping per-unit outcomes.
///
/// Results come back in input order. A failing unit does not affect the
/// others; its error is returned in place of the vector.
///
/// # Arguments
/// - `units`: `(row_index, unit)` pairs.
/// - `provider`: embedding backend.
/// - `concurrency`: maximum number of in-flight embedding requests.
pub async fn embed_units(
    units: &[(usize, RetrievableUnit)],
    provider: &dyn EmbeddingsProvider,
    concurrency: usize,
) -> Vec<Result<Vec<f32>, RagError>> {
    debug!(
        total = units.len(),
        concurrency,
        provider = provider.name(),
        "embed_pool::embed_units"
    );

    stream::iter(units.iter())
        .map(|(_, unit)| provider.embed(&unit.body))
        .buffered(concurrency.max(1))
        .collect()
        .await
}
