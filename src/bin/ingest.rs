//! Offline ingestion: loads the configured review CSV into the vector index.
//!
//! Exits non-zero when any row failed; the failures are logged one per line.

use anyhow::{Context, Result};
use app_settings::Purpose;
use product_assistant::bootstrap;
use rag_store::IngestionPipeline;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = bootstrap::load_settings()?;
    let components = bootstrap::build(cfg, Purpose::Ingestion)?;
    let cfg = &components.cfg;

    let pipeline = IngestionPipeline::new(
        bootstrap::ingestion_config(cfg),
        components.index.clone(),
        components.embedder.clone(),
    )
    .context("building ingestion pipeline")?;

    let source = &cfg.ingestion.source_path;
    info!(source = %source.display(), collection = %cfg.collection_name, "ingestion started");
    let report = pipeline
        .run(source)
        .await
        .with_context(|| format!("ingesting {}", source.display()))?;

    info!(
        total_rows = report.total_rows,
        inserted = report.inserted_count,
        failed = report.failed_rows.len(),
        "ingestion report"
    );
    for f in &report.failed_rows {
        warn!(row = f.row, cause = %f.cause, "row failed");
    }

    if let Some(query) = &cfg.ingestion.sample_query {
        let retriever = &components.retriever;
        let hits = retriever
            .fetch_scored(query)
            .await
            .context("running sample query")?;
        info!(
            %query,
            collection = retriever.collection(),
            top_k = retriever.top_k(),
            hits = hits.len(),
            "sample query"
        );
        for h in hits {
            info!(
                score = h.score,
                product = %h.unit.metadata.product_name,
                rating = h.unit.metadata.product_rating,
                review = %h.unit.body,
                "hit"
            );
        }
    }

    report
        .into_result()
        .context("some rows were not indexed")?;
    Ok(())
}
