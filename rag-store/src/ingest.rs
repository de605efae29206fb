//! Ingestion pipeline: read CSV → map rows → embed bodies → bulk insert.
//!
//! Row-level problems (unparsable row, blank review, embedding failure,
//! rejected insert) never abort the run; they are collected into the
//! [`IngestionReport`]. Source, schema, and collection-creation errors are
//! fatal and returned before anything is written.

use std::{path::Path, sync::Arc};

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    config::IngestionConfig,
    embed::EmbeddingsProvider,
    embed_pool::embed_units,
    errors::RagError,
    index::{CollectionBinding, VectorIndex, new_point_id},
    mappers::to_unit,
    record::{IndexPoint, RetrievableUnit},
    source::CsvSource,
};

/// A row that did not make it into the collection.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RowFailure {
    /// 0-based data row index (header excluded).
    pub row: usize,
    pub cause: String,
}

/// Outcome of one ingestion run.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct IngestionReport {
    pub total_rows: usize,
    pub inserted_count: usize,
    /// Point ids acknowledged by the index, in row order.
    pub inserted_ids: Vec<String>,
    /// Sorted by row index.
    pub failed_rows: Vec<RowFailure>,
}

impl IngestionReport {
    pub fn is_complete(&self) -> bool {
        self.failed_rows.is_empty()
    }

    /// `Err(IngestionPartialFailure)` when any row failed.
    pub fn into_result(self) -> Result<IngestionReport, RagError> {
        if self.is_complete() {
            Ok(self)
        } else {
            Err(RagError::IngestionPartialFailure { report: self })
        }
    }
}

pub struct IngestionPipeline {
    cfg: IngestionConfig,
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn EmbeddingsProvider>,
}

impl IngestionPipeline {
    /// # Errors
    /// [`RagError::Config`] if `cfg` is invalid.
    pub fn new(
        cfg: IngestionConfig,
        index: Arc<dyn VectorIndex>,
        embedder: Arc<dyn EmbeddingsProvider>,
    ) -> Result<Self, RagError> {
        cfg.validate()?;
        Ok(Self {
            cfg,
            index,
            embedder,
        })
    }

    /// Ingests every row of the CSV at `path` into the configured collection.
    ///
    /// Re-running on the same source appends duplicates.
    ///
    /// # Errors
    /// - [`RagError::SourceUnavailable`] / [`RagError::Schema`] for input problems
    /// - any error from opening or creating the collection
    pub async fn run(&self, path: impl AsRef<Path>) -> Result<IngestionReport, RagError> {
        let source = CsvSource::open(path.as_ref())?;

        let mut report = IngestionReport::default();
        let mut units: Vec<(usize, RetrievableUnit)> = Vec::new();
        for (row, parsed) in source.rows() {
            report.total_rows += 1;
            match parsed.and_then(to_unit) {
                Ok(unit) => units.push((row, unit)),
                Err(cause) => {
                    warn!(row, %cause, "skipping row");
                    report.failed_rows.push(RowFailure { row, cause });
                }
            }
        }
        info!(
            rows = report.total_rows,
            units = units.len(),
            collection = %self.cfg.collection,
            backend = self.index.backend(),
            "ingestion: source mapped"
        );

        if units.is_empty() {
            report.failed_rows.sort_by_key(|f| f.row);
            return Ok(report);
        }

        let coll = self.index.open_collection(&self.cfg.collection).await?;

        let batches = units.len().div_ceil(self.cfg.batch_size);
        let pb = ProgressBar::new(batches as u64);
        pb.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({eta})",
            )
            .map(|s| s.progress_chars("##-"))
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );

        let mut dimension = self.cfg.dimension;
        let mut created = false;
        for batch in units.chunks(self.cfg.batch_size) {
            let result = self
                .ingest_batch(coll.as_ref(), batch, &mut dimension, &mut created, &mut report)
                .await;
            if let Err(e) = result {
                pb.abandon();
                return Err(e);
            }
            pb.inc(1);
        }
        pb.finish_and_clear();

        report.failed_rows.sort_by_key(|f| f.row);
        info!(
            total = report.total_rows,
            inserted = report.inserted_count,
            failed = report.failed_rows.len(),
            "ingestion: done"
        );
        Ok(report)
    }

    /// Embeds and inserts one batch. Only collection creation errors escape.
    async fn ingest_batch(
        &self,
        coll: &dyn CollectionBinding,
        batch: &[(usize, RetrievableUnit)],
        dimension: &mut Option<usize>,
        created: &mut bool,
        report: &mut IngestionReport,
    ) -> Result<(), RagError> {
        let vectors = embed_units(batch, self.embedder.as_ref(), self.cfg.embed_concurrency).await;

        let mut points = Vec::with_capacity(batch.len());
        let mut rows_by_id = Vec::with_capacity(batch.len());
        for ((row, unit), vector) in batch.iter().zip(vectors) {
            let vector = vector.and_then(|v| match *dimension {
                Some(want) if v.len() != want => Err(RagError::VectorSizeMismatch { got: v.len(), want }),
                Some(_) => Ok(v),
                None if v.is_empty() => Err(RagError::Embedding("empty embedding".into())),
                None => {
                    *dimension = Some(v.len());
                    Ok(v)
                }
            });
            match vector {
                Ok(vector) => {
                    let id = new_point_id();
                    rows_by_id.push((id.clone(), *row));
                    points.push(IndexPoint {
                        id,
                        vector,
                        unit: unit.clone(),
                    });
                }
                Err(e) => {
                    warn!(row = *row, error = %e, "embedding failed");
                    report.failed_rows.push(RowFailure {
                        row: *row,
                        cause: e.to_string(),
                    });
                }
            }
        }

        if points.is_empty() {
            return Ok(());
        }

        if !*created {
            if let Some(dim) = *dimension {
                coll.ensure_created(dim).await?;
                *created = true;
            }
        }

        let row_of = |id: &str| rows_by_id.iter().find(|(i, _)| i == id).map(|(_, r)| *r);
        match coll.insert_many(points).await {
            Ok(outcome) => {
                debug!(
                    inserted = outcome.inserted.len(),
                    rejected = outcome.rejected.len(),
                    "ingestion: batch written"
                );
                let mut inserted: Vec<(usize, String)> = outcome
                    .inserted
                    .into_iter()
                    .filter_map(|id| row_of(&id).map(|r| (r, id)))
                    .collect();
                inserted.sort_by_key(|(r, _)| *r);
                report.inserted_count += inserted.len();
                report.inserted_ids.extend(inserted.into_iter().map(|(_, id)| id));

                for (id, cause) in outcome.rejected {
                    if let Some(row) = row_of(&id) {
                        report.failed_rows.push(RowFailure { row, cause });
                    }
                }
            }
            Err(e) => {
                warn!(rows = rows_by_id.len(), error = %e, "bulk insert failed");
                for (_, row) in &rows_by_id {
                    report.failed_rows.push(RowFailure {
                        row: *row,
                        cause: e.to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}
