//! Row → unit mapping.
//!
//! Fixed renaming, no derived fields:
//! - `review`        → `body`
//! - `product_title` → `metadata.product_name`
//! - `rating`        → `metadata.product_rating`
//! - `summary`       → `metadata.product_summary`

use crate::record::{RetrievableUnit, SourceRecord, UnitMetadata};

/// Maps one source row to a retrievable unit.
///
/// Returns the failure cause when the review text is blank, since a unit
/// without a body cannot be embedded.
pub fn to_unit(record: SourceRecord) -> Result<RetrievableUnit, String> {
    if record.review.trim().is_empty() {
        return Err("review text is empty".to_string());
    }
    Ok(RetrievableUnit {
        body: record.review,
        metadata: UnitMetadata {
            product_name: record.product_title,
            product_rating: record.rating,
            product_summary: record.summary,
        },
    })
}
