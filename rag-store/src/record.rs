//! Core data models used by the library.

use serde::{Deserialize, Serialize};

/// Columns every review source must provide.
pub const REQUIRED_COLUMNS: [&str; 4] = ["product_title", "rating", "summary", "review"];

/// One input row of the review table.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct SourceRecord {
    pub product_title: String,
    pub rating: f64,
    pub summary: String,
    pub review: String,
}

/// Structured data stored next to the vector; never embedded.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnitMetadata {
    pub product_name: String,
    pub product_rating: f64,
    pub product_summary: String,
}

/// The unit written to and returned by the vector index.
///
/// `body` is the review text and the only embedded field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RetrievableUnit {
    pub body: String,
    pub metadata: UnitMetadata,
}

/// Units ordered by descending similarity, at most `top_k` long.
pub type RetrievalResult = Vec<RetrievableUnit>;

/// A unit with its vector, ready for bulk insert.
#[derive(Clone, Debug)]
pub struct IndexPoint {
    pub id: String,
    pub vector: Vec<f32>,
    pub unit: RetrievableUnit,
}

/// A single search hit with similarity score.
#[derive(Clone, Debug)]
pub struct IndexHit {
    pub id: String,
    pub score: f32,
    pub unit: RetrievableUnit,
}
