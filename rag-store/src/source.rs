//! CSV review source.
//!
//! Opening the source checks the header row against [`REQUIRED_COLUMNS`];
//! rows are then deserialized one by one so a malformed row becomes a
//! row-level failure instead of aborting the read.

use std::{fs::File, path::Path};

use tracing::{debug, info};

use crate::{
    errors::RagError,
    record::{REQUIRED_COLUMNS, SourceRecord},
};

/// An opened, schema-checked review table.
pub struct CsvSource {
    reader: csv::Reader<File>,
}

impl CsvSource {
    /// Opens `path` and validates its header row.
    ///
    /// # Errors
    /// - [`RagError::SourceUnavailable`] if the file cannot be opened or its header read
    /// - [`RagError::Schema`] listing every required column that is absent
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RagError> {
        let path = path.as_ref();
        info!("Opening review source {:?}", path);

        let unavailable = |source: csv::Error| RagError::SourceUnavailable {
            path: path.to_path_buf(),
            source,
        };

        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::Headers)
            .from_path(path)
            .map_err(unavailable)?;

        let headers = reader.headers().map_err(unavailable)?;
        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|col| !headers.iter().any(|h| h == **col))
            .map(|col| col.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(RagError::Schema { missing });
        }
        debug!(columns = headers.len(), "source header accepted");

        Ok(Self { reader })
    }

    /// Yields `(row_index, record)` pairs in file order.
    ///
    /// Row indices are 0-based and exclude the header. A row that cannot be
    /// deserialized (wrong field count, non-numeric rating) yields the cause.
    pub fn rows(self) -> impl Iterator<Item = (usize, Result<SourceRecord, String>)> {
        self.reader
            .into_deserialize::<SourceRecord>()
            .enumerate()
            .map(|(i, r)| (i, r.map_err(|e| e.to_string())))
    }
}
