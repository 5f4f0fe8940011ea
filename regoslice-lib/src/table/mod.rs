//! Tabular source ingestion
//!
//! Policy tables arrive as CSV with an arbitrary but fixed column set. Each
//! row becomes one [`RowRecord`]: the ordered column mapping that later feeds
//! the Rego template, plus a flattened text used only for embedding.
//!
//! # Usage
//!
//! ```ignore
//! use regoslice_lib::table;
//!
//! let records = table::read_table("slice_policies.csv")?;
//! assert_eq!(records[0].metadata["Vendor"], "Nokia");
//! ```

use std::io::Read;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// One source table row.
///
/// Immutable once created; position in the metadata store is the only link
/// back to the corresponding vector in the index.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct RowRecord {
    /// Space-joined cell values in column order, used for embedding
    pub text: String,
    /// Column name -> cell value, in column order
    pub metadata: IndexMap<String, String>,
}

impl RowRecord {
    /// Pair one row of cells with the header names. Short rows are padded
    /// with empty strings so every record carries the full column set.
    fn from_cells(headers: &[String], cells: &csv::StringRecord) -> Self {
        let mut metadata = IndexMap::with_capacity(headers.len());
        for (i, header) in headers.iter().enumerate() {
            let value = cells.get(i).unwrap_or("").to_string();
            metadata.insert(header.clone(), value);
        }

        let text = metadata
            .values()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ");

        Self { text, metadata }
    }

    /// Column names of this record, in column order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.metadata.keys().map(String::as_str)
    }
}

/// Read all rows from a CSV file, in file order.
pub fn read_table<P: AsRef<Path>>(path: P) -> Result<Vec<RowRecord>> {
    let path = path.as_ref();
    let reader = csv::Reader::from_path(path)
        .map_err(|e| Error::Input(format!("cannot open {}: {e}", path.display())))?;
    read_records(reader)
}

/// Read all rows from any CSV source. Used by callers that already hold the
/// bytes (and by tests).
pub fn read_table_from_reader<R: Read>(reader: R) -> Result<Vec<RowRecord>> {
    read_records(csv::Reader::from_reader(reader))
}

fn read_records<R: Read>(mut reader: csv::Reader<R>) -> Result<Vec<RowRecord>> {
    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| Error::Input(format!("cannot read header row: {e}")))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| Error::Input(format!("malformed row: {e}")))?;
        rows.push(RowRecord::from_cells(&headers, &record));
    }

    if rows.is_empty() {
        return Err(Error::Input("table contains no data rows".to_string()));
    }

    Ok(rows)
}
