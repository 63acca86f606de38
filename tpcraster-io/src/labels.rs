//! Hand-labeled run tables (CSV).
//!
//! Format: a header row with at least the columns `evt_id` and `label`; `label`
//! holds a single-letter class code (`p`, `c`, `j`). Other codes are dropped.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use tpcraster_core::LabelTable;

#[derive(Debug, Deserialize)]
struct LabelRecord {
    evt_id: u64,
    label: String,
}

/// Reads a label table from `path`.
///
/// # Errors
/// Returns [`Error::MissingInput`] if the file does not exist, or a CSV error for
/// malformed rows.
pub fn read_label_table<P: AsRef<Path>>(path: P) -> Result<LabelTable> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(Error::MissingInput(path.to_path_buf()));
    }
    let reader = csv::Reader::from_path(path)?;
    parse_label_table(reader)
}

/// Parses a label table from any CSV reader.
///
/// # Errors
/// Returns a CSV error for malformed rows.
pub fn parse_label_table<R: std::io::Read>(mut reader: csv::Reader<R>) -> Result<LabelTable> {
    let records = reader
        .deserialize::<LabelRecord>()
        .collect::<std::result::Result<Vec<_>, _>>()?;
    let table = LabelTable::from_codes(records.iter().map(|r| (r.evt_id, r.label.trim())));
    log::debug!("read {} labeled events", table.len());
    Ok(table)
}
