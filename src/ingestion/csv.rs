//! Plain delimited-text table reading.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::error::IngestionResult;
use crate::types::{Record, Table};

const BOM: char = '\u{feff}';

/// Read a CSV file into a [`Table`].
///
/// Rules:
///
/// - The first non-empty line is the header.
/// - A leading UTF-8 byte-order mark is stripped from the input and from every header name.
/// - Rows may be shorter than the header (missing trailing fields are reported later, per row,
///   when a mutation needs them).
pub fn read_table_from_path(path: impl AsRef<Path>) -> IngestionResult<Table> {
    let text = fs::read_to_string(path)?;
    read_table_from_str(&text)
}

/// Read CSV data from an in-memory string.
pub fn read_table_from_str(input: &str) -> IngestionResult<Table> {
    let input = input.trim_start_matches(BOM);
    // Leading blank lines never count as the header.
    let input = input.trim_start_matches(['\r', '\n', ' ', '\t']);
    if input.is_empty() {
        return Ok(Table::empty());
    }

    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(input.as_bytes());
    read_table_from_reader(&mut rdr)
}

/// Read a table from already-split payload lines (one delimited row per line).
///
/// This is how rich-text recovered payloads enter the same parser as plain files.
pub fn read_table_from_lines<S: AsRef<str>>(lines: &[S]) -> IngestionResult<Table> {
    let joined = lines
        .iter()
        .map(|l| l.as_ref())
        .collect::<Vec<_>>()
        .join("\n");
    read_table_from_str(&joined)
}

/// Read a table from an existing CSV reader.
pub fn read_table_from_reader<R: std::io::Read>(rdr: &mut csv::Reader<R>) -> IngestionResult<Table> {
    let headers: Arc<[String]> = rdr
        .headers()?
        .iter()
        .map(|h| strip_bom(h).to_owned())
        .collect::<Vec<_>>()
        .into();

    let mut records = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let values = record.iter().map(str::to_owned).collect();
        records.push(Record::new(Arc::clone(&headers), values));
    }

    Ok(Table::new(headers, records))
}

fn strip_bom(s: &str) -> &str {
    s.trim_start_matches(BOM)
}
