//! Recovery of a delimited table embedded in a rich-text (RTF) document.
//!
//! Spreadsheet exports saved through a word processor keep the CSV text as a single escaped text
//! run introduced by a `\strokec2 ` control word and closed by the next `}`. Inside the run every
//! line ends with the RTF line-break escape (a backslash). Recovery is plain text scraping:
//!
//! 1. capture the content of the **first** such run (later runs are ignored);
//! 2. turn every backslash into a newline and drop every `{` / `}`;
//! 3. split into lines, trim them and discard blank ones.
//!
//! Other control words inside the run are not interpreted, and an escaped `\}` inside a field ends
//! the run early. Documents that need either are outside what this recovers. Because recovered
//! lines are trimmed, whitespace at the start of a line's first field or the end of its last field
//! is lost, where the same table read as plain CSV keeps it.

use std::fs;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{IngestionError, IngestionResult};
use crate::types::Table;

use super::csv::read_table_from_lines;

static PAYLOAD_RUN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)\\strokec2 (.+?)\}").expect("payload run pattern is valid")
});

/// Return the plain-text payload lines of the first escaped text run, or an empty vector when
/// the document has none.
pub fn extract_payload_lines(content: &str) -> Vec<String> {
    let Some(run) = PAYLOAD_RUN.captures(content).and_then(|c| c.get(1)) else {
        return Vec::new();
    };

    let text: String = run
        .as_str()
        .chars()
        .filter(|c| !matches!(c, '{' | '}'))
        .map(|c| if c == '\\' { '\n' } else { c })
        .collect();

    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Recover a [`Table`] from rich-text content.
///
/// `source` is only used to label the error when no payload is present.
pub fn read_table_from_rtf_str(content: &str, source: &str) -> IngestionResult<Table> {
    let lines = extract_payload_lines(content);
    if lines.is_empty() {
        return Err(IngestionError::PayloadNotFound {
            path: source.to_owned(),
        });
    }
    read_table_from_lines(&lines)
}

/// Read an RTF file and recover the [`Table`] embedded in it.
pub fn read_table_from_rtf_path(path: impl AsRef<Path>) -> IngestionResult<Table> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    read_table_from_rtf_str(&content, &path.display().to_string())
}
