//! Unified table-reading entrypoint.
//!
//! Most callers should use [`read_table`], which reads one source table into a
//! [`crate::types::Table`] regardless of whether the file is plain CSV or an RTF document wrapping
//! CSV text.
//!
//! - If [`ReadOptions::format`] is `None`, the format is inferred from the file extension.
//! - If an [`super::observability::IngestionObserver`] is provided, success/failure/alerts are
//!   reported to it.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{IngestionError, IngestionResult};
use crate::types::Table;

use super::observability::{IngestionContext, IngestionObserver, IngestionSeverity, IngestionStats};
use super::{csv, rtf};

/// Supported source formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    /// Comma-separated values.
    Csv,
    /// Rich Text Format document wrapping comma-separated values.
    Rtf,
}

impl SourceFormat {
    /// Parse a source format from a file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "rtf" => Some(Self::Rtf),
            _ => None,
        }
    }

    /// Canonical file extension for this format.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Rtf => "rtf",
        }
    }
}

/// Options controlling table reads.
#[derive(Clone)]
pub struct ReadOptions {
    /// If `None`, infer format from file extension.
    pub format: Option<SourceFormat>,
    /// Optional observer for logging/alerts.
    pub observer: Option<Arc<dyn IngestionObserver>>,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: IngestionSeverity,
}

impl fmt::Debug for ReadOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadOptions")
            .field("format", &self.format)
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            format: None,
            observer: None,
            alert_at_or_above: IngestionSeverity::Critical,
        }
    }
}

/// Read one named table from `path`.
///
/// When an observer is configured, this function reports:
///
/// - `on_success` on success, with row count stats
/// - `on_failure` on failure, with the error's severity
/// - `on_alert` on failure when that severity is >= `options.alert_at_or_above`
///
/// An RTF document without a payload is returned as [`IngestionError::PayloadNotFound`]; the
/// loader treats that as an empty table rather than a fatal error.
///
/// ```no_run
/// use graph_ingest::ingestion::{read_table, ReadOptions};
///
/// # fn main() -> Result<(), graph_ingest::IngestionError> {
/// let table = read_table("business_segments", "data/business_segments_v2.rtf", &ReadOptions::default())?;
/// println!("rows={}", table.row_count());
/// # Ok(())
/// # }
/// ```
pub fn read_table(table: &str, path: impl AsRef<Path>, options: &ReadOptions) -> IngestionResult<Table> {
    let path = path.as_ref();
    let format = match options.format {
        Some(f) => f,
        None => infer_format_from_path(path)?,
    };

    let ctx = IngestionContext {
        table: table.to_owned(),
        path: path.to_path_buf(),
        format,
    };

    let result = match format {
        SourceFormat::Csv => csv::read_table_from_path(path),
        SourceFormat::Rtf => rtf::read_table_from_rtf_path(path),
    };

    if let Some(obs) = options.observer.as_ref() {
        match &result {
            Ok(t) => obs.on_success(&ctx, IngestionStats { rows: t.row_count() }),
            Err(e) => {
                let sev = e.severity();
                obs.on_failure(&ctx, sev, e);
                if sev >= options.alert_at_or_above {
                    obs.on_alert(&ctx, sev, e);
                }
            }
        }
    }

    result
}

fn infer_format_from_path(path: &Path) -> IngestionResult<SourceFormat> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .ok_or_else(|| IngestionError::Config(format!(
            "cannot infer format: path has no extension ({})",
            path.display()
        )))?;

    SourceFormat::from_extension(ext).ok_or_else(|| {
        IngestionError::Config(format!(
            "cannot infer format from extension '{ext}' for path ({})",
            path.display()
        ))
    })
}
