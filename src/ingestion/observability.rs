//! Observer hooks for table reads and row failures.
//!
//! The loader reports every table read (success or failure) and every collected row error to an
//! optional [`IngestionObserver`]. [`TracingObserver`] forwards them to `tracing`,
//! [`FileObserver`] appends them to a local log file and [`CompositeObserver`] fans out.

use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use tracing::{error, info, warn};

use crate::error::IngestionError;

use super::unified::SourceFormat;

/// How bad a reported failure is; compared against [`super::ReadOptions::alert_at_or_above`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum IngestionSeverity {
    /// Informational.
    Info,
    /// Warning-level event (non-fatal, e.g. a rich-text file without payload).
    Warning,
    /// Error-level event (a table or row failed).
    Error,
    /// Critical error (I/O, lost connection).
    Critical,
}

/// Context about one table read.
#[derive(Debug, Clone)]
pub struct IngestionContext {
    /// Loader table name (e.g. `business_segments`).
    pub table: String,
    /// The input path used for the read.
    pub path: PathBuf,
    /// Source format used for the read.
    pub format: SourceFormat,
}

/// Minimal stats reported on a successful table read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestionStats {
    /// Number of data rows read.
    pub rows: usize,
}

/// Receives table-read outcomes and row failures during a load.
///
/// The loader calls it once per table read and once per abandoned row.
pub trait IngestionObserver: Send + Sync {
    /// Called when a table was read.
    fn on_success(&self, _ctx: &IngestionContext, _stats: IngestionStats) {}

    /// Called when reading a table failed.
    fn on_failure(&self, _ctx: &IngestionContext, _severity: IngestionSeverity, _error: &IngestionError) {}

    /// Called when a failure meets the alert threshold.
    ///
    /// Default behavior forwards to [`Self::on_failure`].
    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        self.on_failure(ctx, severity, error)
    }

    /// Called for every row the loader gave up on (1-based data row number).
    fn on_row_error(&self, _ctx: &IngestionContext, _row: usize, _message: &str) {}
}

/// Forwards every callback to each inner observer.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn IngestionObserver>>,
}

impl CompositeObserver {
    /// Fan out to `observers`, called in list order.
    pub fn new(observers: Vec<Arc<dyn IngestionObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl IngestionObserver for CompositeObserver {
    fn on_success(&self, ctx: &IngestionContext, stats: IngestionStats) {
        for o in &self.observers {
            o.on_success(ctx, stats);
        }
    }

    fn on_failure(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        for o in &self.observers {
            o.on_failure(ctx, severity, error);
        }
    }

    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        for o in &self.observers {
            o.on_alert(ctx, severity, error);
        }
    }

    fn on_row_error(&self, ctx: &IngestionContext, row: usize, message: &str) {
        for o in &self.observers {
            o.on_row_error(ctx, row, message);
        }
    }
}

/// Logs ingestion events through `tracing`.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl IngestionObserver for TracingObserver {
    fn on_success(&self, ctx: &IngestionContext, stats: IngestionStats) {
        info!(
            table = %ctx.table,
            format = ?ctx.format,
            path = %ctx.path.display(),
            rows = stats.rows,
            "table read"
        );
    }

    fn on_failure(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        if severity <= IngestionSeverity::Warning {
            warn!(table = %ctx.table, path = %ctx.path.display(), %error, "table skipped");
        } else {
            error!(table = %ctx.table, path = %ctx.path.display(), ?severity, %error, "table read failed");
        }
    }

    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        error!(
            table = %ctx.table,
            path = %ctx.path.display(),
            ?severity,
            %error,
            "ALERT: ingestion failure at alert threshold"
        );
    }

    fn on_row_error(&self, ctx: &IngestionContext, row: usize, message: &str) {
        warn!(table = %ctx.table, row, "{message}");
    }
}

/// Appends one timestamped line per event to a local file.
#[derive(Debug)]
pub struct FileObserver {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileObserver {
    /// Create a file observer that appends events to `path`.
    ///
    /// A log file that cannot be opened or written is skipped silently; loading never fails on it.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    fn append_line(&self, line: &str) {
        let _guard = self.lock.lock().ok();
        if let Ok(mut f) = OpenOptions::new().create(true).append(true).open(&self.path) {
            let _ = writeln!(f, "{} {line}", Utc::now().to_rfc3339());
        }
    }
}

impl IngestionObserver for FileObserver {
    fn on_success(&self, ctx: &IngestionContext, stats: IngestionStats) {
        self.append_line(&format!(
            "ok table={} format={:?} path={} rows={}",
            ctx.table,
            ctx.format,
            ctx.path.display(),
            stats.rows
        ));
    }

    fn on_failure(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        self.append_line(&format!(
            "fail severity={:?} table={} path={} err={}",
            severity,
            ctx.table,
            ctx.path.display(),
            error
        ));
    }

    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        self.append_line(&format!(
            "ALERT severity={:?} table={} path={} err={}",
            severity,
            ctx.table,
            ctx.path.display(),
            error
        ));
    }

    fn on_row_error(&self, ctx: &IngestionContext, row: usize, message: &str) {
        self.append_line(&format!("row-error table={} row={row} err={message}", ctx.table));
    }
}
