use std::error::Error as StdError;

use thiserror::Error;

use crate::ingestion::IngestionSeverity;

/// Convenience result type for ingestion operations.
pub type IngestionResult<T> = Result<T, IngestionError>;

/// Error type returned across reading, templating, loading and querying.
///
/// Some variants are fatal where they are raised (a table that cannot be read) and some are
/// collected per row by the loader (a failed mutation); see [`crate::loader`].
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Underlying I/O error (e.g. file not found, socket closed).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// Malformed RESP frame from the graph store.
    #[error("protocol error: {0}")]
    Resp(#[from] crate::client::resp::RespError),

    /// The graph store could not be reached or dropped the connection.
    #[error("connection error: {0}")]
    Connection(String),

    /// The graph store rejected a query (error reply).
    #[error("query error: {0}")]
    Query(String),

    /// The table header lacks columns the target mutation needs.
    #[error("schema mismatch: {message}")]
    SchemaMismatch { message: String },

    /// A row lacks a value for a column the target mutation needs.
    #[error("missing field '{column}' at row {row}")]
    MissingField { row: usize, column: String },

    /// An integer-typed field could not be parsed.
    #[error("failed to parse value at row {row} column '{column}': {message} (raw='{raw}')")]
    ParseError {
        row: usize,
        column: String,
        raw: String,
        message: String,
    },

    /// A rich-text source contained no recoverable delimited payload.
    #[error("no delimited payload found in {path}")]
    PayloadNotFound { path: String },

    /// Invalid configuration (unreadable config file, unresolvable table path, ...).
    #[error("config error: {0}")]
    Config(String),
}

impl IngestionError {
    /// Severity classification used for observer callbacks and alerting thresholds.
    pub fn severity(&self) -> IngestionSeverity {
        match self {
            IngestionError::Io(_) | IngestionError::Connection(_) => IngestionSeverity::Critical,
            IngestionError::Csv(err) => match err.kind() {
                ::csv::ErrorKind::Io(_) => IngestionSeverity::Critical,
                _ => IngestionSeverity::Error,
            },
            IngestionError::Resp(err) => {
                if error_chain_contains_io(err) {
                    IngestionSeverity::Critical
                } else {
                    IngestionSeverity::Error
                }
            }
            IngestionError::PayloadNotFound { .. } => IngestionSeverity::Warning,
            IngestionError::Query(_)
            | IngestionError::SchemaMismatch { .. }
            | IngestionError::MissingField { .. }
            | IngestionError::ParseError { .. }
            | IngestionError::Config(_) => IngestionSeverity::Error,
        }
    }
}

fn error_chain_contains_io(e: &(dyn StdError + 'static)) -> bool {
    let mut cur: Option<&(dyn StdError + 'static)> = Some(e);
    while let Some(err) = cur {
        if err.is::<std::io::Error>() {
            return true;
        }
        cur = err.source();
    }
    false
}
