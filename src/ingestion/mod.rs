//! Table reading: the tabular source side of the pipeline.
//!
//! Most callers should use [`read_table`] (from [`unified`]) which:
//!
//! - picks CSV or RTF handling by file extension (or you can override via [`ReadOptions`])
//! - strips byte-order marks and keys every row by the header
//! - optionally reports success/failure/alerts to an [`IngestionObserver`]
//!
//! Format-specific functions are also available under:
//! - [`csv`]
//! - [`rtf`]

pub mod csv;
pub mod observability;
pub mod rtf;
pub mod unified;

pub use observability::{
    CompositeObserver, FileObserver, IngestionContext, IngestionObserver, IngestionSeverity, IngestionStats,
    TracingObserver,
};
pub use unified::{read_table, ReadOptions, SourceFormat};
