//! `graph-ingest` bulk-loads a small knowledge graph of business segments, task templates,
//! workflow templates and their `USED_IN` / `DEPENDS_ON` relationships into a property-graph
//! store that speaks `GRAPH.QUERY` over RESP (FalkorDB and compatibles), then verifies it and
//! offers a read-only [`query::Catalog`] over the result.
//!
//! ## Pipeline
//!
//! 1. **Read** each table with [`ingestion::read_table`]: plain CSV, or an RTF document whose
//!    first escaped text run holds the CSV ([`ingestion::rtf`]). Both yield the same
//!    [`types::Table`] for the same content.
//! 2. **Render** one mutation per row with [`query::render`], which writes typed values into the
//!    query text as escaped literals (the store has no parameter binding).
//! 3. **Submit** through a [`client::GraphClient`], collecting failures per row
//!    ([`loader::GraphLoader`]). Nodes are loaded before relationships.
//! 4. **Index** and **verify** ([`loader::provision_indexes`], [`loader::verify`]).
//!
//! ## Example
//!
//! ```no_run
//! use graph_ingest::client::FalkorClient;
//! use graph_ingest::config::ImportConfig;
//! use graph_ingest::loader::run_import;
//!
//! # fn main() -> Result<(), graph_ingest::IngestionError> {
//! let cfg = ImportConfig::default();
//! let client = FalkorClient::connect(&cfg.host, cfg.port)?;
//! let report = run_import(client, &cfg.resolve_sources()?, cfg.load_options(None), &cfg.post_load())?;
//! println!("{report}");
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`ingestion`]: table reading (CSV, RTF recovery) and observer hooks
//! - [`query`]: placeholder rendering, fixed statements, read-only catalog
//! - [`client`]: the query-execution collaborator and its RESP implementation
//! - [`loader`]: load orchestration, index provisioning, verification
//! - [`config`]: import configuration
//! - [`types`]: tables, records, schemas, values
//! - [`error`]: the shared error type

pub mod client;
pub mod config;
pub mod error;
pub mod ingestion;
pub mod loader;
pub mod query;
pub mod types;

pub use error::{IngestionError, IngestionResult};
