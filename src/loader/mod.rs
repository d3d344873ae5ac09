//! Best-effort, row-at-a-time graph loading.
//!
//! [`GraphLoader`] reads each table, renders one mutation per row and submits it through a
//! [`GraphClient`]. Tables are processed in [`TableKind::LOAD_ORDER`] (all node tables, then the
//! two relationship tables) and rows strictly in source order.
//!
//! Failure policy:
//!
//! - A table that cannot be read (I/O, CSV syntax, header lacking a required column) is fatal and
//!   propagates.
//! - An RTF table without a recoverable payload is reported and treated as empty.
//! - A row that lacks a value or has a non-numeric integer column is skipped, recorded in
//!   [`LoadStats::errors`], and not counted.
//! - A submission the store rejects is recorded with a query excerpt; the row still counts as
//!   attempted and the loop moves on.
//! - An edge whose endpoints do not exist creates nothing and, by default, records nothing. With
//!   [`LoadOptions::strict_edges`] such rows are recorded as errors as well.
//!
//! There is no rollback: whatever was written stays written.

pub mod indexes;
pub mod tables;
pub mod verify;

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::client::GraphClient;
use crate::error::{IngestionError, IngestionResult};
use crate::ingestion::{read_table, IngestionContext, ReadOptions, SourceFormat};
use crate::query::statements::INDEXES;
use crate::query::template::render;
use crate::types::Table;

pub use indexes::{provision_indexes, IndexReport};
pub use tables::TableKind;
pub use verify::{verify, ReferentialGap, SampleOutcome, SampleQuery, VerificationReport};

/// Relationship rows between progress log lines.
const PROGRESS_EVERY: usize = 25;

/// Characters of query text kept in a collected error.
const QUERY_EXCERPT_CHARS: usize = 100;

/// Options for one load run.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Target graph name.
    pub graph: String,
    /// Record edge rows the store reports as having created no relationship.
    pub strict_edges: bool,
    /// How tables are read.
    pub read: ReadOptions,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            graph: "default_db".to_owned(),
            strict_edges: false,
            read: ReadOptions::default(),
        }
    }
}

/// One collected, non-fatal problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowError {
    pub table: TableKind,
    /// 1-based data row, `None` for table-level problems.
    pub row: Option<usize>,
    pub message: String,
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.row {
            Some(row) => write!(f, "[{} row {row}] {}", self.table, self.message),
            None => write!(f, "[{}] {}", self.table, self.message),
        }
    }
}

/// Attempt counters and collected errors of a run.
///
/// Counters track submitted mutations, not confirmed writes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadStats {
    pub business_segments: usize,
    pub task_templates: usize,
    pub workflow_templates: usize,
    pub used_in_relationships: usize,
    pub depends_on_relationships: usize,
    pub errors: Vec<RowError>,
}

impl LoadStats {
    /// Attempts recorded for one table.
    pub fn attempted(&self, kind: TableKind) -> usize {
        match kind {
            TableKind::BusinessSegments => self.business_segments,
            TableKind::TaskTemplates => self.task_templates,
            TableKind::WorkflowTemplates => self.workflow_templates,
            TableKind::UsedIn => self.used_in_relationships,
            TableKind::DependsOn => self.depends_on_relationships,
        }
    }

    /// Count one submitted mutation for `kind`, returning the new count.
    pub fn record_attempt(&mut self, kind: TableKind) -> usize {
        let slot = match kind {
            TableKind::BusinessSegments => &mut self.business_segments,
            TableKind::TaskTemplates => &mut self.task_templates,
            TableKind::WorkflowTemplates => &mut self.workflow_templates,
            TableKind::UsedIn => &mut self.used_in_relationships,
            TableKind::DependsOn => &mut self.depends_on_relationships,
        };
        *slot += 1;
        *slot
    }
}

/// Where each table is read from. Tables without an entry are skipped.
#[derive(Debug, Clone, Default)]
pub struct TableSources {
    paths: BTreeMap<TableKind, PathBuf>,
}

impl TableSources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, kind: TableKind, path: impl Into<PathBuf>) -> Self {
        self.paths.insert(kind, path.into());
        self
    }

    pub fn insert(&mut self, kind: TableKind, path: impl Into<PathBuf>) {
        self.paths.insert(kind, path.into());
    }

    pub fn get(&self, kind: TableKind) -> Option<&Path> {
        self.paths.get(&kind).map(PathBuf::as_path)
    }
}

/// Drives one load against one client.
pub struct GraphLoader<C> {
    client: C,
    options: LoadOptions,
    stats: LoadStats,
}

impl<C: GraphClient> GraphLoader<C> {
    pub fn new(client: C, options: LoadOptions) -> Self {
        Self {
            client,
            options,
            stats: LoadStats::default(),
        }
    }

    pub fn stats(&self) -> &LoadStats {
        &self.stats
    }

    pub fn client_mut(&mut self) -> &mut C {
        &mut self.client
    }

    /// Hand back the client and the final stats.
    pub fn into_parts(self) -> (C, LoadStats) {
        (self.client, self.stats)
    }

    /// Load every table present in `sources`, nodes first.
    pub fn run(&mut self, sources: &TableSources) -> IngestionResult<&LoadStats> {
        info!(graph = %self.options.graph, "starting knowledge graph import");
        for kind in TableKind::LOAD_ORDER {
            match sources.get(kind) {
                Some(path) => self.load_from_path(kind, path)?,
                None => warn!(table = %kind, "no source configured, skipping"),
            }
        }
        Ok(&self.stats)
    }

    /// Read one table from disk and load it.
    pub fn load_from_path(&mut self, kind: TableKind, path: &Path) -> IngestionResult<()> {
        info!(table = %kind, path = %path.display(), "importing");
        let table = match read_table(kind.name(), path, &self.options.read) {
            Ok(table) => table,
            Err(e @ IngestionError::PayloadNotFound { .. }) => {
                warn!(table = %kind, error = %e, "no CSV data found, table treated as empty");
                self.stats.errors.push(RowError {
                    table: kind,
                    row: None,
                    message: e.to_string(),
                });
                return Ok(());
            }
            Err(e) => return Err(e),
        };
        let ctx = IngestionContext {
            table: kind.name().to_owned(),
            path: path.to_path_buf(),
            format: self.options.read.format.unwrap_or_else(|| format_of(path)),
        };
        self.load_table(kind, &table, Some(&ctx))
    }

    /// Load already-read rows.
    ///
    /// Fails only when the header lacks a column the mutation needs; everything row-level is
    /// collected.
    pub fn load_table(&mut self, kind: TableKind, table: &Table, ctx: Option<&IngestionContext>) -> IngestionResult<()> {
        if table.row_count() > 0 {
            let schema = kind.schema();
            let missing = schema.missing_columns(&table.headers);
            if !missing.is_empty() {
                return Err(IngestionError::SchemaMismatch {
                    message: format!(
                        "table '{kind}' is missing required column(s) {missing:?}. headers={:?}",
                        table.headers
                    ),
                });
            }
        }

        let template = kind.template();
        for (idx, record) in table.records.iter().enumerate() {
            let row = idx + 1;
            let created_at = Local::now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string();

            let params = match kind.params(record, row, &created_at) {
                Ok(p) => p,
                Err(e) => {
                    self.row_error(kind, Some(row), e.to_string(), ctx);
                    continue;
                }
            };

            let query = render(template, &params);
            let outcome = self.client.query(&self.options.graph, &query);
            let attempts = self.stats.record_attempt(kind);

            match outcome {
                Ok(result) => {
                    if kind.is_relationship() {
                        if self.options.strict_edges && result.stats.relationships_created == 0 {
                            let message = format!(
                                "no {} created for {}: endpoint not found",
                                kind.graph_type(),
                                kind.describe_row(record)
                            );
                            self.row_error(kind, Some(row), message, ctx);
                        }
                        if attempts % PROGRESS_EVERY == 0 {
                            info!(table = %kind, attempts, "relationships submitted");
                        }
                    } else {
                        debug!(table = %kind, row, "{}", kind.describe_row(record));
                    }
                }
                Err(e) => {
                    let message = format!("Query error: {} ... - {e}", excerpt(&query));
                    self.row_error(kind, Some(row), message, ctx);
                }
            }
        }

        info!(table = %kind, attempted = self.stats.attempted(kind), "table done");
        Ok(())
    }

    fn row_error(&mut self, kind: TableKind, row: Option<usize>, message: String, ctx: Option<&IngestionContext>) {
        warn!(table = %kind, row = ?row, "{message}");
        if let (Some(obs), Some(ctx), Some(row)) = (self.options.read.observer.as_ref(), ctx, row) {
            obs.on_row_error(ctx, row, &message);
        }
        self.stats.errors.push(RowError {
            table: kind,
            row,
            message,
        });
    }
}

fn format_of(path: &Path) -> SourceFormat {
    path.extension()
        .and_then(|e| e.to_str())
        .and_then(SourceFormat::from_extension)
        .unwrap_or(SourceFormat::Csv)
}

fn excerpt(query: &str) -> String {
    query.chars().take(QUERY_EXCERPT_CHARS).collect()
}

/// What to do after the tables are loaded.
#[derive(Debug, Clone)]
pub struct PostLoad {
    pub create_indexes: bool,
    pub verify: bool,
    pub sample: Option<SampleQuery>,
}

impl Default for PostLoad {
    fn default() -> Self {
        Self {
            create_indexes: true,
            verify: true,
            sample: None,
        }
    }
}

/// Full result of an import run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportReport {
    pub stats: LoadStats,
    pub indexes: Option<IndexReport>,
    pub verification: Option<VerificationReport>,
}

impl ImportReport {
    /// Relationship types with fewer stored than attempted edges (empty without verification).
    pub fn referential_gaps(&self) -> Vec<ReferentialGap> {
        self.verification
            .as_ref()
            .map(|v| v.referential_gaps(&self.stats))
            .unwrap_or_default()
    }
}

/// Errors listed in the summary.
const SUMMARY_ERRORS: usize = 5;

impl fmt::Display for ImportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.stats;
        writeln!(f, "{}", "=".repeat(60))?;
        writeln!(f, "IMPORT COMPLETE")?;
        writeln!(f, "{}", "=".repeat(60))?;
        writeln!(f, "Business Segments: {}", s.business_segments)?;
        writeln!(f, "Task Templates: {}", s.task_templates)?;
        writeln!(f, "Workflow Templates: {}", s.workflow_templates)?;
        writeln!(f, "USED_IN Relationships: {}", s.used_in_relationships)?;
        writeln!(f, "DEPENDS_ON Relationships: {}", s.depends_on_relationships)?;

        if !s.errors.is_empty() {
            writeln!(f)?;
            writeln!(f, "Errors: {}", s.errors.len())?;
            for error in s.errors.iter().take(SUMMARY_ERRORS) {
                writeln!(f, "  - {error}")?;
            }
        }

        if let Some(idx) = &self.indexes {
            writeln!(f)?;
            writeln!(f, "Indexes created: {}, rejected: {}", idx.created.len(), idx.failed.len())?;
        }

        if let Some(v) = &self.verification {
            writeln!(f)?;
            writeln!(f, "Node counts:")?;
            for (label, count) in &v.label_counts {
                writeln!(f, "  {label}: {count}")?;
            }
            writeln!(f, "Relationship counts:")?;
            for (rel_type, count) in &v.type_counts {
                writeln!(f, "  {rel_type}: {count}")?;
            }
            if let Some(sample) = &v.sample {
                writeln!(
                    f,
                    "Sample {} tasks in {}: {} found",
                    sample.role,
                    sample.workflow_id,
                    sample.task_ids.len()
                )?;
            }
            for failure in &v.failures {
                writeln!(f, "  verification failed: {failure}")?;
            }
        }
        Ok(())
    }
}

/// Load all tables, then create indexes and verify as requested.
pub fn run_import<C: GraphClient>(
    client: C,
    sources: &TableSources,
    options: LoadOptions,
    post: &PostLoad,
) -> IngestionResult<ImportReport> {
    let graph = options.graph.clone();
    let mut loader = GraphLoader::new(client, options);
    loader.run(sources)?;

    let (mut client, stats) = loader.into_parts();
    let indexes = post
        .create_indexes
        .then(|| provision_indexes(&mut client, &graph, &INDEXES));
    let verification = post
        .verify
        .then(|| verify(&mut client, &graph, post.sample.as_ref()));

    let report = ImportReport {
        stats,
        indexes,
        verification,
    };
    for gap in report.referential_gaps() {
        warn!(
            rel_type = %gap.rel_type,
            attempted = gap.attempted,
            stored = gap.stored,
            "fewer relationships stored than attempted"
        );
    }
    Ok(report)
}
