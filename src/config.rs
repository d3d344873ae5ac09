//! Import configuration.
//!
//! Values come from [`ImportConfig::default`], optionally overridden by a JSON file
//! ([`ImportConfig::from_path`]), then by command-line flags in the binary.
//!
//! ```json
//! {
//!   "host": "localhost",
//!   "port": 6379,
//!   "graph": "default_db",
//!   "data_dir": "docs/Product_Management",
//!   "format": "rtf",
//!   "tables": { "used_in": "task_workflow_relationships_v3" },
//!   "strict_edges": true
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{IngestionError, IngestionResult};
use crate::ingestion::{IngestionObserver, IngestionSeverity, ReadOptions, SourceFormat};
use crate::loader::{LoadOptions, PostLoad, SampleQuery, TableKind, TableSources};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    pub host: String,
    pub port: u16,
    pub graph: String,
    /// Directory holding the five table files.
    pub data_dir: PathBuf,
    pub format: SourceFormat,
    /// File stem overrides per table; unset tables use [`TableKind::default_stem`].
    pub tables: BTreeMap<TableKind, String>,
    pub strict_edges: bool,
    pub create_indexes: bool,
    pub verify: bool,
    pub sample_role: String,
    pub sample_workflow: String,
    /// Append table/row events to this file as well.
    pub log_file: Option<PathBuf>,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_owned(),
            port: 6379,
            graph: "default_db".to_owned(),
            data_dir: PathBuf::from("docs/Product_Management"),
            format: SourceFormat::Csv,
            tables: BTreeMap::new(),
            strict_edges: false,
            create_indexes: true,
            verify: true,
            sample_role: "PRODM".to_owned(),
            sample_workflow: "LAUNCH_001".to_owned(),
            log_file: None,
        }
    }
}

impl ImportConfig {
    pub fn from_json_str(s: &str) -> IngestionResult<Self> {
        serde_json::from_str(s).map_err(|e| IngestionError::Config(format!("invalid config: {e}")))
    }

    pub fn from_path(path: impl AsRef<Path>) -> IngestionResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| IngestionError::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_json_str(&text)
    }

    /// File stem for one table.
    pub fn stem(&self, kind: TableKind) -> String {
        self.tables
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| kind.default_stem())
    }

    /// Locate every table file.
    ///
    /// `<data_dir>/<stem>.<ext>` wins when it exists. A stem set in `tables` must exist as given.
    /// Otherwise the lexicographically last match of `<data_dir>/<table name>*.<ext>` is used, so
    /// `_v3` beats `_v2` but `_v10` sorts below `_v9`.
    pub fn resolve_sources(&self) -> IngestionResult<TableSources> {
        let ext = self.format.extension();
        let mut sources = TableSources::new();
        for kind in TableKind::LOAD_ORDER {
            let exact = self.data_dir.join(format!("{}.{ext}", self.stem(kind)));
            if exact.is_file() {
                sources.insert(kind, exact);
                continue;
            }
            if self.tables.contains_key(&kind) {
                return Err(IngestionError::Config(format!(
                    "configured file for table '{kind}' not found: {}",
                    exact.display()
                )));
            }

            let pattern = format!(
                "{}/{}*.{ext}",
                glob::Pattern::escape(&self.data_dir.to_string_lossy()),
                kind.name()
            );
            let mut matches: Vec<PathBuf> = glob::glob(&pattern)
                .map_err(|e| IngestionError::Config(format!("bad pattern {pattern}: {e}")))?
                .filter_map(Result::ok)
                .filter(|p| p.is_file())
                .collect();
            matches.sort();
            match matches.pop() {
                Some(found) => {
                    debug!(table = %kind, path = %found.display(), "resolved by pattern");
                    sources.insert(kind, found);
                }
                None => {
                    return Err(IngestionError::Config(format!(
                        "no source file for table '{kind}' (tried {} and {pattern})",
                        exact.display()
                    )));
                }
            }
        }
        Ok(sources)
    }

    pub fn sample(&self) -> SampleQuery {
        SampleQuery {
            role: self.sample_role.clone(),
            workflow_id: self.sample_workflow.clone(),
        }
    }

    pub fn load_options(&self, observer: Option<Arc<dyn IngestionObserver>>) -> LoadOptions {
        LoadOptions {
            graph: self.graph.clone(),
            strict_edges: self.strict_edges,
            read: ReadOptions {
                format: Some(self.format),
                observer,
                alert_at_or_above: IngestionSeverity::Critical,
            },
        }
    }

    pub fn post_load(&self) -> PostLoad {
        PostLoad {
            create_indexes: self.create_indexes,
            verify: self.verify,
            sample: Some(self.sample()),
        }
    }
}
