//! Post-load index creation.

use serde::Serialize;
use tracing::{info, warn};

use crate::client::GraphClient;
use crate::query::statements::IndexSpec;

/// Outcome of one provisioning pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IndexReport {
    /// Statements the store accepted.
    pub created: Vec<String>,
    /// `(statement, error)` for statements the store rejected (typically "already indexed").
    pub failed: Vec<(String, String)>,
}

/// Issue one `CREATE INDEX` per index entry. A rejected statement is logged and the next one still runs.
pub fn provision_indexes<C: GraphClient>(client: &mut C, graph: &str, specs: &[IndexSpec]) -> IndexReport {
    info!(graph, count = specs.len(), "creating indexes");
    let mut report = IndexReport::default();
    for spec in specs {
        let statement = spec.statement();
        match client.query(graph, &statement) {
            Ok(_) => {
                info!(%statement, "index created");
                report.created.push(statement);
            }
            Err(e) => {
                warn!(%statement, error = %e, "index creation failed");
                report.failed.push((statement, e.to_string()));
            }
        }
    }
    report
}
