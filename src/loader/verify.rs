//! Post-load verification: read-only counts and one representative traversal.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{info, warn};

use crate::client::GraphClient;
use crate::query::statements::{self, NODE_LABELS, RELATIONSHIP_TYPES};
use crate::query::template::{render, Params};
use crate::types::Value;

use super::tables::TableKind;
use super::LoadStats;

/// The role/workflow pair used for the sample traversal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleQuery {
    pub role: String,
    pub workflow_id: String,
}

/// Result of the sample traversal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SampleOutcome {
    pub role: String,
    pub workflow_id: String,
    /// Task ids in sequence order.
    pub task_ids: Vec<String>,
}

/// A relationship type for which fewer edges are stored than rows were attempted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferentialGap {
    pub rel_type: String,
    pub attempted: usize,
    pub stored: i64,
}

/// Everything the probe observed. Failed probe queries are listed in `failures`, never retried.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VerificationReport {
    /// `labels(n)[0] -> count` over the whole graph.
    pub node_counts: BTreeMap<String, i64>,
    /// `type(r) -> count` over the whole graph.
    pub relationship_counts: BTreeMap<String, i64>,
    /// Count per loaded label, 0 when absent.
    pub label_counts: BTreeMap<String, i64>,
    /// Count per loaded relationship type, 0 when absent.
    pub type_counts: BTreeMap<String, i64>,
    pub sample: Option<SampleOutcome>,
    pub failures: Vec<String>,
}

impl VerificationReport {
    /// Relationship types whose stored count is below the number of attempted rows.
    ///
    /// Edge rows whose endpoints do not exist create nothing and raise nothing; comparing the
    /// loader's attempt counters against the stored counts is how those misses surface.
    pub fn referential_gaps(&self, stats: &LoadStats) -> Vec<ReferentialGap> {
        [TableKind::UsedIn, TableKind::DependsOn]
            .into_iter()
            .filter_map(|kind| {
                let attempted = stats.attempted(kind);
                let stored = self.type_counts.get(kind.graph_type()).copied().unwrap_or(0);
                (attempted as i64 > stored).then(|| ReferentialGap {
                    rel_type: kind.graph_type().to_owned(),
                    attempted,
                    stored,
                })
            })
            .collect()
    }
}

/// Run the verification queries against `graph`.
pub fn verify<C: GraphClient>(client: &mut C, graph: &str, sample: Option<&SampleQuery>) -> VerificationReport {
    info!(graph, "verifying import");
    let mut report = VerificationReport::default();

    match client.ro_query(graph, statements::COUNT_NODES_BY_LABEL) {
        Ok(result) => report.node_counts = result.counts_by_key(),
        Err(e) => report.failures.push(format!("node counts: {e}")),
    }
    match client.ro_query(graph, statements::COUNT_RELATIONSHIPS_BY_TYPE) {
        Ok(result) => report.relationship_counts = result.counts_by_key(),
        Err(e) => report.failures.push(format!("relationship counts: {e}")),
    }

    for label in NODE_LABELS {
        match client.ro_query(graph, &statements::count_label(label)) {
            Ok(result) => {
                report
                    .label_counts
                    .insert(label.to_owned(), result.scalar_i64().unwrap_or(0));
            }
            Err(e) => report.failures.push(format!("{label} count: {e}")),
        }
    }
    for rel_type in RELATIONSHIP_TYPES {
        match client.ro_query(graph, &statements::count_relationship(rel_type)) {
            Ok(result) => {
                report
                    .type_counts
                    .insert(rel_type.to_owned(), result.scalar_i64().unwrap_or(0));
            }
            Err(e) => report.failures.push(format!("{rel_type} count: {e}")),
        }
    }

    if let Some(sample) = sample {
        let params = Params::from([
            ("role".to_owned(), Value::from(sample.role.as_str())),
            ("workflow_id".to_owned(), Value::from(sample.workflow_id.as_str())),
        ]);
        let query = render(statements::ROLE_TASKS_IN_WORKFLOW, &params);
        match client.ro_query(graph, &query) {
            Ok(result) => {
                let task_ids = result
                    .rows
                    .iter()
                    .filter_map(|row| row.first())
                    .map(|v| match v {
                        serde_json::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect();
                report.sample = Some(SampleOutcome {
                    role: sample.role.clone(),
                    workflow_id: sample.workflow_id.clone(),
                    task_ids,
                });
            }
            Err(e) => report.failures.push(format!("sample query: {e}")),
        }
    }

    for (label, count) in &report.label_counts {
        info!(label = %label, count, "node count");
    }
    for (rel_type, count) in &report.type_counts {
        info!(rel_type = %rel_type, count, "relationship count");
    }
    if let Some(sample) = &report.sample {
        info!(
            role = %sample.role,
            workflow = %sample.workflow_id,
            found = sample.task_ids.len(),
            "sample tasks in workflow"
        );
    }
    for failure in &report.failures {
        warn!("verification query failed: {failure}");
    }

    report
}
