//! Read-only queries over a loaded knowledge graph.
//!
//! Every user-supplied value is bound through [`render`], so a role or keyword containing quotes
//! stays a literal instead of becoming query text.

use std::collections::BTreeMap;

use tracing::debug;

use crate::client::GraphClient;
use crate::error::IngestionResult;
use crate::types::Value;

use super::template::{render, Params};

/// One result row: column name → value.
pub type Row = BTreeMap<String, serde_json::Value>;

const ALL_ROLES: &str = "MATCH (tt:TASK_TEMPLATE) RETURN DISTINCT tt.role ORDER BY tt.role";

const TASKS_BY_ROLE: &str = "\
MATCH (tt:TASK_TEMPLATE {role: $role})
RETURN tt.node_id, tt.workflow_name, tt.characteristic, tt.prompt_flexibility
ORDER BY tt.workflow_name";

const WORKFLOW_DETAILS: &str = "\
MATCH (wt:WORKFLOW_TEMPLATE {workflow_id: $workflow_id})
RETURN wt.workflow_name, wt.description, wt.business_value,
       wt.total_tasks, wt.involved_roles, wt.complexity_level";

const WORKFLOW_TASKS: &str = "\
MATCH (tt:TASK_TEMPLATE)-[u:USED_IN]->(wt:WORKFLOW_TEMPLATE {workflow_id: $workflow_id})
RETURN tt.role, tt.workflow_name, tt.characteristic,
       u.sequence_position, u.priority_score
ORDER BY u.sequence_position, u.priority_score";

const TASK_DEPENDENCIES: &str = "\
MATCH (t1:TASK_TEMPLATE {node_id: $task_id})-[d:DEPENDS_ON]->(t2:TASK_TEMPLATE)
RETURN t2.node_id, t2.role, t2.workflow_name,
       d.dependency_type, d.workflow_context
ORDER BY d.priority_score";

const WORKFLOWS_BY_COMPLEXITY: &str = "\
MATCH (wt:WORKFLOW_TEMPLATE {complexity_level: $complexity})
RETURN wt.workflow_id, wt.workflow_name, wt.total_tasks, wt.involved_roles
ORDER BY wt.workflow_name";

const ROLE_COLLABORATION: &str = "\
MATCH (wt:WORKFLOW_TEMPLATE)
RETURN wt.workflow_name, wt.involved_roles, wt.complexity_level
ORDER BY wt.complexity_level, wt.workflow_name";

const SEARCH_TASKS: &str = "\
MATCH (tt:TASK_TEMPLATE)
WHERE tt.workflow_name CONTAINS $keyword
   OR tt.characteristic CONTAINS $keyword
   OR tt.keywords_phrases CONTAINS $keyword
RETURN tt.role, tt.workflow_name, tt.characteristic, tt.keywords_phrases
ORDER BY tt.role, tt.workflow_name";

/// Query helpers bound to one graph.
pub struct Catalog<C> {
    client: C,
    graph: String,
}

impl<C: GraphClient> Catalog<C> {
    pub fn new(client: C, graph: impl Into<String>) -> Self {
        Self {
            client,
            graph: graph.into(),
        }
    }

    /// Run arbitrary read-only query text and return column-keyed rows.
    pub fn cypher(&mut self, query: &str) -> IngestionResult<Vec<Row>> {
        debug!(graph = %self.graph, "catalog query");
        Ok(self.client.ro_query(&self.graph, query)?.records())
    }

    fn bound(&mut self, template: &str, name: &str, value: &str) -> IngestionResult<Vec<Row>> {
        let params = Params::from([(name.to_owned(), Value::from(value))]);
        self.cypher(&render(template, &params))
    }

    /// Distinct task roles, sorted.
    pub fn all_roles(&mut self) -> IngestionResult<Vec<String>> {
        let rows = self.cypher(ALL_ROLES)?;
        Ok(rows
            .iter()
            .filter_map(|r| r.get("tt.role"))
            .filter_map(|v| v.as_str().map(str::to_owned))
            .collect())
    }

    pub fn tasks_by_role(&mut self, role: &str) -> IngestionResult<Vec<Row>> {
        self.bound(TASKS_BY_ROLE, "role", role)
    }

    /// Details of one workflow, `None` when it does not exist.
    pub fn workflow_details(&mut self, workflow_id: &str) -> IngestionResult<Option<Row>> {
        Ok(self.bound(WORKFLOW_DETAILS, "workflow_id", workflow_id)?.into_iter().next())
    }

    pub fn workflow_tasks(&mut self, workflow_id: &str) -> IngestionResult<Vec<Row>> {
        self.bound(WORKFLOW_TASKS, "workflow_id", workflow_id)
    }

    pub fn task_dependencies(&mut self, task_id: &str) -> IngestionResult<Vec<Row>> {
        self.bound(TASK_DEPENDENCIES, "task_id", task_id)
    }

    pub fn workflows_by_complexity(&mut self, complexity: &str) -> IngestionResult<Vec<Row>> {
        self.bound(WORKFLOWS_BY_COMPLEXITY, "complexity", complexity)
    }

    /// Which roles appear together in each workflow.
    pub fn role_collaboration_map(&mut self) -> IngestionResult<Vec<Row>> {
        self.cypher(ROLE_COLLABORATION)
    }

    /// Tasks whose name, characteristic or keywords contain `keyword`.
    pub fn search_tasks_by_keyword(&mut self, keyword: &str) -> IngestionResult<Vec<Row>> {
        self.bound(SEARCH_TASKS, "keyword", keyword)
    }
}
