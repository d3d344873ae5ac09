//! Fixed query text used by the loader, the index provisioner and the verification probe.
//!
//! Mutation templates use `$name` placeholders rendered by [`super::template::render`]; every
//! placeholder name equals the source column it is filled from, plus `$created_at` which the
//! loader stamps on each row.

pub const BUSINESS_SEGMENT_LABEL: &str = "BUSINESS_SEGMENT";
pub const TASK_TEMPLATE_LABEL: &str = "TASK_TEMPLATE";
pub const WORKFLOW_TEMPLATE_LABEL: &str = "WORKFLOW_TEMPLATE";
pub const USED_IN: &str = "USED_IN";
pub const DEPENDS_ON: &str = "DEPENDS_ON";

/// Node labels created by a load, in load order.
pub const NODE_LABELS: [&str; 3] = [BUSINESS_SEGMENT_LABEL, TASK_TEMPLATE_LABEL, WORKFLOW_TEMPLATE_LABEL];

/// Relationship types created by a load, in load order.
pub const RELATIONSHIP_TYPES: [&str; 2] = [USED_IN, DEPENDS_ON];

pub const CREATE_BUSINESS_SEGMENT: &str = "\
CREATE (bs:BUSINESS_SEGMENT {
    segment_id: $segment_id,
    segment_name: $segment_name,
    description: $description,
    version: $version,
    node_type: $node_type,
    created_at: $created_at
})";

pub const CREATE_TASK_TEMPLATE: &str = "\
CREATE (tt:TASK_TEMPLATE {
    node_id: $node_id,
    node_type: $node_type,
    segment_id: $segment_id,
    role: $role,
    workflow_name: $workflow_name,
    characteristic: $characteristic,
    prompt: $prompt,
    pain_point_need: $pain_point_need,
    artifacts: $artifacts,
    keywords_phrases: $keywords_phrases,
    outcomes: $outcomes,
    prompt_flexibility: $prompt_flexibility,
    instruction_with_example: $instruction_with_example,
    example_straightforward: $example_straightforward,
    example_complex: $example_complex,
    example_enterprise: $example_enterprise,
    created_at: $created_at
})";

pub const CREATE_WORKFLOW_TEMPLATE: &str = "\
CREATE (wt:WORKFLOW_TEMPLATE {
    workflow_id: $workflow_id,
    node_type: $node_type,
    segment_id: $segment_id,
    workflow_name: $workflow_name,
    description: $description,
    business_value: $business_value,
    total_tasks: $total_tasks,
    involved_roles: $involved_roles,
    complexity_level: $complexity_level,
    created_at: $created_at
})";

pub const CREATE_USED_IN: &str = "\
MATCH (tt:TASK_TEMPLATE {node_id: $source_node_id})
MATCH (wt:WORKFLOW_TEMPLATE {workflow_id: $target_node_id})
CREATE (tt)-[r:USED_IN {
    relationship_type: $relationship_type,
    sequence_position: $sequence_position,
    priority_score: $priority_score,
    notification_trigger: $notification_trigger,
    visibility_roles: $visibility_roles,
    created_at: $created_at
}]->(wt)";

pub const CREATE_DEPENDS_ON: &str = "\
MATCH (tt1:TASK_TEMPLATE {node_id: $source_node_id})
MATCH (tt2:TASK_TEMPLATE {node_id: $target_node_id})
CREATE (tt1)-[r:DEPENDS_ON {
    relationship_type: $relationship_type,
    workflow_context: $workflow_context,
    dependency_type: $dependency_type,
    priority_score: $priority_score,
    created_at: $created_at
}]->(tt2)";

/// What an index is declared on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexTarget {
    /// A node label.
    Label(&'static str),
    /// A relationship type.
    Relationship(&'static str),
}

/// One `(label-or-type, attribute)` pair that gets an index after the load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexSpec {
    pub target: IndexTarget,
    pub attribute: &'static str,
}

impl IndexSpec {
    const fn node(label: &'static str, attribute: &'static str) -> Self {
        Self {
            target: IndexTarget::Label(label),
            attribute,
        }
    }

    const fn relationship(rel_type: &'static str, attribute: &'static str) -> Self {
        Self {
            target: IndexTarget::Relationship(rel_type),
            attribute,
        }
    }

    /// The `CREATE INDEX` statement for this pair.
    pub fn statement(&self) -> String {
        match self.target {
            IndexTarget::Label(label) => {
                format!("CREATE INDEX FOR (n:{label}) ON (n.{})", self.attribute)
            }
            IndexTarget::Relationship(rel) => {
                format!("CREATE INDEX FOR ()-[r:{rel}]-() ON (r.{})", self.attribute)
            }
        }
    }
}

/// Indexes created after a load.
pub const INDEXES: [IndexSpec; 10] = [
    IndexSpec::node(TASK_TEMPLATE_LABEL, "node_id"),
    IndexSpec::node(TASK_TEMPLATE_LABEL, "role"),
    IndexSpec::node(TASK_TEMPLATE_LABEL, "segment_id"),
    IndexSpec::node(WORKFLOW_TEMPLATE_LABEL, "workflow_id"),
    IndexSpec::node(WORKFLOW_TEMPLATE_LABEL, "segment_id"),
    IndexSpec::node(WORKFLOW_TEMPLATE_LABEL, "complexity_level"),
    IndexSpec::node(BUSINESS_SEGMENT_LABEL, "segment_id"),
    IndexSpec::relationship(USED_IN, "sequence_position"),
    IndexSpec::relationship(DEPENDS_ON, "workflow_context"),
    IndexSpec::relationship(DEPENDS_ON, "dependency_type"),
];

pub const COUNT_NODES_BY_LABEL: &str = "MATCH (n) RETURN labels(n)[0] AS type, count(n) AS count";

pub const COUNT_RELATIONSHIPS_BY_TYPE: &str = "MATCH ()-[r]->() RETURN type(r) AS type, count(r) AS count";

/// Count of nodes carrying one label.
pub fn count_label(label: &str) -> String {
    format!("MATCH (n:{label}) RETURN count(n)")
}

/// Count of relationships of one type.
pub fn count_relationship(rel_type: &str) -> String {
    format!("MATCH ()-[r:{rel_type}]->() RETURN count(r)")
}

/// Tasks of one role reachable from one workflow through `USED_IN`, in sequence order.
pub const ROLE_TASKS_IN_WORKFLOW: &str = "\
MATCH (t:TASK_TEMPLATE)-[r:USED_IN]->(w:WORKFLOW_TEMPLATE)
WHERE t.role = $role AND w.workflow_id = $workflow_id
RETURN t.node_id, r.sequence_position, t.workflow_name
ORDER BY r.sequence_position";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_statements_cover_labels_and_relationships() {
        assert_eq!(
            INDEXES[0].statement(),
            "CREATE INDEX FOR (n:TASK_TEMPLATE) ON (n.node_id)"
        );
        assert_eq!(
            INDEXES[7].statement(),
            "CREATE INDEX FOR ()-[r:USED_IN]-() ON (r.sequence_position)"
        );
    }

    #[test]
    fn per_type_counts_name_the_type() {
        assert_eq!(count_label("TASK_TEMPLATE"), "MATCH (n:TASK_TEMPLATE) RETURN count(n)");
        assert_eq!(count_relationship("USED_IN"), "MATCH ()-[r:USED_IN]->() RETURN count(r)");
    }
}
