//! The five source tables and how a row of each becomes a mutation.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{IngestionError, IngestionResult};
use crate::query::statements;
use crate::query::template::Params;
use crate::types::{DataType, Field, Record, Schema, Value};

/// One source table. Variants are declared in load order: nodes before relationships.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    BusinessSegments,
    TaskTemplates,
    WorkflowTemplates,
    UsedIn,
    DependsOn,
}

impl TableKind {
    /// Every table, in the order a load must process them.
    pub const LOAD_ORDER: [TableKind; 5] = [
        TableKind::BusinessSegments,
        TableKind::TaskTemplates,
        TableKind::WorkflowTemplates,
        TableKind::UsedIn,
        TableKind::DependsOn,
    ];

    /// Stable table name used in logs and config keys.
    pub fn name(self) -> &'static str {
        match self {
            TableKind::BusinessSegments => "business_segments",
            TableKind::TaskTemplates => "task_templates",
            TableKind::WorkflowTemplates => "workflow_templates",
            TableKind::UsedIn => "task_workflow_relationships",
            TableKind::DependsOn => "task_dependencies",
        }
    }

    /// Default file stem (without extension) of the table in the data directory.
    pub fn default_stem(self) -> String {
        format!("{}_v2", self.name())
    }

    /// Whether rows of this table create relationships rather than nodes.
    pub fn is_relationship(self) -> bool {
        matches!(self, TableKind::UsedIn | TableKind::DependsOn)
    }

    /// Node label or relationship type this table creates.
    pub fn graph_type(self) -> &'static str {
        match self {
            TableKind::BusinessSegments => statements::BUSINESS_SEGMENT_LABEL,
            TableKind::TaskTemplates => statements::TASK_TEMPLATE_LABEL,
            TableKind::WorkflowTemplates => statements::WORKFLOW_TEMPLATE_LABEL,
            TableKind::UsedIn => statements::USED_IN,
            TableKind::DependsOn => statements::DEPENDS_ON,
        }
    }

    /// Mutation template rendered once per row.
    pub fn template(self) -> &'static str {
        match self {
            TableKind::BusinessSegments => statements::CREATE_BUSINESS_SEGMENT,
            TableKind::TaskTemplates => statements::CREATE_TASK_TEMPLATE,
            TableKind::WorkflowTemplates => statements::CREATE_WORKFLOW_TEMPLATE,
            TableKind::UsedIn => statements::CREATE_USED_IN,
            TableKind::DependsOn => statements::CREATE_DEPENDS_ON,
        }
    }

    /// Columns a row must provide, typed as they are written to the store.
    pub fn schema(self) -> Schema {
        let fields: Vec<Field> = match self {
            TableKind::BusinessSegments => vec![
                Field::utf8("segment_id"),
                Field::utf8("segment_name"),
                Field::utf8("description"),
                Field::utf8("version"),
                Field::utf8("node_type"),
            ],
            TableKind::TaskTemplates => [
                "node_id",
                "node_type",
                "segment_id",
                "role",
                "workflow_name",
                "characteristic",
                "prompt",
                "pain_point_need",
                "artifacts",
                "keywords_phrases",
                "outcomes",
                "prompt_flexibility",
                "instruction_with_example",
                "example_straightforward",
                "example_complex",
                "example_enterprise",
            ]
            .into_iter()
            .map(Field::utf8)
            .collect(),
            TableKind::WorkflowTemplates => vec![
                Field::utf8("workflow_id"),
                Field::utf8("node_type"),
                Field::utf8("segment_id"),
                Field::utf8("workflow_name"),
                Field::utf8("description"),
                Field::utf8("business_value"),
                Field::int64("total_tasks"),
                Field::utf8("involved_roles"),
                Field::utf8("complexity_level"),
            ],
            TableKind::UsedIn => vec![
                Field::utf8("source_node_id"),
                Field::utf8("target_node_id"),
                Field::utf8("relationship_type"),
                Field::int64("sequence_position"),
                Field::int64("priority_score"),
                Field::utf8("notification_trigger"),
                Field::utf8("visibility_roles"),
            ],
            TableKind::DependsOn => vec![
                Field::utf8("source_node_id"),
                Field::utf8("target_node_id"),
                Field::utf8("relationship_type"),
                Field::utf8("workflow_context"),
                Field::utf8("dependency_type"),
                Field::int64("priority_score"),
            ],
        };
        Schema::new(fields)
    }

    /// Typed placeholder values for one row plus the `created_at` stamp.
    ///
    /// `row` is the 1-based data row number used in error messages.
    pub fn params(self, record: &Record, row: usize, created_at: &str) -> IngestionResult<Params> {
        let schema = self.schema();
        let mut params = Params::new();
        for field in &schema.fields {
            let raw = record.get(&field.name).ok_or_else(|| IngestionError::MissingField {
                row,
                column: field.name.clone(),
            })?;
            params.insert(field.name.clone(), typed_value(row, field, raw)?);
        }
        params.insert("created_at".to_owned(), Value::Utf8(created_at.to_owned()));
        Ok(params)
    }

    /// Short human label for progress logs.
    pub fn describe_row(self, record: &Record) -> String {
        let pick = |name: &str| record.get(name).unwrap_or("?").to_owned();
        match self {
            TableKind::BusinessSegments => pick("segment_name"),
            TableKind::TaskTemplates => {
                let name: String = pick("workflow_name").chars().take(50).collect();
                format!("{}: {name}", pick("role"))
            }
            TableKind::WorkflowTemplates => pick("workflow_name").chars().take(50).collect(),
            TableKind::UsedIn | TableKind::DependsOn => {
                format!("{} -> {}", pick("source_node_id"), pick("target_node_id"))
            }
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn typed_value(row: usize, field: &Field, raw: &str) -> IngestionResult<Value> {
    match field.data_type {
        DataType::Utf8 => Ok(Value::Utf8(raw.to_owned())),
        DataType::Int64 => raw
            .trim()
            .parse::<i64>()
            .map(Value::Int64)
            .map_err(|e| IngestionError::ParseError {
                row,
                column: field.name.clone(),
                raw: raw.to_owned(),
                message: e.to_string(),
            }),
    }
}
