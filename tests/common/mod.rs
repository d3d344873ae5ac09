//! Shared helpers for integration tests: an in-memory graph that understands the statements the
//! loader and the verification probe issue, plus fixture helpers.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde_json::{json, Value as Json};

use graph_ingest::client::{GraphClient, QueryResult, QueryStats};
use graph_ingest::query::statements;
use graph_ingest::{IngestionError, IngestionResult};

pub type Props = BTreeMap<String, Json>;

#[derive(Debug, Clone)]
pub struct Node {
    pub label: String,
    pub props: Props,
}

#[derive(Debug, Clone)]
pub struct Edge {
    pub rel_type: String,
    pub from: usize,
    pub to: usize,
    pub props: Props,
}

/// Interprets node `CREATE`, `MATCH .. MATCH .. CREATE` edge statements, `CREATE INDEX`, the
/// count queries and the sample traversal. Anything else is rejected with a query error.
#[derive(Debug, Default)]
pub struct MemoryGraph {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub indexes: Vec<String>,
    /// Every query received, in order.
    pub log: Vec<String>,
    /// Queries containing any of these fragments are rejected.
    pub reject_containing: Vec<String>,
}

impl MemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rejecting(fragment: &str) -> Self {
        Self {
            reject_containing: vec![fragment.to_owned()],
            ..Self::default()
        }
    }

    pub fn nodes_with_label(&self, label: &str) -> Vec<&Node> {
        self.nodes.iter().filter(|n| n.label == label).collect()
    }

    pub fn edges_of_type(&self, rel_type: &str) -> Vec<&Edge> {
        self.edges.iter().filter(|e| e.rel_type == rel_type).collect()
    }

    fn find_node(&self, label: &str, key: &str, value: &Json) -> Option<usize> {
        self.nodes
            .iter()
            .position(|n| n.label == label && n.props.get(key) == Some(value))
    }

    fn execute(&mut self, query: &str) -> Result<QueryResult, String> {
        let q = query.trim();

        if q == statements::COUNT_NODES_BY_LABEL {
            let mut counts: BTreeMap<&str, i64> = BTreeMap::new();
            for n in &self.nodes {
                *counts.entry(n.label.as_str()).or_default() += 1;
            }
            return Ok(grouped(counts));
        }
        if q == statements::COUNT_RELATIONSHIPS_BY_TYPE {
            let mut counts: BTreeMap<&str, i64> = BTreeMap::new();
            for e in &self.edges {
                *counts.entry(e.rel_type.as_str()).or_default() += 1;
            }
            return Ok(grouped(counts));
        }
        if let Some(label) = q.strip_prefix("MATCH (n:").and_then(|r| r.strip_suffix(") RETURN count(n)")) {
            return Ok(scalar(self.nodes_with_label(label).len() as i64));
        }
        if let Some(t) = q.strip_prefix("MATCH ()-[r:").and_then(|r| r.strip_suffix("]->() RETURN count(r)")) {
            return Ok(scalar(self.edges_of_type(t).len() as i64));
        }
        if q.starts_with("CREATE INDEX") {
            self.indexes.push(q.to_owned());
            return Ok(QueryResult {
                stats: QueryStats {
                    indices_created: 1,
                    ..QueryStats::default()
                },
                ..QueryResult::default()
            });
        }
        if q.starts_with("MATCH (t:TASK_TEMPLATE)-[r:USED_IN]->(w:WORKFLOW_TEMPLATE)") {
            return self.sample_traversal(q);
        }
        if q.starts_with("CREATE (") {
            return self.create_node(q);
        }
        if q.starts_with("MATCH (") && q.contains("]->(") {
            return self.create_edge(q);
        }
        Err(format!("unsupported query: {q}"))
    }

    fn create_node(&mut self, q: &str) -> Result<QueryResult, String> {
        let (label, props, _) = parse_pattern(&q["CREATE ".len()..])?;
        let set = props.len() as u64;
        self.nodes.push(Node { label, props });
        Ok(QueryResult {
            stats: QueryStats {
                nodes_created: 1,
                properties_set: set,
                ..QueryStats::default()
            },
            ..QueryResult::default()
        })
    }

    fn create_edge(&mut self, q: &str) -> Result<QueryResult, String> {
        let mut rest = q;
        let mut endpoints = Vec::new();
        for _ in 0..2 {
            rest = rest.trim_start().strip_prefix("MATCH ").ok_or("expected MATCH")?;
            let (label, props, tail) = parse_pattern(rest)?;
            let (key, value) = props.into_iter().next().ok_or("MATCH without key")?;
            endpoints.push(self.find_node(&label, &key, &value));
            rest = tail;
        }

        let create = rest.trim_start().strip_prefix("CREATE (").ok_or("expected CREATE")?;
        let open = create.find("-[").ok_or("expected relationship")?;
        let (rel_type, props, _) = parse_pattern(&create[open + 1..])?;

        match (endpoints[0], endpoints[1]) {
            (Some(from), Some(to)) => {
                let set = props.len() as u64;
                self.edges.push(Edge {
                    rel_type,
                    from,
                    to,
                    props,
                });
                Ok(QueryResult {
                    stats: QueryStats {
                        relationships_created: 1,
                        properties_set: set,
                        ..QueryStats::default()
                    },
                    ..QueryResult::default()
                })
            }
            _ => Ok(QueryResult::default()),
        }
    }

    fn sample_traversal(&self, q: &str) -> Result<QueryResult, String> {
        let role = literal_after(q, "t.role = ")?;
        let workflow = literal_after(q, "w.workflow_id = ")?;

        let mut rows: Vec<(i64, Vec<Json>)> = self
            .edges
            .iter()
            .filter(|e| e.rel_type == statements::USED_IN)
            .filter(|e| self.nodes[e.from].props.get("role") == Some(&role))
            .filter(|e| self.nodes[e.to].props.get("workflow_id") == Some(&workflow))
            .map(|e| {
                let task = &self.nodes[e.from].props;
                let seq = e.props.get("sequence_position").cloned().unwrap_or(Json::Null);
                let key = seq.as_i64().unwrap_or(i64::MAX);
                let row = vec![
                    task.get("node_id").cloned().unwrap_or(Json::Null),
                    seq,
                    task.get("workflow_name").cloned().unwrap_or(Json::Null),
                ];
                (key, row)
            })
            .collect();
        rows.sort_by_key(|(k, _)| *k);

        Ok(QueryResult {
            columns: vec![
                "t.node_id".into(),
                "r.sequence_position".into(),
                "t.workflow_name".into(),
            ],
            rows: rows.into_iter().map(|(_, r)| r).collect(),
            ..QueryResult::default()
        })
    }
}

impl GraphClient for MemoryGraph {
    fn query(&mut self, _graph: &str, query: &str) -> IngestionResult<QueryResult> {
        self.log.push(query.to_owned());
        if self.reject_containing.iter().any(|f| query.contains(f.as_str())) {
            return Err(IngestionError::Query("rejected by test graph".to_owned()));
        }
        self.execute(query).map_err(IngestionError::Query)
    }
}

fn grouped(counts: BTreeMap<&str, i64>) -> QueryResult {
    QueryResult {
        columns: vec!["type".into(), "count".into()],
        rows: counts.into_iter().map(|(k, v)| vec![json!(k), json!(v)]).collect(),
        ..QueryResult::default()
    }
}

fn scalar(n: i64) -> QueryResult {
    QueryResult {
        columns: vec!["count".into()],
        rows: vec![vec![json!(n)]],
        ..QueryResult::default()
    }
}

/// Parse `(var:LABEL {k: v, ..})` or `[var:TYPE {k: v, ..}]`, returning the label, the property
/// map and the text after the closing bracket.
fn parse_pattern(s: &str) -> Result<(String, Props, &str), String> {
    let s = s.trim_start();
    let close = match s.chars().next() {
        Some('(') => ')',
        Some('[') => ']',
        _ => return Err(format!("expected pattern at: {s}")),
    };
    let colon = s.find(':').ok_or("pattern without label")?;
    let after_colon = &s[colon + 1..];
    let label_end = after_colon
        .find(|c: char| !(c.is_alphanumeric() || c == '_'))
        .ok_or("unterminated label")?;
    let label = after_colon[..label_end].to_owned();
    let mut rest = after_colon[label_end..].trim_start();

    let mut props = Props::new();
    if let Some(body) = rest.strip_prefix('{') {
        let (map, tail) = parse_map(body)?;
        props = map;
        rest = tail.trim_start();
    }
    let rest = rest
        .strip_prefix(close)
        .ok_or_else(|| format!("expected '{close}' at: {rest}"))?;
    Ok((label, props, rest))
}

/// Parse `k: literal, ...}` (opening brace already consumed).
fn parse_map(mut s: &str) -> Result<(Props, &str), String> {
    let mut props = Props::new();
    loop {
        s = s.trim_start();
        if let Some(tail) = s.strip_prefix('}') {
            return Ok((props, tail));
        }
        let colon = s.find(':').ok_or("property without value")?;
        let key = s[..colon].trim().to_owned();
        let (value, tail) = parse_literal(s[colon + 1..].trim_start())?;
        props.insert(key, value);
        s = tail.trim_start();
        if let Some(tail) = s.strip_prefix(',') {
            s = tail;
        }
    }
}

/// Parse one double-quoted string (with escapes) or bare integer literal.
fn parse_literal(s: &str) -> Result<(Json, &str), String> {
    if let Some(body) = s.strip_prefix('"') {
        let mut out = String::new();
        let mut chars = body.char_indices();
        while let Some((i, c)) = chars.next() {
            match c {
                '"' => return Ok((Json::String(out), &body[i + 1..])),
                '\\' => match chars.next() {
                    Some((_, 'n')) => out.push('\n'),
                    Some((_, 'r')) => out.push('\r'),
                    Some((_, other)) => out.push(other),
                    None => return Err("dangling escape".into()),
                },
                _ => out.push(c),
            }
        }
        return Err("unterminated string literal".into());
    }
    let end = s
        .find(|c: char| !(c.is_ascii_digit() || c == '-'))
        .unwrap_or(s.len());
    let n: i64 = s[..end]
        .parse()
        .map_err(|_| format!("bad literal at: {}", s.chars().take(20).collect::<String>()))?;
    Ok((json!(n), &s[end..]))
}

fn literal_after(q: &str, marker: &str) -> Result<Json, String> {
    let at = q.find(marker).ok_or_else(|| format!("missing {marker}"))?;
    parse_literal(&q[at + marker.len()..]).map(|(v, _)| v)
}

pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

/// Wrap CSV text the way a rich-text editor saves it: one `\strokec2` run, `\` line breaks.
pub fn wrap_in_rtf(csv: &str) -> String {
    let body = csv
        .lines()
        .collect::<Vec<_>>()
        .join("\\\n");
    format!(
        "{{\\rtf1\\ansi\\ansicpg1252\\cocoartf2822\n\
         {{\\fonttbl\\f0\\fnil\\fcharset0 Menlo-Regular;}}\n\
         {{\\colortbl;\\red255\\green255\\blue255;\\red0\\green0\\blue0;}}\n\
         \\pard\\tx560\\pardirnatural\\partightenfactor0\n\
         \n\
         \\f0\\fs24 \\cf2 \\expnd0\\expndtw0\\kerning0\n\
         \\outl0\\strokewidth0 \\strokec2 {body}}}\n}}\n"
    )
}
