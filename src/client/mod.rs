//! The query-execution collaborator.
//!
//! The loader, the verification probe and the catalog only ever see [`GraphClient`]:
//! `query(graph, text) -> QueryResult | error`. [`FalkorClient`] implements it over a blocking
//! RESP connection using the `GRAPH.QUERY` command; tests substitute in-memory doubles.

pub mod falkor;
pub mod resp;

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::IngestionResult;

pub use falkor::FalkorClient;

/// Executes literal query text against a named graph.
pub trait GraphClient {
    /// Run a query that may write.
    fn query(&mut self, graph: &str, query: &str) -> IngestionResult<QueryResult>;

    /// Run a query that only reads. Defaults to [`Self::query`].
    fn ro_query(&mut self, graph: &str, query: &str) -> IngestionResult<QueryResult> {
        self.query(graph, query)
    }
}

impl<C: GraphClient + ?Sized> GraphClient for &mut C {
    fn query(&mut self, graph: &str, query: &str) -> IngestionResult<QueryResult> {
        (**self).query(graph, query)
    }

    fn ro_query(&mut self, graph: &str, query: &str) -> IngestionResult<QueryResult> {
        (**self).ro_query(graph, query)
    }
}

/// Write statistics reported alongside a result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QueryStats {
    pub nodes_created: u64,
    pub relationships_created: u64,
    pub properties_set: u64,
    pub indices_created: u64,
    /// Stat lines that are not one of the counters above, verbatim.
    pub other: Vec<String>,
}

impl QueryStats {
    /// Parse `"<Name>: <number>[ unit]"` lines as returned by the store.
    pub fn from_lines<S: AsRef<str>>(lines: &[S]) -> Self {
        let mut stats = Self::default();
        for line in lines {
            let line = line.as_ref();
            let Some((name, rest)) = line.split_once(':') else {
                stats.other.push(line.to_owned());
                continue;
            };
            let count = rest
                .split_whitespace()
                .next()
                .and_then(|n| n.parse::<u64>().ok());
            let slot = match name.trim() {
                "Nodes created" => &mut stats.nodes_created,
                "Relationships created" => &mut stats.relationships_created,
                "Properties set" => &mut stats.properties_set,
                "Indices created" => &mut stats.indices_created,
                _ => {
                    stats.other.push(line.to_owned());
                    continue;
                }
            };
            match count {
                Some(n) => *slot = n,
                None => stats.other.push(line.to_owned()),
            }
        }
        stats
    }
}

/// Result of one query: a header row, row-wise values and write statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryResult {
    /// Column names (empty for pure writes).
    pub columns: Vec<String>,
    /// Tabular result rows, one JSON scalar per column.
    pub rows: Vec<Vec<serde_json::Value>>,
    /// Write statistics.
    pub stats: QueryStats,
}

impl QueryResult {
    /// Rows as column-name → value maps.
    pub fn records(&self) -> Vec<BTreeMap<String, serde_json::Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .zip(row.iter())
                    .map(|(c, v)| (c.clone(), v.clone()))
                    .collect()
            })
            .collect()
    }

    /// First column of the first row as an integer, for `RETURN count(..)` style queries.
    pub fn scalar_i64(&self) -> Option<i64> {
        self.rows.first()?.first().and_then(json_to_i64)
    }

    /// `(first column as text, second column as integer)` pairs, for grouped counts.
    pub fn counts_by_key(&self) -> BTreeMap<String, i64> {
        self.rows
            .iter()
            .filter_map(|row| {
                let key = match row.first()? {
                    serde_json::Value::String(s) => s.clone(),
                    serde_json::Value::Null => return None,
                    other => other.to_string(),
                };
                let count = row.get(1).and_then(json_to_i64)?;
                Some((key, count))
            })
            .collect()
    }
}

fn json_to_i64(v: &serde_json::Value) -> Option<i64> {
    match v {
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
