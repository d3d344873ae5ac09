//! Blocking RESP client for a FalkorDB-compatible graph store.

use std::io::{Read, Write};
use std::net::TcpStream;

use bytes::BytesMut;
use tracing::debug;

use crate::error::{IngestionError, IngestionResult};

use super::resp::RespValue;
use super::{GraphClient, QueryResult, QueryStats};

const READ_CHUNK: usize = 8 * 1024;

/// One connection to the store, held for the duration of a run.
///
/// Commands are written and answered strictly one at a time; a store that never answers blocks
/// the caller.
pub struct FalkorClient {
    stream: TcpStream,
    buf: BytesMut,
    addr: String,
}

impl FalkorClient {
    /// Open a connection to `host:port`.
    pub fn connect(host: &str, port: u16) -> IngestionResult<Self> {
        let addr = format!("{host}:{port}");
        let stream = TcpStream::connect(&addr)
            .map_err(|e| IngestionError::Connection(format!("{addr}: {e}")))?;
        stream.set_nodelay(true)?;
        Ok(Self {
            stream,
            buf: BytesMut::with_capacity(READ_CHUNK),
            addr,
        })
    }

    /// Address this client is connected to.
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// `PING` the server; succeeds on `PONG`.
    pub fn ping(&mut self) -> IngestionResult<()> {
        match self.command(&["PING"])? {
            RespValue::SimpleString(s) if s == "PONG" => Ok(()),
            RespValue::Error(e) => Err(IngestionError::Connection(e)),
            other => Err(IngestionError::Connection(format!("unexpected PING reply: {other:?}"))),
        }
    }

    /// Send one command and wait for its reply.
    pub fn command<S: AsRef<[u8]>>(&mut self, parts: &[S]) -> IngestionResult<RespValue> {
        let mut out = Vec::new();
        RespValue::command(parts).encode(&mut out)?;
        self.stream.write_all(&out)?;
        self.stream.flush()?;

        let mut chunk = [0u8; READ_CHUNK];
        loop {
            match RespValue::decode(&mut self.buf) {
                Ok(Some(value)) => return Ok(value),
                Ok(None) => {}
                Err(e) => {
                    // Drop the undecodable bytes so the next reply starts on a frame boundary.
                    self.buf.clear();
                    return Err(e.into());
                }
            }
            let n = self.stream.read(&mut chunk)?;
            if n == 0 {
                return Err(IngestionError::Connection(format!(
                    "{}: connection closed by server",
                    self.addr
                )));
            }
            self.buf.extend_from_slice(&chunk[..n]);
        }
    }

    fn graph_command(&mut self, command: &str, graph: &str, query: &str) -> IngestionResult<QueryResult> {
        debug!(graph, command, "sending query");
        let reply = self.command(&[command, graph, query])?;
        parse_graph_reply(reply)
    }
}

impl GraphClient for FalkorClient {
    fn query(&mut self, graph: &str, query: &str) -> IngestionResult<QueryResult> {
        self.graph_command("GRAPH.QUERY", graph, query)
    }

    fn ro_query(&mut self, graph: &str, query: &str) -> IngestionResult<QueryResult> {
        self.graph_command("GRAPH.RO_QUERY", graph, query)
    }
}

/// Turn a `GRAPH.QUERY` reply into a [`QueryResult`].
///
/// Replies are either `[stats]` (pure writes) or `[header, rows, stats]`; an error reply, or an
/// error element anywhere at the top level, becomes [`IngestionError::Query`].
pub fn parse_graph_reply(reply: RespValue) -> IngestionResult<QueryResult> {
    let items = match reply {
        RespValue::Error(msg) => return Err(IngestionError::Query(msg)),
        RespValue::Array(Some(items)) => items,
        other => {
            return Err(IngestionError::Query(format!("unexpected reply shape: {other:?}")));
        }
    };

    if let Some(RespValue::Error(msg)) = items.iter().find(|v| matches!(v, RespValue::Error(_))) {
        return Err(IngestionError::Query(msg.clone()));
    }

    let text_lines = |v: &RespValue| -> Vec<String> {
        match v {
            RespValue::Array(Some(lines)) => lines.iter().filter_map(RespValue::as_text).collect(),
            _ => Vec::new(),
        }
    };

    match items.as_slice() {
        [stats] => Ok(QueryResult {
            stats: QueryStats::from_lines(&text_lines(stats)),
            ..QueryResult::default()
        }),
        [header, rows, stats, ..] => {
            let columns = header
                .as_array()?
                .iter()
                .map(column_name)
                .collect();
            let rows = rows
                .as_array()?
                .iter()
                .map(|row| -> IngestionResult<Vec<serde_json::Value>> {
                    Ok(row.as_array()?.iter().map(to_json).collect())
                })
                .collect::<IngestionResult<Vec<_>>>()?;
            Ok(QueryResult {
                columns,
                rows,
                stats: QueryStats::from_lines(&text_lines(stats)),
            })
        }
        [] => Ok(QueryResult::default()),
        [_, _] => Err(IngestionError::Query("reply has header and rows but no statistics".to_string())),
    }
}

/// Column names are plain strings, or `[type, name]` pairs in compact mode.
fn column_name(v: &RespValue) -> String {
    match v {
        RespValue::Array(Some(pair)) => pair.last().and_then(RespValue::as_text).unwrap_or_default(),
        other => other.as_text().unwrap_or_default(),
    }
}

fn to_json(v: &RespValue) -> serde_json::Value {
    match v {
        RespValue::Integer(i) => serde_json::Value::from(*i),
        RespValue::SimpleString(s) | RespValue::Error(s) => serde_json::Value::String(s.clone()),
        RespValue::BulkString(Some(data)) => {
            serde_json::Value::String(String::from_utf8_lossy(data).into_owned())
        }
        RespValue::BulkString(None) | RespValue::Array(None) | RespValue::Null => serde_json::Value::Null,
        RespValue::Array(Some(items)) => serde_json::Value::Array(items.iter().map(to_json).collect()),
    }
}
