//! RESP (Redis Serialization Protocol) framing for the graph store connection.
//!
//! Only what a command client needs: encoding a command as an array of bulk strings and decoding
//! replies (RESP2 plus the RESP3 null). Decoding never consumes a partial frame; callers keep
//! reading into the buffer until [`RespValue::decode`] returns a value.

use std::io::{self, Write};

use bytes::{Buf, BytesMut};
use thiserror::Error;

/// RESP protocol errors
#[derive(Error, Debug)]
pub enum RespError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Protocol parsing error
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Invalid encoding
    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),
}

pub type RespResult<T> = Result<T, RespError>;

/// RESP value types
#[derive(Debug, Clone, PartialEq)]
pub enum RespValue {
    /// Simple string: +OK\r\n
    SimpleString(String),
    /// Error: -ERR message\r\n
    Error(String),
    /// Integer: :1000\r\n
    Integer(i64),
    /// Bulk string: $6\r\nfoobar\r\n (or $-1\r\n for null)
    BulkString(Option<Vec<u8>>),
    /// Array: *2\r\n$3\r\nfoo\r\n$3\r\nbar\r\n (or *-1\r\n for null)
    Array(Option<Vec<RespValue>>),
    /// Null: _\r\n (RESP3)
    Null,
}

impl RespValue {
    /// A command frame: an array of bulk strings.
    pub fn command<S: AsRef<[u8]>>(parts: &[S]) -> Self {
        RespValue::Array(Some(
            parts
                .iter()
                .map(|p| RespValue::BulkString(Some(p.as_ref().to_vec())))
                .collect(),
        ))
    }

    /// Encode RESP value to bytes
    pub fn encode(&self, buf: &mut Vec<u8>) -> io::Result<()> {
        match self {
            RespValue::SimpleString(s) => write!(buf, "+{}\r\n", s)?,
            RespValue::Error(e) => write!(buf, "-{}\r\n", e)?,
            RespValue::Integer(i) => write!(buf, ":{}\r\n", i)?,
            RespValue::BulkString(None) => write!(buf, "$-1\r\n")?,
            RespValue::BulkString(Some(data)) => {
                write!(buf, "${}\r\n", data.len())?;
                buf.extend_from_slice(data);
                write!(buf, "\r\n")?;
            }
            RespValue::Array(None) => write!(buf, "*-1\r\n")?,
            RespValue::Array(Some(items)) => {
                write!(buf, "*{}\r\n", items.len())?;
                for item in items {
                    item.encode(buf)?;
                }
            }
            RespValue::Null => write!(buf, "_\r\n")?,
        }
        Ok(())
    }

    /// Decode one complete value from the front of `buf`, consuming it.
    ///
    /// Returns `Ok(None)` and leaves `buf` untouched when the frame is not complete yet.
    pub fn decode(buf: &mut BytesMut) -> RespResult<Option<RespValue>> {
        match Self::parse(&buf[..])? {
            Some((value, used)) => {
                buf.advance(used);
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    fn parse(buf: &[u8]) -> RespResult<Option<(RespValue, usize)>> {
        let Some((line, mut used)) = read_line(buf) else {
            return Ok(None);
        };
        let Some((&kind, body)) = line.split_first() else {
            return Err(RespError::Protocol("Empty RESP line".to_string()));
        };

        let value = match kind {
            b'+' => RespValue::SimpleString(utf8(body)?),
            b'-' => RespValue::Error(utf8(body)?),
            b':' => RespValue::Integer(parse_int(body, "integer")?),
            b'_' => RespValue::Null,
            b'$' => {
                let len = parse_int(body, "bulk string length")?;
                if len < 0 {
                    RespValue::BulkString(None)
                } else {
                    let len = len as usize;
                    let rest = &buf[used..];
                    if rest.len() < len + 2 {
                        return Ok(None);
                    }
                    if &rest[len..len + 2] != b"\r\n" {
                        return Err(RespError::Protocol("Missing \\r\\n after bulk string".to_string()));
                    }
                    used += len + 2;
                    RespValue::BulkString(Some(rest[..len].to_vec()))
                }
            }
            b'*' => {
                let len = parse_int(body, "array length")?;
                if len < 0 {
                    RespValue::Array(None)
                } else {
                    let mut elements = Vec::with_capacity(len as usize);
                    for _ in 0..len {
                        match Self::parse(&buf[used..])? {
                            Some((val, n)) => {
                                used += n;
                                elements.push(val);
                            }
                            None => return Ok(None),
                        }
                    }
                    RespValue::Array(Some(elements))
                }
            }
            other => {
                return Err(RespError::Protocol(format!(
                    "Unknown RESP type: {}",
                    other as char
                )));
            }
        };

        Ok(Some((value, used)))
    }

    /// Text of a simple or bulk string.
    pub fn as_text(&self) -> Option<String> {
        match self {
            RespValue::SimpleString(s) => Some(s.clone()),
            RespValue::BulkString(Some(data)) => Some(String::from_utf8_lossy(data).into_owned()),
            _ => None,
        }
    }

    /// Elements of a non-null array.
    pub fn as_array(&self) -> RespResult<&[RespValue]> {
        match self {
            RespValue::Array(Some(arr)) => Ok(arr),
            _ => Err(RespError::Protocol("Expected array".to_string())),
        }
    }
}

/// Split off a CRLF-terminated line, returning it (without CRLF) and the bytes consumed.
fn read_line(buf: &[u8]) -> Option<(&[u8], usize)> {
    buf.windows(2)
        .position(|w| w == b"\r\n")
        .map(|pos| (&buf[..pos], pos + 2))
}

fn utf8(bytes: &[u8]) -> RespResult<String> {
    String::from_utf8(bytes.to_vec()).map_err(|e| RespError::InvalidEncoding(e.to_string()))
}

fn parse_int(bytes: &[u8], what: &str) -> RespResult<i64> {
    utf8(bytes)?
        .parse::<i64>()
        .map_err(|e| RespError::Protocol(format!("Invalid {what}: {e}")))
}
