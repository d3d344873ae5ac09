//! Core data model types for ingestion.
//!
//! Source tables are read into a [`Table`] of header-keyed [`Record`]s. Each loader table declares
//! a [`Schema`] (a list of typed [`Field`]s) that says which columns a row must carry and which of
//! them are integers, and rows are projected into typed [`Value`]s before templating.

use std::fmt;
use std::sync::Arc;

/// Logical data type for a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    /// 64-bit signed integer, rendered unquoted.
    Int64,
    /// UTF-8 string, rendered as an escaped quoted literal.
    Utf8,
}

/// A single named, typed field in a [`Schema`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Column name in the source table (also the placeholder name in the query template).
    pub name: String,
    /// Field data type.
    pub data_type: DataType,
}

impl Field {
    /// Create a new field.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }

    /// Shorthand for a [`DataType::Utf8`] field.
    pub fn utf8(name: impl Into<String>) -> Self {
        Self::new(name, DataType::Utf8)
    }

    /// Shorthand for a [`DataType::Int64`] field.
    pub fn int64(name: impl Into<String>) -> Self {
        Self::new(name, DataType::Int64)
    }
}

/// A list of fields describing the columns a table must provide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    /// Ordered list of fields.
    pub fields: Vec<Field>,
}

impl Schema {
    /// Create a new schema from fields.
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// Iterate field names in order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Names of schema fields that are absent from `headers`, in schema order.
    pub fn missing_columns<'a>(&'a self, headers: &[String]) -> Vec<&'a str> {
        self.field_names()
            .filter(|name| !headers.iter().any(|h| h == name))
            .collect()
    }
}

/// A typed value bound to a query placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Integer, inserted unquoted.
    Int64(i64),
    /// String, inserted as an escaped double-quoted literal.
    Utf8(String),
    /// List of strings, flattened to a single comma-joined string literal.
    List(Vec<String>),
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Utf8(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Utf8(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int64(i)
    }
}

impl From<Vec<String>> for Value {
    fn from(items: Vec<String>) -> Self {
        Value::List(items)
    }
}

/// One data row of a source table, keyed by the table's header.
///
/// Field order follows the header. Rows shorter than the header simply lack the trailing fields;
/// [`Record::get`] returns `None` for them.
#[derive(Clone, PartialEq, Eq)]
pub struct Record {
    headers: Arc<[String]>,
    values: Vec<String>,
}

impl Record {
    /// Create a record from a shared header and the row's values.
    pub fn new(headers: Arc<[String]>, values: Vec<String>) -> Self {
        Self { headers, values }
    }

    /// Value of the named field, if the header has it and the row reaches that column.
    pub fn get(&self, name: &str) -> Option<&str> {
        let idx = self.headers.iter().position(|h| h == name)?;
        self.values.get(idx).map(String::as_str)
    }

    /// Iterate `(field, value)` pairs in header order, stopping at the last present value.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers
            .iter()
            .zip(self.values.iter())
            .map(|(h, v)| (h.as_str(), v.as_str()))
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

/// An ordered sequence of records read from one source table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    /// Header row (byte-order mark already stripped).
    pub headers: Arc<[String]>,
    /// Data rows in source order.
    pub records: Vec<Record>,
}

impl Table {
    /// Create a table from a header and records.
    pub fn new(headers: Arc<[String]>, records: Vec<Record>) -> Self {
        Self { headers, records }
    }

    /// A table with no header and no rows.
    pub fn empty() -> Self {
        Self {
            headers: Arc::from(Vec::<String>::new()),
            records: Vec::new(),
        }
    }

    /// Number of data rows.
    pub fn row_count(&self) -> usize {
        self.records.len()
    }
}
