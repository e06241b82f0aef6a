//! Database collaborator used by scenario builds.
//!
//! The builder only needs to enumerate tables, clear them, and read them back;
//! setup procedures additionally execute SQL and insert rows. Backends speak
//! `anyhow` so driver errors keep their context.
pub mod sqlite;

use anyhow::Result;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

pub use sqlite::SqliteDatabase;

/// Single column value as read from a table.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl ColumnValue {
    /// Render scalar values as text for name inference.
    pub fn as_name_source(&self) -> Option<String> {
        match self {
            ColumnValue::Text(text) => Some(text.clone()),
            ColumnValue::Integer(value) => Some(value.to_string()),
            ColumnValue::Real(value) => Some(value.to_string()),
            ColumnValue::Null | ColumnValue::Blob(_) => None,
        }
    }

    /// Interpret the value as a primary key.
    pub fn as_id(&self) -> Option<i64> {
        match self {
            ColumnValue::Integer(value) => Some(*value),
            ColumnValue::Text(text) => text.trim().parse().ok(),
            _ => None,
        }
    }
}

impl From<i64> for ColumnValue {
    fn from(value: i64) -> Self {
        ColumnValue::Integer(value)
    }
}

impl From<f64> for ColumnValue {
    fn from(value: f64) -> Self {
        ColumnValue::Real(value)
    }
}

impl From<&str> for ColumnValue {
    fn from(value: &str) -> Self {
        ColumnValue::Text(value.to_string())
    }
}

impl From<String> for ColumnValue {
    fn from(value: String) -> Self {
        ColumnValue::Text(value)
    }
}

impl<T: Into<ColumnValue>> From<Option<T>> for ColumnValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(ColumnValue::Null)
    }
}

impl Serialize for ColumnValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ColumnValue::Null => serializer.serialize_unit(),
            ColumnValue::Integer(value) => serializer.serialize_i64(*value),
            ColumnValue::Real(value) => serializer.serialize_f64(*value),
            ColumnValue::Text(text) => serializer.serialize_str(text),
            ColumnValue::Blob(bytes) => {
                let hex: String = bytes.iter().map(|byte| format!("{byte:02x}")).collect();
                serializer.serialize_str(&hex)
            }
        }
    }
}

/// A selected row: column name to value, in select order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    columns: Vec<(String, ColumnValue)>,
}

impl Row {
    pub fn new(columns: Vec<(String, ColumnValue)>) -> Self {
        Self { columns }
    }

    pub fn get(&self, column: &str) -> Option<&ColumnValue> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Primary key from the `id` column, when present and numeric.
    pub fn id(&self) -> Option<i64> {
        self.get("id").and_then(ColumnValue::as_id)
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &ColumnValue)> {
        self.columns
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (name, value) in &self.columns {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Anything that identifies a database row by table and primary key.
pub trait FixtureRecord {
    fn table_name(&self) -> &str;
    fn record_id(&self) -> i64;
}

/// Handle to a row inserted during setup.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordRef {
    pub table: String,
    pub id: i64,
}

impl RecordRef {
    pub fn new(table: impl Into<String>, id: i64) -> Self {
        Self {
            table: table.into(),
            id,
        }
    }
}

impl FixtureRecord for RecordRef {
    fn table_name(&self) -> &str {
        &self.table
    }

    fn record_id(&self) -> i64 {
        self.id
    }
}

impl<R: FixtureRecord + ?Sized> FixtureRecord for &R {
    fn table_name(&self) -> &str {
        (**self).table_name()
    }

    fn record_id(&self) -> i64 {
        (**self).record_id()
    }
}

/// Operations a scenario build performs against a live database.
pub trait Database {
    /// All table names, in a stable order.
    fn table_names(&mut self) -> Result<Vec<String>>;

    /// Delete every row of `table`.
    fn delete_all(&mut self, table: &str) -> Result<()>;

    /// Select every row of `table`, in storage order.
    fn select_all(&mut self, table: &str) -> Result<Vec<Row>>;

    /// Execute one or more SQL statements.
    fn execute_batch(&mut self, sql: &str) -> Result<()>;

    /// Insert a row and return a handle keyed by its primary key.
    fn insert(&mut self, table: &str, values: &[(&str, ColumnValue)]) -> Result<RecordRef>;
}
