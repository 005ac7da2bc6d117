//! Core data model types shared by ingestion and the list pipeline.
//!
//! Every dashboard screen works on an in-memory [`DataSet`]: an ordered list of records that all
//! follow one [`Schema`]. Nested record fields (for example a story's `metrics.likes`) are
//! flattened into dotted field names, so a dotted path is just a field name in the schema.

use std::fmt;
use std::ops::Range;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Logical data type for a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    /// 64-bit signed integer.
    Int64,
    /// 64-bit floating point number.
    Float64,
    /// Boolean.
    Bool,
    /// UTF-8 string.
    Utf8,
    /// Point in time, stored in UTC.
    Timestamp,
}

impl DataType {
    /// Returns `true` for `Int64` and `Float64`.
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Int64 | Self::Float64)
    }
}

/// A single named, typed field in a [`Schema`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    /// Field name; nested fields use dot paths (e.g. `metrics.likes`).
    pub name: String,
    /// Field data type.
    pub data_type: DataType,
    /// Whether the field may be absent from an input record (ingested as [`Value::Null`]).
    pub nullable: bool,
}

impl Field {
    /// Create a new required field.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            nullable: false,
        }
    }

    /// Mark the field as optional on input.
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }
}

/// A list of fields describing the shape of every record in a [`DataSet`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
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

    /// Returns the index of a field by name or dotted path, if present.
    pub fn index_of(&self, path: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == path)
    }

    /// Returns the declared type of a field by name or dotted path.
    pub fn data_type_of(&self, path: &str) -> Option<DataType> {
        self.fields
            .iter()
            .find(|f| f.name == path)
            .map(|f| f.data_type)
    }
}

/// A single typed value in a [`DataSet`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Missing/empty value.
    Null,
    /// 64-bit signed integer.
    Int64(i64),
    /// 64-bit float.
    Float64(f64),
    /// Boolean.
    Bool(bool),
    /// UTF-8 string.
    Utf8(String),
    /// UTC timestamp.
    Timestamp(DateTime<Utc>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Numeric view of the value; integers are widened to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int64(v) => Some(*v as f64),
            Self::Float64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Utf8(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Timestamp(t) => Some(*t),
            _ => None,
        }
    }

    /// Parse user input into a value of `data_type`.
    ///
    /// Returns `None` when the input is blank or does not parse; callers treat that as
    /// "no constraint" rather than an error.
    pub fn parse_as(raw: &str, data_type: DataType) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        match data_type {
            DataType::Utf8 => Some(Self::Utf8(trimmed.to_owned())),
            DataType::Int64 => trimmed.parse::<i64>().ok().map(Self::Int64),
            DataType::Float64 => trimmed
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(Self::Float64),
            DataType::Bool => parse_bool(trimmed).map(Self::Bool),
            DataType::Timestamp => parse_timestamp(trimmed).map(Self::Timestamp),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str(""),
            Self::Int64(v) => write!(f, "{v}"),
            Self::Float64(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Utf8(s) => f.write_str(s),
            Self::Timestamp(t) => write!(f, "{}", t.to_rfc3339()),
        }
    }
}

/// Parse a boolean the way dashboard form inputs and CSV exports spell them.
pub fn parse_bool(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "t" | "1" | "yes" | "y" => Some(true),
        "false" | "f" | "0" | "no" | "n" => Some(false),
        _ => None,
    }
}

/// Parse an ISO-8601 timestamp.
///
/// Accepts RFC 3339 (`2025-08-11T15:30:00Z`), a naive date-time (`2025-08-11T15:30:00`, read as
/// UTC) and a plain date (`2023-07-10`, midnight UTC).
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Some(t.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(t) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(t.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|t| t.and_utc())
}

/// In-memory tabular dataset.
///
/// Rows are stored as `Vec<Vec<Value>>` in the same order as the [`Schema`] fields. Row order is
/// the dataset's natural order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataSet {
    /// Schema describing row shape.
    pub schema: Schema,
    /// Row-major value storage.
    pub rows: Vec<Vec<Value>>,
}

impl DataSet {
    /// Create a dataset from schema and rows.
    pub fn new(schema: Schema, rows: Vec<Vec<Value>>) -> Self {
        Self { schema, rows }
    }

    /// An empty dataset sharing `schema`.
    pub fn empty(schema: Schema) -> Self {
        Self {
            schema,
            rows: Vec::new(),
        }
    }

    /// Number of rows in the dataset.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Value at `row` for the field at dotted `path`.
    ///
    /// Returns `None` if the row or path does not exist.
    pub fn value(&self, row: usize, path: &str) -> Option<&Value> {
        let idx = self.schema.index_of(path)?;
        self.rows.get(row)?.get(idx)
    }

    /// Numeric projection of a field; non-numeric and null cells become `None`.
    ///
    /// Returns `None` if the path is not in the schema.
    pub fn numeric_column(&self, path: &str) -> Option<Vec<Option<f64>>> {
        let idx = self.schema.index_of(path)?;
        Some(
            self.rows
                .iter()
                .map(|row| row.get(idx).and_then(Value::as_f64))
                .collect(),
        )
    }

    /// Create a new dataset containing only rows that match `predicate`.
    ///
    /// The returned dataset preserves the original schema and row order.
    pub fn filter_rows<F>(&self, mut predicate: F) -> Self
    where
        F: FnMut(&[Value]) -> bool,
    {
        let rows = self
            .rows
            .iter()
            .filter(|row| predicate(row.as_slice()))
            .cloned()
            .collect();
        Self {
            schema: self.schema.clone(),
            rows,
        }
    }

    /// Copy of the rows in `range`, clamped to the dataset bounds.
    pub fn slice_rows(&self, range: Range<usize>) -> Self {
        let end = range.end.min(self.rows.len());
        let start = range.start.min(end);
        Self {
            schema: self.schema.clone(),
            rows: self.rows[start..end].to_vec(),
        }
    }

    /// Reduce (fold) all rows into an accumulator value.
    ///
    /// This is similar to `Iterator::fold`, but provides each row as `&[Value]`.
    pub fn reduce_rows<A, F>(&self, init: A, mut reducer: F) -> A
    where
        F: FnMut(A, &[Value]) -> A,
    {
        self.rows
            .iter()
            .fold(init, |acc, row| reducer(acc, row.as_slice()))
    }
}
