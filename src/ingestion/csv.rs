//! CSV readers for screen exports.
//!
//! The first line is the header. Columns are matched to schema fields by exact name (dotted
//! names such as `metrics.likes` included), so column order does not matter and extra columns
//! are ignored. Empty cells and absent nullable columns ingest as [`Value::Null`].

use std::path::Path;

use crate::error::{IngestionError, IngestionResult};
use crate::types::{parse_bool, parse_timestamp, DataSet, DataType, Schema, Value};

pub fn ingest_csv_from_path(path: impl AsRef<Path>, schema: &Schema) -> IngestionResult<DataSet> {
    let mut rdr = reader_builder().from_path(path)?;
    ingest_csv_from_reader(&mut rdr, schema)
}

pub fn ingest_csv_from_str(input: &str, schema: &Schema) -> IngestionResult<DataSet> {
    let mut rdr = reader_builder().from_reader(input.as_bytes());
    ingest_csv_from_reader(&mut rdr, schema)
}

/// Read every record from an already configured reader; it must yield headers.
pub fn ingest_csv_from_reader<R: std::io::Read>(
    rdr: &mut csv::Reader<R>,
    schema: &Schema,
) -> IngestionResult<DataSet> {
    let columns = ColumnMap::resolve(rdr.headers()?, schema)?;

    let mut rows: Vec<Vec<Value>> = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        // 1-based, and the header is row 1.
        let line = i + 2;
        let row = schema
            .fields
            .iter()
            .zip(&columns.positions)
            .map(|(field, pos)| {
                let raw = pos.and_then(|p| record.get(p)).unwrap_or("");
                parse_cell(line, &field.name, field.data_type, raw)
            })
            .collect::<IngestionResult<Vec<Value>>>()?;
        rows.push(row);
    }

    tracing::debug!(rows = rows.len(), fields = schema.fields.len(), "ingested csv");
    Ok(DataSet::new(schema.clone(), rows))
}

fn reader_builder() -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder.has_headers(true).trim(csv::Trim::Headers);
    builder
}

/// Header position of each schema field, in schema order.
struct ColumnMap {
    positions: Vec<Option<usize>>,
}

impl ColumnMap {
    fn resolve(headers: &csv::StringRecord, schema: &Schema) -> IngestionResult<Self> {
        let positions: Vec<Option<usize>> = schema
            .fields
            .iter()
            .map(|field| headers.iter().position(|h| h == field.name))
            .collect();

        let missing: Vec<String> = schema
            .fields
            .iter()
            .zip(&positions)
            .filter(|(field, pos)| pos.is_none() && !field.nullable)
            .map(|(field, _)| format!("missing required column '{}'", field.name))
            .collect();
        if !missing.is_empty() {
            return Err(IngestionError::SchemaMismatch {
                message: format!(
                    "{}. headers={:?}",
                    missing.join(", "),
                    headers.iter().collect::<Vec<_>>()
                ),
            });
        }
        Ok(Self { positions })
    }
}

fn parse_cell(row: usize, column: &str, data_type: DataType, raw: &str) -> IngestionResult<Value> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Value::Null);
    }

    let parse_error = |message: String| IngestionError::ParseError {
        row,
        column: column.to_owned(),
        raw: raw.to_owned(),
        message,
    };
    match data_type {
        DataType::Utf8 => Ok(Value::Utf8(trimmed.to_owned())),
        DataType::Int64 => trimmed
            .parse::<i64>()
            .map(Value::Int64)
            .map_err(|e| parse_error(e.to_string())),
        DataType::Float64 => match trimmed.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(Value::Float64(v)),
            Ok(_) => Err(parse_error("expected a finite number".to_string())),
            Err(e) => Err(parse_error(e.to_string())),
        },
        DataType::Bool => parse_bool(trimmed)
            .map(Value::Bool)
            .ok_or_else(|| parse_error("expected bool (true/false/1/0/yes/no)".to_string())),
        DataType::Timestamp => parse_timestamp(trimmed)
            .map(Value::Timestamp)
            .ok_or_else(|| parse_error("expected ISO-8601 date or date-time".to_string())),
    }
}
