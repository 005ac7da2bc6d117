//! Column reductions for [`crate::types::DataSet`].

use serde::{Deserialize, Serialize};

use crate::types::{DataSet, DataType, Value};

/// Built-in reduction operations over a single field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReduceOp {
    /// Count all rows (including nulls).
    Count,
    /// Sum numeric values, ignoring nulls.
    Sum,
    /// Arithmetic mean of numeric values, ignoring nulls.
    Mean,
    /// Minimum numeric value, ignoring nulls.
    Min,
    /// Maximum numeric value, ignoring nulls.
    Max,
    /// First non-null value in dataset order.
    First,
    /// Last non-null value in dataset order.
    Last,
}

/// Reduce a field using a built-in [`ReduceOp`].
///
/// - Returns `None` if `path` does not exist in the schema.
/// - `Count` always returns `Some(Value::Int64(row_count))`.
/// - Numeric ops return `Some(Value::Null)` if there are no non-null numeric values.
/// - `Sum`/`Min`/`Max`/`First`/`Last` are computed exactly in `i64` for integer fields and stay
///   `Int64`; a sum that overflows `i64` is reported as `Float64`. `Mean` is always `Float64`.
pub fn reduce(dataset: &DataSet, path: &str, op: ReduceOp) -> Option<Value> {
    let idx = dataset.schema.index_of(path)?;
    let data_type = dataset.schema.data_type_of(path)?;

    if op == ReduceOp::Count {
        return Some(Value::Int64(dataset.row_count() as i64));
    }
    if !data_type.is_numeric() {
        return Some(Value::Null);
    }

    if data_type == DataType::Int64 && op != ReduceOp::Mean {
        if let Some(ints) = int_cells(dataset, idx) {
            return Some(reduce_ints(&ints, op).unwrap_or_else(|| {
                // Overflowed i64.
                tracing::debug!(field = path, "integer sum overflowed; reporting Float64");
                Value::Float64(ints.iter().map(|&v| v as f64).sum())
            }));
        }
    }

    let values = dataset
        .rows
        .iter()
        .filter_map(|row| row.get(idx).and_then(Value::as_f64));
    let acc = match op {
        ReduceOp::Count => unreachable!("count handled above"),
        ReduceOp::Sum => fold_numeric(values, |a, v| a + v),
        ReduceOp::Min => fold_numeric(values, f64::min),
        ReduceOp::Max => fold_numeric(values, f64::max),
        ReduceOp::First => fold_numeric(values, |a, _| a),
        ReduceOp::Last => fold_numeric(values, |_, v| v),
        ReduceOp::Mean => {
            let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
            return Some(if n == 0 {
                Value::Null
            } else {
                Value::Float64(sum / n as f64)
            });
        }
    };

    Some(acc.map_or(Value::Null, Value::Float64))
}

/// Non-null cells of an integer column, or `None` if any of them is not an `Int64`.
fn int_cells(dataset: &DataSet, idx: usize) -> Option<Vec<i64>> {
    dataset
        .rows
        .iter()
        .filter_map(|row| row.get(idx).filter(|v| !v.is_null()))
        .map(|v| match v {
            Value::Int64(i) => Some(*i),
            _ => None,
        })
        .collect()
}

/// Exact integer reduction; `None` only when a sum overflows.
fn reduce_ints(ints: &[i64], op: ReduceOp) -> Option<Value> {
    let result = match op {
        ReduceOp::Sum => {
            if ints.is_empty() {
                return Some(Value::Null);
            }
            return ints.iter().try_fold(0i64, |acc, &v| acc.checked_add(v)).map(Value::Int64);
        }
        ReduceOp::Min => ints.iter().min().copied(),
        ReduceOp::Max => ints.iter().max().copied(),
        ReduceOp::First => ints.first().copied(),
        ReduceOp::Last => ints.last().copied(),
        ReduceOp::Count | ReduceOp::Mean => unreachable!("handled by the caller"),
    };
    Some(result.map_or(Value::Null, Value::Int64))
}

fn fold_numeric<I, F>(mut values: I, f: F) -> Option<f64>
where
    I: Iterator<Item = f64>,
    F: Fn(f64, f64) -> f64,
{
    let first = values.next()?;
    Some(values.fold(first, f))
}
