//! Derived summary metrics over a (filtered, pre-pagination) [`DataSet`].
//!
//! Every metric is an `f64`. Undefined results (empty dataset, unknown field, zero denominator
//! or zero starting value) yield `0.0`, so `NaN` and infinities
//! never reach a [`SummaryResult`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::processing::reduce::{reduce, ReduceOp};
use crate::types::{DataSet, Value};

/// Value reported for any metric that is mathematically undefined.
pub const SENTINEL: f64 = 0.0;

fn default_scale() -> f64 {
    1.0
}

/// A named metric to derive.
///
/// `Ratio` and `Difference` refer to metrics derived earlier in the same metric list by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum MetricSpec {
    Count { name: String },
    Sum { name: String, field: String },
    Average { name: String, field: String },
    Min { name: String, field: String },
    Max { name: String, field: String },
    First { name: String, field: String },
    Last { name: String, field: String },
    /// `(last - first) / first * 100` over the dataset order.
    GrowthRate { name: String, field: String },
    Constant { name: String, value: f64 },
    /// `numerator / denominator * scale`.
    Ratio {
        name: String,
        numerator: String,
        denominator: String,
        #[serde(default = "default_scale")]
        scale: f64,
    },
    Difference {
        name: String,
        minuend: String,
        subtrahend: String,
    },
}

impl MetricSpec {
    pub fn name(&self) -> &str {
        match self {
            Self::Count { name }
            | Self::Sum { name, .. }
            | Self::Average { name, .. }
            | Self::Min { name, .. }
            | Self::Max { name, .. }
            | Self::First { name, .. }
            | Self::Last { name, .. }
            | Self::GrowthRate { name, .. }
            | Self::Constant { name, .. }
            | Self::Ratio { name, .. }
            | Self::Difference { name, .. } => name,
        }
    }

    /// Names of earlier metrics this one depends on.
    pub fn references(&self) -> Vec<&str> {
        match self {
            Self::Ratio {
                numerator,
                denominator,
                ..
            } => vec![numerator, denominator],
            Self::Difference {
                minuend,
                subtrahend,
                ..
            } => vec![minuend, subtrahend],
            _ => Vec::new(),
        }
    }

    pub fn count(name: impl Into<String>) -> Self {
        Self::Count { name: name.into() }
    }

    pub fn sum(name: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Sum {
            name: name.into(),
            field: field.into(),
        }
    }

    pub fn average(name: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Average {
            name: name.into(),
            field: field.into(),
        }
    }

    pub fn min(name: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Min {
            name: name.into(),
            field: field.into(),
        }
    }

    pub fn max(name: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Max {
            name: name.into(),
            field: field.into(),
        }
    }

    pub fn first(name: impl Into<String>, field: impl Into<String>) -> Self {
        Self::First {
            name: name.into(),
            field: field.into(),
        }
    }

    pub fn last(name: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Last {
            name: name.into(),
            field: field.into(),
        }
    }

    pub fn growth_rate(name: impl Into<String>, field: impl Into<String>) -> Self {
        Self::GrowthRate {
            name: name.into(),
            field: field.into(),
        }
    }

    pub fn constant(name: impl Into<String>, value: f64) -> Self {
        Self::Constant {
            name: name.into(),
            value,
        }
    }

    pub fn ratio(
        name: impl Into<String>,
        numerator: impl Into<String>,
        denominator: impl Into<String>,
        scale: f64,
    ) -> Self {
        Self::Ratio {
            name: name.into(),
            numerator: numerator.into(),
            denominator: denominator.into(),
            scale,
        }
    }

    pub fn difference(
        name: impl Into<String>,
        minuend: impl Into<String>,
        subtrahend: impl Into<String>,
    ) -> Self {
        Self::Difference {
            name: name.into(),
            minuend: minuend.into(),
            subtrahend: subtrahend.into(),
        }
    }
}

/// Metric name → derived scalar. Rebuilt from scratch on every derivation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SummaryResult {
    metrics: BTreeMap<String, f64>,
}

impl SummaryResult {
    pub fn get(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).copied()
    }

    /// Metric value, or the sentinel if it was never derived.
    pub fn value(&self, name: &str) -> f64 {
        self.get(name).unwrap_or(SENTINEL)
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.metrics.iter().map(|(k, v)| (k.as_str(), *v))
    }

    fn insert(&mut self, name: &str, value: f64) {
        self.metrics.insert(name.to_owned(), finite_or_sentinel(value));
    }
}

fn finite_or_sentinel(v: f64) -> f64 {
    if v.is_finite() { v } else { SENTINEL }
}

fn reduce_f64(dataset: &DataSet, field: &str, op: ReduceOp) -> f64 {
    reduce(dataset, field, op)
        .as_ref()
        .and_then(Value::as_f64)
        .unwrap_or(SENTINEL)
}

/// Derive every metric in `specs`, in order, over `dataset`.
pub fn derive(dataset: &DataSet, specs: &[MetricSpec]) -> SummaryResult {
    let mut out = SummaryResult::default();
    for spec in specs {
        let value = match spec {
            MetricSpec::Count { .. } => dataset.row_count() as f64,
            MetricSpec::Sum { field, .. } => reduce_f64(dataset, field, ReduceOp::Sum),
            MetricSpec::Average { field, .. } => reduce_f64(dataset, field, ReduceOp::Mean),
            MetricSpec::Min { field, .. } => reduce_f64(dataset, field, ReduceOp::Min),
            MetricSpec::Max { field, .. } => reduce_f64(dataset, field, ReduceOp::Max),
            MetricSpec::First { field, .. } => reduce_f64(dataset, field, ReduceOp::First),
            MetricSpec::Last { field, .. } => reduce_f64(dataset, field, ReduceOp::Last),
            MetricSpec::GrowthRate { field, .. } => growth_rate(
                reduce_f64(dataset, field, ReduceOp::First),
                reduce_f64(dataset, field, ReduceOp::Last),
            ),
            MetricSpec::Constant { value, .. } => *value,
            MetricSpec::Ratio {
                numerator,
                denominator,
                scale,
                ..
            } => ratio(out.value(numerator), out.value(denominator)) * scale,
            MetricSpec::Difference {
                minuend,
                subtrahend,
                ..
            } => out.value(minuend) - out.value(subtrahend),
        };
        out.insert(spec.name(), value);
    }
    out
}

/// `numerator / denominator`, or the sentinel when the denominator is zero.
pub fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        SENTINEL
    } else {
        finite_or_sentinel(numerator / denominator)
    }
}

/// `value / total * 100`, or the sentinel when the total is zero.
pub fn percent_of_total(value: f64, total: f64) -> f64 {
    ratio(value, total) * 100.0
}

/// `(last - first) / first * 100`, or the sentinel when `first` is zero.
pub fn growth_rate(first: f64, last: f64) -> f64 {
    ratio(last - first, first) * 100.0
}

/// Each row's share of the field total, in percent. Null cells count as 0.
///
/// An unknown field or an empty dataset yields one sentinel per row (possibly none).
pub fn row_shares(dataset: &DataSet, field: &str) -> Vec<f64> {
    let Some(column) = dataset.numeric_column(field) else {
        return vec![SENTINEL; dataset.row_count()];
    };
    let total: f64 = column.iter().flatten().sum();
    column
        .iter()
        .map(|v| percent_of_total(v.unwrap_or(0.0), total))
        .collect()
}

/// Sum of each field and its share of the combined total, in percent (e.g. spend per model).
pub fn column_shares<S: AsRef<str>>(dataset: &DataSet, fields: &[S]) -> Vec<(String, f64, f64)> {
    let sums: Vec<(String, f64)> = fields
        .iter()
        .map(|f| {
            let f = f.as_ref();
            (f.to_owned(), reduce_f64(dataset, f, ReduceOp::Sum))
        })
        .collect();
    let total: f64 = sums.iter().map(|(_, s)| s).sum();
    sums.into_iter()
        .map(|(f, s)| {
            let share = percent_of_total(s, total);
            (f, s, share)
        })
        .collect()
}

/// Whole days until `remaining` runs out at `daily_usage`; `None` when usage is not positive.
pub fn days_until_depletion(remaining: f64, daily_usage: f64) -> Option<u64> {
    if daily_usage > 0.0 && remaining.is_finite() {
        Some((remaining.max(0.0) / daily_usage).round() as u64)
    } else {
        None
    }
}
