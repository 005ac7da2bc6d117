//! Criteria-driven row filtering for [`crate::types::DataSet`].
//!
//! A [`FilterCriteria`] is a set of named [`Criterion`]s combined with logical AND. Builders
//! that take raw form input (`"all"`, empty strings, unparseable numbers) drop the constraint
//! instead of failing, so a screen can pass its input state straight through.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};

use crate::types::{parse_timestamp, DataSet, DataType, Schema, Value};

/// Sentinel used by select inputs to mean "no constraint on this field".
pub const ALL: &str = "all";

/// An auxiliary computed predicate evaluated against a whole row.
pub type RowPredicate = Arc<dyn Fn(&Schema, &[Value]) -> bool + Send + Sync>;

/// One side of an inclusive [`Criterion::Range`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RangeBound {
    Number(f64),
    Instant(DateTime<Utc>),
}

impl RangeBound {
    /// Parse a lower bound for a field of `data_type`.
    pub fn parse_lower(raw: &str, data_type: DataType) -> Option<Self> {
        parse_bound(raw, data_type, false)
    }

    /// Parse an upper bound; a date-only timestamp bound covers the whole day.
    pub fn parse_upper(raw: &str, data_type: DataType) -> Option<Self> {
        parse_bound(raw, data_type, true)
    }

    fn allows_at_least(&self, v: &Value) -> bool {
        match (self, v) {
            (Self::Instant(b), Value::Timestamp(t)) => t >= b,
            (Self::Number(b), v) => v.as_f64().is_some_and(|x| x >= *b),
            _ => false,
        }
    }

    fn allows_at_most(&self, v: &Value) -> bool {
        match (self, v) {
            (Self::Instant(b), Value::Timestamp(t)) => t <= b,
            (Self::Number(b), v) => v.as_f64().is_some_and(|x| x <= *b),
            _ => false,
        }
    }
}

fn parse_bound(raw: &str, data_type: DataType, upper: bool) -> Option<RangeBound> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match data_type {
        DataType::Int64 | DataType::Float64 => raw
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(RangeBound::Number),
        DataType::Timestamp => {
            if upper {
                if let Ok(day) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
                    return day
                        .and_hms_opt(23, 59, 59)
                        .map(|t| RangeBound::Instant(t.and_utc()));
                }
            }
            parse_timestamp(raw).map(RangeBound::Instant)
        }
        DataType::Bool | DataType::Utf8 => None,
    }
}

/// A single constraint on a record.
#[derive(Clone)]
pub enum Criterion {
    /// Exact match; strings compare case-sensitively, numbers by value.
    Equals { field: String, value: Value },
    /// Case-insensitive substring match against any of `fields`.
    Search { fields: Vec<String>, term: String },
    /// Inclusive range; either bound may be absent.
    Range {
        field: String,
        min: Option<RangeBound>,
        max: Option<RangeBound>,
    },
    /// Computed predicate (e.g. "has trigger words").
    Flag { name: String, predicate: RowPredicate },
}

impl Criterion {
    pub fn equals(field: impl Into<String>, value: Value) -> Self {
        Self::Equals {
            field: field.into(),
            value,
        }
    }

    pub fn search<I, S>(fields: I, term: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Search {
            fields: fields.into_iter().map(Into::into).collect(),
            term: term.into(),
        }
    }

    /// Numeric range with optional inclusive bounds.
    pub fn between(field: impl Into<String>, min: Option<f64>, max: Option<f64>) -> Self {
        Self::Range {
            field: field.into(),
            min: min.map(RangeBound::Number),
            max: max.map(RangeBound::Number),
        }
    }

    /// Timestamp range with optional inclusive bounds.
    pub fn during(
        field: impl Into<String>,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Self {
        Self::Range {
            field: field.into(),
            min: start.map(RangeBound::Instant),
            max: end.map(RangeBound::Instant),
        }
    }

    pub fn flag<F>(name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&Schema, &[Value]) -> bool + Send + Sync + 'static,
    {
        Self::Flag {
            name: name.into(),
            predicate: Arc::new(predicate),
        }
    }

    /// Whether the criterion constrains anything at all.
    pub fn is_active(&self) -> bool {
        match self {
            Self::Equals { value, .. } => !value.is_null(),
            Self::Search { fields, term } => !fields.is_empty() && !term.trim().is_empty(),
            Self::Range { min, max, .. } => min.is_some() || max.is_some(),
            Self::Flag { .. } => true,
        }
    }
}

impl fmt::Debug for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equals { field, value } => f
                .debug_struct("Equals")
                .field("field", field)
                .field("value", value)
                .finish(),
            Self::Search { fields, term } => f
                .debug_struct("Search")
                .field("fields", fields)
                .field("term", term)
                .finish(),
            Self::Range { field, min, max } => f
                .debug_struct("Range")
                .field("field", field)
                .field("min", min)
                .field("max", max)
                .finish(),
            Self::Flag { name, .. } => f.debug_struct("Flag").field("name", name).finish(),
        }
    }
}

/// A keyed set of criteria, combined with logical AND.
///
/// Keys make it possible to replace one screen control's constraint without touching the
/// others: equality uses `eq:<field>`, ranges `range:<field>`, search `search`, and flags their
/// own name.
#[derive(Debug, Clone, Default)]
pub struct FilterCriteria {
    criteria: BTreeMap<String, Criterion>,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` when no active criterion is present (filtering is the identity).
    pub fn is_empty(&self) -> bool {
        !self.criteria.values().any(Criterion::is_active)
    }

    /// Number of active criteria.
    pub fn len(&self) -> usize {
        self.criteria.values().filter(|c| c.is_active()).count()
    }

    pub fn get(&self, key: &str) -> Option<&Criterion> {
        self.criteria.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Criterion)> {
        self.criteria.iter().map(|(k, c)| (k.as_str(), c))
    }

    /// Insert or replace a criterion under `key`.
    pub fn set(&mut self, key: impl Into<String>, criterion: Criterion) -> &mut Self {
        self.criteria.insert(key.into(), criterion);
        self
    }

    /// Builder form of [`Self::set`].
    pub fn with(mut self, key: impl Into<String>, criterion: Criterion) -> Self {
        self.set(key, criterion);
        self
    }

    pub fn remove(&mut self, key: &str) -> Option<Criterion> {
        self.criteria.remove(key)
    }

    pub fn clear(&mut self) {
        self.criteria.clear();
    }

    /// Exact-match constraint from a select input.
    ///
    /// `"all"`, blank input, an unknown field, or a value that does not parse as the field's type
    /// removes the constraint.
    pub fn equals_input(&mut self, schema: &Schema, field: &str, raw: &str) -> &mut Self {
        let key = format!("eq:{field}");
        if raw.trim().is_empty() || raw == ALL {
            self.criteria.remove(&key);
            return self;
        }
        let parsed = schema
            .data_type_of(field)
            .and_then(|dt| Value::parse_as(raw, dt));
        match parsed {
            Some(value) => {
                self.criteria.insert(key, Criterion::equals(field, value));
            }
            None => {
                tracing::debug!(field, raw, "ignoring unparseable equality filter");
                self.criteria.remove(&key);
            }
        }
        self
    }

    /// Range constraint from min/max text inputs; each malformed bound is dropped on its own.
    pub fn range_input(
        &mut self,
        schema: &Schema,
        field: &str,
        min_raw: &str,
        max_raw: &str,
    ) -> &mut Self {
        let key = format!("range:{field}");
        let Some(dt) = schema.data_type_of(field) else {
            tracing::debug!(field, "ignoring range filter on unknown field");
            self.criteria.remove(&key);
            return self;
        };
        let min = RangeBound::parse_lower(min_raw, dt);
        let max = RangeBound::parse_upper(max_raw, dt);
        if min.is_none() && !min_raw.trim().is_empty() {
            tracing::debug!(field, raw = min_raw, "ignoring malformed lower bound");
        }
        if max.is_none() && !max_raw.trim().is_empty() {
            tracing::debug!(field, raw = max_raw, "ignoring malformed upper bound");
        }
        if min.is_none() && max.is_none() {
            self.criteria.remove(&key);
        } else {
            self.criteria.insert(
                key,
                Criterion::Range {
                    field: field.to_owned(),
                    min,
                    max,
                },
            );
        }
        self
    }

    /// Free-text search over `fields`; an empty term removes it.
    pub fn search<S: AsRef<str>>(&mut self, fields: &[S], term: &str) -> &mut Self {
        if term.trim().is_empty() || fields.is_empty() {
            self.criteria.remove("search");
        } else {
            self.criteria.insert(
                "search".to_owned(),
                Criterion::search(fields.iter().map(|f| f.as_ref().to_owned()), term.trim()),
            );
        }
        self
    }

    /// Toggle a computed boolean flag; a disabled flag imposes no constraint.
    pub fn flag(&mut self, name: &str, enabled: bool, predicate: RowPredicate) -> &mut Self {
        if enabled {
            self.criteria.insert(
                name.to_owned(),
                Criterion::Flag {
                    name: name.to_owned(),
                    predicate,
                },
            );
        } else {
            self.criteria.remove(name);
        }
        self
    }
}

enum Compiled<'a> {
    /// The referenced field does not exist, so no record can satisfy the criterion.
    Never,
    Equals { idx: usize, value: &'a Value },
    Search { idxs: Vec<usize>, needle: String },
    Range {
        idx: usize,
        min: Option<RangeBound>,
        max: Option<RangeBound>,
    },
    Flag(&'a RowPredicate),
}

/// Criteria resolved against one schema, ready to test rows.
pub struct RowMatcher<'a> {
    schema: &'a Schema,
    compiled: Vec<Compiled<'a>>,
}

impl<'a> RowMatcher<'a> {
    pub fn new(criteria: &'a FilterCriteria, schema: &'a Schema) -> Self {
        let compiled = criteria
            .criteria
            .values()
            .filter(|c| c.is_active())
            .map(|c| compile(c, schema))
            .collect();
        Self { schema, compiled }
    }

    /// `true` if the matcher has nothing to check.
    pub fn is_noop(&self) -> bool {
        self.compiled.is_empty()
    }

    pub fn matches(&self, row: &[Value]) -> bool {
        self.compiled.iter().all(|c| match c {
            Compiled::Never => false,
            Compiled::Equals { idx, value } => row.get(*idx).is_some_and(|v| values_equal(v, value)),
            Compiled::Search { idxs, needle } => idxs.iter().any(|idx| {
                row.get(*idx)
                    .and_then(Value::as_str)
                    .is_some_and(|s| s.to_lowercase().contains(needle.as_str()))
            }),
            Compiled::Range { idx, min, max } => match row.get(*idx) {
                None | Some(Value::Null) => false,
                Some(v) => {
                    min.as_ref().is_none_or(|b| b.allows_at_least(v))
                        && max.as_ref().is_none_or(|b| b.allows_at_most(v))
                }
            },
            Compiled::Flag(predicate) => predicate(self.schema, row),
        })
    }
}

fn compile<'a>(criterion: &'a Criterion, schema: &Schema) -> Compiled<'a> {
    match criterion {
        Criterion::Equals { field, value } => match schema.index_of(field) {
            Some(idx) => Compiled::Equals { idx, value },
            None => Compiled::Never,
        },
        Criterion::Search { fields, term } => {
            let idxs: Vec<usize> = fields.iter().filter_map(|f| schema.index_of(f)).collect();
            if idxs.is_empty() {
                Compiled::Never
            } else {
                Compiled::Search {
                    idxs,
                    needle: term.trim().to_lowercase(),
                }
            }
        }
        Criterion::Range { field, min, max } => match schema.index_of(field) {
            Some(idx) => Compiled::Range {
                idx,
                min: *min,
                max: *max,
            },
            None => Compiled::Never,
        },
        Criterion::Flag { predicate, .. } => Compiled::Flag(predicate),
    }
}

fn values_equal(actual: &Value, expected: &Value) -> bool {
    match (actual.as_f64(), expected.as_f64()) {
        (Some(a), Some(b)) => a == b,
        _ => actual == expected,
    }
}

/// Returns a new [`DataSet`] containing only rows that satisfy every active criterion.
///
/// With no active criteria the dataset is returned unchanged. The input is never mutated.
pub fn filter(dataset: &DataSet, criteria: &FilterCriteria) -> DataSet {
    let matcher = RowMatcher::new(criteria, &dataset.schema);
    if matcher.is_noop() {
        return dataset.clone();
    }
    dataset.filter_rows(|row| matcher.matches(row))
}
