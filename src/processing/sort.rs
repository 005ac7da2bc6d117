//! Stable, type-aware ordering for [`crate::types::DataSet`].
//!
//! Comparison follows the field's declared [`DataType`]: numbers by value, timestamps by instant,
//! strings lexicographically (byte order), booleans `false < true`. Nulls always sort last.
//! Descending order reverses the comparator, never the output, so equal keys keep their original
//! relative order in both directions.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{DataSet, DataType, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[serde(alias = "asc")]
    Ascending,
    #[serde(alias = "desc")]
    Descending,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }
}

/// Field + direction describing the desired order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }

    pub fn ascending(field: impl Into<String>) -> Self {
        Self::new(field, SortDirection::Ascending)
    }

    pub fn descending(field: impl Into<String>) -> Self {
        Self::new(field, SortDirection::Descending)
    }
}

/// Compare two cells of a field declared as `data_type`, ascending, nulls last.
pub fn compare_values(data_type: DataType, a: &Value, b: &Value) -> Ordering {
    match (a.is_null(), b.is_null()) {
        (true, true) => return Ordering::Equal,
        (true, false) => return Ordering::Greater,
        (false, true) => return Ordering::Less,
        (false, false) => {}
    }
    match data_type {
        DataType::Int64 | DataType::Float64 => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
        DataType::Timestamp => match (a.as_timestamp(), b.as_timestamp()) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
        DataType::Utf8 => match (a.as_str(), b.as_str()) {
            (Some(x), Some(y)) => x.cmp(y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
        DataType::Bool => match (a, b) {
            (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
            _ => Ordering::Equal,
        },
    }
}

static MISSING: Value = Value::Null;

/// Row comparator for `spec` against a resolved column, honoring direction and nulls-last.
/// A row too short to hold the column compares as null.
pub(crate) fn row_comparator(
    idx: usize,
    data_type: DataType,
    direction: SortDirection,
) -> impl Fn(&Vec<Value>, &Vec<Value>) -> Ordering + Send + Sync {
    move |a, b| {
        let x = a.get(idx).unwrap_or(&MISSING);
        let y = b.get(idx).unwrap_or(&MISSING);
        // Nulls stay last regardless of direction.
        if x.is_null() || y.is_null() {
            return compare_values(data_type, x, y);
        }
        let ord = compare_values(data_type, x, y);
        match direction {
            SortDirection::Ascending => ord,
            SortDirection::Descending => ord.reverse(),
        }
    }
}

/// Returns a new [`DataSet`] ordered by `spec`.
///
/// Sorting by a field the schema does not declare leaves the natural order untouched.
pub fn sort(dataset: &DataSet, spec: &SortSpec) -> DataSet {
    let (Some(idx), Some(data_type)) = (
        dataset.schema.index_of(&spec.field),
        dataset.schema.data_type_of(&spec.field),
    ) else {
        tracing::debug!(field = %spec.field, "sort field not in schema; keeping natural order");
        return dataset.clone();
    };
    let mut rows = dataset.rows.clone();
    rows.sort_by(row_comparator(idx, data_type, spec.direction));
    DataSet::new(dataset.schema.clone(), rows)
}

/// Declared first-click direction per field for one screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortDefaults {
    /// Direction used for fields without an explicit entry.
    pub fallback: SortDirection,
    /// Per-field first-click direction.
    #[serde(default)]
    pub fields: BTreeMap<String, SortDirection>,
}

impl SortDefaults {
    pub fn new(fallback: SortDirection) -> Self {
        Self {
            fallback,
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.fields.insert(field.into(), direction);
        self
    }

    pub fn direction_for(&self, field: &str) -> SortDirection {
        self.fields.get(field).copied().unwrap_or(self.fallback)
    }
}

impl Default for SortDefaults {
    fn default() -> Self {
        Self::new(SortDirection::Ascending)
    }
}

/// Column-header sort state for one screen.
///
/// Selecting the active field flips its direction; selecting another field starts at that
/// field's declared default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortState {
    current: Option<SortSpec>,
    defaults: SortDefaults,
}

impl SortState {
    pub fn new(defaults: SortDefaults) -> Self {
        Self {
            current: None,
            defaults,
        }
    }

    pub fn with_initial(mut self, spec: SortSpec) -> Self {
        self.current = Some(spec);
        self
    }

    pub fn current(&self) -> Option<&SortSpec> {
        self.current.as_ref()
    }

    pub fn defaults(&self) -> &SortDefaults {
        &self.defaults
    }

    /// Apply a header click on `field` and return the resulting spec.
    pub fn toggle(&mut self, field: &str) -> &SortSpec {
        let direction = match &self.current {
            Some(spec) if spec.field == field => spec.direction.flipped(),
            _ => self.defaults.direction_for(field),
        };
        self.current.insert(SortSpec::new(field, direction))
    }

    /// Set the sort explicitly.
    pub fn set(&mut self, spec: SortSpec) {
        self.current = Some(spec);
    }

    /// Back to natural order.
    pub fn clear(&mut self) {
        self.current = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DataType, Field, Schema, Value};

    fn genres() -> DataSet {
        let schema = Schema::new(vec![
            Field::new("name", DataType::Utf8),
            Field::new("totalReads", DataType::Int64),
            Field::new("avgEngagement", DataType::Float64),
            Field::new("updatedAt", DataType::Timestamp),
        ]);
        let row = |name: &str, reads: Option<i64>, eng: f64, at: &str| {
            vec![
                Value::Utf8(name.to_string()),
                reads.map(Value::Int64).unwrap_or(Value::Null),
                Value::Float64(eng),
                Value::parse_as(at, DataType::Timestamp).unwrap(),
            ]
        };
        DataSet::new(
            schema,
            vec![
                row("Fantasy", Some(12500), 0.78, "2023-07-02"),
                row("Adventure", Some(9800), 0.72, "2023-06-15"),
                row("Mystery", None, 0.65, "2023-07-20"),
                row("Bedtime", Some(9800), 0.81, "2023-05-01"),
                row("Science", Some(4300), 0.65, "2023-07-11"),
            ],
        )
    }

    fn names(ds: &DataSet) -> Vec<&str> {
        ds.rows.iter().filter_map(|r| r[0].as_str()).collect()
    }

    #[test]
    fn numeric_sort_keeps_ties_stable_and_nulls_last() {
        let ds = genres();
        let asc = sort(&ds, &SortSpec::ascending("totalReads"));
        assert_eq!(names(&asc), vec!["Science", "Adventure", "Bedtime", "Fantasy", "Mystery"]);

        let desc = sort(&ds, &SortSpec::descending("totalReads"));
        assert_eq!(names(&desc), vec!["Fantasy", "Adventure", "Bedtime", "Science", "Mystery"]);
    }

    #[test]
    fn strings_and_timestamps_use_their_own_ordering() {
        let ds = genres();
        assert_eq!(
            names(&sort(&ds, &SortSpec::ascending("name"))),
            vec!["Adventure", "Bedtime", "Fantasy", "Mystery", "Science"]
        );
        assert_eq!(
            names(&sort(&ds, &SortSpec::descending("updatedAt"))),
            vec!["Mystery", "Science", "Fantasy", "Adventure", "Bedtime"]
        );
    }

    #[test]
    fn sort_is_idempotent_and_ordered() {
        let ds = genres();
        let spec = SortSpec::descending("avgEngagement");
        let once = sort(&ds, &spec);
        assert_eq!(sort(&once, &spec), once);
        let idx = ds.schema.index_of("avgEngagement").unwrap();
        for pair in once.rows.windows(2) {
            assert_ne!(
                compare_values(DataType::Float64, &pair[0][idx], &pair[1][idx]),
                Ordering::Less
            );
        }
    }

    #[test]
    fn unknown_field_keeps_natural_order() {
        let ds = genres();
        assert_eq!(sort(&ds, &SortSpec::ascending("popularity")), ds);
    }

    #[test]
    fn short_rows_sort_as_nulls() {
        let schema = Schema::new(vec![
            Field::new("name", DataType::Utf8),
            Field::new("totalReads", DataType::Int64).nullable(),
        ]);
        let ds = DataSet::new(
            schema,
            vec![
                vec![Value::Utf8("Fantasy".into())],
                vec![Value::Utf8("Mystery".into()), Value::Int64(40)],
                vec![Value::Utf8("Fables".into()), Value::Int64(90)],
            ],
        );
        for direction in [SortDirection::Ascending, SortDirection::Descending] {
            let sorted = sort(&ds, &SortSpec::new("totalReads", direction));
            assert_eq!(names(&sorted)[2], "Fantasy");
        }
        assert_eq!(names(&sort(&ds, &SortSpec::descending("totalReads"))), vec!["Fables", "Mystery", "Fantasy"]);
    }

    #[test]
    fn toggle_flips_active_field_and_uses_declared_defaults() {
        let defaults = SortDefaults::new(SortDirection::Ascending)
            .with_field("totalReads", SortDirection::Descending);
        let mut state = SortState::new(defaults);

        assert_eq!(state.toggle("totalReads").direction, SortDirection::Descending);
        assert_eq!(state.toggle("totalReads").direction, SortDirection::Ascending);
        assert_eq!(state.toggle("name"), &SortSpec::ascending("name"));
        assert_eq!(state.toggle("totalReads").direction, SortDirection::Descending);
    }
}
