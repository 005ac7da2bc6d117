//! Per-screen pipeline configuration.
//!
//! A [`ScreenConfig`] carries everything that differs between list screens: page size, initial
//! and per-field default sort directions, search fields, an optional top-N limit with the ranking
//! that decides it, and the summary metrics. Configs can be written in code (see [`crate::screens`]) or loaded from JSON:
//!
//! ```rust
//! use dashboard_pipeline::config::ScreenConfig;
//!
//! let cfg = ScreenConfig::from_json_str(r#"{
//!     "name": "quotes",
//!     "page_size": 5,
//!     "initial_sort": { "field": "lastUsed", "direction": "desc" },
//!     "search_fields": ["title", "author", "category"],
//!     "metrics": [{ "op": "count", "name": "total" }]
//! }"#).unwrap();
//! assert_eq!(cfg.page_size, 5);
//! ```

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::processing::paginate::{PageSpec, DEFAULT_PAGE_SIZE};
use crate::processing::sort::{SortDefaults, SortDirection, SortSpec, SortState};
use crate::processing::summary::MetricSpec;
use crate::processing::window::TimeFrame;
use crate::types::Schema;

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_fallback_direction() -> SortDirection {
    SortDirection::Ascending
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScreenConfig {
    pub name: String,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default)]
    pub initial_sort: Option<SortSpec>,
    /// First-click direction for fields without an entry in `sort_defaults`.
    #[serde(default = "default_fallback_direction")]
    pub fallback_direction: SortDirection,
    #[serde(default)]
    pub sort_defaults: BTreeMap<String, SortDirection>,
    #[serde(default)]
    pub search_fields: Vec<String>,
    /// Keep only the top `limit` rows (leaderboards).
    #[serde(default)]
    pub limit: Option<usize>,
    /// Order that picks the rows kept by `limit`. The display sort only reorders them. Without
    /// it, the cut follows the display sort.
    #[serde(default)]
    pub rank_by: Option<SortSpec>,
    /// Ranking column per leaderboard period, in `rank_by`'s direction.
    #[serde(default)]
    pub rank_fields: BTreeMap<TimeFrame, String>,
    #[serde(default)]
    pub metrics: Vec<MetricSpec>,
}

impl ScreenConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            page_size: DEFAULT_PAGE_SIZE,
            initial_sort: None,
            fallback_direction: SortDirection::Ascending,
            sort_defaults: BTreeMap::new(),
            search_fields: Vec::new(),
            limit: None,
            rank_by: None,
            rank_fields: BTreeMap::new(),
            metrics: Vec::new(),
        }
    }

    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn initial_sort(mut self, spec: SortSpec) -> Self {
        self.initial_sort = Some(spec);
        self
    }

    pub fn fallback_direction(mut self, direction: SortDirection) -> Self {
        self.fallback_direction = direction;
        self
    }

    pub fn sort_default(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.sort_defaults.insert(field.into(), direction);
        self
    }

    pub fn search_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.search_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn rank_by(mut self, spec: SortSpec) -> Self {
        self.rank_by = Some(spec);
        self
    }

    pub fn rank_field(mut self, frame: TimeFrame, field: impl Into<String>) -> Self {
        self.rank_fields.insert(frame, field.into());
        self
    }

    pub fn metric(mut self, spec: MetricSpec) -> Self {
        self.metrics.push(spec);
        self
    }

    /// Parse and validate a JSON config.
    pub fn from_json_str(input: &str) -> ConfigResult<Self> {
        let cfg: Self = serde_json::from_str(input)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_path(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Checks that do not need a schema.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.name.trim().is_empty() {
            return Err(self.invalid("name must not be empty"));
        }
        if self.page_size == 0 {
            return Err(self.invalid("page_size must be > 0"));
        }
        if self.limit == Some(0) {
            return Err(self.invalid("limit must be > 0 when set"));
        }
        let mut seen: HashSet<&str> = HashSet::new();
        for spec in &self.metrics {
            for reference in spec.references() {
                if !seen.contains(reference) {
                    return Err(self.invalid(format!(
                        "metric '{}' references '{reference}', which is not defined before it",
                        spec.name()
                    )));
                }
            }
            if !seen.insert(spec.name()) {
                return Err(self.invalid(format!("duplicate metric name '{}'", spec.name())));
            }
        }
        Ok(())
    }

    /// Check every field this config names against `schema`.
    pub fn check_schema(&self, schema: &Schema) -> ConfigResult<()> {
        let sort_fields = self
            .initial_sort
            .iter()
            .map(|s| s.field.as_str())
            .chain(self.sort_defaults.keys().map(String::as_str))
            .chain(self.rank_by.iter().map(|s| s.field.as_str()))
            .chain(self.rank_fields.values().map(String::as_str));
        let metric_fields = self.metrics.iter().filter_map(|m| match m {
            MetricSpec::Sum { field, .. }
            | MetricSpec::Average { field, .. }
            | MetricSpec::Min { field, .. }
            | MetricSpec::Max { field, .. }
            | MetricSpec::First { field, .. }
            | MetricSpec::Last { field, .. }
            | MetricSpec::GrowthRate { field, .. } => Some(field.as_str()),
            _ => None,
        });
        for field in sort_fields
            .chain(self.search_fields.iter().map(String::as_str))
            .chain(metric_fields)
        {
            if schema.index_of(field).is_none() {
                return Err(self.invalid(format!("field '{field}' is not in the schema")));
            }
        }
        Ok(())
    }

    pub fn sort_defaults(&self) -> SortDefaults {
        SortDefaults {
            fallback: self.fallback_direction,
            fields: self.sort_defaults.clone(),
        }
    }

    /// Fresh sort state at the screen's initial sort.
    pub fn sort_state(&self) -> SortState {
        let state = SortState::new(self.sort_defaults());
        match &self.initial_sort {
            Some(spec) => state.with_initial(spec.clone()),
            None => state,
        }
    }

    pub fn first_page(&self) -> PageSpec {
        PageSpec::first(self.page_size)
    }

    fn invalid(&self, message: impl Into<String>) -> ConfigError {
        ConfigError::Invalid {
            screen: self.name.clone(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DataType, Field};

    #[test]
    fn json_defaults_apply() {
        let cfg = ScreenConfig::from_json_str(r#"{"name": "genres"}"#).unwrap();
        assert_eq!(cfg.page_size, 10);
        assert_eq!(cfg.fallback_direction, SortDirection::Ascending);
        assert!(cfg.initial_sort.is_none());
        assert!(cfg.metrics.is_empty());
    }

    #[test]
    fn sort_state_uses_initial_sort_and_field_defaults() {
        let cfg = ScreenConfig::new("genres")
            .initial_sort(SortSpec::descending("totalReads"))
            .fallback_direction(SortDirection::Descending);
        let mut state = cfg.sort_state();
        assert_eq!(state.current(), Some(&SortSpec::descending("totalReads")));
        assert_eq!(state.toggle("name").direction, SortDirection::Descending);
    }

    #[test]
    fn rejects_zero_page_size_and_unknown_keys() {
        let err = ScreenConfig::from_json_str(r#"{"name": "quotes", "page_size": 0}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
        let err = ScreenConfig::from_json_str(r#"{"name": "quotes", "pageSize": 5}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn metric_references_must_come_first() {
        let cfg = ScreenConfig::new("usage")
            .metric(MetricSpec::ratio("costPerToken", "totalCost", "totalTokens", 1.0))
            .metric(MetricSpec::sum("totalCost", "cost"));
        assert!(cfg.validate().is_err());

        let dup = ScreenConfig::new("usage")
            .metric(MetricSpec::sum("totalCost", "cost"))
            .metric(MetricSpec::sum("totalCost", "tokens"));
        assert!(dup.validate().is_err());
    }

    #[test]
    fn ranking_loads_from_json_and_is_schema_checked() {
        let cfg = ScreenConfig::from_json_str(
            r#"{
                "name": "claps_leaderboard",
                "limit": 50,
                "rank_by": { "field": "totalClaps", "direction": "desc" },
                "rank_fields": { "all-time": "totalClaps", "7-days": "thisWeek" }
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.rank_by, Some(SortSpec::descending("totalClaps")));
        assert_eq!(cfg.rank_fields.get(&TimeFrame::Last7Days).map(String::as_str), Some("thisWeek"));

        let schema = Schema::new(vec![Field::new("totalClaps", DataType::Int64)]);
        let err = cfg.check_schema(&schema).unwrap_err();
        assert!(err.to_string().contains("thisWeek"));
    }

    #[test]
    fn check_schema_reports_unknown_fields() {
        let schema = Schema::new(vec![Field::new("title", DataType::Utf8)]);
        let ok = ScreenConfig::new("quotes").search_fields(["title"]);
        assert!(ok.check_schema(&schema).is_ok());
        let bad = ScreenConfig::new("quotes").search_fields(["title", "author"]);
        assert!(bad.check_schema(&schema).is_err());
    }
}
