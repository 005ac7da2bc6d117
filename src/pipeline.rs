//! Stateful list pipeline for one screen.
//!
//! A [`ListPipeline`] holds a screen's source dataset and its current filter, sort and page
//! state. Each [`ListPipeline::get_view`] re-runs filter → rank → limit → sort → paginate →
//! derive from scratch; nothing is cached between calls.
//!
//! On leaderboards the ranking decides *which* rows make the top N; the display sort only
//! reorders those rows.
//!
//! ```rust
//! use dashboard_pipeline::pipeline::ListPipeline;
//! use dashboard_pipeline::processing::{FilterCriteria, SortDirection};
//! use dashboard_pipeline::types::{DataSet, DataType, Field, Schema, Value};
//!
//! let schema = Schema::new(vec![
//!     Field::new("title", DataType::Utf8),
//!     Field::new("likes", DataType::Int64),
//! ]);
//! let rows = (1..=12)
//!     .map(|i| vec![Value::Utf8(format!("Story {i}")), Value::Int64(i)])
//!     .collect();
//! let mut pipeline = ListPipeline::new(DataSet::new(schema, rows));
//!
//! pipeline.configure_page(2, 5);
//! pipeline.configure_sort("likes", SortDirection::Descending);
//! let view = pipeline.get_view();
//! assert_eq!(view.page_index, 1);
//! assert_eq!(view.total_pages, 3);
//! assert_eq!(view.items.rows[0][1], Value::Int64(12));
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use crate::config::ScreenConfig;
use crate::error::FetchResult;
use crate::execution::{ExecutionEngine, RunPlan};
use crate::processing::filter::FilterCriteria;
use crate::processing::paginate::{page_slots, PageSlot, PageSpec};
use crate::processing::sort::{SortDefaults, SortDirection, SortSpec, SortState};
use crate::processing::summary::{MetricSpec, SummaryResult};
use crate::processing::window::TimeFrame;
use crate::source::DatasetSource;
use crate::types::DataSet;

/// What a screen renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListView {
    /// Rows of the current page.
    pub items: DataSet,
    /// Metrics over every matching row, independent of the page and the top-N limit.
    pub summary: SummaryResult,
    /// Effective (clamped) 1-based page index.
    pub page_index: usize,
    pub page_size: usize,
    pub total_pages: usize,
    /// Rows available for paging (after filtering and the limit).
    pub total_count: usize,
}

impl ListView {
    /// Numbered pager buttons for this view.
    pub fn page_slots(&self) -> Vec<PageSlot> {
        page_slots(self.page_index, self.total_pages)
    }
}

pub struct ListPipeline {
    dataset: Arc<DataSet>,
    criteria: FilterCriteria,
    sort: SortState,
    page: PageSpec,
    limit: Option<usize>,
    rank_by: Option<SortSpec>,
    rank_fields: BTreeMap<TimeFrame, String>,
    time_frame: TimeFrame,
    metrics: Vec<MetricSpec>,
    search_fields: Vec<String>,
    engine: Arc<ExecutionEngine>,
}

impl ListPipeline {
    /// A pipeline in natural order, first page of the default size, no metrics.
    pub fn new(dataset: impl Into<Arc<DataSet>>) -> Self {
        Self {
            dataset: dataset.into(),
            criteria: FilterCriteria::new(),
            sort: SortState::new(SortDefaults::default()),
            page: PageSpec::default(),
            limit: None,
            rank_by: None,
            rank_fields: BTreeMap::new(),
            time_frame: TimeFrame::AllTime,
            metrics: Vec::new(),
            search_fields: Vec::new(),
            engine: Arc::new(ExecutionEngine::sequential()),
        }
    }

    /// A pipeline set up the way `config` describes the screen.
    pub fn from_config(dataset: impl Into<Arc<DataSet>>, config: &ScreenConfig) -> Self {
        let mut pipeline = Self::new(dataset);
        pipeline.sort = config.sort_state();
        pipeline.page = config.first_page();
        pipeline.limit = config.limit;
        pipeline.rank_by = config.rank_by.clone();
        pipeline.rank_fields = config.rank_fields.clone();
        pipeline.metrics = config.metrics.clone();
        pipeline.search_fields = config.search_fields.clone();
        tracing::debug!(screen = %config.name, rows = pipeline.dataset.row_count(), "pipeline configured");
        pipeline
    }

    /// Run on `engine` instead of the default sequential one.
    pub fn with_engine(mut self, engine: Arc<ExecutionEngine>) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_metrics(mut self, metrics: Vec<MetricSpec>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    /// Order that picks the rows kept by the limit.
    pub fn with_ranking(mut self, rank_by: Option<SortSpec>) -> Self {
        self.rank_by = rank_by;
        self
    }

    pub fn dataset(&self) -> &Arc<DataSet> {
        &self.dataset
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn sort_spec(&self) -> Option<&SortSpec> {
        self.sort.current()
    }

    pub fn page(&self) -> PageSpec {
        self.page
    }

    /// Current ranking; its field is the value a leaderboard shows for the selected period.
    pub fn ranking(&self) -> Option<&SortSpec> {
        self.rank_by.as_ref()
    }

    pub fn time_frame(&self) -> TimeFrame {
        self.time_frame
    }

    /// Rank by `frame`'s column and display in that order; back to page 1.
    ///
    /// Returns `false` and changes nothing when the screen has no column for `frame`.
    pub fn select_time_frame(&mut self, frame: TimeFrame) -> bool {
        let Some(field) = self.rank_fields.get(&frame) else {
            tracing::debug!(?frame, "no ranking column for time frame; ignoring");
            return false;
        };
        let direction = self
            .rank_by
            .as_ref()
            .map_or(SortDirection::Descending, |spec| spec.direction);
        let spec = SortSpec::new(field.clone(), direction);
        self.sort.set(spec.clone());
        self.rank_by = Some(spec);
        self.time_frame = frame;
        self.reset_page();
        true
    }

    /// Replace the filter criteria; back to page 1.
    pub fn configure_filters(&mut self, criteria: FilterCriteria) {
        self.criteria = criteria;
        self.reset_page();
    }

    /// Edit the current criteria in place; back to page 1.
    pub fn update_filters<F>(&mut self, edit: F)
    where
        F: FnOnce(&mut FilterCriteria, &DataSet),
    {
        edit(&mut self.criteria, &self.dataset);
        self.reset_page();
    }

    /// Free-text search over the screen's search fields; back to page 1.
    pub fn search(&mut self, term: &str) {
        self.criteria.search(self.search_fields.as_slice(), term);
        self.reset_page();
    }

    /// Set the sort explicitly; back to page 1.
    pub fn configure_sort(&mut self, field: &str, direction: SortDirection) {
        self.sort.set(SortSpec::new(field, direction));
        self.reset_page();
    }

    /// Column-header click; back to page 1.
    pub fn toggle_sort(&mut self, field: &str) -> SortSpec {
        let spec = self.sort.toggle(field).clone();
        self.reset_page();
        spec
    }

    /// Back to natural order; back to page 1.
    pub fn clear_sort(&mut self) {
        self.sort.clear();
        self.reset_page();
    }

    /// Select a page. Out-of-range values are clamped when the view is built.
    pub fn configure_page(&mut self, page_index: usize, page_size: usize) {
        self.page = PageSpec::new(page_index, page_size);
    }

    pub fn go_to_page(&mut self, page_index: usize) {
        self.page.page_index = page_index;
    }

    /// Swap in new source data; filters and sort are kept, the page goes back to 1.
    pub fn replace_dataset(&mut self, dataset: impl Into<Arc<DataSet>>) {
        self.dataset = dataset.into();
        self.reset_page();
    }

    /// Fetch from `source` and apply the result; on error the current data stays in place.
    pub async fn refresh<S>(&mut self, source: &S) -> FetchResult<()>
    where
        S: DatasetSource + ?Sized,
    {
        let dataset = source.fetch().await?;
        self.replace_dataset(dataset);
        Ok(())
    }

    /// Build the current view.
    pub fn get_view(&self) -> ListView {
        let out = self.engine.run(
            &self.dataset,
            RunPlan {
                criteria: &self.criteria,
                sort: self.sort.current(),
                limit: self.limit,
                rank: self.rank_by.as_ref(),
                page: self.page,
                metrics: &self.metrics,
            },
        );
        ListView {
            items: out.page.items,
            summary: out.summary,
            page_index: out.page.page_index,
            page_size: out.page.page_size,
            total_pages: out.page.total_pages,
            total_count: out.page.total_count,
        }
    }

    fn reset_page(&mut self) {
        self.page.page_index = 1;
    }
}

impl std::fmt::Debug for ListPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListPipeline")
            .field("rows", &self.dataset.row_count())
            .field("criteria", &self.criteria)
            .field("sort", &self.sort)
            .field("page", &self.page)
            .field("limit", &self.limit)
            .field("rank_by", &self.rank_by)
            .field("time_frame", &self.time_frame)
            .field("metrics", &self.metrics.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::filter::Criterion;
    use crate::types::{DataType, Field, Schema, Value};

    fn numbered(n: i64) -> DataSet {
        let schema = Schema::new(vec![
            Field::new("id", DataType::Int64),
            Field::new("genre", DataType::Utf8),
        ]);
        let rows = (1..=n)
            .map(|i| {
                let genre = if i % 2 == 0 { "Fantasy" } else { "Sci-Fi" };
                vec![Value::Int64(i), Value::Utf8(genre.to_string())]
            })
            .collect();
        DataSet::new(schema, rows)
    }

    #[test]
    fn filter_and_sort_changes_reset_the_page() {
        let mut pipeline = ListPipeline::new(numbered(30));
        pipeline.configure_page(3, 5);
        assert_eq!(pipeline.get_view().page_index, 3);

        pipeline.configure_filters(FilterCriteria::new().with("g", Criterion::equals("genre", Value::Utf8("Fantasy".into()))));
        assert_eq!(pipeline.page().page_index, 1);

        pipeline.go_to_page(2);
        pipeline.toggle_sort("id");
        assert_eq!(pipeline.page().page_index, 1);

        pipeline.go_to_page(2);
        pipeline.replace_dataset(numbered(4));
        assert_eq!(pipeline.page().page_index, 1);
    }

    #[test]
    fn summary_ignores_pagination() {
        let mut pipeline = ListPipeline::new(numbered(23)).with_metrics(vec![
            MetricSpec::count("count"),
            MetricSpec::sum("sum", "id"),
        ]);
        pipeline.configure_page(2, 10);
        let view = pipeline.get_view();
        assert_eq!(view.items.row_count(), 10);
        assert_eq!(view.total_count, 23);
        assert_eq!(view.summary.get("count"), Some(23.0));
        assert_eq!(view.summary.get("sum"), Some(276.0));
    }

    #[test]
    fn toggling_returns_the_new_spec() {
        let mut pipeline = ListPipeline::new(numbered(3));
        assert_eq!(pipeline.toggle_sort("id"), SortSpec::ascending("id"));
        assert_eq!(pipeline.toggle_sort("id"), SortSpec::descending("id"));
        pipeline.clear_sort();
        assert!(pipeline.sort_spec().is_none());
    }

    #[test]
    fn unknown_time_frame_changes_nothing() {
        let mut pipeline = ListPipeline::new(numbered(12)).with_ranking(Some(SortSpec::descending("id")));
        pipeline.go_to_page(2);
        assert!(!pipeline.select_time_frame(TimeFrame::Last7Days));
        assert_eq!(pipeline.time_frame(), TimeFrame::AllTime);
        assert_eq!(pipeline.ranking(), Some(&SortSpec::descending("id")));
        assert_eq!(pipeline.page().page_index, 2);
    }
}
