//! In-memory list stages.
//!
//! Every stage takes a [`crate::types::DataSet`] by reference and returns a new one (or a
//! scalar summary); none of them mutate their input or fail.
//!
//! - [`filter()`]: keyed criteria combined with AND
//! - [`sort()`]: stable, type-aware ordering with nulls last
//! - [`paginate()`]: clamped page slicing
//! - [`reduce()`] and [`derive()`]: column reductions and named summary metrics
//! - [`classify`]: threshold decision tables over derived metrics
//! - [`window`]: positional windows, relative date presets and leaderboard periods
//!
//! ## Example: filter → sort → paginate → derive
//!
//! ```rust
//! use dashboard_pipeline::processing::{
//!     derive, filter, paginate, sort, FilterCriteria, MetricSpec, PageSpec, SortSpec,
//! };
//! use dashboard_pipeline::types::{DataSet, DataType, Field, Schema, Value};
//!
//! let schema = Schema::new(vec![
//!     Field::new("name", DataType::Utf8),
//!     Field::new("genre", DataType::Utf8),
//!     Field::new("totalLikes", DataType::Int64),
//! ]);
//! let ds = DataSet::new(
//!     schema,
//!     vec![
//!         vec![Value::Utf8("Emma".into()), Value::Utf8("Fantasy".into()), Value::Int64(427)],
//!         vec![Value::Utf8("Liam".into()), Value::Utf8("Sci-Fi".into()), Value::Int64(398)],
//!         vec![Value::Utf8("Ava".into()), Value::Utf8("Fantasy".into()), Value::Int64(352)],
//!     ],
//! );
//!
//! let mut criteria = FilterCriteria::new();
//! criteria.equals_input(&ds.schema, "genre", "Fantasy");
//! let filtered = filter(&ds, &criteria);
//! let sorted = sort(&filtered, &SortSpec::ascending("totalLikes"));
//! let page = paginate(&sorted, PageSpec::new(1, 1));
//! let summary = derive(&filtered, &[MetricSpec::sum("likes", "totalLikes")]);
//!
//! assert_eq!(page.total_pages, 2);
//! assert_eq!(page.items.rows[0][0], Value::Utf8("Ava".into()));
//! assert_eq!(summary.get("likes"), Some(779.0));
//! ```

pub mod classify;
pub mod filter;
pub mod paginate;
pub mod reduce;
pub mod sort;
pub mod summary;
pub mod window;

pub use classify::{
    budget_status_table, credit_alert_table, growth_trend_table, BudgetStatus, CreditStatus,
    DecisionTable, GrowthTrend,
};
pub use filter::{filter, Criterion, FilterCriteria, RowMatcher, RowPredicate, ALL};
pub use paginate::{page_slots, paginate, total_pages, Page, PageSlot, PageSpec, DEFAULT_PAGE_SIZE};
pub use reduce::{reduce, ReduceOp};
pub use sort::{sort, SortDefaults, SortDirection, SortSpec, SortState};
pub use summary::{derive, MetricSpec, SummaryResult};
pub use window::{last_n, DatePreset, RowWindow, TimeFrame, TrailingRange};
