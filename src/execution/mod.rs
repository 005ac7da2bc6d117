//! Execution engine for list runs with optional parallelism.
//!
//! This module sits "above" [`crate::processing`] and provides:
//!
//! - A full filter → rank → limit → sort → paginate → derive run over one dataset
//! - Parallel filter and sort on a dedicated `rayon` pool for large datasets
//! - Cumulative metrics + observer hooks for monitoring
//!
//! Parallel filtering preserves row order and parallel sorting is stable, so a parallel run
//! produces exactly the same view as a sequential one.

mod observer;

use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::error::ExecutionError;
use crate::processing::filter::{FilterCriteria, RowMatcher};
use crate::processing::paginate::{paginate, Page, PageSpec};
use crate::processing::sort::{row_comparator, SortSpec};
use crate::processing::summary::{derive, MetricSpec, SummaryResult};
use crate::types::DataSet;

pub use observer::{
    ExecutionEvent, ExecutionMetrics, ExecutionMetricsSnapshot, ExecutionObserver, TracingObserver,
};

/// Configuration for the [`ExecutionEngine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOptions {
    /// Number of worker threads used for parallel stages.
    ///
    /// If `None`, uses the platform's available parallelism.
    pub num_threads: Option<usize>,
    /// Datasets with at least this many rows are filtered and sorted in parallel.
    pub parallel_threshold: usize,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self {
            num_threads: None,
            parallel_threshold: 10_000,
        }
    }
}

/// Everything a single list run needs besides the dataset.
#[derive(Debug, Clone, Copy)]
pub struct RunPlan<'a> {
    pub criteria: &'a FilterCriteria,
    pub sort: Option<&'a SortSpec>,
    /// Top-N cut applied before pagination.
    pub limit: Option<usize>,
    /// Order deciding which rows survive `limit`; `None` cuts in display order.
    pub rank: Option<&'a SortSpec>,
    pub page: PageSpec,
    pub metrics: &'a [MetricSpec],
}

/// Result of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutput {
    pub page: Page,
    /// Derived from the filtered rows before the limit and pagination.
    pub summary: SummaryResult,
}

/// Runs list stages, sequentially or on a `rayon` pool.
pub struct ExecutionEngine {
    pool: Option<ThreadPool>,
    opts: ExecutionOptions,
    observer: Option<Arc<dyn ExecutionObserver>>,
    metrics: Arc<ExecutionMetrics>,
}

impl ExecutionEngine {
    /// Create an engine with its own thread pool.
    pub fn new(opts: ExecutionOptions) -> Result<Self, ExecutionError> {
        if opts.num_threads == Some(0) {
            return Err(ExecutionError::InvalidOptions(
                "num_threads must be > 0 when set".to_string(),
            ));
        }
        let n_threads = opts
            .num_threads
            .unwrap_or_else(|| std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1));
        let pool = ThreadPoolBuilder::new().num_threads(n_threads).build()?;
        Ok(Self {
            pool: Some(pool),
            opts,
            observer: None,
            metrics: Arc::new(ExecutionMetrics::new()),
        })
    }

    /// An engine that never spawns threads.
    pub fn sequential() -> Self {
        Self {
            pool: None,
            opts: ExecutionOptions {
                num_threads: Some(1),
                parallel_threshold: usize::MAX,
            },
            observer: None,
            metrics: Arc::new(ExecutionMetrics::new()),
        }
    }

    /// Attach an observer for execution events (metrics/logging).
    pub fn with_observer(mut self, observer: Arc<dyn ExecutionObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn options(&self) -> &ExecutionOptions {
        &self.opts
    }

    /// Get a handle to real-time execution metrics.
    pub fn metrics(&self) -> Arc<ExecutionMetrics> {
        Arc::clone(&self.metrics)
    }

    fn parallel_pool(&self, rows: usize) -> Option<&ThreadPool> {
        self.pool
            .as_ref()
            .filter(|_| rows >= self.opts.parallel_threshold)
    }

    /// Filter stage; identity when no criterion is active.
    pub fn filter(&self, dataset: &DataSet, criteria: &FilterCriteria) -> DataSet {
        let matcher = RowMatcher::new(criteria, &dataset.schema);
        let mut parallel = false;
        let out = if matcher.is_noop() {
            dataset.clone()
        } else if let Some(pool) = self.parallel_pool(dataset.row_count()) {
            parallel = true;
            self.metrics.on_parallel_stage();
            let rows = pool.install(|| {
                dataset
                    .rows
                    .par_iter()
                    .filter(|row| matcher.matches(row))
                    .cloned()
                    .collect()
            });
            DataSet::new(dataset.schema.clone(), rows)
        } else {
            dataset.filter_rows(|row| matcher.matches(row))
        };
        self.metrics.on_filtered(dataset.row_count(), out.row_count());
        self.emit(ExecutionEvent::Filtered {
            input_rows: dataset.row_count(),
            output_rows: out.row_count(),
            parallel,
        });
        out
    }

    /// Sort stage; an unknown field keeps the natural order.
    pub fn sort(&self, dataset: &DataSet, spec: &SortSpec) -> DataSet {
        let (Some(idx), Some(data_type)) = (
            dataset.schema.index_of(&spec.field),
            dataset.schema.data_type_of(&spec.field),
        ) else {
            tracing::debug!(field = %spec.field, "sort field not in schema; keeping natural order");
            return dataset.clone();
        };
        let cmp = row_comparator(idx, data_type, spec.direction);
        let mut rows = dataset.rows.clone();
        let parallel = match self.parallel_pool(rows.len()) {
            Some(pool) => {
                self.metrics.on_parallel_stage();
                pool.install(|| rows.par_sort_by(&cmp));
                true
            }
            None => {
                rows.sort_by(&cmp);
                false
            }
        };
        self.emit(ExecutionEvent::Sorted {
            field: spec.field.clone(),
            rows: rows.len(),
            parallel,
        });
        DataSet::new(dataset.schema.clone(), rows)
    }

    /// Run every stage for one view.
    pub fn run(&self, dataset: &DataSet, plan: RunPlan<'_>) -> RunOutput {
        let start = Instant::now();
        self.metrics.begin_run();
        self.emit(ExecutionEvent::RunStarted {
            rows: dataset.row_count(),
        });

        let filtered = self.filter(dataset, plan.criteria);

        let summary = derive(&filtered, plan.metrics);
        self.emit(ExecutionEvent::SummaryDerived {
            metrics: summary.len(),
        });

        let ranked = match (plan.limit, plan.rank) {
            (Some(limit), Some(rank)) => self.sort(&filtered, rank).slice_rows(0..limit),
            _ => filtered,
        };
        let mut ordered = match plan.sort {
            Some(spec) => self.sort(&ranked, spec),
            None => ranked,
        };
        if let (Some(limit), None) = (plan.limit, plan.rank) {
            ordered = ordered.slice_rows(0..limit);
        }

        let page = paginate(&ordered, plan.page);
        self.emit(ExecutionEvent::Paged {
            page_index: page.page_index,
            total_pages: page.total_pages,
            rows: page.items.row_count(),
        });

        self.metrics.end_run(start.elapsed());
        self.emit(ExecutionEvent::RunFinished {
            elapsed: start.elapsed(),
            metrics: self.metrics.snapshot(),
        });
        RunOutput { page, summary }
    }

    fn emit(&self, event: ExecutionEvent) {
        if let Some(obs) = &self.observer {
            obs.on_event(&event);
        }
    }
}

impl Default for ExecutionEngine {
    fn default() -> Self {
        Self::sequential()
    }
}

impl std::fmt::Debug for ExecutionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionEngine")
            .field("opts", &self.opts)
            .field("pooled", &self.pool.is_some())
            .field("observer", &self.observer.is_some())
            .finish()
    }
}
