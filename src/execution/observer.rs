use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Events emitted by [`super::ExecutionEngine`] while producing one list view.
#[derive(Debug, Clone)]
pub enum ExecutionEvent {
    RunStarted {
        rows: usize,
    },
    Filtered {
        input_rows: usize,
        output_rows: usize,
        parallel: bool,
    },
    Sorted {
        field: String,
        rows: usize,
        parallel: bool,
    },
    Paged {
        page_index: usize,
        total_pages: usize,
        rows: usize,
    },
    SummaryDerived {
        metrics: usize,
    },
    RunFinished {
        elapsed: Duration,
        metrics: ExecutionMetricsSnapshot,
    },
}

/// Observer hook for execution events.
pub trait ExecutionObserver: Send + Sync {
    fn on_event(&self, event: &ExecutionEvent);
}

/// Logs execution events through `tracing`.
///
/// Stage events go to `debug`, finished runs to `info`.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl ExecutionObserver for TracingObserver {
    fn on_event(&self, event: &ExecutionEvent) {
        match event {
            ExecutionEvent::RunStarted { rows } => tracing::debug!(rows, "list run started"),
            ExecutionEvent::Filtered {
                input_rows,
                output_rows,
                parallel,
            } => tracing::debug!(input_rows, output_rows, parallel, "filtered"),
            ExecutionEvent::Sorted {
                field,
                rows,
                parallel,
            } => tracing::debug!(%field, rows, parallel, "sorted"),
            ExecutionEvent::Paged {
                page_index,
                total_pages,
                rows,
            } => tracing::debug!(page_index, total_pages, rows, "paged"),
            ExecutionEvent::SummaryDerived { metrics } => {
                tracing::debug!(metrics, "summary derived")
            }
            ExecutionEvent::RunFinished { elapsed, metrics } => {
                tracing::info!(elapsed_us = elapsed.as_micros() as u64, %metrics, "list run finished")
            }
        }
    }
}

/// Cumulative counters across every run of one engine.
///
/// The engine updates these during execution; callers can snapshot them at any time.
#[derive(Debug, Default)]
pub struct ExecutionMetrics {
    runs: AtomicU64,
    rows_scanned: AtomicU64,
    rows_matched: AtomicU64,
    parallel_stages: AtomicU64,
    last_elapsed_ns: AtomicU64,
}

impl ExecutionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn begin_run(&self) -> u64 {
        self.runs.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub(crate) fn end_run(&self, elapsed: Duration) {
        self.last_elapsed_ns
            .store(elapsed.as_nanos().min(u64::MAX as u128) as u64, Ordering::SeqCst);
    }

    pub(crate) fn on_filtered(&self, scanned: usize, matched: usize) {
        let _ = self.rows_scanned.fetch_add(scanned as u64, Ordering::SeqCst);
        let _ = self.rows_matched.fetch_add(matched as u64, Ordering::SeqCst);
    }

    pub(crate) fn on_parallel_stage(&self) {
        let _ = self.parallel_stages.fetch_add(1, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> ExecutionMetricsSnapshot {
        let ns = self.last_elapsed_ns.load(Ordering::SeqCst);
        ExecutionMetricsSnapshot {
            runs: self.runs.load(Ordering::SeqCst),
            rows_scanned: self.rows_scanned.load(Ordering::SeqCst),
            rows_matched: self.rows_matched.load(Ordering::SeqCst),
            parallel_stages: self.parallel_stages.load(Ordering::SeqCst),
            last_elapsed: (ns > 0).then(|| Duration::from_nanos(ns)),
        }
    }
}

/// Immutable snapshot of [`ExecutionMetrics`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionMetricsSnapshot {
    pub runs: u64,
    pub rows_scanned: u64,
    pub rows_matched: u64,
    pub parallel_stages: u64,
    pub last_elapsed: Option<Duration>,
}

impl fmt::Display for ExecutionMetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "runs={}, rows_scanned={}, rows_matched={}, parallel_stages={}, last_elapsed={:?}",
            self.runs, self.rows_scanned, self.rows_matched, self.parallel_stages, self.last_elapsed
        )
    }
}
