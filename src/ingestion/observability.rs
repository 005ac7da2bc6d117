//! Hooks for watching screen data loads.
//!
//! [`super::ingest_from_path`] reports every load to an optional [`IngestionObserver`]: the row
//! and null-cell counts on success, a [`IngestionSeverity`] on failure, and an alert when the
//! severity reaches the configured threshold.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::error::IngestionError;

use super::unified::IngestionFormat;

/// How bad a failed load is; ordered so thresholds can be compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestionSeverity {
    Info,
    Warning,
    /// The input was read but does not fit the screen's schema.
    Error,
    /// The input could not be read at all.
    Critical,
}

impl fmt::Display for IngestionSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Critical => "critical",
        })
    }
}

impl IngestionError {
    /// Unreadable input is critical; input that does not match the schema is an error.
    pub fn severity(&self) -> IngestionSeverity {
        match self {
            Self::Io(_) => IngestionSeverity::Critical,
            Self::Csv(err) if matches!(err.kind(), csv::ErrorKind::Io(_)) => IngestionSeverity::Critical,
            Self::Csv(_) | Self::Json { .. } | Self::SchemaMismatch { .. } | Self::ParseError { .. } => {
                IngestionSeverity::Error
            }
        }
    }
}

/// Which load an event belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestionContext {
    pub path: PathBuf,
    pub format: IngestionFormat,
    /// Screen the data is loaded for, when the caller named one.
    pub screen: Option<String>,
}

/// What a successful load produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestionStats {
    pub rows: usize,
    /// Cells that ingested as `Null` (empty values and absent nullable fields).
    pub null_cells: usize,
    pub elapsed: Duration,
}

/// Receives load outcomes. Every method has a no-op default.
pub trait IngestionObserver: Send + Sync {
    fn on_success(&self, _ctx: &IngestionContext, _stats: IngestionStats) {}

    fn on_failure(&self, _ctx: &IngestionContext, _severity: IngestionSeverity, _error: &IngestionError) {}

    /// Called after `on_failure` when the severity reaches the alert threshold.
    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        self.on_failure(ctx, severity, error)
    }
}

/// Forwards every event to each observer in turn.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn IngestionObserver>>,
}

impl CompositeObserver {
    pub fn new(observers: Vec<Arc<dyn IngestionObserver>>) -> Self {
        Self { observers }
    }

    pub fn push(&mut self, observer: Arc<dyn IngestionObserver>) {
        self.observers.push(observer);
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl IngestionObserver for CompositeObserver {
    fn on_success(&self, ctx: &IngestionContext, stats: IngestionStats) {
        self.observers.iter().for_each(|o| o.on_success(ctx, stats));
    }

    fn on_failure(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        self.observers.iter().for_each(|o| o.on_failure(ctx, severity, error));
    }

    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        self.observers.iter().for_each(|o| o.on_alert(ctx, severity, error));
    }
}

/// Logs loads through `tracing`: successes at `info`, failures at `warn` (`error` when
/// critical), alerts at `error`.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl IngestionObserver for TracingObserver {
    fn on_success(&self, ctx: &IngestionContext, stats: IngestionStats) {
        tracing::info!(
            screen = ctx.screen.as_deref().unwrap_or("-"),
            format = ?ctx.format,
            path = %ctx.path.display(),
            rows = stats.rows,
            null_cells = stats.null_cells,
            elapsed_ms = stats.elapsed.as_millis() as u64,
            "screen data loaded"
        );
    }

    fn on_failure(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        let screen = ctx.screen.as_deref().unwrap_or("-");
        if severity >= IngestionSeverity::Critical {
            tracing::error!(screen, %severity, path = %ctx.path.display(), %error, "screen data load failed");
        } else {
            tracing::warn!(screen, %severity, path = %ctx.path.display(), %error, "screen data load failed");
        }
    }

    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        tracing::error!(
            alert = true,
            screen = ctx.screen.as_deref().unwrap_or("-"),
            %severity,
            path = %ctx.path.display(),
            %error,
            "screen data load alert"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreadable_input_is_critical() {
        let io = IngestionError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert_eq!(io.severity(), IngestionSeverity::Critical);

        let mismatch = IngestionError::SchemaMismatch {
            message: "missing required column 'title'".into(),
        };
        assert_eq!(mismatch.severity(), IngestionSeverity::Error);
        assert!(IngestionSeverity::Critical > IngestionSeverity::Error);
    }

    #[test]
    fn composite_grows() {
        let mut composite = CompositeObserver::default();
        assert!(composite.is_empty());
        composite.push(Arc::new(TracingObserver));
        assert_eq!(composite.len(), 1);
    }
}
