//! One entry point for loading a screen's source array from disk.
//!
//! [`ingest_from_path`] picks the reader from [`IngestionOptions::format`] or, when that is
//! `None`, from the file extension, and reports the outcome to the configured observer.
//! [`IngestionRequest`] packages the same call as an owned job for
//! [`crate::source::FileSource`].

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::error::{IngestionError, IngestionResult};
use crate::screens::ScreenPreset;
use crate::types::{DataSet, Schema, Value};

use super::observability::{IngestionContext, IngestionObserver, IngestionSeverity, IngestionStats};
use super::{csv, json};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestionFormat {
    Csv,
    /// A JSON array of records, a single record, or NDJSON.
    Json,
}

impl IngestionFormat {
    /// Case-insensitive; `ndjson` reads as JSON.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "json" | "ndjson" => Some(Self::Json),
            _ => None,
        }
    }

    /// Format implied by `path`'s extension.
    pub fn infer(path: &Path) -> IngestionResult<Self> {
        let Some(ext) = path.extension().and_then(|s| s.to_str()) else {
            return Err(IngestionError::SchemaMismatch {
                message: format!("cannot infer format: path has no extension ({})", path.display()),
            });
        };
        Self::from_extension(ext).ok_or_else(|| IngestionError::SchemaMismatch {
            message: format!(
                "cannot infer format from extension '{ext}' for path ({})",
                path.display()
            ),
        })
    }
}

#[derive(Clone)]
pub struct IngestionOptions {
    /// `None` infers the format from the file extension.
    pub format: Option<IngestionFormat>,
    pub observer: Option<Arc<dyn IngestionObserver>>,
    /// Failures at or above this severity are also sent to `on_alert`.
    pub alert_at_or_above: IngestionSeverity,
    /// Screen name attached to observer events.
    pub screen: Option<String>,
}

impl fmt::Debug for IngestionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestionOptions")
            .field("format", &self.format)
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .field("screen", &self.screen)
            .finish()
    }
}

impl Default for IngestionOptions {
    fn default() -> Self {
        Self {
            format: None,
            observer: None,
            alert_at_or_above: IngestionSeverity::Critical,
            screen: None,
        }
    }
}

/// Load `path` into a [`DataSet`] shaped by `schema`.
///
/// With an observer configured, a success reports row and null-cell counts; a failure reports
/// its [`IngestionError::severity`] and, at or above `options.alert_at_or_above`, an alert.
/// An unknown extension fails before any observer call.
///
/// ```no_run
/// use std::sync::Arc;
///
/// use dashboard_pipeline::ingestion::{ingest_from_path, IngestionOptions, TracingObserver};
/// use dashboard_pipeline::screens;
///
/// # fn main() -> Result<(), dashboard_pipeline::IngestionError> {
/// let preset = screens::user_stories();
/// let opts = IngestionOptions {
///     observer: Some(Arc::new(TracingObserver)),
///     screen: Some(preset.config.name.clone()),
///     ..Default::default()
/// };
/// let ds = ingest_from_path("user_stories.json", &preset.schema, &opts)?;
/// println!("rows={}", ds.row_count());
/// # Ok(())
/// # }
/// ```
pub fn ingest_from_path(
    path: impl AsRef<Path>,
    schema: &Schema,
    options: &IngestionOptions,
) -> IngestionResult<DataSet> {
    let path = path.as_ref();
    let format = match options.format {
        Some(f) => f,
        None => IngestionFormat::infer(path)?,
    };

    let started = Instant::now();
    let result = match format {
        IngestionFormat::Csv => csv::ingest_csv_from_path(path, schema),
        IngestionFormat::Json => json::ingest_json_from_path(path, schema),
    };

    if let Some(observer) = options.observer.as_deref() {
        let ctx = IngestionContext {
            path: path.to_path_buf(),
            format,
            screen: options.screen.clone(),
        };
        report(observer, &ctx, &result, started, options.alert_at_or_above);
    }
    result
}

fn report(
    observer: &dyn IngestionObserver,
    ctx: &IngestionContext,
    result: &IngestionResult<DataSet>,
    started: Instant,
    alert_at_or_above: IngestionSeverity,
) {
    match result {
        Ok(ds) => observer.on_success(
            ctx,
            IngestionStats {
                rows: ds.row_count(),
                null_cells: ds.rows.iter().flatten().filter(|v| matches!(v, Value::Null)).count(),
                elapsed: started.elapsed(),
            },
        ),
        Err(err) => {
            let severity = err.severity();
            observer.on_failure(ctx, severity, err);
            if severity >= alert_at_or_above {
                observer.on_alert(ctx, severity, err);
            }
        }
    }
}

/// An owned load job, runnable on a blocking worker.
#[derive(Clone)]
pub struct IngestionRequest {
    pub path: PathBuf,
    pub schema: Schema,
    pub options: IngestionOptions,
}

impl fmt::Debug for IngestionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestionRequest")
            .field("path", &self.path)
            .field("fields", &self.schema.fields.len())
            .field("options", &self.options)
            .finish()
    }
}

impl IngestionRequest {
    pub fn new(path: impl Into<PathBuf>, schema: Schema) -> Self {
        Self {
            path: path.into(),
            schema,
            options: IngestionOptions::default(),
        }
    }

    /// Load `path` with `preset`'s schema, tagging events with the screen name.
    pub fn for_screen(path: impl Into<PathBuf>, preset: &ScreenPreset) -> Self {
        let mut request = Self::new(path, preset.schema.clone());
        request.options.screen = Some(preset.config.name.clone());
        request
    }

    /// Replaces every option, including a screen name set by [`Self::for_screen`].
    pub fn with_options(mut self, options: IngestionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn IngestionObserver>) -> Self {
        self.options.observer = Some(observer);
        self
    }

    pub fn run(&self) -> IngestionResult<DataSet> {
        ingest_from_path(&self.path, &self.schema, &self.options)
    }
}
