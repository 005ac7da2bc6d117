//! `dashboard-pipeline` is the list engine behind an admin analytics dashboard: every list screen
//! (genres, quotes, user stories, imports, leaderboards, the moderation queue, usage charts) is
//! the same filter → sort → paginate → derive-summary pipeline over an in-memory
//! [`types::DataSet`], parameterized per screen.
//!
//! ## Data model
//!
//! A [`types::DataSet`] is an ordered list of records that follow one [`types::Schema`]. Nested
//! record fields are flattened to dotted names (`metrics.likes`). Supported logical types are:
//!
//! - [`types::DataType::Int64`]
//! - [`types::DataType::Float64`]
//! - [`types::DataType::Bool`]
//! - [`types::DataType::Utf8`]
//! - [`types::DataType::Timestamp`]
//!
//! Missing or empty input values are [`types::Value::Null`].
//!
//! ## Quick example: one screen
//!
//! ```rust
//! use dashboard_pipeline::pipeline::ListPipeline;
//! use dashboard_pipeline::screens;
//! use dashboard_pipeline::types::{DataSet, Value};
//!
//! let preset = screens::likes_leaderboard(3);
//! let names = ["Emma Wilson", "Liam Chen", "Olivia Park", "Noah Smith"];
//! let rows = names
//!     .iter()
//!     .zip([427_i64, 165, 398, 352])
//!     .enumerate()
//!     .map(|(i, (name, likes))| {
//!         vec![
//!             Value::Int64(i as i64 + 1),
//!             Value::Utf8(name.to_string()),
//!             Value::Utf8(format!("user{i}@example.com")),
//!             Value::Int64(likes),
//!             Value::Null,
//!         ]
//!     })
//!     .collect();
//!
//! let pipeline = ListPipeline::from_config(DataSet::new(preset.schema, rows), &preset.config);
//! let view = pipeline.get_view();
//! assert_eq!(view.total_count, 3);
//! assert_eq!(view.items.rows[0][1], Value::Utf8("Emma Wilson".into()));
//! assert_eq!(view.summary.get("userCount"), Some(4.0));
//! ```
//!
//! ## Ingesting source data
//!
//! ```no_run
//! use dashboard_pipeline::ingestion::{ingest_from_path, IngestionOptions};
//! use dashboard_pipeline::screens;
//!
//! # fn main() -> Result<(), dashboard_pipeline::IngestionError> {
//! let preset = screens::chatgpt_usage();
//! let ds = ingest_from_path("chatgpt_usage.json", &preset.schema, &IngestionOptions::default())?;
//! println!("rows={}", ds.row_count());
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`types`]: schema + in-memory dataset types
//! - [`processing`]: the pure list stages (filter/sort/paginate/reduce/summary/classify/window)
//! - [`pipeline`]: per-screen state and the view it renders
//! - [`execution`]: sequential or parallel execution with metrics and observers
//! - [`config`] and [`screens`]: per-screen configuration and the built-in presets
//! - [`moderation`]: trigger-word detection
//! - [`ingestion`]: CSV/JSON loading
//! - [`source`]: async data sources with last-request-wins
//! - [`error`]: error types for the fallible edges
//!
//! Logging goes through `tracing`; the library never installs a subscriber.

pub mod config;
pub mod error;
pub mod execution;
pub mod ingestion;
pub mod moderation;
pub mod pipeline;
pub mod processing;
pub mod screens;
pub mod source;
pub mod types;

pub use error::{
    ConfigError, ConfigResult, ExecutionError, FetchError, FetchResult, IngestionError,
    IngestionResult,
};
pub use pipeline::{ListPipeline, ListView};
