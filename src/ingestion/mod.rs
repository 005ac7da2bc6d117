//! Loading screen source arrays from CSV and JSON exports.
//!
//! [`ingest_from_path`] and [`IngestionRequest`] are the usual way in; they pick a reader by
//! extension and report each load to an [`IngestionObserver`]. The per-format readers live in
//! [`csv`] and [`json`] for callers that already hold a reader or string.

pub mod csv;
pub mod json;
pub mod observability;
pub mod unified;

pub use observability::{
    CompositeObserver, IngestionContext, IngestionObserver, IngestionSeverity, IngestionStats,
    TracingObserver,
};
pub use unified::{ingest_from_path, IngestionFormat, IngestionOptions, IngestionRequest};
