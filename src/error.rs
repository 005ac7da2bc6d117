use thiserror::Error;

/// Convenience result type for ingestion operations.
pub type IngestionResult<T> = Result<T, IngestionError>;

/// Error type returned by ingestion functions.
///
/// This is a single error enum shared across CSV and JSON ingestion.
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Underlying I/O error (e.g. file not found, permission denied).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV ingestion error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// A line of newline-delimited JSON is not valid JSON.
    #[error("invalid ndjson at line {line}: {source}")]
    Json {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    /// The input does not conform to the provided schema (missing required fields/columns, etc.).
    #[error("schema mismatch: {message}")]
    SchemaMismatch { message: String },

    /// A value could not be parsed into the required [`crate::types::DataType`].
    #[error("failed to parse value at row {row} column '{column}': {message} (raw='{raw}')")]
    ParseError {
        row: usize,
        column: String,
        raw: String,
        message: String,
    },
}

/// Convenience result type for screen configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Error type returned when loading or validating a [`crate::config::ScreenConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The configuration parsed but is not usable.
    #[error("invalid screen config '{screen}': {message}")]
    Invalid { screen: String, message: String },
}

/// Convenience result type for the asynchronous data-source boundary.
pub type FetchResult<T> = Result<T, FetchError>;

/// Error type returned by [`crate::source::DatasetSource`] implementations.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The backend call failed.
    #[error("fetch failed: {0}")]
    Failed(String),

    /// A newer request was issued before this one completed; its result must not be applied.
    #[error("request {request} superseded by request {latest}")]
    Superseded { request: u64, latest: u64 },

    #[error(transparent)]
    Ingestion(#[from] IngestionError),

    /// The blocking task running the fetch panicked or was cancelled.
    #[error("fetch task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Error type returned when building an [`crate::execution::ExecutionEngine`].
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("invalid execution options: {0}")]
    InvalidOptions(String),

    #[error("failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
