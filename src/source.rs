//! Asynchronous boundary between list screens and wherever their data comes from.
//!
//! A screen asks a [`DatasetSource`] for a fresh [`DataSet`] and feeds the result to its
//! pipeline. When a screen re-requests before an earlier request has completed (the user changes
//! a filter while a slow fetch is in flight), wrapping the source in [`LatestOnly`] guarantees
//! that only the most recent request's response is applied.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{FetchError, FetchResult};
use crate::ingestion::IngestionRequest;
use crate::types::DataSet;

/// Anything that can produce a dataset for a screen.
#[async_trait]
pub trait DatasetSource: Send + Sync {
    async fn fetch(&self) -> FetchResult<DataSet>;
}

#[async_trait]
impl<S: DatasetSource + ?Sized> DatasetSource for Arc<S> {
    async fn fetch(&self) -> FetchResult<DataSet> {
        (**self).fetch().await
    }
}

/// In-memory data served after a simulated delay.
#[derive(Debug, Clone)]
pub struct StaticSource {
    dataset: Arc<DataSet>,
    latency: Duration,
    failure: Option<String>,
}

impl StaticSource {
    pub fn new(dataset: DataSet) -> Self {
        Self {
            dataset: Arc::new(dataset),
            latency: Duration::ZERO,
            failure: None,
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Make every fetch fail with `message` (after the latency elapses).
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }
}

#[async_trait]
impl DatasetSource for StaticSource {
    async fn fetch(&self) -> FetchResult<DataSet> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        match &self.failure {
            Some(message) => {
                tracing::warn!(%message, "static source fetch failed");
                Err(FetchError::Failed(message.clone()))
            }
            None => Ok(DataSet::clone(&self.dataset)),
        }
    }
}

/// Ingests a file on the blocking thread pool.
#[derive(Debug, Clone)]
pub struct FileSource {
    request: IngestionRequest,
}

impl FileSource {
    pub fn new(request: IngestionRequest) -> Self {
        Self { request }
    }
}

#[async_trait]
impl DatasetSource for FileSource {
    async fn fetch(&self) -> FetchResult<DataSet> {
        let request = self.request.clone();
        let dataset = tokio::task::spawn_blocking(move || request.run()).await??;
        Ok(dataset)
    }
}

/// Last-request-wins wrapper.
///
/// Every call to [`DatasetSource::fetch`] takes a new request number. A response that comes back
/// after a newer request was issued resolves to [`FetchError::Superseded`] instead of data, so
/// a stale response can never overwrite a newer one.
#[derive(Debug)]
pub struct LatestOnly<S> {
    inner: S,
    latest: AtomicU64,
}

impl<S: DatasetSource> LatestOnly<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            latest: AtomicU64::new(0),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Number of the most recently issued request (0 before the first).
    pub fn latest_request(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<S: DatasetSource> DatasetSource for LatestOnly<S> {
    async fn fetch(&self) -> FetchResult<DataSet> {
        let request = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        let result = self.inner.fetch().await;
        let latest = self.latest.load(Ordering::SeqCst);
        if latest != request {
            tracing::debug!(request, latest, "dropping superseded response");
            return Err(FetchError::Superseded { request, latest });
        }
        result
    }
}
