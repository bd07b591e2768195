//! Mock movie catalog for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::catalog::{CatalogError, MovieCatalog, MovieDetail, SearchResult, NO_MATCHES_MESSAGE};

/// A recorded catalog call for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCatalogCall {
    Search { query: String },
    Detail { imdb_id: String },
}

/// Mock implementation of the MovieCatalog trait.
///
/// Provides controllable behavior for testing:
/// - Serve a configurable set of movies
/// - Delay individual queries or ids to force out-of-order completion
/// - Track calls (and which of them were cancelled) for assertions
/// - Simulate failures
///
/// With `set_ignore_cancellation(true)` a call runs to completion even after
/// its token fires, the way a response already on the wire would.
///
/// # Example
///
/// ```rust,ignore
/// use popcorn_core::testing::{MockCatalog, fixtures};
///
/// let catalog = MockCatalog::new();
/// catalog.set_movies(fixtures::batman_movies()).await;
/// catalog.set_latency("bat", Duration::from_millis(500)).await;
/// ```
#[derive(Debug)]
pub struct MockCatalog {
    /// Movies in insertion order.
    movies: Arc<RwLock<Vec<MovieDetail>>>,
    /// Latency per search query or detail id.
    latencies: Arc<RwLock<HashMap<String, Duration>>>,
    /// Latency for anything not listed above.
    default_latency: Arc<RwLock<Duration>>,
    /// Recorded calls.
    calls: Arc<RwLock<Vec<RecordedCatalogCall>>>,
    /// Calls that ended because their token fired.
    cancelled: Arc<RwLock<Vec<RecordedCatalogCall>>>,
    /// If set, the next operation will fail with this error.
    next_error: Arc<RwLock<Option<CatalogError>>>,
    ignore_cancellation: Arc<AtomicBool>,
}

impl Default for MockCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCatalog {
    /// Create a new empty mock catalog.
    pub fn new() -> Self {
        Self {
            movies: Arc::new(RwLock::new(Vec::new())),
            latencies: Arc::new(RwLock::new(HashMap::new())),
            default_latency: Arc::new(RwLock::new(Duration::ZERO)),
            calls: Arc::new(RwLock::new(Vec::new())),
            cancelled: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            ignore_cancellation: Arc::new(AtomicBool::new(false)),
        }
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// Add a movie.
    pub async fn add_movie(&self, movie: MovieDetail) {
        self.movies.write().await.push(movie);
    }

    /// Replace all movies at once.
    pub async fn set_movies(&self, movies: Vec<MovieDetail>) {
        *self.movies.write().await = movies;
    }

    /// Delay the search for `key` (a query) or the detail for `key` (an id).
    pub async fn set_latency(&self, key: &str, latency: Duration) {
        self.latencies.write().await.insert(key.to_string(), latency);
    }

    /// Delay every call without its own latency.
    pub async fn set_default_latency(&self, latency: Duration) {
        *self.default_latency.write().await = latency;
    }

    /// Keep running calls whose token has fired.
    pub fn set_ignore_cancellation(&self, ignore: bool) {
        self.ignore_cancellation.store(ignore, Ordering::SeqCst);
    }

    // =========================================================================
    // Call Recording
    // =========================================================================

    /// Get all recorded calls.
    pub async fn recorded_calls(&self) -> Vec<RecordedCatalogCall> {
        self.calls.read().await.clone()
    }

    /// Get the calls that were aborted by their token.
    pub async fn cancelled_calls(&self) -> Vec<RecordedCatalogCall> {
        self.cancelled.read().await.clone()
    }

    /// Get the number of calls performed.
    pub async fn call_count(&self) -> usize {
        self.calls.read().await.len()
    }

    /// Clear recorded calls.
    pub async fn clear_recorded(&self) {
        self.calls.write().await.clear();
        self.cancelled.write().await.clear();
    }

    // =========================================================================
    // Error Injection
    // =========================================================================

    /// Configure the next operation to fail with the given error.
    pub async fn set_next_error(&self, error: CatalogError) {
        *self.next_error.write().await = Some(error);
    }

    /// Clear any pending error.
    pub async fn clear_next_error(&self) {
        *self.next_error.write().await = None;
    }

    async fn take_error(&self) -> Option<CatalogError> {
        self.next_error.write().await.take()
    }

    async fn record(&self, call: RecordedCatalogCall) {
        self.calls.write().await.push(call);
    }

    async fn latency_for(&self, key: &str) -> Duration {
        match self.latencies.read().await.get(key) {
            Some(latency) => *latency,
            None => *self.default_latency.read().await,
        }
    }

    /// Wait out the configured latency, honouring the token unless told not to.
    async fn wait(
        &self,
        key: &str,
        call: &RecordedCatalogCall,
        cancel: &CancellationToken,
    ) -> Result<(), CatalogError> {
        let latency = self.latency_for(key).await;

        if self.ignore_cancellation.load(Ordering::SeqCst) {
            tokio::time::sleep(latency).await;
            return Ok(());
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                self.cancelled.write().await.push(call.clone());
                Err(CatalogError::Cancelled)
            }
            _ = tokio::time::sleep(latency) => Ok(()),
        }
    }
}

#[async_trait]
impl MovieCatalog for MockCatalog {
    async fn search(
        &self,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<SearchResult>, CatalogError> {
        let call = RecordedCatalogCall::Search {
            query: query.to_string(),
        };
        self.record(call.clone()).await;
        let injected = self.take_error().await;

        self.wait(query, &call, cancel).await?;

        if let Some(err) = injected {
            return Err(err);
        }

        let query_lower = query.to_lowercase();
        let results: Vec<SearchResult> = self
            .movies
            .read()
            .await
            .iter()
            .filter(|m| m.title.to_lowercase().contains(&query_lower))
            .map(|m| SearchResult {
                imdb_id: m.imdb_id.clone(),
                title: m.title.clone(),
                year: m
                    .released
                    .as_deref()
                    .and_then(|r| r.split_whitespace().last())
                    .unwrap_or_default()
                    .to_string(),
                poster: m.poster.clone(),
            })
            .collect();

        if results.is_empty() {
            return Err(CatalogError::NoMatches(NO_MATCHES_MESSAGE.to_string()));
        }

        Ok(results)
    }

    async fn detail(
        &self,
        imdb_id: &str,
        cancel: &CancellationToken,
    ) -> Result<MovieDetail, CatalogError> {
        let call = RecordedCatalogCall::Detail {
            imdb_id: imdb_id.to_string(),
        };
        self.record(call.clone()).await;
        let injected = self.take_error().await;

        self.wait(imdb_id, &call, cancel).await?;

        if let Some(err) = injected {
            return Err(err);
        }

        self.movies
            .read()
            .await
            .iter()
            .find(|m| m.imdb_id == imdb_id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(format!("Movie {} not found", imdb_id)))
    }
}
