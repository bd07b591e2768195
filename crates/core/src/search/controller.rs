//! Search-as-you-type over a [`MovieCatalog`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::catalog::{CatalogError, MovieCatalog, SearchResult};
use crate::config::ClientConfig;
use crate::metrics::record_catalog_request;

/// Settings for [`SearchController`].
#[derive(Debug, Clone)]
pub struct SearchSettings {
    /// Queries with fewer characters than this never reach the catalog.
    pub min_query_len: usize,
    /// Wait before sending, restarted by every new query.
    pub debounce: Duration,
    /// Upper bound for one lookup.
    pub request_timeout: Duration,
}

impl From<&ClientConfig> for SearchSettings {
    fn from(config: &ClientConfig) -> Self {
        Self {
            min_query_len: config.min_query_len,
            debounce: config.debounce(),
            request_timeout: config.request_timeout(),
        }
    }
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self::from(&ClientConfig::default())
    }
}

/// What a rendering layer shows for the search box.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchState {
    /// The query this state belongs to.
    pub query: String,
    pub results: Vec<SearchResult>,
    pub is_loading: bool,
    /// User-visible error, `None` when there is nothing to report.
    pub error: Option<String>,
}

struct Shared {
    /// Token of the lookup allowed to commit. Guards every state commit.
    inflight: Mutex<Option<CancellationToken>>,
    state: watch::Sender<SearchState>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Option<CancellationToken>> {
        self.inflight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply a finished lookup unless it has been superseded.
    fn commit(&self, token: &CancellationToken, outcome: Result<Vec<SearchResult>, CatalogError>) {
        let mut inflight = self.lock();
        if token.is_cancelled() {
            debug!("Discarding result of a superseded search");
            return;
        }
        *inflight = None;

        self.state.send_modify(|state| {
            state.is_loading = false;
            match outcome {
                Ok(results) => {
                    state.results = results;
                    state.error = None;
                }
                Err(CatalogError::Cancelled) => {}
                Err(e) => {
                    debug!(query = %state.query, "Search failed: {}", e);
                    state.results.clear();
                    state.error = Some(e.user_message());
                }
            }
        });
    }
}

/// Turns a changing query into `{results, is_loading, error}`.
///
/// Each qualifying query starts one lookup and cancels the previous one.
/// Cancelling and committing both happen under one lock, and a lookup whose
/// token has been cancelled is never committed, so a slow response for an old
/// query cannot overwrite the state of a newer one.
///
/// Lookups run on spawned tasks, so the controller must be used inside a
/// tokio runtime. Dropping it cancels the lookup in flight.
pub struct SearchController {
    catalog: Arc<dyn MovieCatalog>,
    settings: SearchSettings,
    shared: Arc<Shared>,
}

impl SearchController {
    pub fn new(catalog: Arc<dyn MovieCatalog>, settings: SearchSettings) -> Self {
        let (state, _) = watch::channel(SearchState::default());
        Self {
            catalog,
            settings,
            shared: Arc::new(Shared {
                inflight: Mutex::new(None),
                state,
            }),
        }
    }

    /// Set the query. Returns the lookup task when one was started.
    pub fn set_query(&self, query: impl Into<String>) -> Option<JoinHandle<()>> {
        let query = query.into();
        let mut inflight = self.shared.lock();

        if let Some(previous) = inflight.take() {
            debug!(query = %query, "Superseding in-flight search");
            previous.cancel();
        }

        if query.chars().count() < self.settings.min_query_len {
            self.shared.state.send_modify(|state| {
                state.query = query;
                state.results.clear();
                state.error = None;
                state.is_loading = false;
            });
            return None;
        }

        let token = CancellationToken::new();
        *inflight = Some(token.clone());

        self.shared.state.send_modify(|state| {
            state.query = query.clone();
            state.error = None;
            state.is_loading = true;
        });

        let catalog = self.catalog.clone();
        let shared = self.shared.clone();
        let settings = self.settings.clone();

        Some(tokio::spawn(async move {
            let outcome = lookup(catalog.as_ref(), &query, &settings, &token).await;
            shared.commit(&token, outcome);
        }))
    }

    /// Abort the lookup in flight, if any.
    pub fn cancel(&self) {
        let mut inflight = self.shared.lock();
        if let Some(token) = inflight.take() {
            token.cancel();
            self.shared.state.send_modify(|state| state.is_loading = false);
        }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> SearchState {
        self.shared.state.borrow().clone()
    }

    /// Receive every state change.
    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.shared.state.subscribe()
    }
}

impl Drop for SearchController {
    fn drop(&mut self) {
        if let Some(token) = self.shared.lock().take() {
            token.cancel();
        }
    }
}

async fn lookup(
    catalog: &dyn MovieCatalog,
    query: &str,
    settings: &SearchSettings,
    token: &CancellationToken,
) -> Result<Vec<SearchResult>, CatalogError> {
    if !settings.debounce.is_zero() {
        tokio::select! {
            _ = token.cancelled() => return Err(CatalogError::Cancelled),
            _ = tokio::time::sleep(settings.debounce) => {}
        }
    }

    let started = Instant::now();
    let search = catalog.search(query, token);
    let result = match tokio::time::timeout(settings.request_timeout, search).await {
        Ok(result) => result,
        Err(_) => Err(CatalogError::Timeout),
    };

    let label = match &result {
        Ok(_) => "ok",
        Err(e) => e.kind(),
    };
    record_catalog_request("search", label, started);

    result
}
