//! Detail lookup for the selected movie.
//!
//! Unlike search, a failed lookup is not shown to the user: the detail stays
//! empty and the failure is logged.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::catalog::{CatalogError, MovieCatalog, MovieDetail};
use crate::metrics::record_catalog_request;

/// The selected movie and whatever has been loaded for it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetailState {
    pub selected: Option<String>,
    /// Empty until the lookup for `selected` succeeds.
    pub detail: MovieDetail,
    pub is_loading: bool,
}

struct Shared {
    inflight: Mutex<Option<CancellationToken>>,
    state: watch::Sender<DetailState>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Option<CancellationToken>> {
        self.inflight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn commit(&self, token: &CancellationToken, outcome: Result<MovieDetail, CatalogError>) {
        let mut inflight = self.lock();
        if token.is_cancelled() {
            debug!("Discarding detail for a previous selection");
            return;
        }
        *inflight = None;

        self.state.send_modify(|state| {
            state.is_loading = false;
            match outcome {
                Ok(detail) => state.detail = detail,
                Err(e) => {
                    if !e.is_cancelled() {
                        warn!(
                            imdb_id = state.selected.as_deref().unwrap_or("-"),
                            "Detail lookup failed: {}", e
                        );
                    }
                    state.detail = MovieDetail::default();
                }
            }
        });
    }
}

/// Fetches one [`MovieDetail`] per selection, cancelling on reselect or clear.
pub struct DetailController {
    catalog: Arc<dyn MovieCatalog>,
    request_timeout: Duration,
    shared: Arc<Shared>,
}

impl DetailController {
    pub fn new(catalog: Arc<dyn MovieCatalog>, request_timeout: Duration) -> Self {
        let (state, _) = watch::channel(DetailState::default());
        Self {
            catalog,
            request_timeout,
            shared: Arc::new(Shared {
                inflight: Mutex::new(None),
                state,
            }),
        }
    }

    /// Select a movie and fetch its detail.
    ///
    /// Selecting the movie that is already selected does nothing, even when its
    /// lookup failed. Retry with [`clear`](Self::clear) or
    /// [`toggle`](Self::toggle) followed by another `select`.
    pub fn select(&self, imdb_id: &str) -> Option<JoinHandle<()>> {
        let mut inflight = self.shared.lock();
        if self.shared.state.borrow().selected.as_deref() == Some(imdb_id) {
            return None;
        }

        if let Some(previous) = inflight.take() {
            previous.cancel();
        }

        let token = CancellationToken::new();
        *inflight = Some(token.clone());

        self.shared.state.send_modify(|state| {
            state.selected = Some(imdb_id.to_string());
            state.detail = MovieDetail::default();
            state.is_loading = true;
        });

        let catalog = self.catalog.clone();
        let shared = self.shared.clone();
        let request_timeout = self.request_timeout;
        let imdb_id = imdb_id.to_string();

        Some(tokio::spawn(async move {
            let started = Instant::now();
            let outcome =
                match tokio::time::timeout(request_timeout, catalog.detail(&imdb_id, &token)).await
                {
                    Ok(result) => result,
                    Err(_) => Err(CatalogError::Timeout),
                };

            let label = match &outcome {
                Ok(_) => "ok",
                Err(e) => e.kind(),
            };
            record_catalog_request("detail", label, started);

            shared.commit(&token, outcome);
        }))
    }

    /// Select `imdb_id`, or clear the selection if it is already selected.
    pub fn toggle(&self, imdb_id: &str) -> Option<JoinHandle<()>> {
        if self.selected().as_deref() == Some(imdb_id) {
            self.clear();
            None
        } else {
            self.select(imdb_id)
        }
    }

    /// Drop the selection along with any partially loaded detail.
    pub fn clear(&self) {
        let mut inflight = self.shared.lock();
        if let Some(token) = inflight.take() {
            token.cancel();
        }
        self.shared.state.send_replace(DetailState::default());
    }

    pub fn selected(&self) -> Option<String> {
        self.shared.state.borrow().selected.clone()
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> DetailState {
        self.shared.state.borrow().clone()
    }

    /// Receive every state change.
    pub fn subscribe(&self) -> watch::Receiver<DetailState> {
        self.shared.state.subscribe()
    }
}

impl Drop for DetailController {
    fn drop(&mut self) {
        if let Some(token) = self.shared.lock().take() {
            token.cancel();
        }
    }
}
