//! The locally held watched list, kept in step with a [`WatchedBackend`].

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::{SyncError, WatchedBackend, WatchedSummary};
use crate::catalog::MovieDetail;
use crate::config::Config;
use crate::metrics::SYNC_OPERATIONS;
use crate::watched::{EntryDefaults, NewWatchedEntry, UserRating, WatchedEntry};

/// Settings for [`WatchedList`].
#[derive(Debug, Clone)]
pub struct SyncSettings {
    /// Upper bound for each backend call.
    pub request_timeout: Duration,
    /// Fallbacks for fields a movie record lacks.
    pub defaults: EntryDefaults,
}

impl SyncSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            request_timeout: config.client.request_timeout(),
            defaults: config.defaults.clone(),
        }
    }
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Marks the list busy for as long as it lives.
struct BusyGuard<'a>(&'a AtomicUsize);

impl<'a> BusyGuard<'a> {
    fn new(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// The user's watched list.
///
/// Local state only changes after the backend confirms an operation. Mutations
/// are applied one at a time, so two racing adds of the same movie cannot both
/// pass the membership check.
///
/// A timed-out add or remove may still have been applied by the backend, so
/// the list is reloaded after one before the timeout is reported.
pub struct WatchedList {
    backend: Arc<dyn WatchedBackend>,
    settings: SyncSettings,
    entries: RwLock<Vec<WatchedEntry>>,
    mutation: Mutex<()>,
    busy: AtomicUsize,
    shutdown: CancellationToken,
}

impl WatchedList {
    pub fn new(backend: Arc<dyn WatchedBackend>, settings: SyncSettings) -> Self {
        Self {
            backend,
            settings,
            entries: RwLock::new(Vec::new()),
            mutation: Mutex::new(()),
            busy: AtomicUsize::new(0),
            shutdown: CancellationToken::new(),
        }
    }

    /// Replace the local list with the backend's.
    pub async fn load(&self) -> Result<(), SyncError> {
        let _busy = BusyGuard::new(&self.busy);
        let _serial = self.mutation.lock().await;

        let result = self.fetch_all().await;
        record("load", &result);

        match result {
            Ok(entries) => {
                info!("Loaded {} watched entries", entries.len());
                *self.write_entries() = entries;
                Ok(())
            }
            Err(e) => {
                log_failure("load", None, &e);
                Err(e)
            }
        }
    }

    /// Rate a looked-up movie and add it to the list.
    pub async fn add(
        &self,
        detail: &MovieDetail,
        rating: UserRating,
    ) -> Result<WatchedEntry, SyncError> {
        let _busy = BusyGuard::new(&self.busy);
        let _serial = self.mutation.lock().await;

        let result = self.add_serialized(detail, rating).await;
        record("add", &result);
        if matches!(result, Err(SyncError::Timeout)) {
            self.reconcile("add").await;
        }

        match result {
            Ok(entry) => {
                info!(imdb_id = %entry.imdb_id, "Added '{}' to watched list", entry.title);
                Ok(entry)
            }
            Err(e) => {
                log_failure("add", Some(&detail.imdb_id), &e);
                Err(e)
            }
        }
    }

    async fn add_serialized(
        &self,
        detail: &MovieDetail,
        rating: UserRating,
    ) -> Result<WatchedEntry, SyncError> {
        if detail.is_empty() || detail.imdb_id.trim().is_empty() {
            return Err(SyncError::InvalidEntry("no movie selected".to_string()));
        }
        if self.contains(&detail.imdb_id) {
            return Err(SyncError::AlreadyWatched(detail.imdb_id.clone()));
        }

        let entry = NewWatchedEntry::from_detail(detail, rating, &self.settings.defaults);
        entry
            .validate()
            .map_err(|e| SyncError::InvalidEntry(e.to_string()))?;

        let cancel = self.shutdown.child_token();
        let created = self.bounded(&cancel, self.backend.add(&entry, &cancel)).await?;

        self.write_entries().push(created.clone());
        Ok(created)
    }

    /// Delete an entry by external identifier.
    ///
    /// An id that is not on the list is a successful no-op.
    pub async fn remove(&self, imdb_id: &str) -> Result<(), SyncError> {
        let _busy = BusyGuard::new(&self.busy);
        let _serial = self.mutation.lock().await;

        let cancel = self.shutdown.child_token();
        let result = self
            .bounded(&cancel, self.backend.remove(imdb_id, &cancel))
            .await;
        record("remove", &result);
        if matches!(result, Err(SyncError::Timeout)) {
            self.reconcile("remove").await;
        }

        match result {
            Ok(()) => {
                let mut entries = self.write_entries();
                let before = entries.len();
                entries.retain(|e| e.imdb_id != imdb_id);
                if entries.len() < before {
                    info!(imdb_id, "Removed from watched list");
                } else {
                    debug!(imdb_id, "Remove of an id not on the list");
                }
                Ok(())
            }
            Err(e) => {
                log_failure("remove", Some(imdb_id), &e);
                Err(e)
            }
        }
    }

    /// Snapshot of the current list.
    pub fn list(&self) -> Vec<WatchedEntry> {
        self.read_entries().clone()
    }

    pub fn contains(&self, imdb_id: &str) -> bool {
        self.read_entries().iter().any(|e| e.imdb_id == imdb_id)
    }

    /// The rating previously given to this movie, if it is on the list.
    pub fn user_rating_for(&self, imdb_id: &str) -> Option<UserRating> {
        self.read_entries()
            .iter()
            .find(|e| e.imdb_id == imdb_id)
            .map(|e| e.user_rating)
    }

    pub fn summary(&self) -> WatchedSummary {
        WatchedSummary::from_entries(&self.read_entries())
    }

    /// True while a load, add or remove is in flight.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst) > 0
    }

    /// Abort in-flight backend calls. Later calls fail with [`SyncError::Cancelled`].
    pub fn cancel(&self) {
        self.shutdown.cancel();
    }

    async fn fetch_all(&self) -> Result<Vec<WatchedEntry>, SyncError> {
        let cancel = self.shutdown.child_token();
        self.bounded(&cancel, self.backend.list(&cancel)).await
    }

    /// Re-read the backend after a timed-out mutation. Caller holds `mutation`.
    async fn reconcile(&self, operation: &str) {
        match self.fetch_all().await {
            Ok(entries) => {
                debug!(
                    "Reloaded {} watched entries after {} timeout",
                    entries.len(),
                    operation
                );
                *self.write_entries() = entries;
            }
            Err(e) => warn!("Reload after {} timeout failed: {}", operation, e),
        }
    }

    async fn bounded<T>(
        &self,
        cancel: &CancellationToken,
        call: impl Future<Output = Result<T, SyncError>>,
    ) -> Result<T, SyncError> {
        match tokio::time::timeout(self.settings.request_timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                cancel.cancel();
                Err(SyncError::Timeout)
            }
        }
    }

    fn read_entries(&self) -> RwLockReadGuard<'_, Vec<WatchedEntry>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_entries(&self) -> RwLockWriteGuard<'_, Vec<WatchedEntry>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for WatchedList {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

fn record<T>(operation: &str, result: &Result<T, SyncError>) {
    let label = match result {
        Ok(_) => "ok",
        Err(e) => e.kind(),
    };
    SYNC_OPERATIONS.with_label_values(&[operation, label]).inc();
}

fn log_failure(operation: &str, imdb_id: Option<&str>, e: &SyncError) {
    let imdb_id = imdb_id.unwrap_or("-");
    match e.kind() {
        "cancelled" => debug!(imdb_id, "Watched-list {} cancelled", operation),
        "rejected" => warn!(imdb_id, "Watched-list {} rejected: {}", operation, e),
        _ => error!(imdb_id, "Watched-list {} failed: {}", operation, e),
    }
}
