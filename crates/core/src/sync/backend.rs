//! Persistence backends for the watched-list synchronizer.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::watched::{AddWatchedRequest, NewWatchedEntry, WatchedEntry, WatchedError, WatchedStore};

/// Errors from watched-list synchronization.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The identifier is already on the local list.
    #[error("Already on the watched list: {0}")]
    AlreadyWatched(String),

    /// The movie record cannot become a watched entry.
    #[error("Invalid entry: {0}")]
    InvalidEntry(String),

    /// The operation was torn down before it finished.
    #[error("Request cancelled")]
    Cancelled,

    /// The operation did not finish within its time budget.
    #[error("Request timed out")]
    Timeout,

    /// The store rejected the operation.
    #[error(transparent)]
    Store(#[from] WatchedError),

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(reqwest::Error),

    /// Backend returned a non-success status.
    #[error("Backend error: {status} - {message}")]
    Backend { status: u16, message: String },

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    Parse(String),
}

impl SyncError {
    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            SyncError::AlreadyWatched(_)
            | SyncError::InvalidEntry(_)
            | SyncError::Store(WatchedError::Duplicate(_))
            | SyncError::Store(WatchedError::Validation(_)) => "rejected",
            SyncError::Cancelled => "cancelled",
            SyncError::Timeout => "timeout",
            _ => "error",
        }
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            SyncError::Timeout
        } else {
            SyncError::Http(e)
        }
    }
}

/// Where the synchronizer sends list reads and mutations.
#[async_trait]
pub trait WatchedBackend: Send + Sync {
    /// Fetch the whole list.
    async fn list(&self, cancel: &CancellationToken) -> Result<Vec<WatchedEntry>, SyncError>;

    /// Persist an entry and return the stored record.
    async fn add(
        &self,
        entry: &NewWatchedEntry,
        cancel: &CancellationToken,
    ) -> Result<WatchedEntry, SyncError>;

    /// Delete by external identifier. Deleting an unknown id succeeds.
    async fn remove(&self, imdb_id: &str, cancel: &CancellationToken) -> Result<(), SyncError>;
}

// ============================================================================
// HTTP backend
// ============================================================================

/// Talks to the `/movies` HTTP surface.
pub struct HttpWatchedBackend {
    client: Client,
    base_url: String,
}

impl HttpWatchedBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, SyncError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn movie_url(&self, imdb_id: &str) -> String {
        format!(
            "{}/movies/{}",
            self.base_url,
            urlencoding::encode(imdb_id)
        )
    }

    async fn fetch_list(&self) -> Result<Vec<WatchedEntry>, SyncError> {
        let url = format!("{}/movies", self.base_url);
        debug!("Fetching watched list: {}", url);

        let response = self.client.get(&url).send().await?;
        let response = check_status(response, None).await?;

        response
            .json::<Vec<WatchedEntry>>()
            .await
            .map_err(|e| SyncError::Parse(e.to_string()))
    }

    async fn post_entry(&self, entry: &NewWatchedEntry) -> Result<WatchedEntry, SyncError> {
        let url = self.movie_url(&entry.imdb_id);
        debug!("Adding watched entry: {}", url);

        let response = self
            .client
            .post(&url)
            .json(&AddWatchedRequest::from_entry(entry))
            .send()
            .await?;
        let response = check_status(response, Some(&entry.imdb_id)).await?;

        response
            .json::<WatchedEntry>()
            .await
            .map_err(|e| SyncError::Parse(e.to_string()))
    }

    async fn delete_entry(&self, imdb_id: &str) -> Result<(), SyncError> {
        let url = self.movie_url(imdb_id);
        debug!("Removing watched entry: {}", url);

        let response = self
            .client
            .delete(&url)
            .query(&[("id", imdb_id)])
            .send()
            .await?;
        check_status(response, Some(imdb_id)).await?;

        Ok(())
    }
}

/// Map an error status to [`SyncError`], passing successful responses through.
async fn check_status(
    response: reqwest::Response,
    imdb_id: Option<&str>,
) -> Result<reqwest::Response, SyncError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
        .unwrap_or(body);

    Err(match status {
        StatusCode::CONFLICT => {
            SyncError::Store(WatchedError::Duplicate(imdb_id.unwrap_or_default().to_string()))
        }
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY if imdb_id.is_some() => {
            SyncError::Store(WatchedError::Validation(message))
        }
        _ => SyncError::Backend {
            status: status.as_u16(),
            message,
        },
    })
}

#[async_trait]
impl WatchedBackend for HttpWatchedBackend {
    async fn list(&self, cancel: &CancellationToken) -> Result<Vec<WatchedEntry>, SyncError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(SyncError::Cancelled),
            result = self.fetch_list() => result,
        }
    }

    async fn add(
        &self,
        entry: &NewWatchedEntry,
        cancel: &CancellationToken,
    ) -> Result<WatchedEntry, SyncError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(SyncError::Cancelled),
            result = self.post_entry(entry) => result,
        }
    }

    async fn remove(&self, imdb_id: &str, cancel: &CancellationToken) -> Result<(), SyncError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(SyncError::Cancelled),
            result = self.delete_entry(imdb_id) => result,
        }
    }
}

// ============================================================================
// Local backend
// ============================================================================

/// Calls a [`WatchedStore`] in-process.
///
/// Store calls are short and cannot be interrupted once started, so the token
/// is only checked before each call.
pub struct LocalWatchedBackend {
    store: Arc<dyn WatchedStore>,
}

impl LocalWatchedBackend {
    pub fn new(store: Arc<dyn WatchedStore>) -> Self {
        Self { store }
    }

    async fn run<T, F>(&self, cancel: &CancellationToken, op: F) -> Result<T, SyncError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn WatchedStore) -> Result<T, WatchedError> + Send + 'static,
    {
        if cancel.is_cancelled() {
            return Err(SyncError::Cancelled);
        }

        let store = self.store.clone();
        tokio::task::spawn_blocking(move || op(store.as_ref()))
            .await
            .map_err(|e| {
                SyncError::Store(WatchedError::Database(format!("store task failed: {}", e)))
            })?
            .map_err(SyncError::from)
    }
}

#[async_trait]
impl WatchedBackend for LocalWatchedBackend {
    async fn list(&self, cancel: &CancellationToken) -> Result<Vec<WatchedEntry>, SyncError> {
        self.run(cancel, |store| store.list()).await
    }

    async fn add(
        &self,
        entry: &NewWatchedEntry,
        cancel: &CancellationToken,
    ) -> Result<WatchedEntry, SyncError> {
        let entry = entry.clone();
        self.run(cancel, move |store| store.insert(entry)).await
    }

    async fn remove(&self, imdb_id: &str, cancel: &CancellationToken) -> Result<(), SyncError> {
        let imdb_id = imdb_id.to_string();
        self.run(cancel, move |store| store.delete_by_imdb_id(&imdb_id).map(|_| ()))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;
    use crate::watched::SqliteWatchedStore;

    fn local_backend() -> LocalWatchedBackend {
        LocalWatchedBackend::new(Arc::new(SqliteWatchedStore::in_memory().unwrap()))
    }

    #[tokio::test]
    async fn test_local_backend_add_list_remove() {
        let backend = local_backend();
        let cancel = CancellationToken::new();

        let created = backend
            .add(&fixtures::new_entry("tt1375666", "Inception", 8), &cancel)
            .await
            .unwrap();
        assert_eq!(created.imdb_id, "tt1375666");

        let list = backend.list(&cancel).await.unwrap();
        assert_eq!(list.len(), 1);

        backend.remove("tt1375666", &cancel).await.unwrap();
        backend.remove("tt-missing", &cancel).await.unwrap();
        assert!(backend.list(&cancel).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_local_backend_duplicate() {
        let backend = local_backend();
        let cancel = CancellationToken::new();
        let entry = fixtures::new_entry("tt1375666", "Inception", 8);

        backend.add(&entry, &cancel).await.unwrap();
        let err = backend.add(&entry, &cancel).await.unwrap_err();
        assert!(matches!(err, SyncError::Store(WatchedError::Duplicate(_))));
        assert_eq!(err.kind(), "rejected");
    }

    #[tokio::test]
    async fn test_local_backend_respects_cancelled_token() {
        let backend = local_backend();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = backend
            .add(&fixtures::new_entry("tt1", "First", 5), &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Cancelled));
        assert!(backend
            .list(&CancellationToken::new())
            .await
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_http_backend_url_building() {
        let backend =
            HttpWatchedBackend::new("http://127.0.0.1:8800/", Duration::from_secs(5)).unwrap();
        assert_eq!(
            backend.movie_url("tt1375666"),
            "http://127.0.0.1:8800/movies/tt1375666"
        );
        assert_eq!(
            backend.movie_url("a b/c"),
            "http://127.0.0.1:8800/movies/a%20b%2Fc"
        );
    }
}
