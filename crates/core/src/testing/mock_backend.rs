//! Mock watched-list backend for testing.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::sync::{SyncError, WatchedBackend};
use crate::watched::{NewWatchedEntry, WatchedEntry, WatchedError};

/// A recorded backend call for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedBackendCall {
    List,
    Add { imdb_id: String },
    Remove { imdb_id: String },
}

/// Mock implementation of the WatchedBackend trait.
///
/// Stores entries in memory, enforces one entry per identifier like the real
/// store, and supports latency and error injection.
#[derive(Debug)]
pub struct MockWatchedBackend {
    entries: Arc<RwLock<Vec<WatchedEntry>>>,
    latency: Arc<RwLock<Duration>>,
    /// Delay after a mutation is applied, before it is acknowledged.
    ack_delay: Arc<RwLock<Duration>>,
    calls: Arc<RwLock<Vec<RecordedBackendCall>>>,
    /// If set, the next operation will fail with this error.
    next_error: Arc<RwLock<Option<SyncError>>>,
}

impl Default for MockWatchedBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockWatchedBackend {
    /// Create a new empty mock backend.
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(Vec::new())),
            latency: Arc::new(RwLock::new(Duration::ZERO)),
            ack_delay: Arc::new(RwLock::new(Duration::ZERO)),
            calls: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Replace the stored entries.
    pub async fn set_entries(&self, entries: Vec<WatchedEntry>) {
        *self.entries.write().await = entries;
    }

    /// Current stored entries.
    pub async fn entries(&self) -> Vec<WatchedEntry> {
        self.entries.read().await.clone()
    }

    /// Delay every call.
    pub async fn set_latency(&self, latency: Duration) {
        *self.latency.write().await = latency;
    }

    /// Delay acknowledging add and remove after they are applied.
    ///
    /// Simulates a backend that commits but answers too late for the caller.
    pub async fn set_ack_delay(&self, delay: Duration) {
        *self.ack_delay.write().await = delay;
    }

    /// Wait out the acknowledgement delay. Not interrupted by cancellation.
    async fn acknowledge(&self) {
        let delay = *self.ack_delay.read().await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    /// Configure the next operation to fail with the given error.
    pub async fn set_next_error(&self, error: SyncError) {
        *self.next_error.write().await = Some(error);
    }

    /// Get all recorded calls.
    pub async fn recorded_calls(&self) -> Vec<RecordedBackendCall> {
        self.calls.read().await.clone()
    }

    /// Number of add calls that reached the backend.
    pub async fn add_calls(&self) -> usize {
        self.calls
            .read()
            .await
            .iter()
            .filter(|c| matches!(c, RecordedBackendCall::Add { .. }))
            .count()
    }

    /// Record the call, wait out the latency and surface any injected error.
    async fn begin(
        &self,
        call: RecordedBackendCall,
        cancel: &CancellationToken,
    ) -> Result<(), SyncError> {
        self.calls.write().await.push(call);
        let injected = self.next_error.write().await.take();
        let latency = *self.latency.read().await;

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(SyncError::Cancelled),
            _ = tokio::time::sleep(latency) => {}
        }

        match injected {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl WatchedBackend for MockWatchedBackend {
    async fn list(&self, cancel: &CancellationToken) -> Result<Vec<WatchedEntry>, SyncError> {
        self.begin(RecordedBackendCall::List, cancel).await?;
        Ok(self.entries.read().await.clone())
    }

    async fn add(
        &self,
        entry: &NewWatchedEntry,
        cancel: &CancellationToken,
    ) -> Result<WatchedEntry, SyncError> {
        self.begin(
            RecordedBackendCall::Add {
                imdb_id: entry.imdb_id.clone(),
            },
            cancel,
        )
        .await?;
        entry.validate()?;

        let mut entries = self.entries.write().await;
        if entries.iter().any(|e| e.imdb_id == entry.imdb_id) {
            return Err(WatchedError::Duplicate(entry.imdb_id.clone()).into());
        }

        let now = Utc::now();
        let created = WatchedEntry {
            id: uuid::Uuid::new_v4().simple().to_string(),
            imdb_id: entry.imdb_id.clone(),
            title: entry.title.clone(),
            released: entry.released,
            runtime: entry.runtime,
            genre: entry.genre.clone(),
            actors: entry.actors.clone(),
            director: entry.director.clone(),
            poster: entry.poster.clone(),
            imdb_rating: entry.imdb_rating,
            user_rating: entry.user_rating,
            description: entry.description.clone(),
            created_at: now,
            updated_at: now,
        };
        entries.push(created.clone());
        drop(entries);

        self.acknowledge().await;
        Ok(created)
    }

    async fn remove(&self, imdb_id: &str, cancel: &CancellationToken) -> Result<(), SyncError> {
        self.begin(
            RecordedBackendCall::Remove {
                imdb_id: imdb_id.to_string(),
            },
            cancel,
        )
        .await?;

        self.entries.write().await.retain(|e| e.imdb_id != imdb_id);

        self.acknowledge().await;
        Ok(())
    }
}
