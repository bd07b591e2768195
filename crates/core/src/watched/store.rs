//! Watched-list storage trait and error type.

use std::fmt;

use super::{NewWatchedEntry, WatchedEntry};

/// Error type for watched-list storage.
#[derive(Debug)]
pub enum WatchedError {
    /// A required field is missing or malformed.
    Validation(String),
    /// The identifier is already on the list.
    Duplicate(String),
    /// Database error.
    Database(String),
}

impl fmt::Display for WatchedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WatchedError::Validation(msg) => write!(f, "Invalid entry: {}", msg),
            WatchedError::Duplicate(imdb_id) => write!(f, "Already watched: {}", imdb_id),
            WatchedError::Database(msg) => write!(f, "Database error: {}", msg),
        }
    }
}

impl std::error::Error for WatchedError {}

/// Trait for watched-list storage backends (the "watchedMovies" collection).
pub trait WatchedStore: Send + Sync {
    /// All entries, in insertion order.
    fn list(&self) -> Result<Vec<WatchedEntry>, WatchedError>;

    /// Persist a new entry, assigning its id and timestamps.
    fn insert(&self, entry: NewWatchedEntry) -> Result<WatchedEntry, WatchedError>;

    /// Get an entry by its external identifier.
    fn get(&self, imdb_id: &str) -> Result<Option<WatchedEntry>, WatchedError>;

    /// Delete the entry with this external identifier.
    /// Returns false when there was none.
    fn delete_by_imdb_id(&self, imdb_id: &str) -> Result<bool, WatchedError>;

    /// Number of stored entries.
    fn count(&self) -> Result<i64, WatchedError>;
}
