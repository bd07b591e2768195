//! Watched-list synchronizer.
//!
//! [`WatchedList`] owns the local copy of the list and applies add/remove
//! only after the [`WatchedBackend`] confirms them.

mod backend;
mod list;
mod summary;

pub use backend::{HttpWatchedBackend, LocalWatchedBackend, SyncError, WatchedBackend};
pub use list::{SyncSettings, WatchedList};
pub use summary::WatchedSummary;
