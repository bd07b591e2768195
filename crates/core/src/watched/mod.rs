//! The watched list: entry model, HTTP body adapter, and persistence.

mod request;
mod sqlite_store;
mod store;
mod types;

pub use request::{AddWatchedRequest, FlexNumber, StringList};
pub use sqlite_store::SqliteWatchedStore;
pub use store::{WatchedError, WatchedStore};
pub use types::{resolve_release_date, EntryDefaults, NewWatchedEntry, UserRating, WatchedEntry};
