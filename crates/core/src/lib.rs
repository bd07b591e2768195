pub mod catalog;
pub mod config;
pub mod metrics;
pub mod search;
pub mod sync;
pub mod testing;
pub mod watched;

pub use catalog::{
    CatalogError, MovieCatalog, MovieDetail, OmdbClient, OmdbConfig, SearchResult,
};
pub use config::{
    load_config, load_config_from_str, validate_config, ClientConfig, Config, ConfigError,
    DatabaseConfig, SanitizedConfig, ServerConfig,
};
pub use search::{DetailController, DetailState, SearchController, SearchSettings, SearchState};
pub use sync::{
    HttpWatchedBackend, LocalWatchedBackend, SyncError, SyncSettings, WatchedBackend,
    WatchedList, WatchedSummary,
};
pub use watched::{
    AddWatchedRequest, EntryDefaults, NewWatchedEntry, SqliteWatchedStore, UserRating,
    WatchedEntry, WatchedError, WatchedStore,
};
