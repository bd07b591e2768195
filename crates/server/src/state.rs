use popcorn_core::{Config, EntryDefaults, SanitizedConfig, WatchedStore};
use std::sync::Arc;

/// Shared application state
pub struct AppState {
    config: Config,
    store: Arc<dyn WatchedStore>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn WatchedStore>) -> Self {
        Self { config, store }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    /// The "watchedMovies" collection.
    pub fn store(&self) -> &dyn WatchedStore {
        self.store.as_ref()
    }

    /// Fallbacks applied to incoming entries.
    pub fn defaults(&self) -> &EntryDefaults {
        &self.config.defaults
    }
}
