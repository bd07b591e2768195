//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the catalog and backend
//! traits, so controllers and the synchronizer can be tested without network
//! access.
//!
//! # Example
//!
//! ```rust,ignore
//! use popcorn_core::testing::{fixtures, MockCatalog, MockWatchedBackend};
//!
//! let catalog = MockCatalog::new();
//! catalog.set_movies(fixtures::batman_movies()).await;
//!
//! let backend = MockWatchedBackend::new();
//! backend.set_latency(Duration::from_millis(200)).await;
//! ```

mod mock_backend;
mod mock_catalog;

pub use mock_backend::{MockWatchedBackend, RecordedBackendCall};
pub use mock_catalog::{MockCatalog, RecordedCatalogCall};

/// Test fixtures and helper functions.
pub mod fixtures {
    use chrono::{NaiveDate, Utc};

    use crate::catalog::MovieDetail;
    use crate::watched::{NewWatchedEntry, UserRating, WatchedEntry};

    /// Create a movie detail with reasonable defaults.
    pub fn movie(imdb_id: &str, title: &str, year: i32) -> MovieDetail {
        MovieDetail {
            imdb_id: imdb_id.to_string(),
            title: title.to_string(),
            runtime: Some("120 min".to_string()),
            genre: vec!["Drama".to_string()],
            actors: vec!["Jane Doe".to_string(), "John Roe".to_string()],
            director: Some("Some Director".to_string()),
            plot: Some(format!("A movie about {}.", title.to_lowercase())),
            poster: Some(format!("https://img.example/{}.jpg", imdb_id)),
            released: Some(format!("15 Jun {}", year)),
            imdb_rating: Some(7.5),
        }
    }

    /// Three Batman movies, all matching the query "bat".
    pub fn batman_movies() -> Vec<MovieDetail> {
        vec![
            movie("tt0372784", "Batman Begins", 2005),
            movie("tt0096895", "Batman", 1989),
            movie("tt2975590", "Batman v Superman: Dawn of Justice", 2016),
        ]
    }

    /// Create an unsaved entry.
    pub fn new_entry(imdb_id: &str, title: &str, rating: u8) -> NewWatchedEntry {
        NewWatchedEntry {
            imdb_id: imdb_id.to_string(),
            title: title.to_string(),
            released: NaiveDate::from_ymd_opt(2010, 7, 16).unwrap_or_default(),
            runtime: 120,
            genre: vec!["Drama".to_string()],
            actors: vec!["Jane Doe".to_string()],
            director: None,
            poster: None,
            imdb_rating: Some(7.5),
            user_rating: UserRating::new(rating).expect("fixture rating must be 1..=10"),
            description: None,
        }
    }

    /// Create a saved entry.
    pub fn watched_entry(imdb_id: &str, title: &str, rating: u8) -> WatchedEntry {
        let entry = new_entry(imdb_id, title, rating);
        let now = Utc::now();
        WatchedEntry {
            id: format!("id-{}", imdb_id),
            imdb_id: entry.imdb_id,
            title: entry.title,
            released: entry.released,
            runtime: entry.runtime,
            genre: entry.genre,
            actors: entry.actors,
            director: entry.director,
            poster: entry.poster,
            imdb_rating: entry.imdb_rating,
            user_rating: entry.user_rating,
            description: entry.description,
            created_at: now,
            updated_at: now,
        }
    }
}
