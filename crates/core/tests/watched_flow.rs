//! End-to-end flow through the client core.
//!
//! Search, select, rate and save, then delete, with a mock catalog in front
//! and a file-backed SQLite store behind the synchronizer.

use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use popcorn_core::{
    catalog::NO_MATCHES_MESSAGE,
    testing::{fixtures, MockCatalog},
    DetailController, LocalWatchedBackend, SearchController, SearchSettings, SqliteWatchedStore,
    SyncSettings, UserRating, WatchedList, WatchedStore,
};

/// Test helper wiring the controllers and the synchronizer together.
struct TestHarness {
    search: SearchController,
    details: DetailController,
    watched: WatchedList,
    store: Arc<SqliteWatchedStore>,
    _temp_dir: TempDir,
}

impl TestHarness {
    async fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = Arc::new(
            SqliteWatchedStore::new(&temp_dir.path().join("watched.db"))
                .expect("Failed to create watched store"),
        );

        let catalog = Arc::new(MockCatalog::new());
        catalog.set_movies(fixtures::batman_movies()).await;

        let backend = Arc::new(LocalWatchedBackend::new(store.clone()));

        Self {
            search: SearchController::new(catalog.clone(), SearchSettings::default()),
            details: DetailController::new(catalog, Duration::from_secs(10)),
            watched: WatchedList::new(backend, SyncSettings::default()),
            store,
            _temp_dir: temp_dir,
        }
    }
}

#[tokio::test]
async fn test_search_rate_save_delete() {
    let harness = TestHarness::new().await;
    harness.watched.load().await.unwrap();
    assert!(harness.watched.list().is_empty());

    // "bat" finds movies.
    harness.search.set_query("bat").unwrap().await.unwrap();
    let state = harness.search.state();
    assert!(!state.results.is_empty());
    assert!(state.error.is_none());

    // "xyzxyz123" finds nothing.
    harness.search.set_query("xyzxyz123").unwrap().await.unwrap();
    let state = harness.search.state();
    assert!(state.results.is_empty());
    assert_eq!(state.error.as_deref(), Some(NO_MATCHES_MESSAGE));

    // Back to "bat", select the first hit and rate it 8.
    harness.search.set_query("bat").unwrap().await.unwrap();
    let first = harness.search.state().results[0].clone();
    harness
        .details
        .select(&first.imdb_id)
        .unwrap()
        .await
        .unwrap();
    let detail = harness.details.state().detail;
    assert_eq!(detail.imdb_id, first.imdb_id);

    let entry = harness
        .watched
        .add(&detail, UserRating::new(8).unwrap())
        .await
        .unwrap();
    assert_eq!(entry.user_rating.get(), 8);
    assert_eq!(harness.watched.list(), vec![entry.clone()]);
    assert_eq!(
        harness.store.get(&first.imdb_id).unwrap().map(|e| e.id),
        Some(entry.id.clone())
    );

    let summary = harness.watched.summary();
    assert_eq!(summary.count, 1);
    assert_eq!(summary.avg_user_rating, 8.0);

    // Delete it again.
    harness.watched.remove(&first.imdb_id).await.unwrap();
    assert!(!harness.watched.contains(&first.imdb_id));
    assert_eq!(harness.store.count().unwrap(), 0);
}

#[tokio::test]
async fn test_reload_sees_persisted_entries() {
    let harness = TestHarness::new().await;
    harness
        .watched
        .add(
            &fixtures::movie("tt1375666", "Inception", 2010),
            UserRating::new(9).unwrap(),
        )
        .await
        .unwrap();

    let reopened = WatchedList::new(
        Arc::new(LocalWatchedBackend::new(harness.store.clone())),
        SyncSettings::default(),
    );
    reopened.load().await.unwrap();

    assert!(reopened.contains("tt1375666"));
    assert_eq!(
        reopened.user_rating_for("tt1375666"),
        Some(UserRating::new(9).unwrap())
    );
}

#[tokio::test]
async fn test_store_duplicate_surfaces_as_error() {
    let harness = TestHarness::new().await;
    let movie = fixtures::movie("tt1375666", "Inception", 2010);

    // Written behind the list's back, so only the store's unique index catches it.
    harness
        .store
        .insert(fixtures::new_entry("tt1375666", "Inception", 6))
        .unwrap();

    let result = harness
        .watched
        .add(&movie, UserRating::new(9).unwrap())
        .await;
    assert!(result.is_err());
    assert!(harness.watched.list().is_empty());
    assert!(!harness.watched.is_busy());
}
