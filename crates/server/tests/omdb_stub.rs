//! OMDb client and search controllers against a local stand-in for the OMDb API.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::{extract::Query, http::StatusCode, routing::get, Json, Router};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

use popcorn_core::{
    CatalogError, DetailController, MovieCatalog, OmdbClient, OmdbConfig, SearchController,
    SearchSettings,
};

const API_KEY: &str = "test-key";

async fn omdb(Query(params): Query<HashMap<String, String>>) -> (StatusCode, Json<Value>) {
    if params.get("apikey").map(String::as_str) != Some(API_KEY) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"Response": "False", "Error": "Invalid API key!"})),
        );
    }

    if let Some(query) = params.get("s") {
        if query == "slow" {
            tokio::time::sleep(Duration::from_secs(5)).await;
        }
        if query.to_lowercase().contains("bat") {
            return (
                StatusCode::OK,
                Json(json!({
                    "Search": [
                        {"Title": "Batman Begins", "Year": "2005", "imdbID": "tt0372784", "Type": "movie", "Poster": "https://img.example/bb.jpg"},
                        {"Title": "Batman", "Year": "1989", "imdbID": "tt0096895", "Type": "movie", "Poster": "N/A"}
                    ],
                    "totalResults": "2",
                    "Response": "True"
                })),
            );
        }
        return (
            StatusCode::OK,
            Json(json!({"Response": "False", "Error": "Movie not found!"})),
        );
    }

    if let Some(id) = params.get("i") {
        if id == "tt0372784" {
            return (
                StatusCode::OK,
                Json(json!({
                    "Title": "Batman Begins",
                    "Released": "15 Jun 2005",
                    "Runtime": "140 min",
                    "Genre": "Action, Crime, Drama",
                    "Director": "Christopher Nolan",
                    "Actors": "Christian Bale, Michael Caine, Ken Watanabe",
                    "Plot": "After witnessing his parents' death, Bruce learns the art of fighting.",
                    "Poster": "https://img.example/bb.jpg",
                    "imdbRating": "8.2",
                    "imdbID": "tt0372784",
                    "Response": "True"
                })),
            );
        }
        return (
            StatusCode::OK,
            Json(json!({"Response": "False", "Error": "Incorrect IMDb ID."})),
        );
    }

    (
        StatusCode::OK,
        Json(json!({"Response": "False", "Error": "Something went wrong."})),
    )
}

/// Start the stand-in and return its base URL.
async fn start_stub() -> String {
    let app = Router::new().route("/", get(omdb));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });
    format!("http://{}/", addr)
}

fn client_for(base_url: &str, api_key: &str) -> OmdbClient {
    OmdbClient::new(OmdbConfig {
        api_key: api_key.to_string(),
        base_url: Some(base_url.to_string()),
        timeout_secs: 10,
    })
    .unwrap()
}

#[tokio::test]
async fn test_search_parses_results() {
    let base_url = start_stub().await;
    let client = client_for(&base_url, API_KEY);

    let results = client
        .search("bat", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].imdb_id, "tt0372784");
    assert_eq!(results[0].year, "2005");
    assert_eq!(results[1].poster, None);
}

#[tokio::test]
async fn test_search_without_matches_carries_catalog_message() {
    let base_url = start_stub().await;
    let client = client_for(&base_url, API_KEY);

    let err = client
        .search("xyzxyz123", &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, CatalogError::NoMatches(ref m) if m == "Movie not found!"));
    assert_eq!(err.user_message(), "Movie not found!");
}

#[tokio::test]
async fn test_detail_parses_record() {
    let base_url = start_stub().await;
    let client = client_for(&base_url, API_KEY);

    let detail = client
        .detail("tt0372784", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(detail.title, "Batman Begins");
    assert_eq!(detail.runtime_minutes(), Some(140));
    assert_eq!(detail.genre, vec!["Action", "Crime", "Drama"]);
    assert_eq!(detail.actors.len(), 3);
    assert_eq!(detail.imdb_rating, Some(8.2));
}

#[tokio::test]
async fn test_detail_for_unknown_id_is_not_found() {
    let base_url = start_stub().await;
    let client = client_for(&base_url, API_KEY);

    let err = client
        .detail("tt0000000", &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, CatalogError::NotFound(_)));
}

#[tokio::test]
async fn test_wrong_api_key_is_not_configured() {
    let base_url = start_stub().await;
    let client = client_for(&base_url, "wrong-key");

    let err = client
        .search("bat", &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, CatalogError::NotConfigured(_)));
}

#[tokio::test]
async fn test_cancelling_aborts_slow_search() {
    let base_url = start_stub().await;
    let client = client_for(&base_url, API_KEY);
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let started = std::time::Instant::now();
    let err = client.search("slow", &cancel).await.unwrap_err();

    assert!(err.is_cancelled());
    assert!(started.elapsed() < Duration::from_secs(4));
}

#[tokio::test]
async fn test_search_controller_over_http() {
    let base_url = start_stub().await;
    let catalog: Arc<dyn MovieCatalog> = Arc::new(client_for(&base_url, API_KEY));
    let controller = SearchController::new(Arc::clone(&catalog), SearchSettings::default());

    controller.set_query("bat").unwrap().await.unwrap();
    let state = controller.state();
    assert!(!state.is_loading);
    assert_eq!(state.results.len(), 2);
    assert_eq!(state.error, None);

    controller.set_query("xyzxyz123").unwrap().await.unwrap();
    let state = controller.state();
    assert!(state.results.is_empty());
    assert_eq!(state.error.as_deref(), Some("Movie not found!"));

    let details = DetailController::new(catalog, Duration::from_secs(5));
    details.select("tt0372784").unwrap().await.unwrap();
    let state = details.state();
    assert_eq!(state.selected.as_deref(), Some("tt0372784"));
    assert_eq!(state.detail.title, "Batman Begins");
    assert!(!state.is_loading);
}
