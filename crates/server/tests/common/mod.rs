//! Common test utilities for the `/movies` API.
//!
//! The fixture builds the real router over a SQLite store in a temporary
//! directory, so requests exercise the same code paths as the binary.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use popcorn_core::{Config, DatabaseConfig, SqliteWatchedStore, WatchedStore};
use popcorn_server::{api::create_router, state::AppState};

/// Re-export fixtures for test convenience
pub use popcorn_core::testing::fixtures;

/// In-process server over a throwaway database.
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Direct handle on the store behind the router
    pub store: Arc<dyn WatchedStore>,
    /// Temporary directory holding the database
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Create a new test fixture with the default configuration.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Create a test fixture with a custom configuration.
    ///
    /// The database path is always replaced with one inside the fixture's
    /// temporary directory.
    pub fn with_config(mut config: Config) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");

        config.database = DatabaseConfig {
            path: db_path.clone(),
        };

        let store: Arc<dyn WatchedStore> =
            Arc::new(SqliteWatchedStore::new(&db_path).expect("Failed to create store"));

        let state = Arc::new(AppState::new(config, Arc::clone(&store)));
        let router = create_router(state);

        Self {
            router,
            store,
            temp_dir,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a DELETE request.
    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request("DELETE", path, None).await
    }

    /// Send a POST request with raw string body (for testing malformed JSON).
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        self.request_raw("POST", path, body, "application/json").await
    }

    /// Fetch a path and return the raw text body (for non-JSON endpoints).
    pub async fn get_text(&self, path: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    async fn request_raw(
        &self,
        method: &str,
        path: &str,
        body: &str,
        content_type: &str,
    ) -> TestResponse {
        let request = Request::builder()
            .method(method)
            .uri(path)
            .header("Content-Type", content_type)
            .body(Body::from(body.to_string()))
            .unwrap();

        self.send(request).await
    }

    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}

/// Body a browser client sends when rating Inception.
pub fn inception_body(user_rating: u8) -> Value {
    serde_json::json!({
        "imdbID": "tt1375666",
        "title": "Inception",
        "released": "16 Jul 2010",
        "runtime": "148 min",
        "poster": "https://img.example/inception.jpg",
        "actors": "Leonardo DiCaprio, Joseph Gordon-Levitt",
        "imdbRating": "8.8",
        "userRating": user_rating,
        "genre": "Action, Adventure, Sci-Fi",
        "director": "Christopher Nolan",
        "desc": "A thief who steals corporate secrets through dream-sharing technology."
    })
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}
