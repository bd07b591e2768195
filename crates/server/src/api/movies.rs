//! Watched-list API handlers (`/movies`).

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use popcorn_core::{AddWatchedRequest, WatchedEntry, WatchedError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::metrics::WATCHED_MUTATIONS;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for deleting a movie
#[derive(Debug, Deserialize)]
pub struct DeleteMovieParams {
    /// Identifier to delete; takes precedence over the path segment
    pub id: Option<String>,
}

/// Response for a successful delete
#[derive(Debug, Serialize)]
pub struct DeleteMovieResponse {
    pub message: String,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, error: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
}

fn record(operation: &str, result: &str) {
    WATCHED_MUTATIONS
        .with_label_values(&[operation, result])
        .inc();
}

// ============================================================================
// Handlers
// ============================================================================

/// List all watched movies
pub async fn list_movies(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<WatchedEntry>>, impl IntoResponse> {
    match state.store().list() {
        Ok(entries) => Ok(Json(entries)),
        Err(e) => {
            error!("Failed to list watched movies: {}", e);
            Err(api_error(StatusCode::BAD_REQUEST, e.to_string()))
        }
    }
}

/// Add a movie to the watched list
///
/// The identifier stored is the body's `imdbID`; the path segment only names
/// the resource.
pub async fn add_movie(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Result<Json<AddWatchedRequest>, JsonRejection>,
) -> Result<Json<WatchedEntry>, impl IntoResponse> {
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => {
            record("add", "invalid");
            return Err(api_error(StatusCode::BAD_REQUEST, rejection.body_text()));
        }
    };

    if body.imdb_id.as_deref().is_some_and(|body_id| body_id != id) {
        debug!(path_id = %id, body_id = ?body.imdb_id, "Path and body identifiers differ");
    }

    let entry = match body.into_new_entry(state.defaults()) {
        Ok(entry) => entry,
        Err(e) => {
            record("add", "invalid");
            warn!("Rejected watched movie: {}", e);
            return Err(api_error(StatusCode::BAD_REQUEST, e.to_string()));
        }
    };

    match state.store().insert(entry) {
        Ok(created) => {
            record("add", "ok");
            info!(imdb_id = %created.imdb_id, "Added '{}' to watched list", created.title);
            Ok(Json(created))
        }
        Err(WatchedError::Duplicate(imdb_id)) => {
            record("add", "duplicate");
            Err(api_error(
                StatusCode::CONFLICT,
                format!("Already watched: {}", imdb_id),
            ))
        }
        Err(e @ WatchedError::Validation(_)) => {
            record("add", "invalid");
            Err(api_error(StatusCode::BAD_REQUEST, e.to_string()))
        }
        Err(e) => {
            record("add", "error");
            error!("Failed to add watched movie: {}", e);
            Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

/// Delete a movie from the watched list
pub async fn delete_movie(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(params): Query<DeleteMovieParams>,
) -> Result<Json<DeleteMovieResponse>, impl IntoResponse> {
    let imdb_id = params.id.filter(|q| !q.is_empty()).unwrap_or(id);

    match state.store().delete_by_imdb_id(&imdb_id) {
        Ok(deleted) => {
            record("delete", "ok");
            if deleted {
                info!(imdb_id = %imdb_id, "Removed from watched list");
            } else {
                debug!(imdb_id = %imdb_id, "Delete of a movie not on the list");
            }
            Ok(Json(DeleteMovieResponse {
                message: "Successfully deleted movie".to_string(),
            }))
        }
        Err(e) => {
            record("delete", "error");
            error!("Failed to delete watched movie: {}", e);
            Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}
