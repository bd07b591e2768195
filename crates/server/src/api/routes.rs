use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use super::{handlers, middleware::metrics_middleware, movies};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let static_dir = state.config().server.static_dir.clone();

    let api_routes = Router::new()
        // Health, config and metrics
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route("/metrics", get(handlers::metrics))
        // Watched list
        .route("/movies", get(movies::list_movies))
        .route(
            "/movies/{id}",
            post(movies::add_movie).delete(movies::delete_movie),
        )
        .with_state(state);

    let router = match static_dir {
        // Serve the browser UI with SPA fallback
        Some(dir) => {
            let index_path = dir.join("index.html");
            api_routes.fallback_service(ServeDir::new(&dir).fallback(ServeFile::new(index_path)))
        }
        None => api_routes,
    };

    router
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
}
