use std::sync::Arc;

use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

pub mod error;
pub mod handlers;
pub mod state;

pub use state::AppState;

/// Build the HTTP API. CORS is permissive so the submission page can be
/// served from anywhere on the internal network.
pub async fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/api/articles/submit", post(handlers::submit_article))
        .route("/api/articles/pending", get(handlers::list_pending))
        .route("/api/articles/:id/content", post(handlers::paste_content))
        .route("/api/articles/:id", delete(handlers::remove_article))
        .route("/api/reports/media", post(handlers::trigger_media_report))
        .route(
            "/api/reports/hansard",
            post(handlers::trigger_hansard_report),
        )
        .route("/api/health", get(handlers::health))
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}
