//! Route definitions

use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/providers", get(handlers::providers))
        .route("/api/query", post(handlers::submit_query))
        .route("/api/results/:id", get(handlers::results))
        .route("/api/analysis/:id", get(handlers::analysis))
        .route("/api/history", get(handlers::history))
        .route("/api/export/:id", get(handlers::export))
        .route("/api/events/:id", get(handlers::events))
        .route("/api/stats", get(handlers::stats))
        .layer(CompressionLayer::new())
        .layer(cors)
        .with_state(state)
}
