//! HTTP router construction.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::api;
use crate::state::AppState;

/// Build the application router with all routes and middleware.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(api::health))
        .route("/tick", post(api::tick))
        .route("/pointers", get(api::pointers))
        .route("/ticks", get(api::ticks))
        .route("/config", get(api::config))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
