//! Axum router construction.

use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{compression::CompressionLayer, timeout::TimeoutLayer, trace::TraceLayer};

use super::{handlers, middleware, state::AppState};

/// Build the application [`Router`] with all routes and middleware attached.
///
/// `portal_timeout` bounds one portal call; the request timeout is derived
/// from it.
pub fn build(state: AppState, portal_timeout: Duration) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/api/consultar", post(handlers::consultar))
        .route("/api/importar", post(handlers::importar))
        .route("/health", get(handlers::health))
        .fallback(handlers::not_found)
        .layer(DefaultBodyLimit::max(middleware::MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(middleware::request_timeout(portal_timeout)))
        .layer(CompressionLayer::new())
        .with_state(state)
}
