//! API Routes
//!
//! - `POST /extract-text` - Extract plain text from an uploaded PDF or Word document
//! - `GET /health` - Liveness check

pub mod extract;
pub mod health;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::middleware::cors_layer;
use crate::models::AppState;

/// Create the application router with body limit, request tracing and CORS applied.
pub fn create_router(state: AppState) -> Router {
    info!(
        origins = ?state.config.server.cors_allowed_origins,
        max_upload_bytes = state.config.server.max_upload_bytes,
        "Creating application router"
    );

    let cors = cors_layer(&state.config.server.cors_allowed_origins);
    let body_limit = DefaultBodyLimit::max(state.config.server.max_upload_bytes);

    Router::new()
        .merge(extract::router(state))
        .merge(health::router())
        .layer(body_limit)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
