//! API Routes
//!
//! - `POST /classify` - extract, classify and optionally queue delivery
//! - `GET /supported-platforms` - delivery targets
//! - `GET /document-types` - classification taxonomy
//! - `GET /health` - liveness and active modes
//! - `GET /` - service banner

pub mod classify;
pub mod health;
pub mod platforms;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::middleware::cors_layer;
use crate::models::AppState;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    info!("Creating application router");

    let max_upload_size = state.config.upload.max_upload_size;
    let cors = cors_layer(&state.config.server.cors_allowed_origins);

    Router::new()
        .merge(classify::router(state.clone()))
        .merge(platforms::router(state.clone()))
        .merge(health::router(state))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_upload_size))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
