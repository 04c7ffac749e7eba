//! Route modules for the DocGuard OCR service

pub mod health;
pub mod ocr;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Headroom above the upload limit for multipart framing, so oversized files
/// reach the handler and get a descriptive error
const BODY_LIMIT_HEADROOM: usize = 1024 * 1024;

/// Build the service router
pub fn router(state: AppState) -> Router {
    let body_limit = state
        .config()
        .server
        .max_upload_bytes
        .saturating_add(BODY_LIMIT_HEADROOM);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/ocr", post(ocr::process_upload))
        .route("/health", get(health::health_check))
        .route("/keep-alive", get(health::keep_alive))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
