//! HTTP surface of the CCCD OCR server

pub mod cors;
pub mod download;
pub mod health;
pub mod ocr;

use axum::{
    extract::DefaultBodyLimit,
    http::Method,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::state::AppState;

/// Build the application router
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/", get(health::liveness).options(cors::preflight))
        .route("/ocr", post(ocr::ocr).options(cors::preflight))
        .route(
            "/download/:name",
            get(download::download).options(cors::preflight),
        )
        .fallback(cors::fallback)
        .layer(DefaultBodyLimit::max(state.config().server.max_upload_bytes))
        .layer(cors)
        .with_state(state)
}
