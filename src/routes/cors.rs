//! CORS preflight and fallback handlers
//!
//! Browser preflights carrying `Origin` are answered by the `CorsLayer`
//! installed in [`super::router`]. Bare `OPTIONS` requests reach these
//! handlers and get the same permissive answer.

use axum::{
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
};

pub const ALLOWED_METHODS: &str = "GET, POST, OPTIONS";

/// 200 with permissive `Access-Control-Allow-*` headers
pub async fn preflight() -> Response {
    (
        StatusCode::OK,
        [
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            (header::ACCESS_CONTROL_ALLOW_HEADERS, "*"),
            (header::ACCESS_CONTROL_ALLOW_METHODS, ALLOWED_METHODS),
        ],
    )
        .into_response()
}

/// Unknown paths: preflight for `OPTIONS`, plain 404 otherwise
pub async fn fallback(method: Method) -> Response {
    if method == Method::OPTIONS {
        return preflight().await;
    }
    not_found()
}

pub fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "Not found").into_response()
}
