//! Health check handler

use axum::{Json, http::StatusCode};
use serde::Serialize;

/// Health check response data
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub git_hash: &'static str,
}

/// GET /health
///
/// Liveness only; downstream services are not probed.
pub async fn health_check() -> (StatusCode, Json<HealthResponse>) {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "UP",
            version: env!("CARGO_PKG_VERSION"),
            git_hash: env!("GIT_HASH"),
        }),
    )
}
