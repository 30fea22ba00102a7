//! Axum Handlers for the plain HTTP routes.

use axum::response::Json;
use serde::Serialize;

#[derive(Serialize, Debug, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
}

/// Liveness probe. Says nothing about the upstream provider.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        message: "OpenAI Realtime Chat API 正常運行",
    })
}
