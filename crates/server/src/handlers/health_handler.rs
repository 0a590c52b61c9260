//! Health check handler.

use axum::{response::Json, routing::get, Router};
use serde::Serialize;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Create health routes.
pub fn health_routes() -> Router {
    Router::new().route("/health", get(health_check))
}

/// Health check endpoint.
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "UP" })
}
