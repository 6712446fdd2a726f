//! Health check endpoint.

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::config::ServiceKind;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
}

/// GET /health — returns service health status.
pub async fn check(State(kind): State<ServiceKind>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: kind.as_str(),
    })
}
