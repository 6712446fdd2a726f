//! API error types with HTTP response mapping.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::ServiceError;
use fulfillment::AbortKind;
use store::StoreError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Error raised by a service or collaborator.
    Service(ServiceError),
    /// Bad request from the client.
    BadRequest(String),
    /// Resource not found.
    NotFound(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Service(err) => service_error_to_response(err),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn service_error_to_response(err: ServiceError) -> (StatusCode, String) {
    let status = match &err {
        ServiceError::Auth(_) => StatusCode::UNAUTHORIZED,
        ServiceError::Forbidden { .. } => StatusCode::FORBIDDEN,
        ServiceError::NotFound { .. } => StatusCode::NOT_FOUND,
        ServiceError::BusinessRule(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
        ServiceError::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        ServiceError::Store(e) => {
            tracing::error!(error = %e, "store failure");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, err.to_string())
}

/// Status code of a buy response that ended in `kind`.
pub fn abort_status(kind: AbortKind) -> StatusCode {
    match kind {
        AbortKind::Auth => StatusCode::UNAUTHORIZED,
        AbortKind::Validation | AbortKind::BusinessRule => StatusCode::BAD_REQUEST,
        AbortKind::UpstreamUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        AbortKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        ApiError::Service(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Service(err.into())
    }
}
