//! Service error taxonomy.

use store::StoreError;
use thiserror::Error;

use crate::auth::Role;

/// Errors that can occur while serving a request.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Missing, invalid or unresolvable bearer token, or bad credentials.
    #[error("Unauthorized: {0}")]
    Auth(String),

    /// The caller's role is below the one the operation requires.
    #[error("Forbidden: requires {required} role")]
    Forbidden { required: Role },

    /// Unknown product, customer or order.
    #[error("{kind} with id {id} not found")]
    NotFound { kind: &'static str, id: String },

    /// Insufficient stock, insufficient points, invalid price and similar.
    #[error("{0}")]
    BusinessRule(String),

    /// A collaborator was unreachable or answered with a failure.
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// A required request field is missing or malformed.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Any other storage failure.
    #[error("Store error: {0}")]
    Store(StoreError),
}

impl ServiceError {
    pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
        ServiceError::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound { kind, id } => ServiceError::NotFound { kind, id },
            StoreError::InsufficientStock { .. } | StoreError::Conflict { .. } => {
                ServiceError::BusinessRule(e.to_string())
            }
            other => ServiceError::Store(other),
        }
    }
}

/// Convenience type alias for service results.
pub type Result<T> = std::result::Result<T, ServiceError>;
