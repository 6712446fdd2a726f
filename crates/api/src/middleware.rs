//! Bearer-token authentication and role checks.

use std::sync::Arc;

use axum::Extension;
use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use domain::{Role, ServiceError, User, parse_bearer_token};
use fulfillment::{AuthClient, CallPolicy, Idempotency};

use crate::error::ApiError;

/// Resolves bearer tokens through the auth collaborator.
#[derive(Clone)]
pub struct Authenticator {
    client: Arc<dyn AuthClient>,
    policy: CallPolicy,
}

impl Authenticator {
    pub fn new(client: Arc<dyn AuthClient>, policy: CallPolicy) -> Self {
        Self { client, policy }
    }

    /// Resolves `token` to its user.
    pub async fn resolve(&self, token: &str) -> Result<User, ServiceError> {
        self.policy
            .call("auth", Idempotency::Retryable, || self.client.resolve(token))
            .await
    }
}

/// Extracts the bearer token from the `Authorization` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()
        .and_then(parse_bearer_token)
}

/// Rejects requests without a valid bearer token and stores the resolved
/// [`User`] in the request extensions.
pub async fn authenticate(
    State(auth): State<Authenticator>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers())
        .ok_or_else(|| ServiceError::Auth("missing bearer token".to_string()))?
        .to_string();
    let user = auth.resolve(&token).await?;
    tracing::debug!(username = %user.username, role = %user.role, "request authenticated");

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Rejects authenticated users below the manager role. Must run after [`authenticate`].
pub async fn require_manager(
    Extension(user): Extension<User>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    user.require(Role::Manager)?;
    Ok(next.run(request).await)
}
