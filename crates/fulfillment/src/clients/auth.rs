//! Auth collaborator trait and in-process implementation.

use std::sync::Arc;

use async_trait::async_trait;
use domain::{AuthService, ServiceError, User};

use super::Outage;

/// Resolves bearer tokens to users.
#[async_trait]
pub trait AuthClient: Send + Sync {
    /// Returns the user owning `token`, or `Auth` if the token is unknown.
    async fn resolve(&self, token: &str) -> Result<User, ServiceError>;
}

#[async_trait]
impl<T: AuthClient + ?Sized> AuthClient for Arc<T> {
    async fn resolve(&self, token: &str) -> Result<User, ServiceError> {
        (**self).resolve(token).await
    }
}

/// Auth client backed by an [`AuthService`] in the same process.
#[derive(Clone)]
pub struct LocalAuthClient {
    auth: AuthService,
    outage: Outage,
}

impl LocalAuthClient {
    pub fn new(auth: AuthService) -> Self {
        Self {
            auth,
            outage: Outage::default(),
        }
    }

    /// Makes subsequent calls fail as if the auth service were unreachable.
    pub fn set_unavailable(&self, down: bool) {
        self.outage.set(down);
    }
}

#[async_trait]
impl AuthClient for LocalAuthClient {
    async fn resolve(&self, token: &str) -> Result<User, ServiceError> {
        self.outage.check("auth")?;
        self.auth.resolve(token).await
    }
}
