//! Bearer-token sessions and the role scale.
//!
//! Sessions live in process memory and never expire; a token stays valid
//! until the process restarts.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{Result, ServiceError};

/// Ordered permission scale. Deserializing an unrecognized role fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    User,
    Manager,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Manager => "Manager",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An authenticated principal as seen by the other services.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub name: String,
    pub role: Role,
}

impl User {
    /// Fails with `Forbidden` if the user's role is below `required`.
    pub fn require(&self, required: Role) -> Result<()> {
        if self.role < required {
            return Err(ServiceError::Forbidden { required });
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct Account {
    password: String,
    user: User,
}

/// Issues and resolves session tokens.
#[derive(Clone, Default)]
pub struct AuthService {
    accounts: Arc<HashMap<String, Account>>,
    sessions: Arc<RwLock<HashMap<String, User>>>,
}

impl AuthService {
    /// Creates a service over a fixed set of `(user, password)` accounts.
    pub fn new(accounts: impl IntoIterator<Item = (User, String)>) -> Self {
        let accounts = accounts
            .into_iter()
            .map(|(user, password)| (user.username.clone(), Account { password, user }))
            .collect();
        Self {
            accounts: Arc::new(accounts),
            sessions: Arc::default(),
        }
    }

    /// Checks credentials and opens a session, returning the user and a fresh token.
    #[tracing::instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<(User, String)> {
        let account = self
            .accounts
            .get(username.trim())
            .ok_or_else(|| ServiceError::Auth("bad credentials".to_string()))?;
        if account.password != password.trim() {
            return Err(ServiceError::Auth("bad credentials".to_string()));
        }

        let token = Uuid::new_v4().to_string();
        self.sessions
            .write()
            .await
            .insert(token.clone(), account.user.clone());
        tracing::info!(username = %account.user.username, "user logged in");

        Ok((account.user.clone(), token))
    }

    /// Resolves a session token to its user.
    pub async fn resolve(&self, token: &str) -> Result<User> {
        self.sessions
            .read()
            .await
            .get(token)
            .cloned()
            .ok_or_else(|| ServiceError::Auth("bad credentials".to_string()))
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header value.
///
/// Returns `None` unless the scheme is exactly `Bearer`, followed by
/// whitespace and a non-empty token.
pub fn parse_bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(char::is_whitespace)?;
    let token = token.trim();
    (scheme == "Bearer" && !token.is_empty()).then_some(token)
}
