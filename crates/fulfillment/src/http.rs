//! Collaborator clients for split deployments, one service per process.
//!
//! Each client talks to a service mounted at its own base URL and forwards
//! the caller's bearer token. Non-success answers are mapped back onto
//! [`ServiceError`] from the status code and the `{"error": ...}` body.

use std::time::Duration;

use async_trait::async_trait;
use common::Cart;
use domain::{Catalog, LoyaltyUpdate, PriceQuote, Role, ServiceError, StockSnapshot, User};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::clients::{AuthClient, InventoryClient, LoyaltyClient, PricingClient};
use crate::wire::UpdatePointsRequest;

/// Builds the HTTP client shared by every remote collaborator.
pub fn client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder().timeout(timeout).build()
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Clone)]
struct Remote {
    name: &'static str,
    base_url: String,
    client: Client,
}

impl Remote {
    fn new(name: &'static str, base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            name,
            base_url,
            client,
        }
    }

    fn request(&self, method: Method, path: &str, token: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, path))
            .bearer_auth(token)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ServiceError> {
        let response = request.send().await.map_err(|e| {
            ServiceError::UpstreamUnavailable(format!("unable to reach {} server: {e}", self.name))
        })?;

        let status = response.status();
        if status.is_success() {
            return response.json::<T>().await.map_err(|e| {
                ServiceError::UpstreamUnavailable(format!(
                    "{} server sent an unreadable response: {e}",
                    self.name
                ))
            });
        }

        let path = response.url().path().to_string();
        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.error,
            Err(_) => status.to_string(),
        };
        tracing::debug!(collaborator = self.name, %status, %path, "collaborator rejected request");
        Err(status_error(self.name, status, &path, message))
    }
}

/// Maps a non-success status from a collaborator to a service error.
pub(crate) fn status_error(
    collaborator: &str,
    status: StatusCode,
    path: &str,
    message: String,
) -> ServiceError {
    match status {
        StatusCode::UNAUTHORIZED => ServiceError::Auth(message),
        StatusCode::FORBIDDEN => ServiceError::Forbidden {
            required: Role::Manager,
        },
        StatusCode::NOT_FOUND => ServiceError::not_found("resource", path),
        s if s.is_client_error() => ServiceError::BusinessRule(message),
        s => ServiceError::UpstreamUnavailable(format!("{collaborator} server answered {s}: {message}")),
    }
}

/// Auth service client.
#[derive(Debug, Clone)]
pub struct HttpAuthClient {
    remote: Remote,
}

impl HttpAuthClient {
    pub fn new(base_url: impl Into<String>, client: Client) -> Self {
        Self {
            remote: Remote::new("auth", base_url, client),
        }
    }
}

#[async_trait]
impl AuthClient for HttpAuthClient {
    async fn resolve(&self, token: &str) -> Result<User, ServiceError> {
        let request = self.remote.request(Method::GET, "/info", token);
        self.remote.send(request).await
    }
}

/// Inventory service client.
#[derive(Debug, Clone)]
pub struct HttpInventoryClient {
    remote: Remote,
}

impl HttpInventoryClient {
    pub fn new(base_url: impl Into<String>, client: Client) -> Self {
        Self {
            remote: Remote::new("inventory", base_url, client),
        }
    }
}

#[async_trait]
impl InventoryClient for HttpInventoryClient {
    async fn stock(&self, token: &str) -> Result<StockSnapshot, ServiceError> {
        let request = self.remote.request(Method::GET, "/", token);
        self.remote.send(request).await
    }

    async fn decrement(&self, token: &str, cart: &Cart) -> Result<StockSnapshot, ServiceError> {
        let request = self
            .remote
            .request(Method::POST, "/decrement", token)
            .json(cart);
        self.remote.send(request).await
    }
}

/// Pricing service client.
#[derive(Debug, Clone)]
pub struct HttpPricingClient {
    remote: Remote,
}

impl HttpPricingClient {
    pub fn new(base_url: impl Into<String>, client: Client) -> Self {
        Self {
            remote: Remote::new("price", base_url, client),
        }
    }
}

#[async_trait]
impl PricingClient for HttpPricingClient {
    async fn quote(&self, token: &str, cart: &Cart) -> Result<PriceQuote, ServiceError> {
        let request = self
            .remote
            .request(Method::POST, "/calculate", token)
            .json(cart);
        self.remote.send(request).await
    }

    async fn products(&self, token: &str) -> Result<Catalog, ServiceError> {
        let request = self.remote.request(Method::GET, "/", token);
        self.remote.send(request).await
    }
}

/// Loyalty service client.
#[derive(Debug, Clone)]
pub struct HttpLoyaltyClient {
    remote: Remote,
}

impl HttpLoyaltyClient {
    pub fn new(base_url: impl Into<String>, client: Client) -> Self {
        Self {
            remote: Remote::new("loyalty", base_url, client),
        }
    }
}

#[async_trait]
impl LoyaltyClient for HttpLoyaltyClient {
    async fn update_points(
        &self,
        token: &str,
        request: &UpdatePointsRequest,
    ) -> Result<LoyaltyUpdate, ServiceError> {
        let http_request = self
            .remote
            .request(Method::POST, "/update-points", token)
            .json(request);
        self.remote.send(http_request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let err = status_error("auth", StatusCode::UNAUTHORIZED, "/info", "bad token".into());
        assert!(matches!(err, ServiceError::Auth(msg) if msg == "bad token"));

        let err = status_error("price", StatusCode::FORBIDDEN, "/manager/set-price/0001", String::new());
        assert!(matches!(err, ServiceError::Forbidden { required: Role::Manager }));

        let err = status_error("loyalty", StatusCode::NOT_FOUND, "/points/42", "missing".into());
        assert!(matches!(err, ServiceError::NotFound { id, .. } if id == "/points/42"));

        let err = status_error(
            "loyalty",
            StatusCode::UNPROCESSABLE_ENTITY,
            "/update-points",
            "not enough points".into(),
        );
        assert!(matches!(err, ServiceError::BusinessRule(_)));

        let err = status_error("inventory", StatusCode::BAD_GATEWAY, "/", "down".into());
        assert!(matches!(err, ServiceError::UpstreamUnavailable(msg) if msg.contains("inventory")));
    }

    #[test]
    fn test_base_url_trailing_slash_is_dropped() {
        let remote = Remote::new("price", "http://localhost:8083/", Client::new());
        assert_eq!(remote.base_url, "http://localhost:8083");
    }

    #[tokio::test]
    async fn test_unreachable_server_is_upstream_unavailable() {
        // Port 9 (discard) is not expected to have an HTTP listener.
        let client = HttpInventoryClient::new(
            "http://127.0.0.1:9",
            client(Duration::from_millis(500)).unwrap(),
        );
        let result = client.stock("token").await;
        assert!(matches!(result, Err(ServiceError::UpstreamUnavailable(_))));
    }
}
