//! Login and session lookup endpoints.

use axum::extract::State;
use axum::{Extension, Form, Json};
use domain::{AuthService, ServiceError, User};
use fulfillment::LoginResponse;
use serde::Deserialize;

use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub user: Option<String>,
    pub pass: Option<String>,
}

/// POST /login — exchange form credentials for a bearer token.
#[tracing::instrument(skip_all)]
pub async fn login(
    State(auth): State<AuthService>,
    Form(form): Form<LoginForm>,
) -> Result<Json<LoginResponse>, ApiError> {
    let username = required(form.user, "user")?;
    let password = required(form.pass, "pass")?;

    let (user, token) = auth.login(&username, &password).await?;
    tracing::info!(username = %user.username, "user logged in");

    Ok(Json(LoginResponse {
        user,
        token,
        message: "user logged in".to_string(),
    }))
}

/// GET /info — the user owning the bearer token.
pub async fn info(Extension(user): Extension<User>) -> Json<User> {
    Json(user)
}

fn required(value: Option<String>, field: &str) -> Result<String, ServiceError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ServiceError::Validation(format!("{field} field missing")))
}
