use argon2::{
    password_hash::{Encoding, SaltString},
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
};
use axum::{extract::State, http::StatusCode, routing::post, Form, Json, Router};
use chrono::Utc;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use yatra_core::identity::RegistrationForm;
use yatra_shared::Masked;

use crate::middleware::issue_token;
use crate::views::UserView;
use crate::{error::AppError, state::AppState};

const INVALID_LOGIN: &str = "Please enter a correct username and password. Note that both fields may be case-sensitive.";

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserView,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    /// Username or email
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: Masked<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::InternalServerError(format!("Password hashing failed: {}", e)))
}

pub fn verify_password(password: &str, stored: &str) -> bool {
    match PasswordHash::parse(stored, Encoding::default()) {
        Ok(hash) => Argon2::default().verify_password(password.as_bytes(), &hash).is_ok(),
        Err(e) => {
            tracing::warn!("Unreadable password hash: {}", e);
            false
        }
    }
}

async fn register(
    State(state): State<AppState>,
    Form(form): Form<RegistrationForm>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let registration = form.validate(Utc::now().date_naive())?;
    let password_hash = hash_password(registration.password.expose())?;

    let user = state.users.create_user(registration.into_new_user(password_hash)).await?;
    let token = issue_token(&user, &state.auth)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: UserView::from(&user),
        }),
    ))
}

async fn login(State(state): State<AppState>, Form(form): Form<LoginForm>) -> Result<Json<AuthResponse>, AppError> {
    let user = state
        .users
        .find_by_login(&form.username)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(|| AppError::AuthenticationError(INVALID_LOGIN.to_string()))?;

    if !verify_password(form.password.expose(), user.password_hash.expose()) {
        tracing::warn!("Failed login for {}", user.username);
        return Err(AppError::AuthenticationError(INVALID_LOGIN.to_string()));
    }

    let token = issue_token(&user, &state.auth)?;
    tracing::info!("User logged in: {}", user.username);
    Ok(Json(AuthResponse {
        token,
        user: UserView::from(&user),
    }))
}

/// Tokens are stateless; the client discards its copy.
pub async fn logout() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "message": "You have been logged out." }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_round_trip() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("wrong horse", &hash));
        assert!(!verify_password("correct horse", "not-a-hash"));
    }
}
