use axum::{
    extract::State,
    routing::get,
    Extension, Form, Json, Router,
};
use chrono::Utc;
use yatra_core::identity::{ProfileForm, User};

use crate::middleware::Claims;
use crate::views::UserView;
use crate::{error::AppError, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new().route("/accounts/profile", get(profile).post(update_profile))
}

pub(crate) async fn current_user(state: &AppState, claims: &Claims) -> Result<User, AppError> {
    state
        .users
        .get_user(claims.user_id()?)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(|| AppError::AuthenticationError("User inactive or deleted.".to_string()))
}

async fn profile(State(state): State<AppState>, Extension(claims): Extension<Claims>) -> Result<Json<UserView>, AppError> {
    let user = current_user(&state, &claims).await?;
    Ok(Json(UserView::from(&user)))
}

async fn update_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Form(form): Form<ProfileForm>,
) -> Result<Json<UserView>, AppError> {
    let user = current_user(&state, &claims).await?;
    let update = form.validate(Utc::now().date_naive())?;

    let user = state.users.update_profile(user.id, update).await?;
    tracing::info!("Profile updated: {}", user.username);
    Ok(Json(UserView::from(&user)))
}
