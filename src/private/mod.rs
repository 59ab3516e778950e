//! Routes mounted only in the local environment.

use axum::{extract::State, routing::post, Json, Router};
use serde::Deserialize;
use tracing::{info, instrument};

use crate::{
    error::AppResult,
    extract::ApiJson,
    state::AppState,
    users::{dto::UserCreate, repo_types::UserPublic, services},
};

pub fn router() -> Router<AppState> {
    Router::new().route("/private/users/", post(create_user))
}

#[derive(Debug, Deserialize)]
pub struct PrivateUserCreate {
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
    #[serde(default)]
    pub is_verified: bool,
}

/// Creates a user without authentication.
#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<PrivateUserCreate>,
) -> AppResult<Json<UserPublic>> {
    let mut input = UserCreate {
        email: payload.email,
        password: payload.password,
        is_active: true,
        is_superuser: false,
        full_name: payload.full_name,
    };
    input.validate()?;
    let user = services::create_user(&state.db, input).await?;
    info!(user_id = %user.id, verified = payload.is_verified, "private user created");
    Ok(Json(user.into()))
}
