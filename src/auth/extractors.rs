use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;

use super::jwt::JwtKeys;
use crate::{
    error::{AppError, AppResult},
    state::AppState,
    users::repo_types::User,
};

/// The authenticated, active user behind the request's bearer token.
pub struct CurrentUser(pub User);

/// Like [`CurrentUser`], additionally requiring `is_superuser`.
pub struct CurrentSuperuser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let user = resolve_user(state, token).await?;
        Ok(CurrentUser(user))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentSuperuser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        Ok(CurrentSuperuser(require_superuser(user)?))
    }
}

fn bearer_token(parts: &Parts) -> AppResult<&str> {
    let auth = parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(AppError::NotAuthenticated)?;

    // Expect "Bearer <token>"
    let (scheme, token) = auth.split_once(' ').ok_or(AppError::NotAuthenticated)?;
    if !scheme.eq_ignore_ascii_case("bearer") || token.trim().is_empty() {
        return Err(AppError::NotAuthenticated);
    }
    Ok(token.trim())
}

/// Token check, then existence, then the active flag.
pub async fn resolve_user(state: &AppState, token: &str) -> AppResult<User> {
    let keys = JwtKeys::from_ref(state);
    let user_id = keys.verify_access(token).ok_or_else(|| {
        warn!("invalid or expired token");
        AppError::InvalidToken
    })?;
    let user = User::find_by_id(&state.db, user_id).await?;
    ensure_active(user)
}

pub(crate) fn ensure_active(user: Option<User>) -> AppResult<User> {
    let user = user.ok_or_else(|| AppError::not_found("User not found"))?;
    if !user.is_active {
        warn!(user_id = %user.id, "inactive user");
        return Err(AppError::InactiveUser);
    }
    Ok(user)
}

pub fn require_superuser(user: User) -> AppResult<User> {
    if !user.is_superuser {
        warn!(user_id = %user.id, "superuser required");
        return Err(AppError::InsufficientPrivilege);
    }
    Ok(user)
}
