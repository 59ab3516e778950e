use axum::{
    extract::{FromRef, State},
    http::{HeaderName, HeaderValue},
    response::Html,
    routing::post,
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{LoginForm, NewPassword, TokenResponse},
        extractors::{CurrentSuperuser, CurrentUser},
        jwt::JwtKeys,
    },
    common::Message,
    error::{AppError, AppResult},
    extract::{ApiForm, ApiJson, ApiPath},
    mail,
    state::AppState,
    users::{repo_types::User, repo_types::UserPublic, services},
    validation::normalize_email,
};

const NO_SUCH_EMAIL: &str = "The user with this email does not exist in the system.";

pub fn login_routes() -> Router<AppState> {
    Router::new()
        .route("/login/access-token", post(login_access_token))
        .route("/login/test-token", post(test_token))
        .route("/password-recovery/:email", post(recover_password))
        .route("/reset-password/", post(reset_password))
        .route(
            "/password-recovery-html-content/:email",
            post(recover_password_html_content),
        )
}

#[instrument(skip(state, form))]
pub async fn login_access_token(
    State(state): State<AppState>,
    ApiForm(form): ApiForm<LoginForm>,
) -> AppResult<Json<TokenResponse>> {
    let email = normalize_email(&form.username);
    let user = services::authenticate(&state.db, &email, &form.password)
        .await?
        .ok_or_else(|| {
            warn!("login failed");
            AppError::IncorrectCredentials
        })?;
    if !user.is_active {
        warn!(user_id = %user.id, "login by inactive user");
        return Err(AppError::InactiveUser);
    }

    let keys = JwtKeys::from_ref(&state);
    let access_token = keys.sign_access(user.id)?;
    info!(user_id = %user.id, "user logged in");
    Ok(Json(TokenResponse::bearer(access_token)))
}

#[instrument(skip_all)]
pub async fn test_token(CurrentUser(user): CurrentUser) -> Json<UserPublic> {
    Json(user.into())
}

#[instrument(skip(state))]
pub async fn recover_password(
    State(state): State<AppState>,
    ApiPath(email): ApiPath<String>,
) -> AppResult<Json<Message>> {
    let email = normalize_email(&email);
    let user = User::find_by_email(&state.db, &email)
        .await?
        .ok_or_else(|| AppError::not_found(NO_SUCH_EMAIL))?;

    let token = JwtKeys::from_ref(&state).sign_password_reset(&user.email)?;
    let email_data = mail::reset_password_email(&state.config, &user.email, &token);
    state.mailer.send(&user.email, &email_data).await?;
    info!(user_id = %user.id, "password recovery email sent");
    Ok(Json(Message::new("Password recovery email sent")))
}

#[instrument(skip(state, body))]
pub async fn reset_password(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<NewPassword>,
) -> AppResult<Json<Message>> {
    body.validate()?;
    let email = JwtKeys::from_ref(&state)
        .verify_password_reset(&body.token)
        .ok_or_else(|| AppError::BadRequest("Invalid token".into()))?;

    let user = User::find_by_email(&state.db, &email)
        .await?
        .ok_or_else(|| AppError::not_found(NO_SUCH_EMAIL))?;
    if !user.is_active {
        return Err(AppError::InactiveUser);
    }

    let user = services::set_password(&state.db, user, body.new_password).await?;
    info!(user_id = %user.id, "password reset");
    Ok(Json(Message::new("Password updated successfully")))
}

#[instrument(skip(state, _admin))]
pub async fn recover_password_html_content(
    State(state): State<AppState>,
    CurrentSuperuser(_admin): CurrentSuperuser,
    ApiPath(email): ApiPath<String>,
) -> AppResult<([(HeaderName, HeaderValue); 1], Html<String>)> {
    let email = normalize_email(&email);
    let user = User::find_by_email(&state.db, &email)
        .await?
        .ok_or_else(|| {
            AppError::not_found("The user with this username does not exist in the system.")
        })?;

    let token = JwtKeys::from_ref(&state).sign_password_reset(&user.email)?;
    let email_data = mail::reset_password_email(&state.config, &user.email, &token);
    let subject = HeaderValue::from_str(&email_data.subject)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("subject header: {e}")))?;
    Ok((
        [(HeaderName::from_static("subject"), subject)],
        Html(email_data.html_content),
    ))
}
