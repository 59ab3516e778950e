use axum::{
    extract::State,
    routing::{get, patch, post},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::{UpdatePassword, UserCreate, UserRegister, UserUpdate, UserUpdateMe, UsersPublic},
    repo_types::{User, UserPublic},
    services,
};
use crate::{
    auth::{
        extractors::{CurrentSuperuser, CurrentUser},
        password::verify_password_blocking,
    },
    common::{Message, Pagination},
    error::{AppError, AppResult},
    extract::{ApiJson, ApiPath, ApiQuery},
    mail,
    state::AppState,
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users/", get(read_users).post(create_user))
        .route(
            "/users/me",
            get(read_user_me).patch(update_user_me).delete(delete_user_me),
        )
        .route("/users/me/password", patch(update_password_me))
        .route("/users/signup", post(register_user))
        .route(
            "/users/:user_id",
            get(read_user_by_id).patch(update_user).delete(delete_user),
        )
}

#[instrument(skip(state, _admin))]
pub async fn read_users(
    State(state): State<AppState>,
    CurrentSuperuser(_admin): CurrentSuperuser,
    ApiQuery(p): ApiQuery<Pagination>,
) -> AppResult<Json<UsersPublic>> {
    let (skip, limit) = p.bounds();
    let count = User::count(&state.db).await?;
    let users = User::list(&state.db, skip, limit).await?;
    Ok(Json(UsersPublic {
        data: users.into_iter().map(UserPublic::from).collect(),
        count,
    }))
}

#[instrument(skip(state, admin, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    CurrentSuperuser(admin): CurrentSuperuser,
    ApiJson(mut payload): ApiJson<UserCreate>,
) -> AppResult<Json<UserPublic>> {
    payload.validate()?;
    let password = payload.password.clone();
    let user = services::create_user(&state.db, payload).await?;
    info!(admin_id = %admin.id, user_id = %user.id, "user created by superuser");

    if state.config.emails_enabled() {
        let email_data = mail::new_account_email(&state.config, &user.email, &password);
        state.mailer.send(&user.email, &email_data).await?;
    }
    Ok(Json(user.into()))
}

#[instrument(skip_all)]
pub async fn read_user_me(CurrentUser(user): CurrentUser) -> Json<UserPublic> {
    Json(user.into())
}

#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn update_user_me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(mut payload): ApiJson<UserUpdateMe>,
) -> AppResult<Json<UserPublic>> {
    payload.validate()?;
    if let Some(email) = payload.email.as_deref() {
        ensure_email_free(&state, email, user.id).await?;
    }
    let user = services::update_user(&state.db, user, payload.into()).await?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn update_password_me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(payload): ApiJson<UpdatePassword>,
) -> AppResult<Json<Message>> {
    payload.validate()?;
    let matches = verify_password_blocking(
        payload.current_password.clone(),
        user.hashed_password.clone(),
    )
    .await;
    if !matches {
        warn!("incorrect current password");
        return Err(AppError::BadRequest("Incorrect password".into()));
    }
    if payload.current_password == payload.new_password {
        return Err(AppError::BadRequest(
            "New password cannot be the same as the current one".into(),
        ));
    }
    services::set_password(&state.db, user, payload.new_password).await?;
    Ok(Json(Message::new("Password updated successfully")))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn delete_user_me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<Message>> {
    if user.is_superuser {
        return Err(AppError::Forbidden(
            "Super users are not allowed to delete themselves".into(),
        ));
    }
    User::delete(&state.db, user.id).await?;
    info!("user deleted own account");
    Ok(Json(Message::new("User deleted successfully")))
}

#[instrument(skip(state, payload))]
pub async fn register_user(
    State(state): State<AppState>,
    ApiJson(mut payload): ApiJson<UserRegister>,
) -> AppResult<Json<UserPublic>> {
    payload.validate()?;
    let user = services::create_user(&state.db, payload.into()).await?;
    info!(user_id = %user.id, "user registered");
    Ok(Json(user.into()))
}

#[instrument(skip(state, current), fields(current_id = %current.id))]
pub async fn read_user_by_id(
    State(state): State<AppState>,
    CurrentUser(current): CurrentUser,
    ApiPath(user_id): ApiPath<Uuid>,
) -> AppResult<Json<UserPublic>> {
    if current.id == user_id {
        return Ok(Json(current.into()));
    }
    if !current.is_superuser {
        return Err(AppError::InsufficientPrivilege);
    }
    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, _admin, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    CurrentSuperuser(_admin): CurrentSuperuser,
    ApiPath(user_id): ApiPath<Uuid>,
    ApiJson(mut payload): ApiJson<UserUpdate>,
) -> AppResult<Json<UserPublic>> {
    payload.validate()?;
    let existing = User::find_by_id(&state.db, user_id).await?.ok_or_else(|| {
        AppError::not_found("The user with this id does not exist in the system")
    })?;
    if let Some(email) = payload.email.as_deref() {
        ensure_email_free(&state, email, user_id).await?;
    }
    let user = services::update_user(&state.db, existing, payload).await?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn delete_user(
    State(state): State<AppState>,
    CurrentSuperuser(admin): CurrentSuperuser,
    ApiPath(user_id): ApiPath<Uuid>,
) -> AppResult<Json<Message>> {
    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;
    if user.id == admin.id {
        return Err(AppError::Forbidden(
            "Super users are not allowed to delete themselves".into(),
        ));
    }
    User::delete(&state.db, user.id).await?;
    info!(%user_id, "user deleted");
    Ok(Json(Message::new("User deleted successfully")))
}

/// Another account already holding `email` is a conflict; the caller's own is fine.
async fn ensure_email_free(state: &AppState, email: &str, owner: Uuid) -> AppResult<()> {
    match User::find_by_email(&state.db, email).await? {
        Some(other) if other.id != owner => Err(AppError::Conflict(
            "User with this email already exists".into(),
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::build_app;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    #[test]
    fn public_user_hides_hash() {
        let user = User {
            id: Uuid::new_v4(),
            email: "test@example.com".into(),
            hashed_password: "$argon2id$secret".into(),
            is_active: true,
            is_superuser: false,
            full_name: None,
        };
        let raw = serde_json::to_string(&user).unwrap();
        assert!(!raw.contains("argon2"));
        let public = serde_json::to_string(&UserPublic::from(user)).unwrap();
        assert!(public.contains("test@example.com"));
        assert!(!public.contains("hashed_password"));
    }

    #[tokio::test]
    async fn signup_rejects_short_password_before_touching_db() {
        let resp = build_app(AppState::fake())
            .oneshot(
                Request::post("/api/v1/users/signup")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"email":"a@x.com","password":"short"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn users_me_requires_token() {
        let resp = build_app(AppState::fake())
            .oneshot(Request::get("/api/v1/users/me").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}
