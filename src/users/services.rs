use sqlx::PgPool;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::dto::{UserCreate, UserUpdate};
use super::repo_types::User;
use crate::auth::password::{hash_password_blocking, verify_password_blocking};
use crate::error::AppResult;

/// Hashes the password and stores a new user. A taken email is a `Conflict`.
#[instrument(skip(db, input), fields(email = %input.email))]
pub async fn create_user(db: &PgPool, input: UserCreate) -> AppResult<User> {
    let hashed_password = hash_password_blocking(input.password).await?;
    let user = User {
        id: Uuid::new_v4(),
        email: input.email,
        hashed_password,
        is_active: input.is_active,
        is_superuser: input.is_superuser,
        full_name: input.full_name,
    };
    let user = User::insert(db, &user).await?;
    info!(user_id = %user.id, "user created");
    Ok(user)
}

/// Applies `patch` to `existing`; the password is rehashed only when the patch carries one.
#[instrument(skip(db, existing, patch), fields(user_id = %existing.id))]
pub async fn update_user(db: &PgPool, existing: User, mut patch: UserUpdate) -> AppResult<User> {
    let new_hash = match patch.password.take() {
        Some(plain) => Some(hash_password_blocking(plain).await?),
        None => None,
    };
    let updated = apply_update(existing, patch, new_hash);
    Ok(User::save(db, &updated).await?)
}

pub async fn set_password(db: &PgPool, existing: User, plain: String) -> AppResult<User> {
    let patch = UserUpdate {
        password: Some(plain),
        ..Default::default()
    };
    update_user(db, existing, patch).await
}

pub(crate) fn apply_update(mut user: User, patch: UserUpdate, new_hash: Option<String>) -> User {
    if let Some(email) = patch.email {
        user.email = email;
    }
    if let Some(is_active) = patch.is_active {
        user.is_active = is_active;
    }
    if let Some(is_superuser) = patch.is_superuser {
        user.is_superuser = is_superuser;
    }
    if let Some(full_name) = patch.full_name {
        user.full_name = Some(full_name);
    }
    if let Some(hash) = new_hash {
        user.hashed_password = hash;
    }
    user
}

/// `None` both for an unknown email and for a wrong password.
#[instrument(skip(db, password))]
pub async fn authenticate(db: &PgPool, email: &str, password: &str) -> AppResult<Option<User>> {
    let user = User::find_by_email(db, email).await?;
    Ok(check_password(user, password).await)
}

pub(crate) async fn check_password(user: Option<User>, password: &str) -> Option<User> {
    let user = user?;
    if verify_password_blocking(password.to_string(), user.hashed_password.clone()).await {
        Some(user)
    } else {
        warn!(user_id = %user.id, "password mismatch");
        None
    }
}
