//! Directory tests against a real Postgres. Run with
//! `DATABASE_URL=... cargo test -- --ignored`.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::FromRef,
    http::{Request, StatusCode},
};
use sqlx::PgPool;
use tower::ServiceExt;

use super::dto::{UserCreate, UserUpdate};
use super::repo_types::User;
use super::services::{authenticate, create_user, update_user};
use crate::app::build_app;
use crate::auth::{extractors::resolve_user, jwt::JwtKeys, password::verify_password};
use crate::config::test_config;
use crate::error::AppError;
use crate::items::{dto::ItemCreate, repo_types::Item};
use crate::mail::{testing::CapturingMailer, LogMailer};
use crate::state::AppState;

fn new_user(email: &str, password: &str) -> UserCreate {
    UserCreate {
        email: email.into(),
        password: password.into(),
        is_active: true,
        is_superuser: false,
        full_name: None,
    }
}

fn state_for(pool: &PgPool) -> AppState {
    AppState::from_parts(pool.clone(), Arc::new(test_config()), Arc::new(LogMailer))
}

async fn add_item(pool: &PgPool, owner: &User, title: &str) -> Item {
    let input = ItemCreate {
        title: title.into(),
        description: None,
    };
    Item::create(pool, &input, owner.id).await.unwrap()
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs DATABASE_URL"]
async fn create_then_authenticate(pool: PgPool) {
    let created = create_user(&pool, new_user("a@x.com", "longpass1")).await.unwrap();
    assert_ne!(created.hashed_password, "longpass1");

    let found = authenticate(&pool, "a@x.com", "longpass1").await.unwrap();
    assert_eq!(found.map(|u| u.id), Some(created.id));

    assert!(authenticate(&pool, "a@x.com", "wrong").await.unwrap().is_none());
    assert!(authenticate(&pool, "nobody@x.com", "longpass1")
        .await
        .unwrap()
        .is_none());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs DATABASE_URL"]
async fn duplicate_email_is_conflict(pool: PgPool) {
    create_user(&pool, new_user("a@x.com", "longpass1")).await.unwrap();
    let err = create_user(&pool, new_user("a@x.com", "otherpass2"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs DATABASE_URL"]
async fn update_rehashes_only_with_password(pool: PgPool) {
    let user = create_user(&pool, new_user("a@x.com", "longpass1")).await.unwrap();
    let hash = user.hashed_password.clone();

    let patch = UserUpdate {
        full_name: Some("Ada".into()),
        ..Default::default()
    };
    let user = update_user(&pool, user, patch).await.unwrap();
    assert_eq!(user.hashed_password, hash);
    assert_eq!(user.full_name.as_deref(), Some("Ada"));

    let patch = UserUpdate {
        password: Some("newpass99".into()),
        ..Default::default()
    };
    let user = update_user(&pool, user, patch).await.unwrap();
    assert!(verify_password("newpass99", &user.hashed_password));
    assert_eq!(user.full_name.as_deref(), Some("Ada"));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs DATABASE_URL"]
async fn deleting_user_removes_items(pool: PgPool) {
    let user = create_user(&pool, new_user("a@x.com", "longpass1")).await.unwrap();
    let item = add_item(&pool, &user, "Groceries").await;

    User::delete(&pool, user.id).await.unwrap();
    assert!(User::find_by_id(&pool, user.id).await.unwrap().is_none());
    assert!(Item::get(&pool, item.id).await.unwrap().is_none());
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs DATABASE_URL"]
async fn valid_token_of_inactive_user_is_inactive(pool: PgPool) {
    let mut input = new_user("idle@x.com", "longpass1");
    input.is_active = false;
    let user = create_user(&pool, input).await.unwrap();

    let state = state_for(&pool);
    let token = JwtKeys::from_ref(&state).sign_access(user.id).unwrap();
    let err = resolve_user(&state, &token).await.unwrap_err();
    assert!(matches!(err, AppError::InactiveUser));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs DATABASE_URL"]
async fn valid_token_of_deleted_user_is_not_found(pool: PgPool) {
    let user = create_user(&pool, new_user("gone@x.com", "longpass1")).await.unwrap();
    let state = state_for(&pool);
    let token = JwtKeys::from_ref(&state).sign_access(user.id).unwrap();
    assert_eq!(resolve_user(&state, &token).await.unwrap().id, user.id);

    User::delete(&pool, user.id).await.unwrap();
    let err = resolve_user(&state, &token).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs DATABASE_URL"]
async fn owner_listing_is_scoped(pool: PgPool) {
    let alice = create_user(&pool, new_user("alice@x.com", "longpass1")).await.unwrap();
    let bob = create_user(&pool, new_user("bob@x.com", "longpass1")).await.unwrap();
    add_item(&pool, &alice, "Apples").await;
    add_item(&pool, &alice, "Bread").await;
    add_item(&pool, &bob, "Cheese").await;

    let mine = Item::list_by_owner(&pool, alice.id, 0, 100).await.unwrap();
    assert_eq!(mine.len(), 2);
    assert!(mine.iter().all(|i| i.owner_id == alice.id));
    assert_eq!(Item::count_by_owner(&pool, alice.id).await.unwrap(), 2);
    assert_eq!(Item::count_by_owner(&pool, bob.id).await.unwrap(), 1);
    assert_eq!(Item::count_all(&pool).await.unwrap(), 3);

    let page = Item::list_by_owner(&pool, alice.id, 1, 1).await.unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].title, "Bread");
}

#[sqlx::test(migrations = "./migrations")]
#[ignore = "needs DATABASE_URL"]
async fn recovery_email_carries_working_reset_token(pool: PgPool) {
    create_user(&pool, new_user("a@x.com", "longpass1")).await.unwrap();
    let mailer = Arc::new(CapturingMailer::default());
    let state = AppState::from_parts(pool.clone(), Arc::new(test_config()), mailer.clone());
    let app = build_app(state.clone());

    let resp = app
        .clone()
        .oneshot(
            Request::post("/api/v1/password-recovery/a@x.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let (to, email) = mailer.sent.lock().unwrap().pop().expect("recovery email");
    assert_eq!(to, "a@x.com");
    let token = email
        .html_content
        .split("reset-password?token=")
        .nth(1)
        .and_then(|rest| rest.split('"').next())
        .unwrap()
        .to_string();
    assert_eq!(
        JwtKeys::from_ref(&state).verify_password_reset(&token).as_deref(),
        Some("a@x.com")
    );

    let body = serde_json::json!({ "token": token, "new_password": "brandnew9" });
    let resp = app
        .oneshot(
            Request::post("/api/v1/reset-password/")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    assert!(authenticate(&pool, "a@x.com", "brandnew9").await.unwrap().is_some());
    assert!(authenticate(&pool, "a@x.com", "longpass1").await.unwrap().is_none());
}
