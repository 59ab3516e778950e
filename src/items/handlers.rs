use axum::{
    extract::State,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::{ItemCreate, ItemUpdate, ItemsPublic},
    repo_types::Item,
};
use crate::{
    auth::extractors::CurrentUser,
    common::{Message, Pagination},
    error::{AppError, AppResult},
    extract::{ApiJson, ApiPath, ApiQuery},
    state::AppState,
    users::repo_types::User,
};

pub fn item_routes() -> Router<AppState> {
    Router::new()
        .route("/items/", get(read_items).post(create_item))
        .route(
            "/items/:id",
            get(read_item).put(update_item).delete(delete_item),
        )
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn read_items(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiQuery(p): ApiQuery<Pagination>,
) -> AppResult<Json<ItemsPublic>> {
    let (skip, limit) = p.bounds();
    let (count, data) = if user.is_superuser {
        (
            Item::count_all(&state.db).await?,
            Item::list_all(&state.db, skip, limit).await?,
        )
    } else {
        (
            Item::count_by_owner(&state.db, user.id).await?,
            Item::list_by_owner(&state.db, user.id, skip, limit).await?,
        )
    };
    Ok(Json(ItemsPublic { data, count }))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn read_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<Item>> {
    let item = load_owned(&state, &user, id).await?;
    Ok(Json(item))
}

#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn create_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiJson(payload): ApiJson<ItemCreate>,
) -> AppResult<Json<Item>> {
    payload.validate()?;
    let item = Item::create(&state.db, &payload, user.id).await?;
    info!(item_id = %item.id, "item created");
    Ok(Json(item))
}

#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn update_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<ItemUpdate>,
) -> AppResult<Json<Item>> {
    payload.validate()?;
    let item = load_owned(&state, &user, id).await?;
    let item = Item::save(&state.db, &payload.apply(item)).await?;
    Ok(Json(item))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn delete_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<Message>> {
    let item = load_owned(&state, &user, id).await?;
    Item::delete(&state.db, item.id).await?;
    info!(item_id = %id, "item deleted");
    Ok(Json(Message::new("Item deleted successfully")))
}

async fn load_owned(state: &AppState, user: &User, id: Uuid) -> AppResult<Item> {
    let item = Item::get(&state.db, id)
        .await?
        .ok_or_else(|| AppError::not_found("Item not found"))?;
    ensure_can_access(user, &item)?;
    Ok(item)
}

/// Owners and superusers only.
pub(crate) fn ensure_can_access(user: &User, item: &Item) -> AppResult<()> {
    if user.is_superuser || item.owner_id == user.id {
        return Ok(());
    }
    warn!(user_id = %user.id, item_id = %item.id, "item access denied");
    Err(AppError::BadRequest("Not enough permissions".into()))
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

    fn user(is_superuser: bool) -> User {
        User {
            id: Uuid::new_v4(),
            email: "a@x.com".into(),
            hashed_password: String::new(),
            is_active: true,
            is_superuser,
            full_name: None,
        }
    }

    fn item_of(owner: &User) -> Item {
        Item {
            id: Uuid::new_v4(),
            title: "Groceries".into(),
            description: None,
            owner_id: owner.id,
        }
    }

    #[test]
    fn owner_and_superuser_may_access() {
        let owner = user(false);
        let item = item_of(&owner);
        assert!(ensure_can_access(&owner, &item).is_ok());
        assert!(ensure_can_access(&user(true), &item).is_ok());

        let err = ensure_can_access(&user(false), &item).unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Not enough permissions");
    }

    #[tokio::test]
    async fn items_require_token() {
        let resp = build_app(AppState::fake())
            .oneshot(Request::get("/api/v1/items/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}
