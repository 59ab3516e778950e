use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Item record; also the public shape returned to clients.
#[derive(Debug, Clone, Serialize, FromRow, PartialEq, Eq)]
pub struct Item {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub owner_id: Uuid, // users.id, ON DELETE CASCADE
}
