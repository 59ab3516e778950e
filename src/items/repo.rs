use sqlx::PgPool;
use uuid::Uuid;

use super::{dto::ItemCreate, repo_types::Item};

impl Item {
    pub async fn create(db: &PgPool, input: &ItemCreate, owner_id: Uuid) -> Result<Item, sqlx::Error> {
        sqlx::query_as::<_, Item>(
            r#"
            INSERT INTO items (id, title, description, owner_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, title, description, owner_id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&input.title)
        .bind(&input.description)
        .bind(owner_id)
        .fetch_one(db)
        .await
    }

    pub async fn get(db: &PgPool, id: Uuid) -> Result<Option<Item>, sqlx::Error> {
        sqlx::query_as::<_, Item>(
            r#"SELECT id, title, description, owner_id FROM items WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(db)
        .await
    }

    pub async fn list_by_owner(
        db: &PgPool,
        owner_id: Uuid,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<Item>, sqlx::Error> {
        sqlx::query_as::<_, Item>(
            r#"
            SELECT id, title, description, owner_id
            FROM items
            WHERE owner_id = $1
            ORDER BY title, id
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(owner_id)
        .bind(limit)
        .bind(skip)
        .fetch_all(db)
        .await
    }

    pub async fn list_all(db: &PgPool, skip: i64, limit: i64) -> Result<Vec<Item>, sqlx::Error> {
        sqlx::query_as::<_, Item>(
            r#"
            SELECT id, title, description, owner_id
            FROM items
            ORDER BY title, id
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(skip)
        .fetch_all(db)
        .await
    }

    pub async fn count_by_owner(db: &PgPool, owner_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM items WHERE owner_id = $1")
            .bind(owner_id)
            .fetch_one(db)
            .await
    }

    pub async fn count_all(db: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM items")
            .fetch_one(db)
            .await
    }

    /// Persist title/description; `owner_id` never changes.
    pub async fn save(db: &PgPool, item: &Item) -> Result<Item, sqlx::Error> {
        sqlx::query_as::<_, Item>(
            r#"
            UPDATE items SET title = $2, description = $3
             WHERE id = $1
            RETURNING id, title, description, owner_id
            "#,
        )
        .bind(item.id)
        .bind(&item.title)
        .bind(&item.description)
        .fetch_one(db)
        .await
    }

    pub async fn delete(db: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM items WHERE id = $1")
            .bind(id)
            .execute(db)
            .await?;
        Ok(())
    }
}
