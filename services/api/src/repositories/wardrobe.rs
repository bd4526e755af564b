//! Wardrobe repository; every query is scoped to the owning user

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::info;
use uuid::Uuid;

use crate::models::{
    PageQuery,
    wardrobe::{NewWardrobeItem, UpdateWardrobeItem, WardrobeItem},
};
use crate::recommender::WardrobeSource;

const WARDROBE_COLUMNS: &str =
    "id, user_id, title, color, category, description, created_at, updated_at";

fn wardrobe_item_from_row(row: &PgRow) -> Result<WardrobeItem> {
    Ok(WardrobeItem {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        title: row.try_get("title")?,
        color: row.try_get("color")?,
        category: row.try_get("category")?,
        description: row.try_get("description")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Wardrobe repository
#[derive(Clone)]
pub struct WardrobeRepository {
    pool: PgPool,
}

impl WardrobeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Page through a user's items, newest first
    pub async fn list(&self, user_id: Uuid, query: &PageQuery) -> Result<(i64, Vec<WardrobeItem>)> {
        let count: i64 =
            sqlx::query("SELECT COUNT(*) AS count FROM wardrobe_items WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?
                .try_get("count")?;

        let rows = sqlx::query(&format!(
            r#"
            SELECT {WARDROBE_COLUMNS}
            FROM wardrobe_items
            WHERE user_id = $1
            ORDER BY id DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(user_id)
        .bind(i64::from(query.limit()))
        .bind(query.offset())
        .fetch_all(&self.pool)
        .await?;

        let items = rows
            .iter()
            .map(wardrobe_item_from_row)
            .collect::<Result<Vec<_>>>()?;

        Ok((count, items))
    }

    /// The `limit` most recently added items (highest id first)
    pub async fn recent_for_user(&self, user_id: Uuid, limit: i64) -> Result<Vec<WardrobeItem>> {
        let rows = sqlx::query(&format!(
            "SELECT {WARDROBE_COLUMNS} FROM wardrobe_items WHERE user_id = $1 ORDER BY id DESC LIMIT $2"
        ))
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(wardrobe_item_from_row).collect()
    }

    /// Find one of the user's items
    pub async fn find(&self, user_id: Uuid, id: i64) -> Result<Option<WardrobeItem>> {
        let row = sqlx::query(&format!(
            "SELECT {WARDROBE_COLUMNS} FROM wardrobe_items WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(wardrobe_item_from_row).transpose()
    }

    /// Add an item to the user's wardrobe
    pub async fn create(&self, user_id: Uuid, item: &NewWardrobeItem) -> Result<WardrobeItem> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO wardrobe_items (user_id, title, color, category, description)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {WARDROBE_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(item.title.trim())
        .bind(item.color.trim())
        .bind(item.category.trim())
        .bind(item.description.as_deref())
        .fetch_one(&self.pool)
        .await?;

        let created = wardrobe_item_from_row(&row)?;
        info!("Added wardrobe item {} for user {}", created.id, user_id);
        Ok(created)
    }

    /// Partially update one of the user's items
    pub async fn update(
        &self,
        user_id: Uuid,
        id: i64,
        changes: &UpdateWardrobeItem,
    ) -> Result<Option<WardrobeItem>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE wardrobe_items SET
                title = COALESCE($3, title),
                color = COALESCE($4, color),
                category = COALESCE($5, category),
                description = COALESCE($6, description),
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING {WARDROBE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(user_id)
        .bind(changes.title.as_deref().map(str::trim))
        .bind(changes.color.as_deref().map(str::trim))
        .bind(changes.category.as_deref().map(str::trim))
        .bind(changes.description.as_deref())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(wardrobe_item_from_row).transpose()
    }

    /// Delete one of the user's items; false when it does not exist
    pub async fn delete(&self, user_id: Uuid, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM wardrobe_items WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl WardrobeSource for WardrobeRepository {
    async fn recent_items(&self, user_id: Uuid, limit: i64) -> Result<Vec<WardrobeItem>> {
        self.recent_for_user(user_id, limit).await
    }
}
