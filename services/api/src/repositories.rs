//! Repositories for database operations

use anyhow::Result;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::UserSummary;

pub mod profile;
pub mod stylist;
pub mod wardrobe;

pub use profile::ClientProfileRepository;
pub use stylist::StylistProfileRepository;
pub use wardrobe::WardrobeRepository;

/// Read-only access to accounts owned by the auth service
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find the account summary for a user ID
    pub async fn find_summary(&self, id: Uuid) -> Result<Option<UserSummary>> {
        let row = sqlx::query(
            r#"
            SELECT id, email, username, phone, first_name, last_name,
                   profile_picture, role, status, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(UserSummary {
                id: row.try_get("id")?,
                email: row.try_get("email")?,
                username: row.try_get("username")?,
                phone: row.try_get("phone")?,
                first_name: row.try_get("first_name")?,
                last_name: row.try_get("last_name")?,
                profile_picture: row.try_get("profile_picture")?,
                role: row.try_get("role")?,
                status: row.try_get("status")?,
                created_at: row.try_get("created_at")?,
            })),
            None => Ok(None),
        }
    }
}
