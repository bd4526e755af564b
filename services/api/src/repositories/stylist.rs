//! Stylist profile repository
//!
//! Owners read and edit their own profile; clients browse the public view of
//! active stylists, best rated first.

use anyhow::Result;
use serde_json::Value;
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::info;
use uuid::Uuid;

use crate::models::{
    PageQuery, PublicUser,
    profile::{PublicStylist, StylistProfile, UpdateStylistProfile},
};

const STYLIST_PROFILE_COLUMNS: &str = "user_id, bio, expertise, years_experience, rating, \
     rating_count, earnings_total, created_at, updated_at";

const PUBLIC_STYLIST_QUERY: &str = r#"
    SELECT u.id, u.username, u.first_name, u.last_name, u.profile_picture,
           s.bio, s.expertise, s.years_experience, s.rating, s.rating_count, s.updated_at
    FROM stylist_profiles s
    JOIN users u ON u.id = s.user_id
    WHERE u.role = 'stylist' AND u.status = 'active'
"#;

/// Expertise tags stored as a JSON array; anything else reads as empty
fn expertise_from_json(value: Option<Value>) -> Vec<String> {
    match value {
        Some(Value::Array(tags)) => tags
            .into_iter()
            .filter_map(|t| t.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

fn stylist_profile_from_row(row: &PgRow) -> Result<StylistProfile> {
    Ok(StylistProfile {
        user_id: row.try_get("user_id")?,
        bio: row.try_get("bio")?,
        expertise: expertise_from_json(row.try_get("expertise")?),
        years_experience: row.try_get("years_experience")?,
        rating: row.try_get("rating")?,
        rating_count: row.try_get("rating_count")?,
        earnings_total: row.try_get("earnings_total")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn public_stylist_from_row(row: &PgRow) -> Result<PublicStylist> {
    Ok(PublicStylist {
        user: PublicUser {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            profile_picture: row.try_get("profile_picture")?,
        },
        bio: row.try_get("bio")?,
        expertise: expertise_from_json(row.try_get("expertise")?),
        years_experience: row.try_get("years_experience")?,
        rating: row.try_get("rating")?,
        rating_count: row.try_get("rating_count")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Stylist profile repository
#[derive(Clone)]
pub struct StylistProfileRepository {
    pool: PgPool,
}

impl StylistProfileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Load the owner's profile, creating an empty one if missing
    pub async fn get_or_create(&self, user_id: Uuid) -> Result<StylistProfile> {
        sqlx::query("INSERT INTO stylist_profiles (user_id) VALUES ($1) ON CONFLICT DO NOTHING")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        let row = sqlx::query(&format!(
            "SELECT {STYLIST_PROFILE_COLUMNS} FROM stylist_profiles WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        stylist_profile_from_row(&row)
    }

    /// Apply a partial update to the owner-editable fields
    pub async fn update(
        &self,
        user_id: Uuid,
        changes: &UpdateStylistProfile,
    ) -> Result<StylistProfile> {
        info!("Updating stylist profile for user: {}", user_id);

        self.get_or_create(user_id).await?;

        let expertise = changes
            .normalized_expertise()
            .map(serde_json::to_value)
            .transpose()?;

        let row = sqlx::query(&format!(
            r#"
            UPDATE stylist_profiles SET
                bio = COALESCE($2, bio),
                expertise = COALESCE($3, expertise),
                years_experience = COALESCE($4, years_experience),
                updated_at = NOW()
            WHERE user_id = $1
            RETURNING {STYLIST_PROFILE_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(changes.bio.as_deref())
        .bind(expertise)
        .bind(changes.years_experience)
        .fetch_one(&self.pool)
        .await?;

        stylist_profile_from_row(&row)
    }

    /// Page through active stylists by rating, rating count, then recency
    pub async fn list_public(&self, query: &PageQuery) -> Result<(i64, Vec<PublicStylist>)> {
        let count: i64 = sqlx::query(
            r#"
            SELECT COUNT(*) AS count
            FROM stylist_profiles s
            JOIN users u ON u.id = s.user_id
            WHERE u.role = 'stylist' AND u.status = 'active'
            "#,
        )
        .fetch_one(&self.pool)
        .await?
        .try_get("count")?;

        let rows = sqlx::query(&format!(
            "{PUBLIC_STYLIST_QUERY} \
             ORDER BY s.rating DESC, s.rating_count DESC, s.updated_at DESC \
             LIMIT $1 OFFSET $2"
        ))
        .bind(i64::from(query.limit()))
        .bind(query.offset())
        .fetch_all(&self.pool)
        .await?;

        let stylists = rows
            .iter()
            .map(public_stylist_from_row)
            .collect::<Result<Vec<_>>>()?;

        Ok((count, stylists))
    }

    /// Public view of a single active stylist
    pub async fn find_public(&self, user_id: Uuid) -> Result<Option<PublicStylist>> {
        let row = sqlx::query(&format!("{PUBLIC_STYLIST_QUERY} AND u.id = $1"))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(public_stylist_from_row).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_expertise_from_json() {
        assert_eq!(
            expertise_from_json(Some(json!(["bridal", 1, "street"]))),
            vec!["bridal".to_string(), "street".to_string()]
        );
        assert!(expertise_from_json(Some(json!({"a": 1}))).is_empty());
        assert!(expertise_from_json(None).is_empty());
    }
}
