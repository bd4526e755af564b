//! Client profile repository

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::info;
use uuid::Uuid;

use crate::models::profile::{ClientProfile, UpdateClientProfile};
use crate::recommender::ProfileSource;

const CLIENT_PROFILE_COLUMNS: &str = "user_id, date_of_birth, gender, skin_tone, body_shape, \
     face_shape, style_preferences, created_at, updated_at";

fn client_profile_from_row(row: &PgRow) -> Result<ClientProfile> {
    Ok(ClientProfile {
        user_id: row.try_get("user_id")?,
        date_of_birth: row.try_get("date_of_birth")?,
        gender: row.try_get("gender")?,
        skin_tone: row.try_get("skin_tone")?,
        body_shape: row.try_get("body_shape")?,
        face_shape: row.try_get("face_shape")?,
        style_preferences: row.try_get("style_preferences")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Client profile repository
#[derive(Clone)]
pub struct ClientProfileRepository {
    pool: PgPool,
}

impl ClientProfileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find the profile belonging to a user
    pub async fn find_by_user(&self, user_id: Uuid) -> Result<Option<ClientProfile>> {
        let row = sqlx::query(&format!(
            "SELECT {CLIENT_PROFILE_COLUMNS} FROM client_profiles WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(client_profile_from_row).transpose()
    }

    /// Load the profile, creating an empty one for accounts that predate
    /// profile creation at registration
    pub async fn get_or_create(&self, user_id: Uuid) -> Result<ClientProfile> {
        sqlx::query("INSERT INTO client_profiles (user_id) VALUES ($1) ON CONFLICT DO NOTHING")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        self.find_by_user(user_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("client profile for {} vanished", user_id))
    }

    /// Apply a partial update; absent fields keep their stored value
    pub async fn update(
        &self,
        user_id: Uuid,
        changes: &UpdateClientProfile,
    ) -> Result<ClientProfile> {
        info!("Updating client profile for user: {}", user_id);

        self.get_or_create(user_id).await?;

        let row = sqlx::query(&format!(
            r#"
            UPDATE client_profiles SET
                date_of_birth = COALESCE($2, date_of_birth),
                gender = COALESCE($3, gender),
                skin_tone = COALESCE($4, skin_tone),
                body_shape = COALESCE($5, body_shape),
                face_shape = COALESCE($6, face_shape),
                style_preferences = COALESCE($7, style_preferences),
                updated_at = NOW()
            WHERE user_id = $1
            RETURNING {CLIENT_PROFILE_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(changes.date_of_birth)
        .bind(changes.gender.map(|v| v.as_str()))
        .bind(changes.skin_tone.map(|v| v.as_str()))
        .bind(changes.body_shape.map(|v| v.as_str()))
        .bind(changes.face_shape.map(|v| v.as_str()))
        .bind(changes.style_preferences.clone())
        .fetch_one(&self.pool)
        .await?;

        client_profile_from_row(&row)
    }
}

#[async_trait]
impl ProfileSource for ClientProfileRepository {
    async fn client_profile(&self, user_id: Uuid) -> Result<Option<ClientProfile>> {
        self.find_by_user(user_id).await
    }
}
