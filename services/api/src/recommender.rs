//! Outfit recommendation orchestration
//!
//! Loads the client's styling profile and wardrobe, builds the payload the
//! AI service expects and relays its answer. Stores are reached through the
//! [`ProfileSource`] and [`WardrobeSource`] traits so the flow can run
//! against in-memory fakes.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::models::{
    profile::ClientProfile,
    recommendation::{AiRecommendPayload, DrawerProduct, RecommendResponse, UserInfo},
    wardrobe::WardrobeItem,
};

pub mod client;

pub use client::{AiServiceConfig, RecommendationClient};

/// Upper bound on stored items sent along with a request
pub const STORE_ITEM_LIMIT: i64 = 20;

/// Profile fields the AI service cannot work without, in reporting order
const REQUIRED_PROFILE_FIELDS: [&str; 4] = ["gender", "skin_tone", "face_shape", "body_shape"];

#[async_trait]
pub trait ProfileSource: Send + Sync {
    async fn client_profile(&self, user_id: Uuid) -> anyhow::Result<Option<ClientProfile>>;
}

#[async_trait]
pub trait WardrobeSource: Send + Sync {
    /// Most recently added items first
    async fn recent_items(&self, user_id: Uuid, limit: i64) -> anyhow::Result<Vec<WardrobeItem>>;
}

#[derive(Debug, Error)]
pub enum RecommendError {
    #[error("Client profile not found.")]
    ProfileNotFound,

    #[error("Missing required profile fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("No wardrobe items available for recommendation.")]
    NoItems,

    #[error("AI service error ({status}): {body}")]
    Upstream { status: u16, body: Value },

    #[error("AI service unreachable: {0}")]
    Unreachable(String),

    #[error("AI service returned an unexpected response: {0}")]
    MalformedResponse(String),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// Where the garments for a request come from
#[derive(Debug, Clone)]
pub enum ItemSource {
    /// Caller supplied items; the wardrobe store is not consulted
    Override(Vec<DrawerProduct>),
    /// The user's most recent stored items
    Store,
}

impl ItemSource {
    /// HTTP semantics: an absent or empty list means "use my wardrobe"
    pub fn from_request(products: Vec<DrawerProduct>) -> Self {
        if products.is_empty() {
            ItemSource::Store
        } else {
            ItemSource::Override(products)
        }
    }
}

#[derive(Debug, Clone)]
pub struct RecommendationInput {
    pub user_id: Uuid,
    pub destination: String,
    pub occasion: String,
    pub requested_at: DateTime<Utc>,
    pub items: ItemSource,
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(|v| v.trim().is_empty())
}

/// Required fields that are absent or blank, in fixed order
pub fn missing_profile_fields(profile: &ClientProfile) -> Vec<&'static str> {
    REQUIRED_PROFILE_FIELDS
        .into_iter()
        .filter(|field| {
            let value = match *field {
                "gender" => &profile.gender,
                "skin_tone" => &profile.skin_tone,
                "face_shape" => &profile.face_shape,
                _ => &profile.body_shape,
            };
            is_blank(value)
        })
        .collect()
}

/// Translate a stored skin tone into the AI service's vocabulary
///
/// Unknown values pass through unchanged.
pub fn map_skin_tone(value: Option<&str>) -> Option<String> {
    let value = value?;
    let mapped = match value.trim().to_lowercase().as_str() {
        "fair" | "light" => "white",
        "medium" => "wheat",
        "tan" => "tan",
        "olive" => "olive",
        "brown" => "brown",
        "dark" => "dark",
        _ => return Some(value.to_string()),
    };
    Some(mapped.to_string())
}

/// Assemble the outbound request body
pub fn build_payload(
    profile: &ClientProfile,
    drawer_products: Vec<DrawerProduct>,
    destination: &str,
    occasion: &str,
) -> AiRecommendPayload {
    AiRecommendPayload {
        user_info: UserInfo {
            gender: profile.gender.clone(),
            skin_tone: map_skin_tone(profile.skin_tone.as_deref()),
            color_preferences: profile.color_preferences(),
            face_shape: profile.face_shape.clone(),
            body_shape: profile.body_shape.clone(),
        },
        drawer_products,
        location: destination.to_string(),
        occasion: occasion.to_string(),
    }
}

/// Recommendation orchestrator
#[derive(Clone)]
pub struct Recommender {
    profiles: Arc<dyn ProfileSource>,
    wardrobe: Arc<dyn WardrobeSource>,
    client: RecommendationClient,
}

impl Recommender {
    pub fn new(
        profiles: Arc<dyn ProfileSource>,
        wardrobe: Arc<dyn WardrobeSource>,
        client: RecommendationClient,
    ) -> Self {
        Self {
            profiles,
            wardrobe,
            client,
        }
    }

    /// Produce outfit suggestions for a client
    pub async fn recommend(
        &self,
        input: RecommendationInput,
    ) -> Result<RecommendResponse, RecommendError> {
        let profile = self
            .profiles
            .client_profile(input.user_id)
            .await?
            .ok_or(RecommendError::ProfileNotFound)?;

        let missing = missing_profile_fields(&profile);
        if !missing.is_empty() {
            return Err(RecommendError::MissingFields(missing));
        }

        let drawer_products = match input.items {
            ItemSource::Override(products) => products,
            ItemSource::Store => self
                .wardrobe
                .recent_items(input.user_id, STORE_ITEM_LIMIT)
                .await?
                .iter()
                .map(DrawerProduct::from)
                .collect(),
        };
        if drawer_products.is_empty() {
            return Err(RecommendError::NoItems);
        }

        info!(
            "Requesting recommendations for user {} with {} items (requested for {})",
            input.user_id,
            drawer_products.len(),
            input.requested_at.to_rfc3339()
        );

        let payload = build_payload(
            &profile,
            drawer_products,
            &input.destination,
            &input.occasion,
        );

        self.client.recommend(&payload).await
    }
}
