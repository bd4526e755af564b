//! Recommendation request, outbound payload and AI service response

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::wardrobe::WardrobeItem;

pub const MAX_DESTINATION_LEN: usize = 100;
pub const MAX_OCCASION_LEN: usize = 50;

/// Garment as exchanged with the AI service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawerProduct {
    pub id: i64,
    pub title: String,
    pub color: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl From<&WardrobeItem> for DrawerProduct {
    fn from(item: &WardrobeItem) -> Self {
        Self {
            id: item.id,
            title: item.title.clone(),
            color: item.color.clone(),
            category: item.category.clone(),
            description: Some(item.description.clone().unwrap_or_default()),
        }
    }
}

/// `POST /client/recommendations` body
#[derive(Debug, Deserialize)]
pub struct RecommendRequest {
    pub destination: String,
    pub occasion: String,
    pub datetime: DateTime<Utc>,
    /// Absent or empty means "use the stored wardrobe"
    #[serde(default)]
    pub drawer_products: Vec<DrawerProduct>,
}

impl RecommendRequest {
    pub fn validate(&self) -> Result<(), String> {
        check_text("destination", &self.destination, MAX_DESTINATION_LEN)?;
        check_text("occasion", &self.occasion, MAX_OCCASION_LEN)?;

        for product in &self.drawer_products {
            if [&product.title, &product.color, &product.category]
                .iter()
                .any(|v| v.trim().is_empty())
            {
                return Err(format!(
                    "drawer_products item {} needs a title, color and category.",
                    product.id
                ));
            }
        }
        Ok(())
    }
}

fn check_text(field: &str, value: &str, max: usize) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{} may not be blank.", field));
    }
    if value.chars().count() > max {
        return Err(format!("{} must be at most {} characters.", field, max));
    }
    Ok(())
}

/// Styling attributes sent to the AI service
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserInfo {
    pub gender: Option<String>,
    pub skin_tone: Option<String>,
    pub color_preferences: Vec<String>,
    pub face_shape: Option<String>,
    pub body_shape: Option<String>,
}

/// Outbound request body for the AI service
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AiRecommendPayload {
    pub user_info: UserInfo,
    pub drawer_products: Vec<DrawerProduct>,
    pub location: String,
    pub occasion: String,
}

/// One suggested outfit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendItem {
    pub name: String,
    pub description: String,
    pub product_ids: Vec<i64>,
}

/// AI service response, relayed to the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendResponse {
    pub recommendations: Vec<RecommendItem>,
}
