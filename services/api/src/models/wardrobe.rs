//! Wardrobe item models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const MAX_TITLE_LEN: usize = 200;
pub const MAX_COLOR_LEN: usize = 50;
pub const MAX_CATEGORY_LEN: usize = 50;

/// Garment owned by a client
#[derive(Debug, Clone, Serialize)]
pub struct WardrobeItem {
    pub id: i64,
    #[serde(skip_serializing)]
    pub user_id: Uuid,
    pub title: String,
    pub color: String,
    pub category: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// `POST /client/wardrobe` body
#[derive(Debug, Deserialize)]
pub struct NewWardrobeItem {
    pub title: String,
    pub color: String,
    #[serde(default)]
    pub category: String,
    pub description: Option<String>,
}

/// `PATCH /client/wardrobe/{id}` body
#[derive(Debug, Default, Deserialize)]
pub struct UpdateWardrobeItem {
    pub title: Option<String>,
    pub color: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
}

fn check_required(field: &str, value: &str, max: usize) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{} may not be blank.", field));
    }
    check_length(field, value, max)
}

fn check_length(field: &str, value: &str, max: usize) -> Result<(), String> {
    if value.chars().count() > max {
        return Err(format!("{} must be at most {} characters.", field, max));
    }
    Ok(())
}

impl NewWardrobeItem {
    pub fn validate(&self) -> Result<(), String> {
        check_required("title", &self.title, MAX_TITLE_LEN)?;
        check_required("color", &self.color, MAX_COLOR_LEN)?;
        check_length("category", &self.category, MAX_CATEGORY_LEN)
    }
}

impl UpdateWardrobeItem {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(title) = &self.title {
            check_required("title", title, MAX_TITLE_LEN)?;
        }
        if let Some(color) = &self.color {
            check_required("color", color, MAX_COLOR_LEN)?;
        }
        if let Some(category) = &self.category {
            check_length("category", category, MAX_CATEGORY_LEN)?;
        }
        Ok(())
    }
}
