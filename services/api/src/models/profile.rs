//! Client and stylist profile models

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::{PublicUser, UserSummary};

macro_rules! vocabulary {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }
    };
}

vocabulary!(
    /// Gender choices
    Gender {
        Male => "male",
        Female => "female",
        NonBinary => "non_binary",
        Other => "other",
        PreferNotToSay => "prefer_not_to_say",
    }
);

vocabulary!(
    /// Skin tone choices
    SkinTone {
        Fair => "fair",
        Light => "light",
        Medium => "medium",
        Tan => "tan",
        Olive => "olive",
        Brown => "brown",
        Dark => "dark",
    }
);

vocabulary!(
    /// Body shape choices
    BodyShape {
        Rectangle => "rectangle",
        Hourglass => "hourglass",
        Pear => "pear",
        Apple => "apple",
        InvertedTriangle => "inverted_triangle",
    }
);

vocabulary!(
    /// Face shape choices
    FaceShape {
        Oval => "oval",
        Round => "round",
        Square => "square",
        Heart => "heart",
        Diamond => "diamond",
        Oblong => "oblong",
    }
);

/// Stored client profile
///
/// Styling attributes are kept as text so rows written before a vocabulary
/// change still load.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ClientProfile {
    #[serde(skip_serializing)]
    pub user_id: Uuid,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub skin_tone: Option<String>,
    pub body_shape: Option<String>,
    pub face_shape: Option<String>,
    pub style_preferences: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ClientProfile {
    /// String entries of `style_preferences.colors`
    pub fn color_preferences(&self) -> Vec<String> {
        self.style_preferences
            .as_ref()
            .and_then(|prefs| prefs.get("colors"))
            .and_then(Value::as_array)
            .map(|colors| {
                colors
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Client profile as returned to its owner
#[derive(Debug, Serialize)]
pub struct ClientProfileResponse {
    pub user: UserSummary,
    #[serde(flatten)]
    pub profile: ClientProfile,
}

/// `PATCH /client/me` body; absent fields are left unchanged
#[derive(Debug, Default, Deserialize)]
pub struct UpdateClientProfile {
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub skin_tone: Option<SkinTone>,
    pub body_shape: Option<BodyShape>,
    pub face_shape: Option<FaceShape>,
    pub style_preferences: Option<Value>,
}

impl UpdateClientProfile {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(prefs) = &self.style_preferences {
            let prefs = prefs
                .as_object()
                .ok_or("style_preferences must be an object.")?;
            if let Some(colors) = prefs.get("colors") {
                let valid = colors
                    .as_array()
                    .is_some_and(|list| list.iter().all(Value::is_string));
                if !valid {
                    return Err("style_preferences.colors must be a list of strings.".into());
                }
            }
        }
        if let Some(dob) = self.date_of_birth {
            if dob > Utc::now().date_naive() {
                return Err("date_of_birth cannot be in the future.".into());
            }
        }
        Ok(())
    }
}

/// Stored stylist profile
#[derive(Debug, Clone, Serialize)]
pub struct StylistProfile {
    #[serde(skip_serializing)]
    pub user_id: Uuid,
    pub bio: Option<String>,
    pub expertise: Vec<String>,
    pub years_experience: Option<i32>,
    pub rating: f64,
    pub rating_count: i32,
    pub earnings_total: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Stylist profile as returned to its owner
#[derive(Debug, Serialize)]
pub struct StylistProfileResponse {
    pub user: UserSummary,
    #[serde(flatten)]
    pub profile: StylistProfile,
}

/// Stylist profile as browsed by clients (no earnings)
#[derive(Debug, Serialize)]
pub struct PublicStylist {
    pub user: PublicUser,
    pub bio: Option<String>,
    pub expertise: Vec<String>,
    pub years_experience: Option<i32>,
    pub rating: f64,
    pub rating_count: i32,
    pub updated_at: DateTime<Utc>,
}

/// `PATCH /stylist/me` body
///
/// Rating, rating count and earnings are not accepted here; unknown keys
/// are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateStylistProfile {
    pub bio: Option<String>,
    pub expertise: Option<Vec<String>>,
    pub years_experience: Option<i32>,
}

const MAX_EXPERTISE_TAG: usize = 50;

impl UpdateStylistProfile {
    pub fn validate(&self) -> Result<(), String> {
        if matches!(self.years_experience, Some(years) if years < 0) {
            return Err("years_experience must be zero or greater.".into());
        }
        if let Some(tags) = &self.expertise {
            if tags
                .iter()
                .any(|t| t.trim().is_empty() || t.chars().count() > MAX_EXPERTISE_TAG)
            {
                return Err(format!(
                    "expertise entries must be non-blank and at most {} characters.",
                    MAX_EXPERTISE_TAG
                ));
            }
        }
        Ok(())
    }

    /// Expertise tags trimmed, in the order given
    pub fn normalized_expertise(&self) -> Option<Vec<String>> {
        self.expertise
            .as_ref()
            .map(|tags| tags.iter().map(|t| t.trim().to_string()).collect())
    }
}
