use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::taxonomy::Category;
use crate::validation::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCoordinates")]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Deserialize)]
struct RawCoordinates {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<RawCoordinates> for Coordinates {
    type Error = ValidationError;

    fn try_from(raw: RawCoordinates) -> Result<Self, Self::Error> {
        Coordinates::new(raw.latitude, raw.longitude)
    }
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, ValidationError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(ValidationError::Latitude(latitude));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(ValidationError::Longitude(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// The map SDK treats 0/0 as "nothing picked yet".
    pub fn is_unset(&self) -> bool {
        self.latitude == 0.0 && self.longitude == 0.0
    }
}

/// Top match of a forward lookup. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeocodeResult {
    pub latitude: f64,
    pub longitude: f64,
    pub precision: f64,
}

impl GeocodeResult {
    pub fn coordinates(&self) -> Option<Coordinates> {
        Coordinates::new(self.latitude, self.longitude).ok()
    }
}

/// Address fields as the forms hold them; an empty string means "not given".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Address {
    pub address: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub locality: String,
    pub cross_street_1: String,
    pub cross_street_2: String,
}

impl Address {
    pub fn is_blank(&self) -> bool {
        [
            &self.address,
            &self.city,
            &self.state,
            &self.country,
            &self.locality,
            &self.cross_street_1,
            &self.cross_street_2,
        ]
        .iter()
        .all(|field| field.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub artist_id: String,
    pub title: String,
    pub description: String,
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    #[serde(flatten)]
    pub address: Address,
    pub categories: Vec<Category>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub image_path: Option<String>,
    pub ticket_url: Option<String>,
    pub video_url: Option<String>,
    pub created_at_utc: DateTime<Utc>,
    pub updated_at_utc: DateTime<Utc>,
}

impl Event {
    pub fn coordinates(&self) -> Option<Coordinates> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => Coordinates::new(lat, lng).ok(),
            _ => None,
        }
    }

    /// Row invariants: at least one category, no repeats, and sane coordinates.
    pub fn check(&self) -> Result<(), ValidationError> {
        if self.categories.is_empty() {
            return Err(ValidationError::NoCategory);
        }
        for (i, category) in self.categories.iter().enumerate() {
            if self.categories[..i].contains(category) {
                return Err(ValidationError::DuplicateCategory(
                    category.storage_label().to_string(),
                ));
            }
        }
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => {
                Coordinates::new(lat, lng)?;
            }
            (None, None) => {}
            _ => return Err(ValidationError::PartialCoordinates),
        }
        Ok(())
    }
}

/// Stable hash: artist_id|date|title|created_at.
pub fn event_id(artist_id: &str, date: NaiveDate, title: &str, created_at: DateTime<Utc>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(artist_id.as_bytes());
    hasher.update(b"|");
    hasher.update(date.to_string().as_bytes());
    hasher.update(b"|");
    hasher.update(title.trim().as_bytes());
    hasher.update(b"|");
    hasher.update(created_at.to_rfc3339().as_bytes());
    format!("{:x}", hasher.finalize())
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SocialLinks {
    pub instagram: Option<String>,
    pub twitter: Option<String>,
    pub youtube: Option<String>,
    pub website: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Artist,
    Fan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artist {
    pub id: String,
    pub display_name: String,
    pub bio: Option<String>,
    pub image_path: Option<String>,
    #[serde(default)]
    pub social: SocialLinks,
    #[serde(default)]
    pub follower_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fan {
    pub id: String,
    pub display_name: String,
    pub bio: Option<String>,
    pub image_path: Option<String>,
    #[serde(default)]
    pub social: SocialLinks,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Follow {
    pub fan_id: String,
    pub artist_id: String,
    pub created_at_utc: DateTime<Utc>,
}
