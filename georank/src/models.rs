//! Core data models for georank
//!
//! Listings are read-only from the engine's point of view; they are created by
//! the surrounding CRUD layer (or the seeding helpers in `database.rs`).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Latitude within [-90, 90] and longitude within [-180, 180], both finite.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// How precisely a listing's location was captured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LocationPrecision {
    #[default]
    Approximate,
    Precise,
}

impl LocationPrecision {
    pub fn from_database_str(s: &str) -> Self {
        match s {
            "precise" => LocationPrecision::Precise,
            _ => LocationPrecision::Approximate,
        }
    }

    pub fn to_database_str(&self) -> &'static str {
        match self {
            LocationPrecision::Approximate => "approximate",
            LocationPrecision::Precise => "precise",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingLocation {
    pub point: GeoPoint,
    /// Human-readable place string, e.g. "Indiranagar, Bengaluru".
    pub geo: String,
    pub precision: LocationPrecision,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingImage {
    pub id: i64,
    pub url: String,
}

/// A listing as returned by search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: i64,
    pub owner_id: i64,
    pub title: String,
    pub description: String,
    /// Unix milliseconds
    pub created_at: i64,
    pub location: Option<ListingLocation>,
    /// Domain attributes (salary, price, work mode, ...), opaque to ranking.
    pub attributes: Map<String, Value>,
    pub tags: Vec<String>,
    pub images: Vec<ListingImage>,
    pub is_bookmarked: bool,
    pub is_applied: bool,
}

/// Input for seeding a listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewListing {
    pub owner_id: i64,
    pub title: String,
    pub description: String,
    pub created_at: i64,
    pub location: Option<ListingLocation>,
    /// Values for the domain's attribute columns; unknown keys are rejected.
    pub attributes: Map<String, Value>,
    pub tags: Vec<String>,
    pub image_urls: Vec<String>,
}

impl NewListing {
    pub fn new(owner_id: i64, title: impl Into<String>, description: impl Into<String>, created_at: i64) -> Self {
        Self {
            owner_id,
            title: title.into(),
            description: description.into(),
            created_at,
            ..Self::default()
        }
    }

    pub fn at(mut self, latitude: f64, longitude: f64, geo: impl Into<String>) -> Self {
        self.location = Some(ListingLocation {
            point: GeoPoint::new(latitude, longitude),
            geo: geo.into(),
            precision: LocationPrecision::Approximate,
        });
        self
    }

    pub fn attribute(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.to_string(), value.into());
        self
    }
}

/// Parse an embedded JSON string array. Anything unparsable yields an empty list.
pub fn parse_tags(raw: Option<&str>) -> Vec<String> {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return Vec::new();
    };
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        Ok(_) => Vec::new(),
        Err(e) => {
            tracing::debug!("ignoring malformed tag list: {}", e);
            Vec::new()
        }
    }
}
