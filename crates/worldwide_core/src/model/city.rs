//! City domain model.
//!
//! # Responsibility
//! - Define the persisted `City` record and its JSON wire shape.
//! - Define create/update payloads and the create-time presence check.
//!
//! # Invariants
//! - `id`, `created_at` and `updated_at` are never taken from client input;
//!   payload types do not even carry them.
//! - `updated_at >= created_at`.
//! - A `NewCity` always has non-blank `city_name`/`country` and a position.
//!
//! Wire names are camelCase (`cityName`, `createdAt`, ...) to match the
//! browser client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use uuid::Uuid;

/// Store-assigned identifier of a city record.
pub type CityId = Uuid;

/// Well-formed map coordinates.
///
/// Records keep `position` exactly as the client sent it; this type is the
/// typed view used to build and read coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub lat: f64,
    pub lng: f64,
}

impl Position {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl From<Position> for Value {
    fn from(position: Position) -> Self {
        json!({ "lat": position.lat, "lng": position.lng })
    }
}

/// One visited city, as stored and as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct City {
    pub id: CityId,
    pub city_name: String,
    pub country: String,
    /// Flag glyph derived by the client from the country code.
    pub emoji: Option<String>,
    /// Visit date exactly as the client sent it.
    #[serde(default)]
    pub date: Option<Value>,
    pub notes: String,
    /// `{lat, lng}` as sent; a partial update may leave one coordinate out.
    pub position: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl City {
    /// Typed coordinates, when both are present and numeric.
    pub fn coordinates(&self) -> Option<Position> {
        Position::deserialize(&self.position).ok()
    }
}

/// Required create fields, in the order they are reported.
pub const REQUIRED_CITY_FIELDS: [&str; 3] = ["cityName", "country", "position"];

/// Create payload exactly as received at the API boundary.
///
/// Every field is optional here so that absence can be reported as a
/// validation error instead of a decoding error. `position` and `date` are
/// kept as raw JSON: only their presence is checked.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CityDraft {
    pub city_name: Option<String>,
    pub country: Option<String>,
    pub emoji: Option<String>,
    pub date: Option<Value>,
    pub notes: Option<String>,
    pub position: Option<Value>,
}

impl CityDraft {
    /// Presence check for `cityName`, `country` and `position`.
    ///
    /// Blank text and a falsy `position` (`null`, `false`, `0`, `""`) count
    /// as absent. No range or format checks are made.
    pub fn validate(self) -> Result<NewCity, CityValidationError> {
        let city_name = non_blank(self.city_name);
        let country = non_blank(self.country);
        let position = self.position.filter(is_truthy);

        match (city_name, country, position) {
            (Some(city_name), Some(country), Some(position)) => Ok(NewCity {
                city_name,
                country,
                emoji: self.emoji,
                date: self.date,
                notes: self.notes.unwrap_or_default(),
                position,
            }),
            (city_name, country, position) => {
                let present = [city_name.is_some(), country.is_some(), position.is_some()];
                let missing = REQUIRED_CITY_FIELDS
                    .iter()
                    .zip(present)
                    .filter(|(_, present)| !present)
                    .map(|(field, _)| *field)
                    .collect();
                Err(CityValidationError::MissingFields(missing))
            }
        }
    }
}

/// Validated create payload, ready for persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCity {
    pub city_name: String,
    pub country: String,
    pub emoji: Option<String>,
    pub date: Option<Value>,
    pub notes: String,
    pub position: Value,
}

impl NewCity {
    pub fn new(city_name: impl Into<String>, country: impl Into<String>, position: Position) -> Self {
        Self {
            city_name: city_name.into(),
            country: country.into(),
            emoji: None,
            date: None,
            notes: String::new(),
            position: position.into(),
        }
    }
}

/// Partial update payload: a shallow `$set` of the top-level fields sent.
///
/// The outer `Option` is "field present in the request". An explicit `null`
/// clears `emoji`, `date` and `position`, and resets `notes` to `""`;
/// `cityName`/`country` must be strings when present. `position` replaces
/// the stored value wholesale, so sending only `lat` drops `lng`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CityPatch {
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub city_name: Option<String>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub emoji: Option<Option<String>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub date: Option<Value>,
    #[serde(default, deserialize_with = "text_or_empty", skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub position: Option<Value>,
}

impl CityPatch {
    /// True when the patch would only refresh `updatedAt`.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Create payload failed the boundary presence check.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CityValidationError {
    /// Lists the absent fields using their wire names.
    #[error("Missing required fields: cityName, country, position")]
    MissingFields(Vec<&'static str>),
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => false,
        Value::Number(number) => number.as_f64() != Some(0.0),
        Value::String(text) => !text.is_empty(),
        Value::Bool(true) | Value::Array(_) | Value::Object(_) => true,
    }
}

// Only runs for keys present in the input, so `null` lands as `Some(T::null)`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

fn text_or_empty<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(|text| Some(text.unwrap_or_default()))
}
