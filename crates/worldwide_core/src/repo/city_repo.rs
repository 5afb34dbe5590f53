//! City repository contract and document-store implementation.
//!
//! # Responsibility
//! - Provide CRUD over the `cities` collection.
//! - Parse identifiers and map documents to/from `City`.
//! - Stamp `createdAt`/`updatedAt`.
//!
//! # Invariants
//! - A malformed identifier is `InvalidId`, never a silent "no match".
//! - A zero match count on get/update/delete is `NotFound`, never success.
//! - `list_cities` is all-or-nothing: one undecodable document fails the call.

use crate::db::{Collection, Database, DbError, Document, StoredDocument};
use crate::model::city::{City, CityId, CityPatch, NewCity};
use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

/// Name of the collection holding city documents.
pub const CITIES_COLLECTION: &str = "cities";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for city persistence and query operations.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("City not found: {0}")]
    NotFound(CityId),
    #[error("invalid city id `{0}`")]
    InvalidId(String),
    #[error("storage failure: {0}")]
    Storage(#[from] DbError),
    #[error("invalid persisted city data: {0}")]
    InvalidData(String),
}

/// Repository interface for city CRUD operations.
pub trait CityRepository {
    /// All cities, newest-created first.
    fn list_cities(&self) -> RepoResult<Vec<City>>;
    fn get_city(&self, id: &str) -> RepoResult<City>;
    /// Stores a new city and returns it with generated fields populated.
    fn create_city(&self, city: &NewCity) -> RepoResult<City>;
    /// Applies `patch` and returns the record as read back after the write.
    fn update_city(&self, id: &str, patch: &CityPatch) -> RepoResult<City>;
    /// Hard-deletes one city; returns the deleted count.
    fn delete_city(&self, id: &str) -> RepoResult<u64>;
    fn count_cities(&self) -> RepoResult<u64>;
    /// Removes every city; returns the deleted count.
    fn delete_all_cities(&self) -> RepoResult<u64>;
}

/// Persisted document body; the identifier lives outside the body.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CityDocument {
    city_name: String,
    country: String,
    emoji: Option<String>,
    #[serde(default)]
    date: Option<Value>,
    #[serde(default)]
    notes: String,
    position: Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Document-store backed city repository.
#[derive(Debug, Clone)]
pub struct DocumentCityRepository {
    collection: Collection,
}

impl DocumentCityRepository {
    /// Binds the repository to the `cities` collection of `database`.
    pub fn new(database: &Database) -> Self {
        Self {
            collection: database.collection(CITIES_COLLECTION),
        }
    }
}

impl CityRepository for DocumentCityRepository {
    fn list_cities(&self) -> RepoResult<Vec<City>> {
        let mut cities = self
            .collection
            .find_all()?
            .into_iter()
            .map(city_from_document)
            .collect::<RepoResult<Vec<_>>>()?;
        // Stable sort: equal timestamps keep most-recent-insert-first order.
        cities.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(cities)
    }

    fn get_city(&self, id: &str) -> RepoResult<City> {
        let city_id = parse_city_id(id)?;
        match self.collection.find_one(city_id)? {
            Some(stored) => city_from_document(stored),
            None => Err(RepoError::NotFound(city_id)),
        }
    }

    fn create_city(&self, city: &NewCity) -> RepoResult<City> {
        let now = Utc::now();
        let document = CityDocument {
            city_name: city.city_name.clone(),
            country: city.country.clone(),
            emoji: city.emoji.clone(),
            date: city.date.clone(),
            notes: city.notes.clone(),
            position: city.position.clone(),
            created_at: now,
            updated_at: now,
        };
        let body = to_document(&document)?;
        let id = self.collection.insert_one(&body)?;
        debug!("event=city_create module=repo status=ok city_id={id}");

        Ok(city_from_parts(id, document))
    }

    fn update_city(&self, id: &str, patch: &CityPatch) -> RepoResult<City> {
        let current = self.get_city(id)?;

        let mut set = to_document(patch)?;
        let updated_at = Utc::now().max(current.created_at);
        set.insert(
            "updatedAt".to_string(),
            serde_json::to_value(updated_at).map_err(DbError::from)?,
        );

        if self.collection.update_one(current.id, &set)? == 0 {
            return Err(RepoError::NotFound(current.id));
        }
        debug!(
            "event=city_update module=repo status=ok city_id={} fields={}",
            current.id,
            set.len() - 1
        );

        self.get_city(id)
    }

    fn delete_city(&self, id: &str) -> RepoResult<u64> {
        let city_id = parse_city_id(id)?;
        match self.collection.delete_one(city_id)? {
            0 => Err(RepoError::NotFound(city_id)),
            deleted => {
                debug!("event=city_delete module=repo status=ok city_id={city_id}");
                Ok(deleted)
            }
        }
    }

    fn count_cities(&self) -> RepoResult<u64> {
        Ok(self.collection.count_documents()?)
    }

    fn delete_all_cities(&self) -> RepoResult<u64> {
        let deleted = self.collection.delete_many()?;
        warn!("event=city_delete_all module=repo status=ok deleted={deleted}");
        Ok(deleted)
    }
}

fn parse_city_id(value: &str) -> RepoResult<CityId> {
    Uuid::parse_str(value.trim()).map_err(|_| RepoError::InvalidId(value.to_string()))
}

fn to_document(value: &impl Serialize) -> RepoResult<Document> {
    match serde_json::to_value(value).map_err(DbError::from)? {
        Value::Object(map) => Ok(map),
        other => Err(RepoError::InvalidData(format!(
            "expected a JSON object, serialized `{other}`"
        ))),
    }
}

fn city_from_document(stored: StoredDocument) -> RepoResult<City> {
    let document: CityDocument = serde_json::from_value(Value::Object(stored.body))
        .map_err(|err| RepoError::InvalidData(format!("city {}: {err}", stored.id)))?;
    Ok(city_from_parts(stored.id, document))
}

fn city_from_parts(id: CityId, document: CityDocument) -> City {
    City {
        id,
        city_name: document.city_name,
        country: document.country,
        emoji: document.emoji,
        date: document.date,
        notes: document.notes,
        position: document.position,
        created_at: document.created_at,
        updated_at: document.updated_at,
    }
}
