//! City use-case service.
//!
//! # Responsibility
//! - Provide list/get/create/update/delete entry points for API callers.
//! - Run the create-time presence check before touching storage.
//! - Collapse repository errors into the outcome taxonomy callers switch on.
//!
//! # Invariants
//! - A draft failing validation never reaches the repository.
//! - Service APIs never bypass repository persistence contracts.

use crate::model::city::{City, CityDraft, CityId, CityPatch, CityValidationError};
use crate::repo::city_repo::{CityRepository, RepoError};
use log::{debug, error, info};
use thiserror::Error;

/// Outcome taxonomy of city use-cases.
#[derive(Debug, Error)]
pub enum CityServiceError {
    /// Client payload failed the presence check.
    #[error(transparent)]
    Validation(#[from] CityValidationError),
    /// Identifier is not a structurally valid city id.
    #[error("Invalid city id: {0}")]
    InvalidId(String),
    #[error("City not found")]
    NotFound(CityId),
    /// Storage failure or unreadable persisted state.
    #[error(transparent)]
    Storage(RepoError),
}

impl From<RepoError> for CityServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound(id),
            RepoError::InvalidId(raw) => Self::InvalidId(raw),
            other @ (RepoError::Storage(_) | RepoError::InvalidData(_)) => Self::Storage(other),
        }
    }
}

pub type CityServiceResult<T> = Result<T, CityServiceError>;

/// City service facade over repository implementations.
pub struct CityService<R: CityRepository> {
    repo: R,
}

impl<R: CityRepository> CityService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn list_cities(&self) -> CityServiceResult<Vec<City>> {
        self.repo.list_cities().map_err(|err| log_failure("list", err))
    }

    pub fn get_city(&self, id: &str) -> CityServiceResult<City> {
        self.repo.get_city(id).map_err(|err| log_failure("get", err))
    }

    /// Validates `draft` and stores it as a new city.
    pub fn create_city(&self, draft: CityDraft) -> CityServiceResult<City> {
        let new_city = draft.validate().map_err(|err| {
            let CityValidationError::MissingFields(missing) = &err;
            info!(
                "event=city_create module=service status=rejected missing={}",
                missing.join(",")
            );
            err
        })?;

        let city = self
            .repo
            .create_city(&new_city)
            .map_err(|err| log_failure("create", err))?;
        info!(
            "event=city_create module=service status=ok city_id={}",
            city.id
        );
        Ok(city)
    }

    /// Applies `patch`; an empty patch still refreshes `updatedAt`.
    pub fn update_city(&self, id: &str, patch: CityPatch) -> CityServiceResult<City> {
        if patch.is_empty() {
            debug!("event=city_update module=service status=touch_only city_id={id}");
        }
        let city = self
            .repo
            .update_city(id, &patch)
            .map_err(|err| log_failure("update", err))?;
        info!(
            "event=city_update module=service status=ok city_id={}",
            city.id
        );
        Ok(city)
    }

    /// Hard-deletes one city; returns the deleted count (always 1).
    pub fn delete_city(&self, id: &str) -> CityServiceResult<u64> {
        let deleted = self
            .repo
            .delete_city(id)
            .map_err(|err| log_failure("delete", err))?;
        info!("event=city_delete module=service status=ok city_id={id}");
        Ok(deleted)
    }
}

fn log_failure(operation: &'static str, err: RepoError) -> CityServiceError {
    match &err {
        RepoError::NotFound(_) | RepoError::InvalidId(_) => {
            info!("event=city_{operation} module=service status=rejected reason={err}");
        }
        RepoError::Storage(_) | RepoError::InvalidData(_) => {
            error!("event=city_{operation} module=service status=error error={err}");
        }
    }
    err.into()
}
