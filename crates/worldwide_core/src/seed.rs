//! One-shot fixture loader for the `cities` collection.
//!
//! # Responsibility
//! - Read a `{ "cities": [...] }` JSON fixture.
//! - Guard a non-empty collection behind a caller-supplied confirmation.
//! - Insert records one at a time and report partial success explicitly.
//!
//! # Invariants
//! - A declined confirmation leaves the collection untouched.
//! - One bad record never aborts the batch; it lands in `SeedReport::failed`.
//! - Every inserted record gets fresh `createdAt`/`updatedAt` stamps; any
//!   identifiers or timestamps in the fixture are ignored.

use crate::model::city::{City, CityDraft};
use crate::repo::city_repo::{CityRepository, RepoError};
use log::{error, info, warn};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Parsed fixture file. Records stay raw so one bad entry cannot poison the rest.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeedFixture {
    pub cities: Vec<Value>,
}

impl SeedFixture {
    pub fn from_json_str(raw: &str) -> Result<Self, SeedError> {
        serde_json::from_str(raw).map_err(SeedError::Fixture)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SeedError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| SeedError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn len(&self) -> usize {
        self.cities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }
}

/// A fixture record that could not be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct SeedFailure {
    pub input: Value,
    pub reason: String,
}

/// Per-record outcome of a completed seed run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeedReport {
    pub succeeded: Vec<City>,
    pub failed: Vec<SeedFailure>,
}

impl SeedReport {
    pub fn attempted(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SeedOutcome {
    /// The collection already held `existing` cities and the caller declined.
    Cancelled { existing: u64 },
    /// Import ran; `cleared` documents were removed first.
    Completed { cleared: u64, report: SeedReport },
}

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("failed to read fixture `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid fixture: {0}")]
    Fixture(#[source] serde_json::Error),
    #[error("confirmation prompt failed: {0}")]
    Prompt(#[source] std::io::Error),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Loads `fixture` into the repository.
///
/// `confirm` is called with the existing document count only when the
/// collection is non-empty; returning `false` cancels the run.
pub fn seed_cities<R, F>(
    repo: &R,
    fixture: &SeedFixture,
    confirm: F,
) -> Result<SeedOutcome, SeedError>
where
    R: CityRepository + ?Sized,
    F: FnOnce(u64) -> std::io::Result<bool>,
{
    info!(
        "event=seed_start module=seed status=start records={}",
        fixture.len()
    );

    let existing = repo.count_cities()?;
    let mut cleared = 0;
    if existing > 0 {
        warn!("event=seed_guard module=seed status=confirm existing={existing}");
        if !confirm(existing).map_err(SeedError::Prompt)? {
            info!("event=seed_guard module=seed status=cancelled existing={existing}");
            return Ok(SeedOutcome::Cancelled { existing });
        }
        cleared = repo.delete_all_cities()?;
    }

    let mut report = SeedReport::default();
    for input in &fixture.cities {
        match insert_record(repo, input) {
            Ok(city) => {
                info!(
                    "event=seed_record module=seed status=ok city_id={} city_name={}",
                    city.id, city.city_name
                );
                report.succeeded.push(city);
            }
            Err(reason) => {
                error!("event=seed_record module=seed status=error reason={reason}");
                report.failed.push(SeedFailure {
                    input: input.clone(),
                    reason,
                });
            }
        }
    }

    info!(
        "event=seed_finish module=seed status=ok succeeded={} failed={} cleared={cleared}",
        report.succeeded.len(),
        report.failed.len()
    );
    Ok(SeedOutcome::Completed { cleared, report })
}

fn insert_record<R: CityRepository + ?Sized>(repo: &R, input: &Value) -> Result<City, String> {
    let draft: CityDraft =
        serde_json::from_value(input.clone()).map_err(|err| format!("malformed record: {err}"))?;
    let new_city = draft.validate().map_err(|err| err.to_string())?;
    repo.create_city(&new_city).map_err(|err| err.to_string())
}

/// Interprets an interactive answer; only `y`/`yes` (any case) confirm.
pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

#[cfg(test)]
mod tests {
    use super::{is_affirmative, SeedFixture};

    #[test]
    fn only_yes_answers_confirm() {
        assert!(is_affirmative("y"));
        assert!(is_affirmative(" YES \n"));
        assert!(!is_affirmative(""));
        assert!(!is_affirmative("n"));
        assert!(!is_affirmative("yep"));
    }

    #[test]
    fn fixture_requires_cities_array() {
        assert!(SeedFixture::from_json_str(r#"{"cities": []}"#).unwrap().is_empty());
        assert!(SeedFixture::from_json_str(r#"{"towns": []}"#).is_err());
    }
}
