//! Core domain logic for the Worldwide travel log.
//! This crate is the single source of truth for city record invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod seed;
pub mod service;

pub use db::{Database, DbError, DbResult, Gateway, GatewayConfig};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::city::{
    City, CityDraft, CityId, CityPatch, CityValidationError, NewCity, Position,
};
pub use repo::city_repo::{
    CityRepository, DocumentCityRepository, RepoError, RepoResult, CITIES_COLLECTION,
};
pub use seed::{
    is_affirmative, seed_cities, SeedError, SeedFailure, SeedFixture, SeedOutcome, SeedReport,
};
pub use service::city_service::{CityService, CityServiceError, CityServiceResult};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
