//! Shared request state.

use crate::error::{ApiError, CityOperation};
use log::error;
use std::sync::Arc;
use worldwide_core::{CityService, CityServiceResult, Database, DocumentCityRepository};

pub type CityApiService = CityService<DocumentCityRepository>;

/// Cloned into every handler; all clones share one service and connection.
#[derive(Clone)]
pub struct AppState {
    cities: Arc<CityApiService>,
}

impl AppState {
    pub fn new(database: &Database) -> Self {
        Self {
            cities: Arc::new(CityService::new(DocumentCityRepository::new(database))),
        }
    }

    /// Runs a synchronous service call on the blocking pool so storage I/O
    /// never stalls the event loop.
    pub(crate) async fn run<T, F>(&self, operation: CityOperation, call: F) -> Result<T, ApiError>
    where
        T: Send + 'static,
        F: FnOnce(&CityApiService) -> CityServiceResult<T> + Send + 'static,
    {
        let cities = Arc::clone(&self.cities);
        tokio::task::spawn_blocking(move || call(&cities))
            .await
            .map_err(|err| {
                error!(
                    "event=http_error module=server status=error operation={operation:?} error_code=task_join_failed error={err}"
                );
                ApiError::Internal
            })?
            .map_err(|err| ApiError::from_service(operation, err))
    }
}
