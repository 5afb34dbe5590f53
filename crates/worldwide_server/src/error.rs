//! HTTP error taxonomy and its status-code mapping.
//!
//! # Invariants
//! - Clients only ever see `{"error": <message>}`; sources and driver
//!   details stay in the logs.
//! - The mapping from service outcome to status code is one exhaustive match.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::{error, warn};
use serde_json::json;
use thiserror::Error;
use worldwide_core::CityServiceError;

/// City operation a request was performing; names the generic 500 message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CityOperation {
    List,
    Get,
    Create,
    Update,
    Delete,
}

impl CityOperation {
    fn failure_message(self) -> &'static str {
        match self {
            Self::List => "Failed to fetch cities",
            Self::Get => "Failed to fetch city",
            Self::Create => "Failed to create city",
            Self::Update => "Failed to update city",
            Self::Delete => "Failed to delete city",
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    /// Payload shape or identifier rejected at the boundary.
    #[error("{0}")]
    BadRequest(String),
    #[error("City not found")]
    CityNotFound,
    #[error("Endpoint not found")]
    EndpointNotFound,
    /// Storage failed while running `operation`.
    #[error("{}", .operation.failure_message())]
    Storage {
        operation: CityOperation,
        #[source]
        source: CityServiceError,
    },
    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    /// Maps a service outcome, tagging storage failures with `operation`.
    pub fn from_service(operation: CityOperation, err: CityServiceError) -> Self {
        match err {
            CityServiceError::Validation(err) => Self::BadRequest(err.to_string()),
            CityServiceError::InvalidId(_) => Self::BadRequest(err.to_string()),
            CityServiceError::NotFound(_) => Self::CityNotFound,
            CityServiceError::Storage(_) => Self::Storage {
                operation,
                source: err,
            },
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::CityNotFound | Self::EndpointNotFound => StatusCode::NOT_FOUND,
            Self::Storage { .. } | Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(value: JsonRejection) -> Self {
        warn!(
            "event=http_bad_body module=server status=rejected error={}",
            value.body_text().replace(['\n', '\r'], " ")
        );
        Self::BadRequest("Invalid request body".to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Storage { operation, source } = &self {
            error!(
                "event=http_error module=server status=error operation={operation:?} error={source}"
            );
        }
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}
