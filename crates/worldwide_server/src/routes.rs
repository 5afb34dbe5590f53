//! City resource routes.
//!
//! # Responsibility
//! - Dispatch URL + method to one city use-case.
//! - Render outcomes as JSON with the agreed status codes.
//!
//! # Invariants
//! - Handlers hold no state of their own; everything flows through `AppState`.
//! - Unmatched paths answer `404 {"error": "Endpoint not found"}`.
//! - A panicking handler answers `500 {"error": "Internal server error"}`.

use crate::error::{ApiError, CityOperation};
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use log::info;
use serde::Serialize;
use std::any::Any;
use std::time::Instant;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use worldwide_core::{City, CityDraft, CityPatch};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub message: &'static str,
}

/// Builds the full application router.
pub fn router(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/cities", get(list_cities).post(create_city))
        .route(
            "/cities/{id}",
            get(get_city).put(update_city).delete(delete_city),
        )
        .fallback(endpoint_not_found)
        .with_state(state)
        .layer(middleware::from_fn(log_request))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(cors)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK",
        message: "Worldwide API is running",
        timestamp: Utc::now(),
    })
}

async fn list_cities(State(state): State<AppState>) -> Result<Json<Vec<City>>, ApiError> {
    let cities = state
        .run(CityOperation::List, |cities| cities.list_cities())
        .await?;
    Ok(Json(cities))
}

async fn get_city(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<City>, ApiError> {
    let city = state
        .run(CityOperation::Get, move |cities| cities.get_city(&id))
        .await?;
    Ok(Json(city))
}

async fn create_city(
    State(state): State<AppState>,
    payload: Result<Json<CityDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<City>), ApiError> {
    let Json(draft) = payload?;
    let city = state
        .run(CityOperation::Create, move |cities| cities.create_city(draft))
        .await?;
    Ok((StatusCode::CREATED, Json(city)))
}

async fn update_city(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<CityPatch>, JsonRejection>,
) -> Result<Json<City>, ApiError> {
    let Json(patch) = payload?;
    let city = state
        .run(CityOperation::Update, move |cities| {
            cities.update_city(&id, patch)
        })
        .await?;
    Ok(Json(city))
}

async fn delete_city(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    state
        .run(CityOperation::Delete, move |cities| cities.delete_city(&id))
        .await?;
    Ok(Json(DeleteResponse {
        message: "City deleted successfully",
    }))
}

async fn endpoint_not_found() -> ApiError {
    ApiError::EndpointNotFound
}

fn panic_response(_payload: Box<dyn Any + Send + 'static>) -> Response {
    ApiError::Internal.into_response()
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started_at = Instant::now();

    let response = next.run(request).await;
    info!(
        "event=http_request module=server status={} method={method} path={path} duration_ms={}",
        response.status().as_u16(),
        started_at.elapsed().as_millis()
    );
    response
}

#[cfg(test)]
mod tests {
    use super::panic_response;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;
    use tower_http::catch_panic::CatchPanicLayer;

    async fn exploding_handler() -> &'static str {
        panic!("handler exploded");
    }

    #[tokio::test]
    async fn panicking_handler_answers_internal_server_error() {
        let app = Router::new()
            .route("/boom", get(exploding_handler))
            .layer(CatchPanicLayer::custom(panic_response));

        let response = app
            .oneshot(Request::builder().uri("/boom").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, serde_json::json!({"error": "Internal server error"}));
    }
}
