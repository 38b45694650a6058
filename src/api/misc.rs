//! Health and greeting endpoints.

use std::sync::Arc;

use axum::{extract::State, Json};
use bytes::Bytes;

use super::error::{parse_body, ApiError};
use super::routes::AppState;
use super::types::{HealthResponse, HelloRequest, HelloResponse};

/// GET /health
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        mode: state.config.mode.as_str().to_string(),
        api_key_configured: state.config.api_key.is_some(),
    })
}

/// POST /hello - `{name}` → `{"message": "hello, <name>"}`.
pub async fn hello(body: Bytes) -> Result<Json<HelloResponse>, ApiError> {
    let request: HelloRequest = parse_body(&body)?;
    let len = request.name.chars().count();
    if !(1..=50).contains(&len) {
        return Err(ApiError::BadRequest(
            "'name' must be between 1 and 50 characters".to_string(),
        ));
    }

    Ok(Json(HelloResponse {
        message: format!("hello, {}", request.name),
    }))
}
