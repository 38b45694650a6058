//! Pass-through proxy endpoint.
//!
//! Receives `POST /api/v1/chat/completions` and forwards the body unchanged
//! to the upstream chat endpoint with the configured bearer credential. No
//! tool loop runs here; the upstream status and body come back as-is, which
//! lets a browser front end reach the API without CORS trouble.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::Response,
    routing::post,
    Router,
};
use bytes::Bytes;
use serde::Deserialize;

use super::error::error_response;
use super::routes::AppState;

/// Only the model is inspected, for logging.
#[derive(Debug, Deserialize)]
struct ProxiedRequest {
    #[serde(default)]
    model: Option<String>,
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/chat/completions", post(chat_completions))
}

async fn chat_completions(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let req: ProxiedRequest = match serde_json::from_slice(&body) {
        Ok(r) => r,
        Err(e) => {
            return error_response(
                StatusCode::BAD_REQUEST,
                format!("Invalid request body: {}", e),
                "invalid_request_error",
            );
        }
    };

    tracing::info!(
        model = %req.model.as_deref().unwrap_or("unknown"),
        url = %format!("{}/v1/chat/completions", state.upstream.base_url()),
        "Proxying chat completion request"
    );

    match state.upstream.forward("/v1/chat/completions", body).await {
        Ok((status, resp_body)) => {
            tracing::info!(status = %status, "Upstream responded");
            Response::builder()
                .status(status)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(resp_body))
                .unwrap_or_else(|_| {
                    error_response(
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Failed to build response".to_string(),
                        "internal_error",
                    )
                })
        }
        Err(e) => {
            tracing::error!(error = %e, "Proxy request failed");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Request failed: {}", e),
                "upstream_unavailable",
            )
        }
    }
}
