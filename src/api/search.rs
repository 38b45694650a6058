use std::sync::Arc;

use axum::{extract::State, Json};
use bytes::Bytes;
use serde_json::Value;

use super::error::{parse_body, ApiError};
use super::routes::AppState;
use super::types::SearchApiRequest;
use crate::tools::{run_search, SearchRequest, DEFAULT_MAX_RESULTS};

/// POST /search - Forward a search straight to the upstream search API.
///
/// Unlike the `search` tool, upstream failures are HTTP errors here.
pub async fn search(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let request: SearchApiRequest = parse_body(&body)?;
    let keywords = request.keywords;
    if keywords.is_empty() {
        return Err(ApiError::BadRequest("'keywords' must not be empty".to_string()));
    }

    let max_results = request.max_results.unwrap_or(DEFAULT_MAX_RESULTS);
    if !(1..=20).contains(&max_results) {
        return Err(ApiError::BadRequest(format!(
            "'max_results' must be between 1 and 20, got {}",
            max_results
        )));
    }

    let result = run_search(
        &state.upstream,
        &SearchRequest {
            keywords,
            max_results,
        },
    )
    .await?;

    Ok(Json(result))
}
