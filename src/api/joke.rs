//! `GET /api/joke`: a single tool-free completion from the joke model.

use std::sync::Arc;

use axum::{extract::State, Json};
use serde_json::{json, Map};

use super::error::ApiError;
use super::routes::AppState;
use super::types::JokeResponse;
use crate::llm::{ChatMessage, ChatRequest, GenerationParams, LlmClient, MessageContent};
use crate::upstream::UpstreamError;

pub const JOKE_MODEL: &str = "grok-4-fast";

const JOKE_PROMPT: &str = "请给我讲一个有趣的笑话，用中文回答。";

fn joke_params() -> GenerationParams {
    let mut params = Map::new();
    params.insert("temperature".to_string(), json!(0.7));
    params.insert("max_tokens".to_string(), json!(500));
    GenerationParams::new(params)
}

/// GET /api/joke
pub async fn joke(State(state): State<Arc<AppState>>) -> Result<Json<JokeResponse>, ApiError> {
    let params = joke_params().shaped_for(&state.config.profile_for(JOKE_MODEL));
    let messages = [ChatMessage::user(JOKE_PROMPT)];

    tracing::info!(model = JOKE_MODEL, "Requesting a joke");

    let completion = state
        .upstream
        .chat_completion(ChatRequest {
            model: JOKE_MODEL,
            messages: &messages,
            tools: None,
            params: &params,
        })
        .await
        .map_err(|e| match e {
            UpstreamError::Decode(msg) => ApiError::Internal(format!("Unreadable joke response: {}", msg)),
            other => ApiError::Upstream(other),
        })?;

    let reply = completion
        .first_message()
        .map_err(|e| ApiError::Internal(format!("Unreadable joke response: {}", e)))?;

    Ok(Json(JokeResponse {
        joke: reply.content.as_ref().map(MessageContent::as_text).unwrap_or_default(),
        model: JOKE_MODEL.to_string(),
        usage: completion
            .as_value()
            .get("usage")
            .cloned()
            .unwrap_or_else(|| json!({})),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn joke_params_follow_the_model_profile() {
        let config = Config::new("k", "http://unused");
        let shaped = joke_params().shaped_for(&config.profile_for(JOKE_MODEL));
        assert_eq!(shaped["temperature"], json!(0.7));
        assert_eq!(shaped["max_tokens"], json!(500));
        assert!(shaped.get("max_completion_tokens").is_none());
    }
}
