//! Chat endpoints backed by the agent loop.
//!
//! - `POST /v1/chat/completions` - OpenAI-compatible; returns the final
//!   upstream response verbatim.
//! - `POST /api/chat` - simplified `{messages}` → `{role, content}` for the
//!   bundled web front end.

use std::sync::Arc;

use axum::{extract::State, routing::post, Json, Router};
use bytes::Bytes;
use serde_json::Value;
use tracing::Instrument;
use uuid::Uuid;

use super::error::{parse_body, ApiError};
use super::routes::AppState;
use super::types::{SimpleChatMessage, SimpleChatRequest, SimpleChatResponse};
use crate::llm::{ChatCompletionRequest, ChatMessage, GenerationParams, MessageContent};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/chat/completions", post(chat_completions))
}

async fn chat_completions(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let request: ChatCompletionRequest = parse_body(&body)?;

    let span = tracing::info_span!("chat_request", request_id = %Uuid::new_v4());
    let completion = state.agent.run(request).instrument(span).await?;

    Ok(Json(completion.into_inner()))
}

/// POST /api/chat - Simplified chat for the front end.
pub async fn simple_chat(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<SimpleChatResponse>, ApiError> {
    let request: SimpleChatRequest = parse_body(&body)?;
    let messages = request
        .messages
        .into_iter()
        .map(to_chat_message)
        .collect::<Result<Vec<_>, _>>()?;

    let request = ChatCompletionRequest {
        model: None,
        messages: Some(messages),
        params: GenerationParams::default(),
    };

    let span = tracing::info_span!("simple_chat", request_id = %Uuid::new_v4());
    let completion = state.agent.run(request).instrument(span).await?;

    let reply = completion
        .first_message()
        .map_err(|e| ApiError::Internal(format!("Unreadable model reply: {}", e)))?;
    Ok(Json(SimpleChatResponse::assistant(reply.content.as_ref())))
}

fn to_chat_message(msg: SimpleChatMessage) -> Result<ChatMessage, ApiError> {
    let content = MessageContent::Text(msg.content);
    match msg.role.as_str() {
        "user" => Ok(ChatMessage::User { content, name: None }),
        "assistant" => Ok(ChatMessage::Assistant {
            content: Some(content),
            tool_calls: None,
        }),
        "system" => Ok(ChatMessage::System { content, name: None }),
        "developer" => Ok(ChatMessage::Developer { content, name: None }),
        other => Err(ApiError::BadRequest(format!(
            "Unsupported message role '{}': expected user, assistant, system or developer",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_roles_map_to_chat_messages() {
        let msg = to_chat_message(SimpleChatMessage {
            role: "assistant".into(),
            content: "hello".into(),
        })
        .unwrap();
        assert_eq!(
            serde_json::to_value(msg).unwrap(),
            serde_json::json!({"role": "assistant", "content": "hello"})
        );
    }

    #[test]
    fn unknown_simple_role_is_rejected() {
        let err = to_chat_message(SimpleChatMessage {
            role: "tool".into(),
            content: "x".into(),
        })
        .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }
}
