//! API request and response types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::llm::MessageContent;

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,

    /// `agent` or `proxy`
    pub mode: String,

    /// Whether an upstream credential is loaded
    pub api_key_configured: bool,
}

/// Body of `POST /hello`.
#[derive(Debug, Clone, Deserialize)]
pub struct HelloRequest {
    /// Name to greet (1-50 characters)
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct HelloResponse {
    pub message: String,
}

/// Reply of `GET /api/joke`.
#[derive(Debug, Clone, Serialize)]
pub struct JokeResponse {
    pub joke: String,
    pub model: String,
    /// Upstream token usage, `{}` when not reported
    pub usage: Value,
}

/// Body of `POST /search`.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchApiRequest {
    /// One keyword or a list of keywords
    #[serde(deserialize_with = "crate::tools::deserialize_keywords")]
    pub keywords: Vec<String>,

    /// Results per keyword (1-20, default 6)
    #[serde(default)]
    pub max_results: Option<u32>,
}

/// A message of the simplified chat API.
#[derive(Debug, Clone, Deserialize)]
pub struct SimpleChatMessage {
    /// `user` or `assistant`
    pub role: String,
    pub content: String,
}

/// Body of `POST /api/chat`.
#[derive(Debug, Clone, Deserialize)]
pub struct SimpleChatRequest {
    #[serde(default)]
    pub messages: Vec<SimpleChatMessage>,
}

/// Reply of `POST /api/chat`.
#[derive(Debug, Clone, Serialize)]
pub struct SimpleChatResponse {
    pub role: String,
    pub content: String,
}

impl SimpleChatResponse {
    pub fn assistant(content: Option<&MessageContent>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.map(MessageContent::as_text).unwrap_or_default(),
        }
    }
}
