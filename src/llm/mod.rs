//! OpenAI-style chat completion types and the client seam used by the agent.

mod client;
mod params;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::upstream::UpstreamError;

pub use params::GenerationParams;

/// Message content: plain text or a list of content parts (images, etc.).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<Value>),
}

impl MessageContent {
    /// Text view of the content, joining the `text` of any text parts.
    pub fn as_text(&self) -> String {
        match self {
            MessageContent::Text(s) => s.clone(),
            MessageContent::Parts(parts) => parts
                .iter()
                .filter_map(|p| p.get("text").and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

impl From<&str> for MessageContent {
    fn from(s: &str) -> Self {
        MessageContent::Text(s.to_string())
    }
}

/// A single conversation message, tagged by role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum ChatMessage {
    System {
        content: MessageContent,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    /// Newer OpenAI name for system instructions.
    Developer {
        content: MessageContent,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    User {
        content: MessageContent,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    Assistant {
        /// Usually null when the message carries tool calls.
        #[serde(default)]
        content: Option<MessageContent>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tool_calls: Option<Vec<ToolCall>>,
    },
    Tool {
        tool_call_id: String,
        content: String,
    },
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        ChatMessage::User {
            content: MessageContent::Text(content.into()),
            name: None,
        }
    }

    pub fn tool(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        ChatMessage::Tool {
            tool_call_id: tool_call_id.into(),
            content: content.into(),
        }
    }
}

/// A tool invocation requested by the model.
///
/// Provider-specific fields (e.g. `extra_content` carrying a thought
/// signature) are kept in `extra` and sent back unchanged on the next round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type", default = "function_type")]
    pub call_type: String,
    pub function: FunctionCall,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn function_type() -> String {
    "function".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    /// Normally a JSON-encoded string; some providers send an object.
    #[serde(default)]
    pub arguments: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FunctionCall {
    /// Decode the raw argument payload into a JSON value.
    pub fn parse_arguments(&self) -> Result<Value, serde_json::Error> {
        match &self.arguments {
            Value::String(raw) if raw.trim().is_empty() => Ok(Value::Object(Map::new())),
            Value::String(raw) => serde_json::from_str(raw),
            Value::Null => Ok(Value::Object(Map::new())),
            other => Ok(other.clone()),
        }
    }
}

/// A function tool declaration sent to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    #[serde(rename = "type")]
    pub tool_type: String,
    pub function: FunctionDefinition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

impl ToolDefinition {
    pub fn function(name: &str, description: &str, parameters: Value) -> Self {
        Self {
            tool_type: "function".to_string(),
            function: FunctionDefinition {
                name: name.to_string(),
                description: description.to_string(),
                parameters,
            },
        }
    }
}

/// Inbound `/v1/chat/completions` request body.
///
/// Only `model` and `messages` are interpreted; every other field is a
/// generation parameter passed through to the upstream model.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionRequest {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub messages: Option<Vec<ChatMessage>>,
    #[serde(flatten)]
    pub params: GenerationParams,
}

/// One outbound chat-completion call.
#[derive(Debug, Clone, Copy)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [ChatMessage],
    pub tools: Option<&'a [ToolDefinition]>,
    /// Already shaped for `model` (see [`GenerationParams::shaped_for`]).
    pub params: &'a Map<String, Value>,
}

impl ChatRequest<'_> {
    /// JSON body for the upstream `/v1/chat/completions` endpoint.
    pub fn to_body(&self) -> Value {
        let mut body = self.params.clone();
        body.insert("model".to_string(), json!(self.model));
        body.insert("messages".to_string(), json!(self.messages));
        if let Some(tools) = self.tools.filter(|t| !t.is_empty()) {
            body.insert("tools".to_string(), json!(tools));
        }
        Value::Object(body)
    }
}

/// The assistant message of the first choice, as far as the loop cares.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AssistantReply {
    #[serde(default)]
    pub content: Option<MessageContent>,
    #[serde(default)]
    pub tool_calls: Option<Vec<ToolCall>>,
}

impl AssistantReply {
    pub fn tool_calls(&self) -> &[ToolCall] {
        self.tool_calls.as_deref().unwrap_or(&[])
    }
}

/// A chat-completion response, kept verbatim as the upstream sent it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatCompletion(Value);

impl ChatCompletion {
    pub fn new(raw: Value) -> Self {
        Self(raw)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_inner(self) -> Value {
        self.0
    }

    /// Parse `choices[0].message`. A response without choices reads as an
    /// empty reply with no tool calls.
    pub fn first_message(&self) -> Result<AssistantReply, serde_json::Error> {
        match self.0.pointer("/choices/0/message") {
            Some(message) => AssistantReply::deserialize(message),
            None => Ok(AssistantReply::default()),
        }
    }
}

/// Anything that can answer a chat-completion request.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn chat_completion(&self, request: ChatRequest<'_>) -> Result<ChatCompletion, UpstreamError>;
}
