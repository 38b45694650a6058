//! Core agent loop implementation.

use std::sync::Arc;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::config::Config;
use crate::llm::{ChatCompletion, ChatCompletionRequest, ChatRequest, LlmClient, ToolDefinition};
use crate::tools::ToolRegistry;
use crate::upstream::UpstreamError;

use super::conversation::{Conversation, RoundState};

#[derive(Debug, Error)]
pub enum AgentError {
    /// The request cannot be run at all (e.g. no messages).
    #[error("{0}")]
    Validation(String),

    /// The upstream model call failed. Never retried.
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

/// The search agent.
pub struct Agent {
    config: Config,
    llm: Arc<dyn LlmClient>,
    tools: Arc<ToolRegistry>,
}

impl Agent {
    pub fn new(config: Config, llm: Arc<dyn LlmClient>, tools: Arc<ToolRegistry>) -> Self {
        Self { config, llm, tools }
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Run a chat request through the tool loop and return the final
    /// upstream response unchanged.
    pub async fn run(&self, request: ChatCompletionRequest) -> Result<ChatCompletion, AgentError> {
        let conversation = Conversation::new(request.messages.unwrap_or_default());
        if conversation.is_empty() {
            return Err(AgentError::Validation(
                "'messages' must be a non-empty array".to_string(),
            ));
        }

        let model = request
            .model
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| self.config.default_model.clone());
        let params = request.params.shaped_for(&self.config.profile_for(&model));

        self.run_rounds(&model, &params, conversation, RoundState::first())
            .await
    }

    /// Drive the loop from `round` onwards.
    pub(crate) async fn run_rounds(
        &self,
        model: &str,
        params: &Map<String, Value>,
        mut conversation: Conversation,
        mut round: RoundState,
    ) -> Result<ChatCompletion, AgentError> {
        let tool_schemas: Vec<ToolDefinition> = self.tools.get_tool_schemas();

        tracing::info!(model = %model, max_rounds = round.max_rounds(), "Starting agent loop");

        loop {
            let offer_tools = round.offer_tools() && !self.tools.is_empty();
            tracing::info!(
                round = round.round(),
                offer_tools,
                messages = conversation.len(),
                "Calling upstream model"
            );

            let response = self
                .llm
                .chat_completion(ChatRequest {
                    model,
                    messages: conversation.messages(),
                    tools: offer_tools.then_some(tool_schemas.as_slice()),
                    params,
                })
                .await?;

            let reply = response.first_message().map_err(|e| {
                UpstreamError::Decode(format!("malformed assistant message: {}", e))
            })?;
            let tool_calls = reply.tool_calls();

            tracing::info!(
                round = round.round(),
                tool_calls = tool_calls.len(),
                preview = %preview(reply.content.as_ref().map(|c| c.as_text()).as_deref()),
                "Received model response"
            );

            if tool_calls.is_empty() {
                tracing::info!(round = round.round(), "No tool calls, returning response");
                return Ok(response);
            }
            if round.is_final() {
                tracing::info!(
                    round = round.round(),
                    ignored_tool_calls = tool_calls.len(),
                    "Round budget exhausted, returning response as-is"
                );
                return Ok(response);
            }

            let results = self.tools.execute_batch(tool_calls).await;
            conversation.push_tool_round(reply.content.clone(), tool_calls, results);

            tracing::info!(round = round.round(), "Tool results recorded, next round");
            round = round.next();
        }
    }
}

/// First 100 characters of the model's text, for logs.
fn preview(content: Option<&str>) -> String {
    match content {
        Some(text) if !text.is_empty() => match text.char_indices().nth(100) {
            Some((idx, _)) => format!("{}...", &text[..idx]),
            None => text.to_string(),
        },
        _ => "None".to_string(),
    }
}
