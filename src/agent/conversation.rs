//! Per-request conversation buffer and round bookkeeping.

use std::collections::VecDeque;

use crate::llm::{ChatMessage, MessageContent, ToolCall};
use crate::tools::ToolResult;

/// Upstream calls allowed per request. Tools are offered on all but the last.
pub const MAX_ROUNDS: usize = 3;

/// Append-only message history owned by a single request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self { messages }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Record one tool round: the assistant message that requested the calls,
    /// then one tool message per call in the order the model listed them.
    ///
    /// `results` may be in any order; each is matched to its call by
    /// `tool_call_id`. A call without a result gets an error payload so the
    /// next upstream request stays well-formed.
    pub fn push_tool_round(
        &mut self,
        content: Option<MessageContent>,
        calls: &[ToolCall],
        results: Vec<ToolResult>,
    ) {
        self.messages.push(ChatMessage::Assistant {
            content,
            tool_calls: Some(calls.to_vec()),
        });

        let mut pending: VecDeque<ToolResult> = results.into();
        for call in calls {
            let output = match pending.iter().position(|r| r.tool_call_id == call.id) {
                Some(idx) => pending.remove(idx).map(|r| r.output),
                None => None,
            }
            .unwrap_or_else(|| {
                tracing::warn!(tool_call_id = %call.id, "No result recorded for tool call");
                serde_json::json!({ "error": "Tool produced no result" })
            });

            self.messages
                .push(ChatMessage::tool(call.id.clone(), output.to_string()));
        }
    }
}

/// Where the loop is in its round budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundState {
    round: usize,
    max_rounds: usize,
}

impl RoundState {
    pub fn first() -> Self {
        Self::at(1)
    }

    /// State at a given 1-indexed round.
    pub fn at(round: usize) -> Self {
        Self {
            round: round.clamp(1, MAX_ROUNDS),
            max_rounds: MAX_ROUNDS,
        }
    }

    pub fn round(&self) -> usize {
        self.round
    }

    pub fn max_rounds(&self) -> usize {
        self.max_rounds
    }

    pub fn offer_tools(&self) -> bool {
        self.round < self.max_rounds
    }

    pub fn is_final(&self) -> bool {
        self.round >= self.max_rounds
    }

    pub fn next(self) -> Self {
        Self {
            round: self.round + 1,
            ..self
        }
    }
}
