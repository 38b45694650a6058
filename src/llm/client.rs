//! Upstream chat-completion client.

use async_trait::async_trait;

use super::{ChatCompletion, ChatRequest, LlmClient};
use crate::upstream::{UpstreamClient, UpstreamError};

const CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";

#[async_trait]
impl LlmClient for UpstreamClient {
    async fn chat_completion(&self, request: ChatRequest<'_>) -> Result<ChatCompletion, UpstreamError> {
        let body = request.to_body();
        tracing::debug!(
            model = %request.model,
            messages = request.messages.len(),
            tools = request.tools.map_or(0, |t| t.len()),
            "Calling upstream chat completions"
        );

        let raw = self.post_json(CHAT_COMPLETIONS_PATH, &body).await?;
        if !raw.is_object() {
            return Err(UpstreamError::Decode(
                "chat completion response is not a JSON object".to_string(),
            ));
        }
        Ok(ChatCompletion::new(raw))
    }
}
