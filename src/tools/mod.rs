//! Tool registry and concurrent executor.
//!
//! Tools are looked up by name. A batch of tool calls runs concurrently and
//! always yields one [`ToolResult`] per call: argument errors, unknown tools
//! and handler failures become `{"error": "..."}` payloads instead of
//! aborting the batch.

mod search;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{FuturesUnordered, StreamExt};
use serde_json::{json, Value};

use crate::llm::{ToolCall, ToolDefinition};
use crate::upstream::UpstreamClient;

pub use search::{run_search, SearchRequest, SearchTool, DEFAULT_MAX_RESULTS};
pub(crate) use search::deserialize_keywords;

/// A capability the model can invoke.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON schema of the arguments object.
    fn parameters_schema(&self) -> Value;

    /// Run the tool. Errors are reported to the model, not to the caller.
    async fn execute(&self, args: Value) -> anyhow::Result<Value>;
}

/// Name and description of a registered tool.
#[derive(Debug, Clone)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
}

/// Outcome of one tool call.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResult {
    pub tool_call_id: String,
    /// Tool output or `{"error": "..."}`.
    pub output: Value,
}

impl ToolResult {
    fn error(tool_call_id: &str, message: impl Into<String>) -> Self {
        Self {
            tool_call_id: tool_call_id.to_string(),
            output: json!({ "error": message.into() }),
        }
    }

    pub fn is_error(&self) -> bool {
        self.output.get("error").is_some()
    }
}

/// Name → handler mapping.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Registry with the built-in tools.
    pub fn new(upstream: Arc<UpstreamClient>) -> Self {
        let mut registry = Self::default();
        registry.register(Arc::new(SearchTool::new(upstream)));
        registry
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn list_tools(&self) -> Vec<ToolInfo> {
        let mut tools: Vec<_> = self
            .tools
            .values()
            .map(|t| ToolInfo {
                name: t.name().to_string(),
                description: t.description().to_string(),
            })
            .collect();
        tools.sort_by(|a, b| a.name.cmp(&b.name));
        tools
    }

    /// Function declarations for the model, sorted by name.
    pub fn get_tool_schemas(&self) -> Vec<ToolDefinition> {
        let mut schemas: Vec<_> = self
            .tools
            .values()
            .map(|t| ToolDefinition::function(t.name(), t.description(), t.parameters_schema()))
            .collect();
        schemas.sort_by(|a, b| a.function.name.cmp(&b.function.name));
        schemas
    }

    /// Execute a tool by name.
    pub async fn execute(&self, name: &str, args: Value) -> anyhow::Result<Value> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| anyhow::anyhow!("Unknown tool: {}", name))?;
        tool.execute(args).await
    }

    /// Execute one model tool call. Never fails.
    pub async fn execute_call(&self, call: &ToolCall) -> ToolResult {
        let name = call.function.name.as_str();

        let args = match call.function.parse_arguments() {
            Ok(args) => args,
            Err(e) => {
                tracing::warn!(tool = %name, tool_call_id = %call.id, error = %e, "Unparsable tool arguments");
                return ToolResult::error(&call.id, format!("Invalid arguments for {}: {}", name, e));
            }
        };

        tracing::info!(tool = %name, tool_call_id = %call.id, args = %args, "Executing tool call");

        match self.execute(name, args).await {
            Ok(output) => {
                let result = ToolResult {
                    tool_call_id: call.id.clone(),
                    output,
                };
                if result.is_error() {
                    tracing::warn!(tool = %name, tool_call_id = %call.id, "Tool reported an error");
                } else {
                    tracing::info!(tool = %name, tool_call_id = %call.id, "Tool call completed");
                }
                result
            }
            Err(e) => {
                tracing::warn!(tool = %name, tool_call_id = %call.id, error = %e, "Tool call failed");
                ToolResult::error(&call.id, e.to_string())
            }
        }
    }

    /// Run every call concurrently and wait for all of them.
    ///
    /// Results come back in completion order; callers match them to their
    /// calls by `tool_call_id`.
    pub async fn execute_batch(&self, calls: &[ToolCall]) -> Vec<ToolResult> {
        tracing::info!(count = calls.len(), "Executing tool calls in parallel");

        let mut pending: FuturesUnordered<_> =
            calls.iter().map(|call| self.execute_call(call)).collect();

        let mut results = Vec::with_capacity(calls.len());
        while let Some(result) = pending.next().await {
            results.push(result);
        }
        results
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.list_tools().iter().map(|t| t.name.clone()).collect::<Vec<_>>())
            .finish()
    }
}
