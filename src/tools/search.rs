//! Web search through the upstream search API.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::Tool;
use crate::upstream::{UpstreamClient, UpstreamError};

const SEARCH_PATH: &str = "/v1/search/";

/// Results per keyword when the caller does not say.
pub const DEFAULT_MAX_RESULTS: u32 = 6;

/// One keyword or a list of them.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
enum Keywords {
    One(String),
    Many(Vec<String>),
}

impl From<Keywords> for Vec<String> {
    fn from(k: Keywords) -> Self {
        match k {
            Keywords::One(s) => vec![s],
            Keywords::Many(v) => v,
        }
    }
}

/// Body of an upstream search request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    #[serde(deserialize_with = "deserialize_keywords")]
    pub keywords: Vec<String>,
    #[serde(default = "default_max_results")]
    pub max_results: u32,
}

fn default_max_results() -> u32 {
    DEFAULT_MAX_RESULTS
}

/// Accepts `"kw"` or `["kw", ...]`.
pub(crate) fn deserialize_keywords<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Keywords::deserialize(deserializer).map(Into::into)
}

/// Send a search request upstream and return the raw response.
pub async fn run_search(upstream: &UpstreamClient, request: &SearchRequest) -> Result<Value, UpstreamError> {
    let body = serde_json::to_value(request).map_err(|e| UpstreamError::Decode(e.to_string()))?;
    upstream.post_json(SEARCH_PATH, &body).await
}

/// The `search` tool offered to the model.
pub struct SearchTool {
    upstream: Arc<UpstreamClient>,
}

impl SearchTool {
    pub fn new(upstream: Arc<UpstreamClient>) -> Self {
        Self { upstream }
    }
}

#[async_trait]
impl Tool for SearchTool {
    fn name(&self) -> &str {
        "search"
    }

    fn description(&self) -> &str {
        "Search the web for information. Use this when the question needs recent information, facts, data, or anything that should be looked up online."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "keywords": {
                    "type": "array",
                    "items": {"type": "string"},
                    "description": "Search keywords, at least one"
                },
                "max_results": {
                    "type": "integer",
                    "description": "Maximum results per keyword",
                    "default": DEFAULT_MAX_RESULTS,
                    "minimum": 1,
                    "maximum": 20
                }
            },
            "required": ["keywords"]
        })
    }

    /// Upstream failures come back as `Ok({"error": ...})` so the model can
    /// see them; only malformed arguments are an `Err`.
    async fn execute(&self, args: Value) -> anyhow::Result<Value> {
        let request: SearchRequest = serde_json::from_value(args)
            .map_err(|e| anyhow::anyhow!("Invalid search arguments: {}", e))?;
        if request.keywords.is_empty() {
            return Err(anyhow::anyhow!("Invalid search arguments: 'keywords' must not be empty"));
        }

        tracing::info!(
            keywords = ?request.keywords,
            max_results = request.max_results,
            "Running search"
        );

        match run_search(&self.upstream, &request).await {
            Ok(result) => {
                log_summary(&result);
                Ok(result)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Search failed");
                Ok(json!({ "error": format!("Search failed: {}", e) }))
            }
        }
    }
}

/// Log how many results each query produced.
fn log_summary(result: &Value) {
    let queries = result["queries"].as_array().map(Vec::as_slice).unwrap_or(&[]);
    if let Some(answer) = result["combined_answer"].as_str() {
        tracing::debug!(answer = %truncate_for_log(answer, 200), "Search combined answer");
    }
    for query in queries.iter().take(2) {
        let keyword = query["keyword"].as_str().unwrap_or("unknown");
        let count = query["response"]["results"].as_array().map_or(0, Vec::len);
        tracing::debug!(keyword = %keyword, results = count, "Search query summary");
    }
    tracing::info!(queries = queries.len(), "Search completed");
}

fn truncate_for_log(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}... [truncated]", &s[..idx]),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::config::Config;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn tool_for(server: &MockServer) -> SearchTool {
        let upstream = UpstreamClient::new(&Config::new("search_key", server.uri())).unwrap();
        SearchTool::new(Arc::new(upstream))
    }

    #[tokio::test]
    async fn forwards_keywords_and_cap() {
        let mock_server = MockServer::start().await;
        let response = json!({
            "queries": [{"keyword": "rust", "response": {"results": [{"title": "Rust"}]}}],
            "combined_answer": "Rust is a language"
        });
        Mock::given(method("POST"))
            .and(path("/v1/search/"))
            .and(header("Authorization", "Bearer search_key"))
            .and(body_json(json!({"keywords": ["rust", "tokio"], "max_results": 3})))
            .respond_with(ResponseTemplate::new(200).set_body_json(response.clone()))
            .expect(1)
            .mount(&mock_server)
            .await;

        let result = tool_for(&mock_server)
            .execute(json!({"keywords": ["rust", "tokio"], "max_results": 3}))
            .await
            .unwrap();
        assert_eq!(result, response);
    }

    #[tokio::test]
    async fn single_keyword_and_default_cap() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/search/"))
            .and(body_json(json!({"keywords": ["X"], "max_results": 6})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"queries": []})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let result = tool_for(&mock_server).execute(json!({"keywords": "X"})).await.unwrap();
        assert_eq!(result, json!({"queries": []}));
    }

    #[tokio::test]
    async fn cap_is_not_revalidated() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_json(json!({"keywords": ["X"], "max_results": 50})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&mock_server)
            .await;

        tool_for(&mock_server)
            .execute(json!({"keywords": ["X"], "max_results": 50}))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn upstream_failure_is_returned_as_data() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("search backend down"))
            .mount(&mock_server)
            .await;

        let result = tool_for(&mock_server).execute(json!({"keywords": ["X"]})).await.unwrap();
        let message = result["error"].as_str().unwrap();
        assert!(message.starts_with("Search failed:"));
        assert!(message.contains("search backend down"));
    }

    #[tokio::test]
    async fn unreachable_search_is_returned_as_data() {
        let upstream = UpstreamClient::new(&Config::new("k", "http://127.0.0.1:9")).unwrap();
        let result = SearchTool::new(Arc::new(upstream))
            .execute(json!({"keywords": ["X"]}))
            .await
            .unwrap();
        let message = result["error"].as_str().unwrap();
        assert!(message.starts_with("Search failed: Could not reach upstream API"));
    }

    #[tokio::test]
    async fn slow_search_times_out_as_data() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/search/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"queries": []}))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&mock_server)
            .await;

        let mut config = Config::new("k", mock_server.uri());
        config.request_timeout = Duration::from_millis(100);
        let tool = SearchTool::new(Arc::new(UpstreamClient::new(&config).unwrap()));

        let result = tool.execute(json!({"keywords": ["X"]})).await.unwrap();
        let message = result["error"].as_str().unwrap();
        assert!(message.starts_with("Search failed: Could not reach upstream API"));
    }

    #[tokio::test]
    async fn bad_arguments_are_errors() {
        let mock_server = MockServer::start().await;
        let tool = tool_for(&mock_server);
        tokio_test::assert_err!(tool.execute(json!({})).await);
        tokio_test::assert_err!(tool.execute(json!({"keywords": []})).await);
        tokio_test::assert_err!(tool.execute(json!({"keywords": [1, 2]})).await);
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_for_log("short", 10), "short");
        assert_eq!(truncate_for_log("日本語テキスト", 3), "日本語... [truncated]");
    }
}
