//! HTTP plumbing shared by every outbound call to the upstream API.
//!
//! Chat completions, search and the pass-through proxy all go to the same
//! base URL with the same bearer credential and per-call timeout.

use bytes::Bytes;
use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

use crate::config::Config;

/// Failure talking to the upstream API.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The upstream answered with a non-2xx status.
    #[error("Upstream API error ({status}): {body}")]
    Status { status: u16, body: String },

    /// Timeout, DNS failure, refused connection, truncated body.
    #[error("Could not reach upstream API: {0}")]
    Transport(#[from] reqwest::Error),

    /// 2xx response whose body is not the JSON we expected.
    #[error("Unexpected upstream response: {0}")]
    Decode(String),
}

impl UpstreamError {
    /// HTTP status to surface to our own caller.
    pub fn status_code(&self) -> StatusCode {
        match self {
            UpstreamError::Status { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            UpstreamError::Transport(_) => StatusCode::SERVICE_UNAVAILABLE,
            UpstreamError::Decode(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

/// Client for the upstream API.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl UpstreamClient {
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: config.api_base_url.clone(),
            api_key: config.api_key.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let request = self.http.post(url);
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    /// POST a JSON body and decode a JSON response.
    ///
    /// Non-2xx statuses come back as `UpstreamError::Status` carrying the
    /// upstream body text.
    pub async fn post_json(&self, path: &str, body: &Value) -> Result<Value, UpstreamError> {
        tracing::debug!(path = %path, "Sending upstream request");

        let response = self.post(path).json(body).send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let body = String::from_utf8_lossy(&bytes).into_owned();
            tracing::warn!(path = %path, status = %status, "Upstream returned error status");
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_slice(&bytes).map_err(|e| UpstreamError::Decode(e.to_string()))
    }

    /// Forward a raw JSON body and hand back whatever the upstream answered,
    /// error statuses included.
    pub async fn forward(&self, path: &str, body: Bytes) -> Result<(StatusCode, Bytes), UpstreamError> {
        let response = self
            .post(path)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;
        let status = response.status();
        let bytes = response.bytes().await?;
        Ok((status, bytes))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn post_json_sends_bearer_and_decodes() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/echo"))
            .and(header("Authorization", "Bearer test_key"))
            .and(body_json(json!({"ping": 1})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"pong": 1})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = UpstreamClient::new(&Config::new("test_key", mock_server.uri())).unwrap();
        let value = client.post_json("/v1/echo", &json!({"ping": 1})).await.unwrap();
        assert_eq!(value, json!({"pong": 1}));
    }

    #[tokio::test]
    async fn error_status_keeps_code_and_body() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway upstream"))
            .mount(&mock_server)
            .await;

        let client = UpstreamClient::new(&Config::new("k", mock_server.uri())).unwrap();
        let err = client.post_json("/v1/echo", &json!({})).await.unwrap_err();
        match &err {
            UpstreamError::Status { status, body } => {
                assert_eq!(*status, 502);
                assert_eq!(body, "bad gateway upstream");
            }
            other => panic!("expected status error, got {:?}", other),
        }
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn non_json_success_is_decode_error() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&mock_server)
            .await;

        let client = UpstreamClient::new(&Config::new("k", mock_server.uri())).unwrap();
        let err = client.post_json("/v1/echo", &json!({})).await.unwrap_err();
        assert!(matches!(err, UpstreamError::Decode(_)));
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn slow_upstream_hits_the_request_timeout() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({}))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&mock_server)
            .await;

        let mut config = Config::new("k", mock_server.uri());
        config.request_timeout = Duration::from_millis(100);
        let client = UpstreamClient::new(&config).unwrap();

        let started = std::time::Instant::now();
        let err = client.post_json("/v1/echo", &json!({})).await.unwrap_err();
        assert!(started.elapsed() < Duration::from_secs(2));
        match &err {
            UpstreamError::Transport(e) => assert!(e.is_timeout()),
            other => panic!("expected transport error, got {:?}", other),
        }
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn unreachable_host_is_transport_error() {
        // Port 9 (discard) on localhost is expected to refuse connections.
        let client = UpstreamClient::new(&Config::new("k", "http://127.0.0.1:9")).unwrap();
        let err = client.post_json("/v1/echo", &json!({})).await.unwrap_err();
        assert!(matches!(err, UpstreamError::Transport(_)));
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
