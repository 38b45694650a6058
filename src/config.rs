//! Configuration management for the search agent.
//!
//! Configuration is read once at startup from environment variables (a `.env`
//! file in the working directory is loaded first, if present):
//! - `AI_BUILDER_API_KEY` - Bearer credential for the upstream API. Required in
//!   agent mode; optional (with a warning) in proxy mode.
//! - `AI_BUILDER_BASE_URL` - Optional. Upstream API base URL. Defaults to
//!   `https://space.ai-builders.com/backend`.
//! - `HOST` - Optional. Server host. Defaults to `127.0.0.1`.
//! - `PORT` - Optional. Server port. Defaults to `8000`.
//! - `DEFAULT_MODEL` - Optional. Model used when a request names none. Defaults to `gpt-5`.
//! - `REQUEST_TIMEOUT_SECS` - Optional. Per-call upstream timeout. Defaults to `60`.
//! - `MODEL_TEMPERATURES` - Optional. Comma-separated `model=temperature` pairs
//!   for models that only accept a fixed sampling temperature. Applied on top of
//!   the built-in profiles (`gpt-5` is pinned to `1.0`).
//! - `SERVICE_MODE` - Optional. `agent` (default) or `proxy`.

use std::collections::HashMap;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://space.ai-builders.com/backend";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Which surface the server exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceMode {
    /// Agentic chat endpoint plus search/hello helpers. Requires the API key.
    Agent,
    /// Plain pass-through proxy. Starts without an API key.
    Proxy,
}

impl ServiceMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceMode::Agent => "agent",
            ServiceMode::Proxy => "proxy",
        }
    }
}

/// How a model wants its generation parameters shaped.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelProfile {
    /// Temperature the model requires. Caller-supplied values are dropped when set.
    pub temperature: Option<f64>,

    /// Upstream field name for the completion token cap.
    pub token_limit_field: String,
}

impl Default for ModelProfile {
    fn default() -> Self {
        Self {
            temperature: None,
            token_limit_field: "max_completion_tokens".to_string(),
        }
    }
}

/// Service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Bearer credential for the upstream API
    pub api_key: Option<String>,

    /// Upstream API base URL (no trailing slash)
    pub api_base_url: String,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Model used when the request does not name one
    pub default_model: String,

    /// Timeout applied to every outbound HTTP call
    pub request_timeout: Duration,

    /// Per-model parameter shaping, keyed by model id
    pub model_profiles: HashMap<String, ModelProfile>,

    pub mode: ServiceMode,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if `AI_BUILDER_API_KEY` is not set
    /// and the service runs in agent mode.
    pub fn from_env() -> Result<Self, ConfigError> {
        // A missing .env file is fine; the process environment still applies.
        let _ = dotenv::dotenv();

        let mode = match std::env::var("SERVICE_MODE") {
            Ok(v) => parse_mode(&v)
                .map_err(|e| ConfigError::InvalidValue("SERVICE_MODE".to_string(), e))?,
            Err(_) => ServiceMode::Agent,
        };

        let api_key = std::env::var("AI_BUILDER_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty());
        if api_key.is_none() {
            match mode {
                ServiceMode::Agent => {
                    return Err(ConfigError::MissingEnvVar("AI_BUILDER_API_KEY".to_string()))
                }
                ServiceMode::Proxy => tracing::warn!(
                    "AI_BUILDER_API_KEY not set; upstream requests will fail until it is configured"
                ),
            }
        }

        let api_base_url = std::env::var("AI_BUILDER_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse()
            .map_err(|e| ConfigError::InvalidValue("PORT".to_string(), format!("{}", e)))?;

        let default_model =
            std::env::var("DEFAULT_MODEL").unwrap_or_else(|_| "gpt-5".to_string());

        let timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "60".to_string())
            .parse()
            .map_err(|e| {
                ConfigError::InvalidValue("REQUEST_TIMEOUT_SECS".to_string(), format!("{}", e))
            })?;

        let mut model_profiles = default_model_profiles();
        if let Ok(v) = std::env::var("MODEL_TEMPERATURES") {
            let temperatures = parse_model_temperatures(&v)
                .map_err(|e| ConfigError::InvalidValue("MODEL_TEMPERATURES".to_string(), e))?;
            apply_temperatures(&mut model_profiles, temperatures);
        }

        Ok(Self {
            api_key,
            api_base_url,
            host,
            port,
            default_model,
            request_timeout: Duration::from_secs(timeout_secs),
            model_profiles,
            mode,
        })
    }

    /// Create a config with custom values (useful for testing).
    pub fn new(api_key: impl Into<String>, api_base_url: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            api_base_url: api_base_url.into().trim_end_matches('/').to_string(),
            host: "127.0.0.1".to_string(),
            port: 8000,
            default_model: "gpt-5".to_string(),
            request_timeout: Duration::from_secs(60),
            model_profiles: default_model_profiles(),
            mode: ServiceMode::Agent,
        }
    }

    /// Profile for `model`, falling back to the default shaping.
    pub fn profile_for(&self, model: &str) -> ModelProfile {
        self.model_profiles.get(model).cloned().unwrap_or_default()
    }
}

/// Built-in profiles. gpt-5 only accepts `temperature = 1.0`; grok-4-fast
/// still takes the legacy `max_tokens` field.
fn default_model_profiles() -> HashMap<String, ModelProfile> {
    let mut profiles = HashMap::new();
    profiles.insert(
        "gpt-5".to_string(),
        ModelProfile {
            temperature: Some(1.0),
            ..ModelProfile::default()
        },
    );
    profiles.insert(
        "grok-4-fast".to_string(),
        ModelProfile {
            temperature: None,
            token_limit_field: "max_tokens".to_string(),
        },
    );
    profiles
}

fn parse_mode(value: &str) -> Result<ServiceMode, String> {
    match value.trim().to_lowercase().as_str() {
        "agent" | "" => Ok(ServiceMode::Agent),
        "proxy" => Ok(ServiceMode::Proxy),
        other => Err(format!("expected 'agent' or 'proxy', got: {}", other)),
    }
}

/// Parse `gpt-5=1.0,o3=1` into model → temperature pairs.
fn parse_model_temperatures(value: &str) -> Result<HashMap<String, f64>, String> {
    let mut temperatures = HashMap::new();
    for pair in value.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (model, temp) = pair
            .split_once('=')
            .ok_or_else(|| format!("expected model=temperature, got: {}", pair))?;
        let model = model.trim();
        if model.is_empty() {
            return Err(format!("empty model name in: {}", pair));
        }
        let temperature: f64 = temp
            .trim()
            .parse()
            .map_err(|e| format!("bad temperature for {}: {}", model, e))?;
        temperatures.insert(model.to_string(), temperature);
    }
    Ok(temperatures)
}

fn apply_temperatures(profiles: &mut HashMap<String, ModelProfile>, temperatures: HashMap<String, f64>) {
    for (model, temperature) in temperatures {
        profiles.entry(model).or_default().temperature = Some(temperature);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_temperature_overrides() {
        let temperatures = parse_model_temperatures("gpt-5=1.0, o3 = 1 ,").unwrap();
        assert_eq!(temperatures.len(), 2);
        assert_eq!(temperatures["gpt-5"], 1.0);
        assert_eq!(temperatures["o3"], 1.0);
    }

    #[test]
    fn overrides_layer_on_builtin_profiles() {
        let mut profiles = default_model_profiles();
        apply_temperatures(&mut profiles, parse_model_temperatures("grok-4-fast=0.5,o3=1").unwrap());

        assert_eq!(profiles["gpt-5"].temperature, Some(1.0));
        assert_eq!(profiles["grok-4-fast"].temperature, Some(0.5));
        assert_eq!(profiles["grok-4-fast"].token_limit_field, "max_tokens");
        assert_eq!(profiles["o3"].token_limit_field, "max_completion_tokens");

        let before = default_model_profiles();
        apply_temperatures(&mut profiles, parse_model_temperatures("").unwrap());
        assert_eq!(profiles["gpt-5"], before["gpt-5"]);
    }

    #[test]
    fn rejects_malformed_overrides() {
        assert!(parse_model_temperatures("gpt-5").is_err());
        assert!(parse_model_temperatures("=1.0").is_err());
        assert!(parse_model_temperatures("gpt-5=hot").is_err());
    }

    #[test]
    fn mode_parsing() {
        assert_eq!(parse_mode("Proxy").unwrap(), ServiceMode::Proxy);
        assert_eq!(parse_mode("agent").unwrap(), ServiceMode::Agent);
        assert!(parse_mode("both").is_err());
    }

    #[test]
    fn unknown_models_use_default_profile() {
        let config = Config::new("key", "http://localhost:9000/");
        assert_eq!(config.api_base_url, "http://localhost:9000");
        assert_eq!(config.profile_for("gpt-5").temperature, Some(1.0));
        assert_eq!(config.profile_for("grok-4-fast").token_limit_field, "max_tokens");
        assert_eq!(config.profile_for("llama-3"), ModelProfile::default());
    }
}
