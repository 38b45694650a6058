//! Pass-through generation parameters and per-model shaping.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::config::ModelProfile;

/// Fields the caller may not set because the agent owns them.
const RESERVED: &[&str] = &["model", "messages", "tools", "tool_choice", "stream", "stream_options"];

/// Caller-supplied generation parameters (`max_tokens`, `top_p`, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GenerationParams(Map<String, Value>);

impl GenerationParams {
    pub fn new(params: Map<String, Value>) -> Self {
        Self(params)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Parameters as the upstream expects them for a model with `profile`.
    ///
    /// Reserved fields are dropped, a fixed temperature replaces whatever the
    /// caller sent, and `max_tokens` moves to the profile's token field.
    pub fn shaped_for(&self, profile: &ModelProfile) -> Map<String, Value> {
        let mut out = self.0.clone();
        for key in RESERVED {
            if out.remove(*key).is_some() {
                tracing::debug!(field = %key, "Ignoring caller-supplied field");
            }
        }

        if let Some(temperature) = profile.temperature {
            out.insert("temperature".to_string(), json!(temperature));
        }

        if let Some(limit) = out.remove("max_tokens") {
            out.entry(profile.token_limit_field.clone()).or_insert(limit);
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(v: Value) -> GenerationParams {
        serde_json::from_value(v).unwrap()
    }

    fn fixed(temp: f64) -> ModelProfile {
        ModelProfile {
            temperature: Some(temp),
            ..ModelProfile::default()
        }
    }

    #[test]
    fn fixed_temperature_overrides_caller() {
        let shaped = params(json!({"temperature": 0.2})).shaped_for(&fixed(1.0));
        assert_eq!(shaped["temperature"], json!(1.0));
    }

    #[test]
    fn fixed_temperature_added_when_absent() {
        let shaped = params(json!({})).shaped_for(&fixed(1.0));
        assert_eq!(shaped["temperature"], json!(1.0));
    }

    #[test]
    fn caller_temperature_kept_without_profile() {
        let shaped = params(json!({"temperature": 0.7})).shaped_for(&ModelProfile::default());
        assert_eq!(shaped["temperature"], json!(0.7));
    }

    #[test]
    fn max_tokens_is_renamed() {
        let shaped = params(json!({"max_tokens": 256})).shaped_for(&fixed(1.0));
        assert!(shaped.get("max_tokens").is_none());
        assert_eq!(shaped["max_completion_tokens"], json!(256));
    }

    #[test]
    fn explicit_completion_tokens_win_over_renamed() {
        let shaped = params(json!({"max_tokens": 256, "max_completion_tokens": 64}))
            .shaped_for(&ModelProfile::default());
        assert_eq!(shaped["max_completion_tokens"], json!(64));
        assert!(shaped.get("max_tokens").is_none());
    }

    #[test]
    fn legacy_token_field_profile_keeps_max_tokens() {
        let profile = ModelProfile {
            temperature: None,
            token_limit_field: "max_tokens".to_string(),
        };
        let shaped = params(json!({"max_tokens": 500})).shaped_for(&profile);
        assert_eq!(shaped["max_tokens"], json!(500));
    }

    #[test]
    fn reserved_fields_are_dropped() {
        let shaped = params(json!({
            "stream": true,
            "tools": [],
            "tool_choice": "auto",
            "top_p": 0.9
        }))
        .shaped_for(&ModelProfile::default());
        assert_eq!(shaped.len(), 1);
        assert_eq!(shaped["top_p"], json!(0.9));
    }
}
