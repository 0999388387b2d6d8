use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{MatcherError, Result};

pub const DEFAULT_MODEL: &str = "gemini-1.0-pro";
pub const DEFAULT_LOCATION: &str = "us-east4";

/// Sampling options sent with every generation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationOptions {
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: 0.8,
            max_output_tokens: 2048,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HarmCategory {
    HarmCategoryHarassment,
    HarmCategoryHateSpeech,
    HarmCategorySexuallyExplicit,
    HarmCategoryDangerousContent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HarmBlockThreshold {
    BlockNone,
    BlockOnlyHigh,
    BlockMediumAndAbove,
    BlockLowAndAbove,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetySetting {
    pub category: HarmCategory,
    pub threshold: HarmBlockThreshold,
}

/// Every category switched to `BLOCK_NONE`.
pub fn block_none() -> Vec<SafetySetting> {
    [
        HarmCategory::HarmCategoryHarassment,
        HarmCategory::HarmCategoryHateSpeech,
        HarmCategory::HarmCategorySexuallyExplicit,
        HarmCategory::HarmCategoryDangerousContent,
    ]
    .into_iter()
    .map(|category| SafetySetting {
        category,
        threshold: HarmBlockThreshold::BlockNone,
    })
    .collect()
}

/// Where generation requests are sent
#[derive(Debug, Clone, PartialEq)]
pub enum Provider {
    /// Public Generative Language API, authenticated with a key
    ApiKey { api_key: String },
    /// Vertex AI, authenticated with a bearer token
    Vertex {
        project: String,
        location: String,
        access_token: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    pub provider: Provider,
    pub model: String,
    pub options: GenerationOptions,
    /// Overrides the provider's default endpoint
    pub base_url: Option<String>,
    pub timeout: Duration,
}

impl ModelConfig {
    pub fn new(provider: Provider) -> Self {
        Self {
            provider,
            model: DEFAULT_MODEL.to_string(),
            options: GenerationOptions::default(),
            base_url: None,
            timeout: Duration::from_secs(60),
        }
    }

    /// Load the model configuration from the environment.
    ///
    /// `GEMINI_API_KEY` wins over the Vertex AI variables when both are set.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let provider = if let Some(api_key) = lookup("GEMINI_API_KEY") {
            Provider::ApiKey { api_key }
        } else if let Some(project) = lookup("GOOGLE_CLOUD_PROJECT") {
            let access_token = lookup("VERTEX_ACCESS_TOKEN").ok_or_else(|| {
                MatcherError::Configuration(
                    "VERTEX_ACCESS_TOKEN is required with GOOGLE_CLOUD_PROJECT".into(),
                )
            })?;
            Provider::Vertex {
                project,
                location: lookup("GOOGLE_CLOUD_LOCATION")
                    .unwrap_or_else(|| DEFAULT_LOCATION.to_string()),
                access_token,
            }
        } else {
            return Err(MatcherError::Configuration(
                "set GEMINI_API_KEY, or GOOGLE_CLOUD_PROJECT and VERTEX_ACCESS_TOKEN".into(),
            ));
        };

        let mut config = Self::new(provider);
        if let Some(model) = lookup("MATCHER_MODEL") {
            config.model = model;
        }
        if let Some(raw) = lookup("MATCHER_TEMPERATURE") {
            config.options.temperature = parse_var("MATCHER_TEMPERATURE", &raw)?;
        }
        if let Some(raw) = lookup("MATCHER_MAX_OUTPUT_TOKENS") {
            config.options.max_output_tokens = parse_var("MATCHER_MAX_OUTPUT_TOKENS", &raw)?;
        }
        config.base_url = lookup("MATCHER_BASE_URL");
        Ok(config)
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| MatcherError::Configuration(format!("{} is not valid: {:?}", name, raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn safety_settings_serialize_as_wire_names() {
        let json = serde_json::to_value(block_none()).unwrap();
        assert_eq!(json.as_array().unwrap().len(), 4);
        assert_eq!(json[0]["category"], "HARM_CATEGORY_HARASSMENT");
        assert_eq!(json[3]["category"], "HARM_CATEGORY_DANGEROUS_CONTENT");
        assert!(json.as_array().unwrap().iter().all(|s| s["threshold"] == "BLOCK_NONE"));
    }

    #[test]
    fn options_serialize_camel_case() {
        let json = serde_json::to_value(GenerationOptions::default()).unwrap();
        assert_eq!(json["maxOutputTokens"], 2048);
        assert!((json["temperature"].as_f64().unwrap() - 0.8).abs() < 1e-6);
    }

    #[test]
    fn api_key_takes_precedence() {
        let config = ModelConfig::from_lookup(lookup_from(&[
            ("GEMINI_API_KEY", "k"),
            ("GOOGLE_CLOUD_PROJECT", "p"),
        ]))
        .unwrap();
        assert_eq!(config.provider, Provider::ApiKey { api_key: "k".into() });
        assert_eq!(config.model, DEFAULT_MODEL);
    }

    #[test]
    fn vertex_defaults_location() {
        let config = ModelConfig::from_lookup(lookup_from(&[
            ("GOOGLE_CLOUD_PROJECT", "proj"),
            ("VERTEX_ACCESS_TOKEN", "tok"),
            ("MATCHER_TEMPERATURE", "0.3"),
            ("MATCHER_MAX_OUTPUT_TOKENS", "512"),
        ]))
        .unwrap();
        match config.provider {
            Provider::Vertex { location, .. } => assert_eq!(location, DEFAULT_LOCATION),
            other => panic!("unexpected provider {:?}", other),
        }
        assert_eq!(config.options.max_output_tokens, 512);
        assert!((config.options.temperature - 0.3).abs() < 1e-6);
    }

    #[test]
    fn missing_credentials_is_a_configuration_error() {
        let err = ModelConfig::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(matches!(err, MatcherError::Configuration(_)));

        let err = ModelConfig::from_lookup(lookup_from(&[("GOOGLE_CLOUD_PROJECT", "p")]))
            .unwrap_err();
        assert!(err.to_string().contains("VERTEX_ACCESS_TOKEN"));
    }

    #[test]
    fn bad_numbers_are_rejected() {
        let err = ModelConfig::from_lookup(lookup_from(&[
            ("GEMINI_API_KEY", "k"),
            ("MATCHER_MAX_OUTPUT_TOKENS", "lots"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("MATCHER_MAX_OUTPUT_TOKENS"));
    }
}
