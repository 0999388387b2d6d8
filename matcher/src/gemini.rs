//! Gemini `generateContent` client over plain HTTP.
//!
//! Works against the public Generative Language API (API key) and against
//! Vertex AI (project + location + bearer token). Streamed calls use
//! `streamGenerateContent` without SSE, which answers with a JSON array of
//! partial responses; each element becomes one fragment.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{GenerationOptions, ModelConfig, Provider, SafetySetting};
use crate::error::{MatcherError, Result};
use crate::model::{Fragment, FragmentStream, GenerationRequest, GenerativeModel};

const GENERATIVE_LANGUAGE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentBody<'a> {
    contents: Vec<Content>,
    generation_config: &'a GenerationOptions,
    safety_settings: &'a [SafetySetting],
}

impl<'a> GenerateContentBody<'a> {
    fn from_request(request: &'a GenerationRequest) -> Self {
        Self {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(request.prompt().to_string()),
                }],
            }],
            generation_config: request.options(),
            safety_settings: request.safety(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentChunk {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    code: Option<u16>,
    #[serde(default)]
    message: String,
}

impl GenerateContentChunk {
    fn into_fragment(self) -> Fragment {
        if let Some(error) = self.error {
            return Err(MatcherError::TransientCallFailure(format!(
                "stream error {}: {}",
                error.code.unwrap_or_default(),
                error.message
            )));
        }

        let Some(candidate) = self.candidates.into_iter().next() else {
            let reason = self
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .unwrap_or_else(|| "no candidates".to_string());
            return Err(MatcherError::EmptyCandidate(reason));
        };

        let texts: Vec<String> = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if texts.is_empty() {
            return Err(MatcherError::EmptyCandidate(
                candidate
                    .finish_reason
                    .unwrap_or_else(|| "no text parts".to_string()),
            ));
        }
        Ok(texts.concat())
    }
}

/// HTTP client for one Gemini model
pub struct GeminiClient {
    http: reqwest::Client,
    config: ModelConfig,
}

impl GeminiClient {
    pub fn new(config: ModelConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| MatcherError::Configuration(format!("http client: {}", e)))?;
        info!(model = %config.model, "Gemini client ready");
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    fn endpoint(&self, stream: bool) -> String {
        let method = if stream {
            "streamGenerateContent"
        } else {
            "generateContent"
        };
        let model = &self.config.model;
        match &self.config.provider {
            Provider::ApiKey { .. } => {
                let base = self
                    .config
                    .base_url
                    .as_deref()
                    .unwrap_or(GENERATIVE_LANGUAGE_URL);
                format!("{}/v1beta/models/{}:{}", base.trim_end_matches('/'), model, method)
            }
            Provider::Vertex {
                project, location, ..
            } => {
                let base = self
                    .config
                    .base_url
                    .clone()
                    .unwrap_or_else(|| format!("https://{}-aiplatform.googleapis.com", location));
                format!(
                    "{}/v1/projects/{}/locations/{}/publishers/google/models/{}:{}",
                    base.trim_end_matches('/'),
                    project,
                    location,
                    model,
                    method
                )
            }
        }
    }
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    fn name(&self) -> &str {
        &self.config.model
    }

    async fn generate_content(&self, request: &GenerationRequest) -> Result<FragmentStream> {
        let url = self.endpoint(request.stream());
        debug!(%url, prompt_len = request.prompt().len(), "Sending generation request");

        let builder = self
            .http
            .post(&url)
            .json(&GenerateContentBody::from_request(request));
        let builder = match &self.config.provider {
            Provider::ApiKey { api_key } => builder.header("x-goog-api-key", api_key),
            Provider::Vertex { access_token, .. } => builder.bearer_auth(access_token),
        };

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MatcherError::TransientCallFailure(format!(
                "{} returned {}: {}",
                self.name(),
                status,
                body.trim()
            )));
        }

        let bytes = response.bytes().await?;
        let chunks: Vec<GenerateContentChunk> = if request.stream() {
            serde_json::from_slice(&bytes)?
        } else {
            vec![serde_json::from_slice(&bytes)?]
        };
        debug!(chunks = chunks.len(), "Generation response received");

        Ok(Box::new(
            chunks.into_iter().map(GenerateContentChunk::into_fragment),
        ))
    }
}
