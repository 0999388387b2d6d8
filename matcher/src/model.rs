use async_trait::async_trait;
use serde::Serialize;

use crate::config::{GenerationOptions, SafetySetting, block_none};
use crate::error::{MatcherError, Result};

/// Prompt text plus everything sent alongside it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationRequest {
    prompt: String,
    options: GenerationOptions,
    safety: Vec<SafetySetting>,
    stream: bool,
}

impl GenerationRequest {
    /// Streamed request with every safety threshold at `BLOCK_NONE`.
    pub fn new(prompt: impl Into<String>, options: GenerationOptions) -> Result<Self> {
        let prompt = prompt.into();
        if prompt.trim().is_empty() {
            return Err(MatcherError::InvalidSelection("prompt is empty".into()));
        }
        Ok(Self {
            prompt,
            options,
            safety: block_none(),
            stream: true,
        })
    }

    /// Same request answered in one piece through `generateContent`.
    #[must_use]
    pub fn unstreamed(mut self) -> Self {
        self.stream = false;
        self
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn options(&self) -> &GenerationOptions {
        &self.options
    }

    pub fn safety(&self) -> &[SafetySetting] {
        &self.safety
    }

    pub fn stream(&self) -> bool {
        self.stream
    }
}

/// One piece of a streamed response, or the reason it could not be read
pub type Fragment = Result<String>;

/// Finite, lazily produced sequence of fragments for one generation
pub type FragmentStream = Box<dyn Iterator<Item = Fragment> + Send>;

/// A handle to a generative model, built once and shared read-only
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Model identifier used in logs
    fn name(&self) -> &str;

    /// Issue the content-generation call.
    ///
    /// An `Err` here fails the whole attempt. Individual fragments may still
    /// fail with `MatcherError::EmptyCandidate`, which callers read as "".
    async fn generate_content(&self, request: &GenerationRequest) -> Result<FragmentStream>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_prompt_is_refused() {
        let err = GenerationRequest::new("   ", GenerationOptions::default()).unwrap_err();
        assert!(matches!(err, MatcherError::InvalidSelection(_)));
    }

    #[test]
    fn request_streams_with_block_none() {
        let request = GenerationRequest::new("hi", GenerationOptions::default()).unwrap();
        assert!(request.stream());
        assert_eq!(request.safety().len(), 4);
        assert_eq!(request.prompt(), "hi");

        let single = request.unstreamed();
        assert!(!single.stream());
        assert_eq!(single.safety().len(), 4);
    }
}
