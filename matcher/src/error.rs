use thiserror::Error;

/// Errors produced while building prompts and talking to the model
#[derive(Debug, Error)]
pub enum MatcherError {
    /// A model call failed in a way worth retrying (network, quota, bad body)
    #[error("model call failed: {0}")]
    TransientCallFailure(String),

    /// Every attempt of a bounded retry failed
    #[error("gave up after {attempts} attempts: {last_error}")]
    ExhaustedRetries { attempts: u32, last_error: String },

    /// A streamed chunk carried no usable candidate text
    #[error("candidate unavailable: {0}")]
    EmptyCandidate(String),

    #[error("invalid selection: {0}")]
    InvalidSelection(String),

    #[error("configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for MatcherError {
    fn from(err: reqwest::Error) -> Self {
        MatcherError::TransientCallFailure(err.to_string())
    }
}

impl From<serde_json::Error> for MatcherError {
    fn from(err: serde_json::Error) -> Self {
        MatcherError::TransientCallFailure(format!("malformed response: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, MatcherError>;
