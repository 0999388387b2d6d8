pub mod config;
pub mod error;
pub mod filters;
pub mod gemini;
pub mod model;
pub mod prompt;
pub mod render;
pub mod responder;
pub mod retry;

// Re-export commonly used types
pub use config::{GenerationOptions, ModelConfig, Provider, SafetySetting};
pub use error::{MatcherError, Result};
pub use filters::{
    AgeGroup, Era, FilterSelection, LengthBucket, MediaType, YearRange, validate_languages,
    validate_mood,
};
pub use gemini::GeminiClient;
pub use model::{Fragment, FragmentStream, GenerationRequest, GenerativeModel};
pub use prompt::{BookPreset, book_presets, custom_prompt};
pub use render::{Link, LinkKind, MatchLine, match_lines};
pub use responder::{GenerationResult, Notice, NoticeLevel, NoticeSink, PromptResponder};
pub use retry::{RetryOutcome, RetryPolicy};
