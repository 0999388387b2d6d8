use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::config::GenerationOptions;
use crate::error::{MatcherError, Result};
use crate::model::{GenerationRequest, GenerativeModel};
use crate::retry::{RetryOutcome, RetryPolicy, retry};

pub const SERVICE_UNAVAILABLE: &str = "Service is currently unavailable. Please try again later.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Warning,
    Error,
}

/// A message meant for the person who asked
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// Receives user-facing notices while a generation runs
pub trait NoticeSink: Send {
    fn notify(&mut self, notice: Notice);
}

impl NoticeSink for Vec<Notice> {
    fn notify(&mut self, notice: Notice) {
        self.push(notice);
    }
}

/// Outcome of one generation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationResult {
    /// Joined text; may be empty if the model had nothing to say
    Success(String),
    /// Every attempt failed
    Exhausted { attempts: u32, last_error: String },
}

impl GenerationResult {
    pub fn is_success(&self) -> bool {
        matches!(self, GenerationResult::Success(_))
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            GenerationResult::Success(text) => Some(text),
            GenerationResult::Exhausted { .. } => None,
        }
    }

    /// Collapse to the old empty-string convention.
    pub fn into_text(self) -> String {
        match self {
            GenerationResult::Success(text) => text,
            GenerationResult::Exhausted { .. } => String::new(),
        }
    }

    pub fn into_result(self) -> Result<String> {
        match self {
            GenerationResult::Success(text) => Ok(text),
            GenerationResult::Exhausted {
                attempts,
                last_error,
            } => Err(MatcherError::ExhaustedRetries {
                attempts,
                last_error,
            }),
        }
    }
}

/// Space-join streamed fragments; empty fragments keep their slot.
pub fn join_fragments(fragments: &[String]) -> String {
    fragments.join(" ")
}

/// Sends prompts to a model and turns the streamed answer into one string
#[derive(Clone)]
pub struct PromptResponder {
    model: Arc<dyn GenerativeModel>,
    options: GenerationOptions,
    policy: RetryPolicy,
}

impl PromptResponder {
    pub fn new(model: Arc<dyn GenerativeModel>) -> Self {
        Self {
            model,
            options: GenerationOptions::default(),
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    pub fn options(&self) -> &GenerationOptions {
        &self.options
    }

    /// Generate a response for `prompt`.
    ///
    /// Fails only when the prompt is blank, in which case the model is not
    /// called. Model failures are retried and end up as
    /// `GenerationResult::Exhausted`, never as `Err`.
    pub async fn respond(
        &self,
        prompt: &str,
        notices: &mut dyn NoticeSink,
    ) -> Result<GenerationResult> {
        let request = GenerationRequest::new(prompt, self.options)?;
        Ok(respond(self.model.as_ref(), &request, &self.policy, notices).await)
    }
}

/// One retried generation against `model`.
pub async fn respond(
    model: &dyn GenerativeModel,
    request: &GenerationRequest,
    policy: &RetryPolicy,
    notices: &mut dyn NoticeSink,
) -> GenerationResult {
    info!(model = model.name(), prompt_len = request.prompt().len(), "Generating response");

    let outcome = retry(
        policy,
        |attempt, err: &MatcherError| {
            warn!(model = model.name(), attempt, error = %err, "Generation attempt failed");
            let message = if policy.can_retry(attempt) {
                format!("Attempt failed: {}. Retrying...", err)
            } else {
                format!("Attempt failed: {}.", err)
            };
            notices.notify(Notice {
                level: NoticeLevel::Warning,
                message,
            });
        },
        |attempt| async move {
            debug!(attempt, "Calling model");
            collect_fragments(model, request).await
        },
    )
    .await;

    match outcome {
        RetryOutcome::Succeeded { value, attempts } => {
            info!(attempts, response_len = value.len(), "Generation succeeded");
            GenerationResult::Success(value)
        }
        RetryOutcome::Exhausted {
            attempts,
            last_error,
        } => {
            error!(attempts, error = %last_error, "Generation gave up");
            notices.notify(Notice {
                level: NoticeLevel::Error,
                message: SERVICE_UNAVAILABLE.to_string(),
            });
            GenerationResult::Exhausted {
                attempts,
                last_error: last_error.to_string(),
            }
        }
    }
}

async fn collect_fragments(model: &dyn GenerativeModel, request: &GenerationRequest) -> Result<String> {
    let fragments = model.generate_content(request).await?;
    let mut collected = Vec::new();
    for fragment in fragments {
        match fragment {
            Ok(text) => collected.push(text),
            Err(MatcherError::EmptyCandidate(reason)) => {
                debug!(%reason, "Fragment unavailable, keeping an empty slot");
                collected.push(String::new());
            }
            Err(err) => return Err(err),
        }
    }
    Ok(join_fragments(&collected))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Fragment, FragmentStream};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;
    use tokio::time::Instant;

    enum Step {
        Fail(&'static str),
        /// `None` stands for a blocked candidate
        Stream(Vec<Option<&'static str>>),
        BrokenStream,
    }

    struct ScriptedModel {
        steps: Mutex<VecDeque<Step>>,
        calls: AtomicU32,
    }

    impl ScriptedModel {
        fn new(steps: Vec<Step>) -> Arc<Self> {
            Arc::new(Self {
                steps: Mutex::new(steps.into()),
                calls: AtomicU32::new(0),
            })
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl GenerativeModel for ScriptedModel {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn generate_content(&self, _request: &GenerationRequest) -> Result<FragmentStream> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let step = self
                .steps
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Step::Fail("script exhausted"));
            match step {
                Step::Fail(reason) => Err(MatcherError::TransientCallFailure(reason.into())),
                Step::Stream(parts) => {
                    let fragments: Vec<Fragment> = parts
                        .into_iter()
                        .map(|p| match p {
                            Some(text) => Ok(text.to_string()),
                            None => Err(MatcherError::EmptyCandidate("SAFETY".into())),
                        })
                        .collect();
                    Ok(Box::new(fragments.into_iter()))
                }
                Step::BrokenStream => Ok(Box::new(
                    vec![
                        Ok("half".to_string()),
                        Err(MatcherError::TransientCallFailure("connection reset".into())),
                    ]
                    .into_iter(),
                )),
            }
        }
    }

    #[test]
    fn join_keeps_empty_slots() {
        let fragments = vec!["A".to_string(), String::new(), "B".to_string()];
        assert_eq!(join_fragments(&fragments), "A  B");
    }

    #[tokio::test(start_paused = true)]
    async fn always_failing_model_gives_up_after_three_attempts() {
        let model = ScriptedModel::new(vec![]);
        let responder = PromptResponder::new(model.clone());
        let mut notices = Vec::new();
        let started = Instant::now();

        let result = responder.respond("find me a film", &mut notices).await.unwrap();

        assert_eq!(model.calls(), 3);
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(4) && elapsed < Duration::from_secs(5));
        assert!(matches!(result, GenerationResult::Exhausted { attempts: 3, .. }));
        assert_eq!(result.clone().into_text(), "");
        assert!(matches!(
            result.into_result(),
            Err(MatcherError::ExhaustedRetries { attempts: 3, .. })
        ));

        let levels: Vec<NoticeLevel> = notices.iter().map(|n| n.level).collect();
        assert_eq!(
            levels,
            vec![
                NoticeLevel::Warning,
                NoticeLevel::Warning,
                NoticeLevel::Warning,
                NoticeLevel::Error
            ]
        );
        assert!(notices[0].message.ends_with("Retrying..."));
        assert!(!notices[2].message.ends_with("Retrying..."));
        assert_eq!(notices[3].message, SERVICE_UNAVAILABLE);
    }

    #[tokio::test(start_paused = true)]
    async fn second_attempt_success_stops_retrying() {
        let model = ScriptedModel::new(vec![
            Step::Fail("quota"),
            Step::Stream(vec![Some("A"), None, Some("B")]),
            Step::Stream(vec![Some("never used")]),
        ]);
        let responder = PromptResponder::new(model.clone());
        let mut notices = Vec::new();

        let result = responder.respond("find me a film", &mut notices).await.unwrap();

        assert_eq!(result, GenerationResult::Success("A  B".to_string()));
        assert_eq!(model.calls(), 2);
        assert_eq!(notices.len(), 1);
        assert!(notices[0].message.contains("quota"));
    }

    #[tokio::test]
    async fn broken_stream_counts_as_failed_attempt() {
        let model = ScriptedModel::new(vec![
            Step::BrokenStream,
            Step::Stream(vec![Some("whole")]),
        ]);
        let responder = PromptResponder::new(model.clone())
            .with_retry_policy(RetryPolicy::new(3, Duration::ZERO));
        let mut notices = Vec::new();

        let result = responder.respond("x", &mut notices).await.unwrap();

        assert_eq!(result.text(), Some("whole"));
        assert_eq!(model.calls(), 2);
    }

    #[tokio::test]
    async fn empty_success_is_not_a_failure() {
        let model = ScriptedModel::new(vec![Step::Stream(vec![])]);
        let responder = PromptResponder::new(model.clone());
        let mut notices = Vec::new();

        let result = responder.respond("x", &mut notices).await.unwrap();

        assert!(result.is_success());
        assert_eq!(result.text(), Some(""));
        assert!(notices.is_empty());
    }

    #[tokio::test]
    async fn blank_prompt_never_reaches_the_model() {
        let model = ScriptedModel::new(vec![Step::Stream(vec![Some("unused")])]);
        let responder = PromptResponder::new(model.clone());
        let mut notices = Vec::new();

        let err = responder.respond(" \n ", &mut notices).await.unwrap_err();

        assert!(matches!(err, MatcherError::InvalidSelection(_)));
        assert_eq!(model.calls(), 0);
    }
}
