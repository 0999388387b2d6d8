use std::future::Future;
use std::time::Duration;

/// Bounded retry with a fixed pause between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, the first one included. Zero behaves like one.
    pub max_attempts: u32,
    /// Pause between two attempts; never applied after the last one
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// `max_attempts` is raised to 1: the operation always runs at least once.
    #[must_use]
    pub const fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: if max_attempts == 0 { 1 } else { max_attempts },
            delay,
        }
    }

    /// Whether another attempt may follow attempt number `attempt` (1-based).
    #[must_use]
    pub const fn can_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RetryOutcome<T, E> {
    Succeeded { value: T, attempts: u32 },
    Exhausted { attempts: u32, last_error: E },
}

impl<T, E> RetryOutcome<T, E> {
    pub fn attempts(&self) -> u32 {
        match self {
            RetryOutcome::Succeeded { attempts, .. } | RetryOutcome::Exhausted { attempts, .. } => {
                *attempts
            }
        }
    }

    pub fn into_result(self) -> Result<T, E> {
        match self {
            RetryOutcome::Succeeded { value, .. } => Ok(value),
            RetryOutcome::Exhausted { last_error, .. } => Err(last_error),
        }
    }
}

/// Run `op` until it succeeds or the policy runs out of attempts.
///
/// `op` receives the 1-based attempt number. `on_failure` sees every failed
/// attempt, the last one included, before any pause.
pub async fn retry<T, E, F, Fut, N>(policy: &RetryPolicy, mut on_failure: N, mut op: F) -> RetryOutcome<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    N: FnMut(u32, &E),
{
    let mut attempt = 1;
    loop {
        match op(attempt).await {
            Ok(value) => {
                return RetryOutcome::Succeeded {
                    value,
                    attempts: attempt,
                };
            }
            Err(err) => {
                on_failure(attempt, &err);
                if !policy.can_retry(attempt) {
                    return RetryOutcome::Exhausted {
                        attempts: attempt,
                        last_error: err,
                    };
                }
                tokio::time::sleep(policy.delay).await;
                attempt += 1;
            }
        }
    }
}
