//! Bounded polling
//!
//! The integration API accepts create and lifecycle calls asynchronously and
//! only hands back a request id. The durable alert id shows up later under
//! `requests/{id}`, so the adapter polls that endpoint a bounded number of
//! times.

use crate::config::{BackoffStrategy, PollConfig};
use crate::error::{AppError, Result};
use crate::models::RequestStatus;
use crate::transport::{ApiResponse, HttpMethod, JsmOpsClient};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Attempt budget and delay schedule
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
    pub max_interval: Duration,
    pub backoff: BackoffStrategy,
}

impl RetryPolicy {
    pub fn from_config(config: &PollConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            interval: Duration::from_millis(config.interval_ms),
            max_interval: Duration::from_millis(config.max_interval_ms),
            backoff: config.backoff,
        }
    }

    /// Override the attempt budget; zero is raised to one
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Delay after the 1-based `attempt`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let attempt = attempt.max(1);
        let delay = match self.backoff {
            BackoffStrategy::Fixed => self.interval,
            BackoffStrategy::Linear => self.interval.saturating_mul(attempt),
            BackoffStrategy::Exponential => {
                let factor = 2_u32.checked_pow(attempt - 1).unwrap_or(u32::MAX);
                self.interval.saturating_mul(factor)
            }
        };
        delay.min(self.max_interval)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&PollConfig::default())
    }
}

/// How a polling run ended
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome<T> {
    /// The predicate held for this value
    Satisfied { value: T, attempts: u32 },
    /// Budget spent; the last value seen
    Exhausted { last: T, attempts: u32 },
}

/// Call `fetch` until `is_done` holds or the attempt budget runs out
///
/// Errors from `fetch` end the run immediately. No delay follows the final
/// attempt.
pub async fn poll_until<T, F, Fut, P>(policy: &RetryPolicy, mut fetch: F, is_done: P) -> Result<PollOutcome<T>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T>>,
    P: Fn(&T) -> bool,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        let value = fetch(attempt).await?;

        if is_done(&value) {
            return Ok(PollOutcome::Satisfied {
                value,
                attempts: attempt,
            });
        }

        if attempt >= max_attempts {
            return Ok(PollOutcome::Exhausted {
                last: value,
                attempts: attempt,
            });
        }

        let delay = policy.delay_for(attempt);
        debug!(
            attempt = attempt,
            max_attempts = max_attempts,
            delay_ms = delay.as_millis() as u64,
            "Condition not met, waiting before next attempt"
        );
        if !delay.is_zero() {
            sleep(delay).await;
        }
    }
}

/// Structurally valid request-status answer, if any
pub fn request_status(response: &ApiResponse) -> Option<RequestStatus> {
    let data = response.object()?.get("data")?;
    if !data.is_object() {
        return None;
    }
    serde_json::from_value(data.clone()).ok()
}

/// Exchanges a request id for the materialized alert
pub struct ResolutionPoller<'a> {
    client: &'a JsmOpsClient,
    policy: RetryPolicy,
    name: String,
}

impl<'a> ResolutionPoller<'a> {
    pub fn new(client: &'a JsmOpsClient, policy: RetryPolicy, name: impl Into<String>) -> Self {
        Self {
            client,
            policy,
            name: name.into(),
        }
    }

    /// Poll `requests/{request_id}` until the remote reports a settled state
    pub async fn resolve(&self, request_id: &str) -> Result<RequestStatus> {
        let path = format!("requests/{}", request_id);

        let outcome = poll_until(
            &self.policy,
            |attempt| {
                let path = path.as_str();
                async move {
                    debug!(request_id = %request_id, attempt = attempt, "Polling request status");
                    self.client.request(HttpMethod::Get, path, None, true).await
                }
            },
            |response| request_status(response).is_some_and(|status| status.is_settled()),
        )
        .await?;

        match outcome {
            PollOutcome::Satisfied { value, attempts } => {
                let status = request_status(&value).ok_or_else(|| AppError::AlertIdUnresolved(self.name.clone()))?;
                info!(
                    request_id = %request_id,
                    alert_id = status.alert_id.as_deref().unwrap_or_default(),
                    attempts = attempts,
                    status = %status.status,
                    "Request resolved"
                );
                Ok(status)
            }
            PollOutcome::Exhausted { last, attempts } => match request_status(&last) {
                Some(status) => {
                    warn!(
                        request_id = %request_id,
                        attempts = attempts,
                        status = %status.status,
                        "Remote reported operation failure"
                    );
                    Err(AppError::RemoteOperation {
                        name: self.name.clone(),
                        status: status.status,
                    })
                }
                None => {
                    warn!(request_id = %request_id, attempts = attempts, "Request status never materialized");
                    Err(AppError::AlertIdUnresolved(self.name.clone()))
                }
            },
        }
    }
}
