//! Retry and provider-fallback policy
//!
//! One logical completion request moves through three states:
//!
//! ```text
//!            success
//! ATTEMPT ───────────────────────────────▶ done
//!   │  quota exhausted on primary, backup unused
//!   ├──────────────▶ SWITCH_PROVIDER ──▶ ATTEMPT (backup, same prompt)
//!   │  any other rate limit
//!   ├──────────────▶ WAIT_AND_RETRY ───▶ ATTEMPT (identical request)
//!   │  anything else
//!   └──────────────▶ failed
//! ```
//!
//! The provider switch fires at most once. Waiting is bounded by
//! [`FallbackPolicy::max_attempts`] and [`FallbackPolicy::total_timeout`] and
//! can be interrupted through a [`CancellationToken`]. The deadline also cuts
//! short an attempt that is still in flight.

use crate::client::ChatTransport;
use crate::config::ProviderProfile;
use crate::error::{DebateError, DebateResult};
use crate::logging::{log_debug, log_info, log_warn};
use crate::types::ChatRequest;

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::{sleep, sleep_until, Instant};
use tokio_util::sync::CancellationToken;

/// Wait and retry configuration for rate-limited requests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallbackPolicy {
    /// Cap on requests per logical call; `None` retries rate limits forever
    pub max_attempts: Option<u32>,
    /// Wait before the first retry after a rate limit
    pub rate_limit_wait: Duration,
    /// Growth factor of the wait per retry; 1.0 keeps it fixed
    pub backoff_multiplier: f64,
    /// Upper bound of a single wait, jitter included; never below `rate_limit_wait`
    pub max_wait: Duration,
    /// Random extra wait as a fraction of the computed wait, clamped to `0.0..=1.0`
    pub jitter: f64,
    /// Deadline for the whole logical call
    pub total_timeout: Option<Duration>,
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        Self {
            max_attempts: Some(10),
            rate_limit_wait: Duration::from_secs(25),
            backoff_multiplier: 1.0,
            max_wait: Duration::from_secs(120),
            jitter: 0.0,
            total_timeout: None,
        }
    }
}

impl FallbackPolicy {
    /// Policy with a fixed wait and no attempt cap
    pub fn unbounded(rate_limit_wait: Duration) -> Self {
        Self {
            max_attempts: None,
            rate_limit_wait,
            ..Self::default()
        }
    }

    /// Wait before retry number `retry` (zero based)
    pub fn wait_for(&self, retry: u32) -> Duration {
        let ceiling = self.max_wait.max(self.rate_limit_wait);
        let mut secs = self.rate_limit_wait.as_secs_f64()
            * self.backoff_multiplier.max(1.0).powi(retry.min(i32::MAX as u32) as i32);

        if self.jitter > 0.0 {
            secs *= 1.0 + fastrand::f64() * self.jitter.clamp(0.0, 1.0);
        }

        Duration::try_from_secs_f64(secs.min(ceiling.as_secs_f64())).unwrap_or(ceiling)
    }

    fn attempts_exhausted(&self, attempts: u32) -> bool {
        self.max_attempts.is_some_and(|max| attempts >= max)
    }
}

/// States of the fallback state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackState {
    Attempt,
    WaitAndRetry,
    SwitchProvider,
    Failed,
}

impl FallbackState {
    /// State entered after an attempt failed with `error`
    ///
    /// `can_switch` is true only while the current provider is the primary
    /// and the backup has not been used yet.
    pub fn after_error(error: &DebateError, can_switch: bool) -> Self {
        match error {
            DebateError::QuotaExhausted { .. } if can_switch => Self::SwitchProvider,
            DebateError::QuotaExhausted { .. } | DebateError::RateLimited { .. } => {
                Self::WaitAndRetry
            }
            _ => Self::Failed,
        }
    }
}

/// Result of a logical request that eventually succeeded
#[derive(Debug, Clone, PartialEq)]
pub struct FallbackOutcome {
    pub content: String,
    /// Display name of the profile that produced `content`
    pub provider: String,
    pub model: String,
    /// Whether the backup replaced the primary
    pub switched: bool,
    /// Total requests issued, including the successful one
    pub attempts: u32,
}

/// Drives a [`ChatTransport`] through the fallback state machine
pub struct FallbackExecutor<'a> {
    policy: &'a FallbackPolicy,
    transport: &'a dyn ChatTransport,
    cancel: CancellationToken,
}

impl<'a> FallbackExecutor<'a> {
    pub fn new(policy: &'a FallbackPolicy, transport: &'a dyn ChatTransport) -> Self {
        Self {
            policy,
            transport,
            cancel: CancellationToken::new(),
        }
    }

    /// Abort waits and in-flight attempts when `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Run one logical request
    ///
    /// `fallback` is the profile to switch to on quota exhaustion; pass `None`
    /// when `profile` is already the backup or no backup exists.
    ///
    /// # Errors
    ///
    /// - any non rate-limit error of an attempt, unchanged
    /// - [`DebateError::RetriesExhausted`] when the attempt cap is reached
    /// - [`DebateError::DeadlineExceeded`] when the total deadline passes,
    ///   even in the middle of a wait or an attempt
    /// - [`DebateError::Cancelled`] when the token fires
    pub async fn execute(
        &self,
        profile: &ProviderProfile,
        fallback: Option<&ProviderProfile>,
        request: ChatRequest,
    ) -> DebateResult<FallbackOutcome> {
        let started = Instant::now();
        let deadline = self
            .policy
            .total_timeout
            .and_then(|limit| started.checked_add(limit));
        let mut profile = profile;
        let mut fallback = fallback;
        let mut request = request;
        let mut attempts = 0u32;
        let mut retries = 0u32;
        let mut switched = false;

        loop {
            self.check_deadline(deadline)?;
            attempts += 1;

            log_debug!(
                attempt = attempts,
                max_attempts = ?self.policy.max_attempts,
                provider = %profile.name,
                model = %request.model,
                state = ?FallbackState::Attempt,
                "Executing completion attempt"
            );

            let result = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(self.cancelled(attempts)),
                _ = until(deadline) => return Err(self.deadline_exceeded(attempts)),
                result = self.transport.complete(profile, &request) => result,
            };

            let error = match result {
                Ok(content) => {
                    return Ok(FallbackOutcome {
                        content,
                        provider: profile.name.clone(),
                        model: request.model,
                        switched,
                        attempts,
                    });
                }
                Err(error) => error,
            };

            match FallbackState::after_error(&error, fallback.is_some()) {
                FallbackState::SwitchProvider => {
                    let Some(backup) = fallback.take() else {
                        return Err(error);
                    };
                    log_warn!(
                        from = %profile.name,
                        to = %backup.name,
                        state = ?FallbackState::SwitchProvider,
                        "Quota exhausted, switching to backup provider"
                    );
                    request.model = backup.model.clone();
                    profile = backup;
                    switched = true;
                }
                FallbackState::WaitAndRetry => {
                    if self.policy.attempts_exhausted(attempts) {
                        return Err(DebateError::retries_exhausted(attempts, error));
                    }
                    let delay = self.policy.wait_for(retries);
                    retries += 1;
                    log_warn!(
                        provider = %profile.name,
                        attempt = attempts,
                        delay_ms = delay.as_millis(),
                        state = ?FallbackState::WaitAndRetry,
                        "Rate limited, waiting before retry"
                    );
                    self.wait(delay, deadline, attempts).await?;
                }
                FallbackState::Attempt | FallbackState::Failed => return Err(error),
            }
        }
    }

    fn check_deadline(&self, deadline: Option<Instant>) -> DebateResult<()> {
        match (deadline, self.policy.total_timeout) {
            (Some(deadline), Some(limit)) if Instant::now() >= deadline => {
                Err(DebateError::deadline_exceeded(limit))
            }
            _ => Ok(()),
        }
    }

    /// Sleep for `delay`, cut short by cancellation or the total deadline
    async fn wait(
        &self,
        delay: Duration,
        deadline: Option<Instant>,
        attempts: u32,
    ) -> DebateResult<()> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(self.cancelled(attempts)),
            _ = until(deadline) => Err(self.deadline_exceeded(attempts)),
            _ = sleep(delay) => Ok(()),
        }
    }

    fn deadline_exceeded(&self, attempts: u32) -> DebateError {
        log_debug!(attempts = attempts, "Total deadline reached");
        DebateError::deadline_exceeded(self.policy.total_timeout.unwrap_or_default())
    }

    fn cancelled(&self, attempts: u32) -> DebateError {
        log_info!(attempts = attempts, "Completion request cancelled");
        DebateError::Cancelled
    }
}

/// Completes at `deadline`, never without one
async fn until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending::<()>().await,
    }
}
