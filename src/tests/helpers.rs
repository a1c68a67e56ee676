//! Test helper utilities for llm-debate tests
//!
//! IMPORTANT: These helpers are test-only and should NEVER be used in production code.

// Allow dead code in test utilities - functions are used across different test files
#![allow(dead_code)]

use crate::client::ChatTransport;
use crate::config::{CompletionParams, DebateConfig, ProviderProfile};
use crate::error::{DebateError, DebateResult};
use crate::retry::FallbackPolicy;
use crate::types::ChatRequest;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

pub const TEST_WAIT: Duration = Duration::from_secs(25);

pub fn primary_profile() -> ProviderProfile {
    ProviderProfile::openai(Some("test-openai-key".to_string()))
}

pub fn backup_profile() -> ProviderProfile {
    ProviderProfile::groq(Some("test-groq-key".to_string()))
}

/// Fixed 25s wait, capped at `max_attempts`
pub fn test_policy(max_attempts: Option<u32>) -> FallbackPolicy {
    FallbackPolicy {
        max_attempts,
        rate_limit_wait: TEST_WAIT,
        ..FallbackPolicy::default()
    }
}

/// Valid config with both profiles and test credentials
pub fn create_test_config() -> DebateConfig {
    DebateConfig {
        primary: primary_profile(),
        backup: Some(backup_profile()),
        params: CompletionParams::default(),
        fallback: test_policy(Some(5)),
    }
}

pub fn debate_json(optimistic: &str, pessimistic: &str, recommendation: &str) -> String {
    serde_json::json!({
        "optimistic": optimistic,
        "pessimistic": pessimistic,
        "recommendation": recommendation,
    })
    .to_string()
}

/// A request as seen by the transport
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub provider: String,
    pub api_key: String,
    pub request: ChatRequest,
}

/// Transport replaying a fixed script of results and recording every call
///
/// Each script entry builds the result from the profile it is called with.
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Box<dyn Fn(&ProviderProfile) -> DebateResult<String> + Send>>>,
    calls: Mutex<Vec<RecordedCall>>,
    latency: Duration,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            latency: Duration::ZERO,
        }
    }

    /// Every call takes `latency` of (paused) tokio time before answering
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn then_ok(self, content: &str) -> Self {
        let content = content.to_string();
        self.push(move |_| Ok(content.clone()))
    }

    pub fn then_rate_limited(self, times: usize) -> Self {
        (0..times).fold(self, |transport, _| {
            transport.push(|profile| Err(DebateError::rate_limited(profile.name.clone(), None)))
        })
    }

    pub fn then_quota_exhausted(self, times: usize) -> Self {
        (0..times).fold(self, |transport, _| {
            transport.push(|profile| Err(DebateError::quota_exhausted(profile.name.clone())))
        })
    }

    pub fn then_api_error(self, status: u16) -> Self {
        self.push(move |profile| Err(DebateError::api_error(profile.name.clone(), status, "boom")))
    }

    pub fn then_auth_failure(self) -> Self {
        self.push(|profile| {
            Err(DebateError::authentication_failed(
                profile.name.clone(),
                "Invalid API key",
            ))
        })
    }

    fn push(
        self,
        entry: impl Fn(&ProviderProfile) -> DebateResult<String> + Send + 'static,
    ) -> Self {
        self.script.lock().unwrap().push_back(Box::new(entry));
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ChatTransport for ScriptedTransport {
    async fn complete(
        &self,
        profile: &ProviderProfile,
        request: &ChatRequest,
    ) -> DebateResult<String> {
        self.calls.lock().unwrap().push(RecordedCall {
            provider: profile.name.clone(),
            api_key: profile.api_key().to_string(),
            request: request.clone(),
        });
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(entry) => entry(profile),
            None => Err(DebateError::api_error(
                profile.name.clone(),
                500,
                "script exhausted",
            )),
        }
    }
}
