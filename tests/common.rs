//! Test helper utilities for llm-debate integration tests
//!
//! Shared fixtures for tests that run the completion client against a
//! wiremock server.
//!
//! IMPORTANT: These helpers are test-only and should NEVER be used in production code.

// Allow dead code in test utilities - functions are used across different test files
#![allow(dead_code)]

use llm_debate::{CompletionParams, DebateConfig, FallbackPolicy, ProviderProfile};
use std::time::Duration;
use wiremock::ResponseTemplate;

pub const CHAT_PATH: &str = "/v1/chat/completions";
pub const GROQ_PATH: &str = "/openai/v1/chat/completions";

/// Primary profile pointing at a mock server
pub fn primary_profile(server_uri: &str) -> ProviderProfile {
    let mut profile = ProviderProfile::openai(Some("test-openai-key".to_string()));
    profile.api_url = format!("{server_uri}{CHAT_PATH}");
    profile
}

/// Backup profile pointing at a mock server
pub fn backup_profile(server_uri: &str) -> ProviderProfile {
    let mut profile = ProviderProfile::groq(Some("test-groq-key".to_string()));
    profile.api_url = format!("{server_uri}{GROQ_PATH}");
    profile
}

/// Config with both profiles on the mock server and a short rate-limit wait
pub fn create_test_config(server_uri: &str) -> DebateConfig {
    DebateConfig {
        primary: primary_profile(server_uri),
        backup: Some(backup_profile(server_uri)),
        params: CompletionParams {
            timeout: Duration::from_secs(5),
            ..CompletionParams::default()
        },
        fallback: FallbackPolicy {
            max_attempts: Some(5),
            rate_limit_wait: Duration::from_millis(10),
            ..FallbackPolicy::default()
        },
    }
}

/// Successful chat completion with one choice
pub fn success_response(content: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": {
                "role": "assistant",
                "content": content
            },
            "finish_reason": "stop"
        }],
        "usage": {
            "prompt_tokens": 10,
            "completion_tokens": 5,
            "total_tokens": 15
        }
    }))
}

/// 429 carrying the `insufficient_quota` code
pub fn quota_exhausted_response() -> ResponseTemplate {
    ResponseTemplate::new(429).set_body_json(serde_json::json!({
        "error": {
            "message": "You exceeded your current quota, please check your plan and billing details.",
            "type": "insufficient_quota",
            "param": null,
            "code": "insufficient_quota"
        }
    }))
}

/// Generic 429 without a quota code
pub fn rate_limited_response() -> ResponseTemplate {
    ResponseTemplate::new(429).set_body_json(serde_json::json!({
        "error": {
            "message": "Rate limit reached for requests",
            "type": "requests",
            "code": "rate_limit_exceeded"
        }
    }))
}
