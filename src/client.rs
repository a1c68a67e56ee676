//! Completion client for OpenAI-compatible chat endpoints
//!
//! [`CompletionClient`] performs exactly one request/response round trip per
//! call and classifies the outcome into a [`DebateError`]. Retrying and
//! switching providers is the job of [`crate::retry::FallbackExecutor`], which
//! drives any [`ChatTransport`].

use crate::config::{CompletionParams, ProviderProfile};
use crate::error::{DebateError, DebateResult};
use crate::logging::{log_debug, log_error, preview};
use crate::types::{ApiErrorBody, ChatMessage, ChatRequest, ChatResponse};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use std::time::{Duration, Instant};

/// One completion round trip against a provider profile
///
/// The request carries model and prompt; the profile supplies endpoint and
/// credential. Implementations must not retry on their own.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn complete(&self, profile: &ProviderProfile, request: &ChatRequest)
        -> DebateResult<String>;
}

/// Build the request body for a prompt
///
/// The whole prompt travels as a single system message.
pub fn build_chat_request(model: &str, prompt: &str, params: &CompletionParams) -> ChatRequest {
    ChatRequest {
        model: model.to_string(),
        messages: vec![ChatMessage::system(prompt)],
        temperature: Some(params.temperature),
        max_tokens: params.max_tokens,
    }
}

/// HTTP client for OpenAI-compatible providers
#[derive(Debug, Clone)]
pub struct CompletionClient {
    client: reqwest::Client,
    timeout: Duration,
}

impl Default for CompletionClient {
    fn default() -> Self {
        Self::new(CompletionParams::default().timeout)
    }
}

impl CompletionClient {
    /// Create a client whose requests time out after `timeout`
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout,
        }
    }

    /// Build authentication headers for OpenAI-compatible APIs
    pub fn build_auth_headers(api_key: &str) -> DebateResult<HeaderMap> {
        let mut headers = HeaderMap::new();

        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {api_key}")).map_err(|e| {
                DebateError::configuration_error(format!("Invalid API key format: {e}"))
            })?,
        );

        Ok(headers)
    }

    async fn send(&self, profile: &ProviderProfile, request: &ChatRequest) -> DebateResult<String> {
        let headers = Self::build_auth_headers(profile.api_key())?;

        let response = self
            .client
            .post(&profile.api_url)
            .headers(headers)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                log_error!(
                    url = %profile.api_url,
                    error = %e,
                    "HTTP request failed"
                );
                DebateError::transport_error(format!("Request failed: {e}"), Some(Box::new(e)))
            })?;

        if !response.status().is_success() {
            return Err(classify_error_response(&profile.name, response).await);
        }

        let raw_body = response.text().await.map_err(|e| {
            DebateError::transport_error(format!("Failed to read response: {e}"), Some(Box::new(e)))
        })?;

        extract_first_choice(&raw_body)
    }
}

#[async_trait]
impl ChatTransport for CompletionClient {
    async fn complete(
        &self,
        profile: &ProviderProfile,
        request: &ChatRequest,
    ) -> DebateResult<String> {
        log_debug!(
            provider = %profile.name,
            model = %request.model,
            prompt_preview = %preview(request.prompt()),
            "Sending completion request"
        );

        let started = Instant::now();
        let content = tokio::time::timeout(self.timeout, self.send(profile, request))
            .await
            .map_err(|_| DebateError::timeout(self.timeout.as_secs()))??;

        log_debug!(
            provider = %profile.name,
            duration_ms = started.elapsed().as_millis(),
            content_length = content.len(),
            "Completion request succeeded"
        );

        Ok(content)
    }
}

/// Map a non-success response to the error taxonomy
async fn classify_error_response(provider: &str, response: reqwest::Response) -> DebateError {
    let status = response.status();
    let retry_after_seconds = response
        .headers()
        .get("retry-after")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok());
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());

    classify_status(provider, status.as_u16(), retry_after_seconds, &body)
}

/// Classify a non-success status and body
pub fn classify_status(
    provider: &str,
    status: u16,
    retry_after_seconds: Option<u64>,
    body: &str,
) -> DebateError {
    match status {
        401 | 403 => {
            let detail = ApiErrorBody::from_text(body)
                .error
                .message
                .unwrap_or_else(|| "Invalid API key or authentication failed".to_string());
            DebateError::authentication_failed(provider, detail)
        }
        429 if ApiErrorBody::from_text(body).is_quota_exhausted() => {
            DebateError::quota_exhausted(provider)
        }
        429 => DebateError::rate_limited(provider, retry_after_seconds),
        _ => DebateError::api_error(provider, status, body),
    }
}

/// Content of the first choice of a success body
pub fn extract_first_choice(raw_body: &str) -> DebateResult<String> {
    let parsed: ChatResponse = serde_json::from_str(raw_body).map_err(|e| {
        log_error!(
            error = %e,
            raw_body = %preview(raw_body),
            "Failed to parse completion response"
        );
        DebateError::response_parsing_error(format!("Invalid response: {e}"))
    })?;

    parsed
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content.unwrap_or_default())
        .ok_or_else(|| DebateError::response_parsing_error("No choices in completion response"))
}
