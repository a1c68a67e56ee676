//! OpenAI-compatible wire structures
//!
//! Both supported providers (OpenAI and Groq) speak the same chat-completions
//! dialect, so one set of request/response types covers them.

use serde::{Deserialize, Serialize};

/// Error code a provider sends with a 429 when the account has no quota left
pub const INSUFFICIENT_QUOTA: &str = "insufficient_quota";

/// Chat message structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }
}

/// Chat completion request body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl ChatRequest {
    /// Text of the first message, which carries the whole prompt
    pub fn prompt(&self) -> &str {
        self.messages
            .first()
            .map(|m| m.content.as_str())
            .unwrap_or_default()
    }
}

/// Chat completion response body
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

/// Choice in a completion response
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ChatChoice {
    pub message: ChatResponseMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Message in a completion response choice
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ChatResponseMessage {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

/// Error envelope, `{"error": {"code": ..., "message": ...}}`
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub error: ApiErrorDetail,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ApiErrorDetail {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, rename = "type")]
    pub error_type: Option<String>,
}

impl ApiErrorBody {
    /// Parse an error body leniently; anything unreadable yields an empty detail
    pub fn from_text(text: &str) -> Self {
        serde_json::from_str(text).unwrap_or_default()
    }

    pub fn is_quota_exhausted(&self) -> bool {
        self.error.code.as_deref() == Some(INSUFFICIENT_QUOTA)
    }
}
