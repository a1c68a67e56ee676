//! Error types for debate operations.
//!
//! Every failure of the completion pipeline is expressed as a [`DebateError`].
//! The variants mirror the way a completion call can go wrong:
//! - Configuration errors (missing credentials, invalid settings)
//! - Transport failures and per-request timeouts
//! - Authentication failures
//! - Quota exhaustion and generic rate limiting
//! - Other non-success API responses
//! - Malformed completion envelopes
//! - Retry budget exhaustion, the total deadline and cancellation
//!
//! # Error Handling Example
//!
//! ```rust
//! use llm_debate::{DebateError, error::ErrorCategory};
//!
//! fn report(err: &DebateError) -> String {
//!     match err.category() {
//!         ErrorCategory::Transient => format!("try again later: {}", err.user_message()),
//!         _ => err.user_message(),
//!     }
//! }
//! ```
//!
//! Constructor methods log the error at the matching level, so callers
//! never need to log a failure a second time before showing it.

use crate::logging::{log_error, log_warn};
use std::time::Duration;
use thiserror::Error;

// ============================================================================
// Error categorization types
// ============================================================================

/// High-level categorization of errors for routing and display decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The provider or the network had an issue.
    External,

    /// The caller can fix this (credentials, configuration, input).
    Client,

    /// Temporary condition; waiting or switching provider may help.
    Transient,
}

/// Severity level for logging decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Action failed and needs attention.
    Error,

    /// Unexpected but recoverable situation.
    Warning,

    /// Expected outcome, e.g. a user-requested cancellation.
    Info,
}

// ============================================================================
// Debate Error types
// ============================================================================

/// Convenient result type for debate operations.
pub type DebateResult<T> = std::result::Result<T, DebateError>;

/// Errors that can occur while running a debate.
///
/// | Variant | Category | Handling by the fallback policy |
/// |---------|----------|---------------------------------|
/// | `ConfigurationError` | Client | terminal |
/// | `TransportError` | External | terminal |
/// | `Timeout` | Transient | terminal |
/// | `AuthenticationFailed` | Client | terminal |
/// | `QuotaExhausted` | Transient | one-time provider switch, else wait |
/// | `RateLimited` | Transient | wait and retry |
/// | `ApiError` | External | terminal |
/// | `ResponseParsingError` | External | terminal |
/// | `RetriesExhausted` | Transient | terminal |
/// | `DeadlineExceeded` | Transient | terminal |
/// | `Cancelled` | Client | terminal |
/// | `TemplateError` | Client | terminal |
#[derive(Error, Debug)]
pub enum DebateError {
    /// Configuration is invalid or incomplete.
    #[error("Configuration error: {message}")]
    ConfigurationError {
        /// Description of the configuration problem.
        message: String,
    },

    /// The HTTP request never produced a response.
    #[error("Transport error: {message}")]
    TransportError {
        /// Description of the failure.
        message: String,
        /// The underlying error, if available.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A single completion request exceeded its timeout.
    #[error("Request timed out after {timeout_seconds}s")]
    Timeout {
        /// The timeout duration that was exceeded.
        timeout_seconds: u64,
    },

    /// The provider rejected the credential.
    #[error("Authentication failed for {provider}: {message}")]
    AuthenticationFailed {
        /// Profile name of the provider.
        provider: String,
        /// Details from the provider.
        message: String,
    },

    /// The provider reported that the account's quota is used up.
    #[error("Quota exhausted at {provider}")]
    QuotaExhausted {
        /// Profile name of the provider.
        provider: String,
    },

    /// The provider is throttling requests.
    #[error("Rate limited by {provider}")]
    RateLimited {
        /// Profile name of the provider.
        provider: String,
        /// Value of the `retry-after` header, when the provider sent one.
        retry_after_seconds: Option<u64>,
    },

    /// Any other non-success status.
    #[error("API error {status} from {provider}: {body}")]
    ApiError {
        /// Profile name of the provider.
        provider: String,
        /// HTTP status code.
        status: u16,
        /// Response body text.
        body: String,
    },

    /// The completion envelope could not be read.
    #[error("Response parsing failed: {message}")]
    ResponseParsingError {
        /// Details about the parsing failure.
        message: String,
    },

    /// The fallback policy gave up.
    #[error("Giving up after {attempts} attempts: {last}")]
    RetriesExhausted {
        /// Total number of requests issued.
        attempts: u32,
        /// The error returned by the final attempt.
        #[source]
        last: Box<DebateError>,
    },

    /// The whole logical call, waits and retries included, ran past its deadline.
    #[error("Total deadline of {limit_ms}ms exceeded")]
    DeadlineExceeded {
        /// The configured deadline in milliseconds.
        limit_ms: u64,
    },

    /// The caller cancelled the request.
    #[error("Request cancelled")]
    Cancelled,

    /// A prompt template could not be loaded.
    #[error("Prompt template error: {message}")]
    TemplateError {
        /// Details about the failure.
        message: String,
    },
}

impl DebateError {
    /// Get the error category for routing and display decisions.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ConfigurationError { .. } => ErrorCategory::Client,
            Self::TransportError { .. } => ErrorCategory::External,
            Self::Timeout { .. } => ErrorCategory::Transient,
            Self::AuthenticationFailed { .. } => ErrorCategory::Client,
            Self::QuotaExhausted { .. } => ErrorCategory::Transient,
            Self::RateLimited { .. } => ErrorCategory::Transient,
            Self::ApiError { .. } => ErrorCategory::External,
            Self::ResponseParsingError { .. } => ErrorCategory::External,
            Self::RetriesExhausted { .. } => ErrorCategory::Transient,
            Self::DeadlineExceeded { .. } => ErrorCategory::Transient,
            Self::Cancelled => ErrorCategory::Client,
            Self::TemplateError { .. } => ErrorCategory::Client,
        }
    }

    /// Get the error severity for logging.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::ConfigurationError { .. } => ErrorSeverity::Error,
            Self::TransportError { .. } => ErrorSeverity::Error,
            Self::Timeout { .. } => ErrorSeverity::Warning,
            Self::AuthenticationFailed { .. } => ErrorSeverity::Error,
            Self::QuotaExhausted { .. } => ErrorSeverity::Warning,
            Self::RateLimited { .. } => ErrorSeverity::Warning,
            Self::ApiError { .. } => ErrorSeverity::Error,
            Self::ResponseParsingError { .. } => ErrorSeverity::Warning,
            Self::RetriesExhausted { .. } => ErrorSeverity::Error,
            Self::DeadlineExceeded { .. } => ErrorSeverity::Warning,
            Self::Cancelled => ErrorSeverity::Info,
            Self::TemplateError { .. } => ErrorSeverity::Error,
        }
    }

    /// Whether this is a 429-class signal that the fallback policy handles.
    pub fn is_rate_limit(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. } | Self::QuotaExhausted { .. }
        )
    }

    /// Convert to a message suitable for showing to the person who started the debate.
    ///
    /// Unlike the `Display` form, the message never contains credentials or
    /// internal details, except the status and body of a provider error, which
    /// are shown for manual inspection.
    pub fn user_message(&self) -> String {
        match self {
            Self::ConfigurationError { message } => {
                format!("Configuration problem: {message}")
            }
            Self::TransportError { .. } => {
                "Could not reach the AI service. Please check your connection".to_string()
            }
            Self::Timeout { timeout_seconds } => {
                format!("The AI service did not answer within {timeout_seconds} seconds")
            }
            Self::AuthenticationFailed { provider, .. } => {
                format!("Authentication with {provider} failed. Please check your API key")
            }
            Self::QuotaExhausted { provider } => {
                format!("The quota for {provider} is exhausted")
            }
            Self::RateLimited { provider, .. } => {
                format!("{provider} is rate limiting requests. Please try again shortly")
            }
            Self::ApiError { status, body, .. } => format!("API error {status}: {body}"),
            Self::ResponseParsingError { .. } => {
                "Received an unreadable response from the AI service".to_string()
            }
            Self::RetriesExhausted { attempts, last } => {
                format!("No answer after {attempts} attempts. {}", last.user_message())
            }
            Self::DeadlineExceeded { limit_ms } => {
                format!("No answer within the time limit of {limit_ms} ms")
            }
            Self::Cancelled => "The debate was cancelled".to_string(),
            Self::TemplateError { message } => format!("Prompt template problem: {message}"),
        }
    }

    // =========================================================================
    // Constructor methods with automatic logging
    // =========================================================================

    pub fn configuration_error(message: impl Into<String>) -> Self {
        let message = message.into();
        log_error!(
            error_type = "configuration_error",
            message = %message,
            "Debate configuration validation failed"
        );
        Self::ConfigurationError { message }
    }

    pub fn transport_error(
        message: impl Into<String>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        let message = message.into();
        log_error!(
            error_type = "transport_error",
            message = %message,
            has_source = source.is_some(),
            "Completion request could not be delivered"
        );
        Self::TransportError { message, source }
    }

    pub fn timeout(timeout_seconds: u64) -> Self {
        log_warn!(
            error_type = "timeout",
            timeout_seconds = timeout_seconds,
            "Completion request timed out"
        );
        Self::Timeout { timeout_seconds }
    }

    pub fn deadline_exceeded(limit: Duration) -> Self {
        let limit_ms = u64::try_from(limit.as_millis()).unwrap_or(u64::MAX);
        log_warn!(
            error_type = "deadline_exceeded",
            limit_ms = limit_ms,
            "Total deadline for the completion call exceeded"
        );
        Self::DeadlineExceeded { limit_ms }
    }

    pub fn authentication_failed(provider: impl Into<String>, message: impl Into<String>) -> Self {
        let provider = provider.into();
        let message = message.into();
        log_error!(
            error_type = "authentication_failed",
            provider = %provider,
            message = %message,
            "Provider authentication failed"
        );
        Self::AuthenticationFailed { provider, message }
    }

    pub fn quota_exhausted(provider: impl Into<String>) -> Self {
        let provider = provider.into();
        log_warn!(
            error_type = "quota_exhausted",
            provider = %provider,
            "Provider quota exhausted"
        );
        Self::QuotaExhausted { provider }
    }

    pub fn rate_limited(provider: impl Into<String>, retry_after_seconds: Option<u64>) -> Self {
        let provider = provider.into();
        log_warn!(
            error_type = "rate_limited",
            provider = %provider,
            retry_after_seconds = ?retry_after_seconds,
            "Provider rate limit hit"
        );
        Self::RateLimited {
            provider,
            retry_after_seconds,
        }
    }

    pub fn api_error(provider: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        let provider = provider.into();
        let body = body.into();
        log_error!(
            error_type = "api_error",
            provider = %provider,
            status = status,
            body = %crate::logging::preview(&body),
            "Provider returned an error status"
        );
        Self::ApiError {
            provider,
            status,
            body,
        }
    }

    pub fn response_parsing_error(message: impl Into<String>) -> Self {
        let message = message.into();
        log_warn!(
            error_type = "response_parsing_error",
            message = %message,
            "Completion envelope invalid"
        );
        Self::ResponseParsingError { message }
    }

    pub fn retries_exhausted(attempts: u32, last: DebateError) -> Self {
        log_error!(
            error_type = "retries_exhausted",
            attempts = attempts,
            last_error = %last,
            "Fallback policy gave up"
        );
        Self::RetriesExhausted {
            attempts,
            last: Box::new(last),
        }
    }

    pub fn template_error(message: impl Into<String>) -> Self {
        let message = message.into();
        log_error!(
            error_type = "template_error",
            message = %message,
            "Prompt template unavailable"
        );
        Self::TemplateError { message }
    }
}
