//! Provider profiles and debate configuration
//!
//! A debate talks to at most two providers: the primary (paid) profile and an
//! optional backup (free-tier) profile that takes over once the primary reports
//! quota exhaustion. Secrets are read from the environment only in
//! [`DebateConfig::from_env`]; everything else receives the config explicitly.

use crate::error::{DebateError, DebateResult};
use crate::logging::{log_debug, log_warn};
use crate::retry::FallbackPolicy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const GROQ_CHAT_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

/// Model names offered by agent pickers in two-agent debates
pub const AGENT_MODELS: [&str; 5] = [
    "gpt-3.5-turbo",
    "gpt-4",
    "claude-3",
    "mistral-saba-24b",
    "llama-2-13b",
];

/// Which of the two configured profiles a call targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderRole {
    /// Main provider, the only one eligible for quota fallback
    Primary,
    /// Fallback and prompt-generator provider
    Backup,
}

impl fmt::Display for ProviderRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderRole::Primary => write!(f, "primary"),
            ProviderRole::Backup => write!(f, "backup"),
        }
    }
}

/// Connection details of one chat-completion endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderProfile {
    /// Display name, e.g. "OpenAI (gpt-3.5-turbo)"
    pub name: String,
    /// Full chat-completions URL
    pub api_url: String,
    pub api_key: Option<String>,
    pub model: String,
    /// Price used for cost estimates; 0.0 disables the estimate
    pub cost_per_1k_tokens: f64,
    /// Prefix prompts with a strict JSON-only instruction
    pub json_preamble: bool,
}

impl ProviderProfile {
    /// OpenAI profile on gpt-3.5-turbo
    pub fn openai(api_key: Option<String>) -> Self {
        Self {
            name: "OpenAI (gpt-3.5-turbo)".to_string(),
            api_url: OPENAI_CHAT_URL.to_string(),
            api_key,
            model: "gpt-3.5-turbo".to_string(),
            cost_per_1k_tokens: 0.002,
            json_preamble: false,
        }
    }

    /// Groq free-tier profile on mistral-saba-24b, answers steered to JSON
    pub fn groq(api_key: Option<String>) -> Self {
        Self {
            name: "Groq (mistral-saba-24b)".to_string(),
            api_url: GROQ_CHAT_URL.to_string(),
            api_key,
            model: "mistral-saba-24b".to_string(),
            cost_per_1k_tokens: 0.0,
            json_preamble: true,
        }
    }

    /// Same endpoint and credential, different model
    pub fn with_model(&self, model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..self.clone()
        }
    }

    pub fn api_key(&self) -> &str {
        self.api_key.as_deref().unwrap_or_default()
    }

    /// Validate the profile is usable
    ///
    /// # Errors
    ///
    /// Returns [`DebateError::ConfigurationError`] if the URL, model or API key
    /// is missing.
    pub fn validate(&self) -> DebateResult<()> {
        if self.api_url.trim().is_empty() {
            return Err(DebateError::configuration_error(format!(
                "{}: endpoint URL is required",
                self.name
            )));
        }
        if self.model.trim().is_empty() {
            return Err(DebateError::configuration_error(format!(
                "{}: model is required",
                self.name
            )));
        }
        if self.api_key.as_deref().map_or(true, |k| k.trim().is_empty()) {
            return Err(DebateError::configuration_error(format!(
                "{}: API key is required",
                self.name
            )));
        }
        Ok(())
    }
}

/// Sampling and transport parameters shared by every completion call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionParams {
    pub temperature: f64,
    pub max_tokens: Option<u32>,
    /// Timeout for one HTTP round trip
    pub timeout: Duration,
}

impl Default for CompletionParams {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: None,
            timeout: Duration::from_secs(25),
        }
    }
}

/// Complete configuration of a debate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebateConfig {
    pub primary: ProviderProfile,
    /// No backup means quota exhaustion is treated like any rate limit
    pub backup: Option<ProviderProfile>,
    pub params: CompletionParams,
    pub fallback: FallbackPolicy,
}

impl Default for DebateConfig {
    fn default() -> Self {
        Self {
            primary: ProviderProfile::openai(None),
            backup: Some(ProviderProfile::groq(None)),
            params: CompletionParams::default(),
            fallback: FallbackPolicy::default(),
        }
    }
}

impl DebateConfig {
    /// Profile for the given role, if configured
    pub fn profile(&self, role: ProviderRole) -> Option<&ProviderProfile> {
        match role {
            ProviderRole::Primary => Some(&self.primary),
            ProviderRole::Backup => self.backup.as_ref(),
        }
    }

    /// Validate both profiles and the shared parameters
    ///
    /// # Errors
    ///
    /// Returns [`DebateError::ConfigurationError`] if:
    /// - either configured profile fails [`ProviderProfile::validate`]
    /// - temperature is outside `0.0..=2.0`
    /// - the request timeout is zero
    pub fn validate(&self) -> DebateResult<()> {
        self.primary.validate()?;
        if let Some(backup) = &self.backup {
            backup.validate().map_err(|e| {
                DebateError::configuration_error(format!("Backup provider invalid: {e}"))
            })?;
        }
        if !(0.0..=2.0).contains(&self.params.temperature) {
            return Err(DebateError::configuration_error(format!(
                "Temperature {} is outside 0.0..=2.0",
                self.params.temperature
            )));
        }
        if self.params.timeout.is_zero() {
            return Err(DebateError::configuration_error(
                "Request timeout must be greater than zero",
            ));
        }
        Ok(())
    }

    /// Load configuration from environment variables
    /// This is the ONLY method that should access environment variables
    ///
    /// | Variable | Effect |
    /// |----------|--------|
    /// | `OPENAI_API_KEY` | primary credential (required) |
    /// | `GROQ_API_KEY` | backup credential; without it no fallback is configured |
    /// | `DEBATE_PRIMARY_URL`, `DEBATE_PRIMARY_MODEL` | primary overrides |
    /// | `DEBATE_BACKUP_URL`, `DEBATE_BACKUP_MODEL` | backup overrides |
    /// | `DEBATE_TEMPERATURE` | sampling temperature |
    /// | `DEBATE_TIMEOUT_SECS` | per-request timeout, also the rate-limit wait |
    /// | `DEBATE_MAX_ATTEMPTS` | attempt cap, `0` for unbounded |
    ///
    /// # Errors
    ///
    /// Returns [`DebateError::ConfigurationError`] if a numeric variable is
    /// malformed or the resulting configuration fails [`Self::validate`].
    pub fn from_env() -> DebateResult<Self> {
        let mut primary = ProviderProfile::openai(env_var("OPENAI_API_KEY"));
        if let Some(url) = env_var("DEBATE_PRIMARY_URL") {
            primary.api_url = url;
        }
        if let Some(model) = env_var("DEBATE_PRIMARY_MODEL") {
            primary.model = model;
        }

        let backup = match env_var("GROQ_API_KEY") {
            Some(key) => {
                let mut backup = ProviderProfile::groq(Some(key));
                if let Some(url) = env_var("DEBATE_BACKUP_URL") {
                    backup.api_url = url;
                }
                if let Some(model) = env_var("DEBATE_BACKUP_MODEL") {
                    backup.model = model;
                }
                Some(backup)
            }
            None => {
                log_warn!("GROQ_API_KEY not set, quota fallback disabled");
                None
            }
        };

        let mut params = CompletionParams::default();
        let mut fallback = FallbackPolicy::default();
        if let Some(temperature) = parse_env::<f64>("DEBATE_TEMPERATURE")? {
            params.temperature = temperature;
        }
        if let Some(secs) = parse_env::<u64>("DEBATE_TIMEOUT_SECS")? {
            params.timeout = Duration::from_secs(secs);
            fallback.rate_limit_wait = Duration::from_secs(secs);
        }
        if let Some(max_attempts) = parse_env::<u32>("DEBATE_MAX_ATTEMPTS")? {
            fallback.max_attempts = (max_attempts > 0).then_some(max_attempts);
        }

        let config = Self {
            primary,
            backup,
            params,
            fallback,
        };
        config.validate()?;

        log_debug!(
            primary = %config.primary.name,
            primary_model = %config.primary.model,
            has_backup = config.backup.is_some(),
            temperature = config.params.temperature,
            timeout_seconds = config.params.timeout.as_secs(),
            max_attempts = ?config.fallback.max_attempts,
            "Debate configuration loaded and validated"
        );

        Ok(config)
    }
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T: FromStr>(key: &str) -> DebateResult<Option<T>>
where
    T::Err: fmt::Display,
{
    env_var(key)
        .map(|raw| {
            raw.trim().parse::<T>().map_err(|e| {
                DebateError::configuration_error(format!("{key}={raw} is invalid: {e}"))
            })
        })
        .transpose()
}
