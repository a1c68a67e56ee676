//! Debate orchestration
//!
//! A [`DebateSession`] is the per-action context: it borrows the configuration
//! and a transport, carries a request id for log correlation and a
//! cancellation token, and is dropped when the action is done. The different
//! debate flows are thin callers over the same client, policy and parser.

use crate::client::{build_chat_request, ChatTransport};
use crate::config::{DebateConfig, ProviderProfile, ProviderRole};
use crate::error::{DebateError, DebateResult};
use crate::logging::{log_debug, log_info};
use crate::parser::{ParsedDebate, ResponseParser};
use crate::prompt::{
    adjust_for_provider, build_debate_prompt, AgentLabel, AgentSetup, PromptTemplate, UseCase,
};
use crate::retry::{FallbackExecutor, FallbackOutcome};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Result of a single-call debate
#[derive(Debug, Clone, Serialize)]
pub struct DebateOutcome {
    pub request_id: Uuid,
    pub use_case: UseCase,
    pub parsed: ParsedDebate,
    /// Display name of the provider that answered
    pub provider: String,
    pub model: String,
    /// Whether quota exhaustion moved the call to the backup
    pub switched: bool,
    pub attempts: u32,
    pub duration: Duration,
    /// Word count of the raw answer
    pub estimated_tokens: usize,
    /// Present only when the answering profile has a price
    pub estimated_cost: Option<f64>,
    pub completed_at: DateTime<Utc>,
}

/// One debating agent in a two-agent debate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSpec {
    pub label: AgentLabel,
    /// Model requested on the primary endpoint
    pub model: String,
    pub setup: AgentSetup,
}

impl AgentSpec {
    pub fn new(label: AgentLabel, model: impl Into<String>, setup: AgentSetup) -> Self {
        Self {
            label,
            model: model.into(),
            setup,
        }
    }
}

/// Answer of one agent
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentReply {
    pub label: AgentLabel,
    pub provider: String,
    pub model: String,
    pub content: String,
}

/// Result of a two-agent debate
#[derive(Debug, Clone, Serialize)]
pub struct TwoAgentOutcome {
    pub request_id: Uuid,
    pub agent_a: AgentReply,
    pub agent_b: AgentReply,
    pub completed_at: DateTime<Utc>,
}

/// Estimated price of `tokens` at the profile's rate
pub fn estimate_cost(profile: &ProviderProfile, tokens: usize) -> Option<f64> {
    (profile.cost_per_1k_tokens > 0.0)
        .then(|| tokens as f64 / 1000.0 * profile.cost_per_1k_tokens)
}

/// Per-action debate context
pub struct DebateSession<'a> {
    config: &'a DebateConfig,
    transport: &'a dyn ChatTransport,
    request_id: Uuid,
    cancel: CancellationToken,
}

impl<'a> DebateSession<'a> {
    pub fn new(config: &'a DebateConfig, transport: &'a dyn ChatTransport) -> Self {
        Self {
            config,
            transport,
            request_id: Uuid::new_v4(),
            cancel: CancellationToken::new(),
        }
    }

    /// Use an externally owned token so the caller can abort waits
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Ask one provider to simulate an optimistic/pessimistic debate
    ///
    /// `selection` picks the provider to start with; only a debate started on
    /// the primary can fall back to the backup.
    ///
    /// # Errors
    ///
    /// Returns [`DebateError::ConfigurationError`] for an empty question or an
    /// unconfigured backup selection, otherwise whatever the fallback policy
    /// gives up with.
    pub async fn run_debate(
        &self,
        selection: ProviderRole,
        use_case: UseCase,
        question: &str,
    ) -> DebateResult<DebateOutcome> {
        let question = require_question(question)?;
        let profile = self.config.profile(selection).ok_or_else(|| {
            DebateError::configuration_error(format!("No {selection} provider configured"))
        })?;
        let fallback = match selection {
            ProviderRole::Primary => self.config.backup.as_ref(),
            ProviderRole::Backup => None,
        };

        log_info!(
            request_id = %self.request_id,
            provider = %profile.name,
            use_case = %use_case,
            "Starting single-call debate"
        );

        let prompt = adjust_for_provider(&build_debate_prompt(use_case, question), profile);
        let started = Instant::now();
        let outcome = self.complete(profile, fallback, &prompt).await?;
        let duration = started.elapsed();

        let parsed = ResponseParser::parse(&outcome.content);
        let answered_by = match (outcome.switched, fallback) {
            (true, Some(backup)) => backup,
            _ => profile,
        };
        let estimated_tokens = parsed.word_count();

        log_info!(
            request_id = %self.request_id,
            provider = %outcome.provider,
            switched = outcome.switched,
            attempts = outcome.attempts,
            duration_ms = duration.as_millis(),
            parse_source = ?parsed.source,
            "Debate finished"
        );

        Ok(DebateOutcome {
            request_id: self.request_id,
            use_case,
            estimated_cost: estimate_cost(answered_by, estimated_tokens),
            estimated_tokens,
            parsed,
            provider: outcome.provider,
            model: outcome.model,
            switched: outcome.switched,
            attempts: outcome.attempts,
            duration,
            completed_at: Utc::now(),
        })
    }

    /// Let two agents answer the same question, one after the other
    ///
    /// Both agents use the primary endpoint with their own model; each call
    /// runs through the fallback policy on its own.
    ///
    /// # Errors
    ///
    /// Returns [`DebateError::ConfigurationError`] for an empty question, or
    /// the first agent failure.
    pub async fn run_two_agents(
        &self,
        agent_a: &AgentSpec,
        agent_b: &AgentSpec,
        question: &str,
    ) -> DebateResult<TwoAgentOutcome> {
        let question = require_question(question)?;

        log_info!(
            request_id = %self.request_id,
            model_a = %agent_a.model,
            model_b = %agent_b.model,
            "Starting two-agent debate"
        );

        let reply_a = self.ask_agent(agent_a, question).await?;
        let reply_b = self.ask_agent(agent_b, question).await?;

        Ok(TwoAgentOutcome {
            request_id: self.request_id,
            agent_a: reply_a,
            agent_b: reply_b,
            completed_at: Utc::now(),
        })
    }

    /// Render a generator template and send it once to the backup provider
    ///
    /// No retry and no fallback: a failure is returned as is.
    ///
    /// # Errors
    ///
    /// Returns [`DebateError::ConfigurationError`] if the keyword is empty or no
    /// backup is configured, [`DebateError::Cancelled`] if cancelled, or the
    /// transport error.
    pub async fn generate_prompt(
        &self,
        template: &PromptTemplate,
        keyword: &str,
    ) -> DebateResult<String> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(DebateError::configuration_error("Keyword must not be empty"));
        }
        let generator = self.config.backup.as_ref().ok_or_else(|| {
            DebateError::configuration_error("Prompt generation needs a backup provider")
        })?;

        let prompt = template.render(keyword);
        let request = build_chat_request(&generator.model, &prompt, &self.config.params);

        log_debug!(
            request_id = %self.request_id,
            provider = %generator.name,
            keyword = %keyword,
            "Generating agent prompt"
        );

        let content = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(DebateError::Cancelled),
            result = self.transport.complete(generator, &request) => result?,
        };

        Ok(content.trim().to_string())
    }

    async fn ask_agent(&self, agent: &AgentSpec, question: &str) -> DebateResult<AgentReply> {
        let profile = self.config.primary.with_model(&agent.model);
        let prompt = agent.setup.build_prompt(agent.label, question);
        let outcome = self
            .complete(&profile, self.config.backup.as_ref(), &prompt)
            .await?;

        log_debug!(
            request_id = %self.request_id,
            agent = %agent.label,
            provider = %outcome.provider,
            attempts = outcome.attempts,
            "Agent answered"
        );

        Ok(AgentReply {
            label: agent.label,
            provider: outcome.provider,
            model: outcome.model,
            content: outcome.content,
        })
    }

    async fn complete(
        &self,
        profile: &ProviderProfile,
        fallback: Option<&ProviderProfile>,
        prompt: &str,
    ) -> DebateResult<FallbackOutcome> {
        let request = build_chat_request(&profile.model, prompt, &self.config.params);
        FallbackExecutor::new(&self.config.fallback, self.transport)
            .with_cancellation(self.cancel.clone())
            .execute(profile, fallback, request)
            .await
    }
}

fn require_question(question: &str) -> DebateResult<&str> {
    let question = question.trim();
    if question.is_empty() {
        return Err(DebateError::configuration_error("Question must not be empty"));
    }
    Ok(question)
}
