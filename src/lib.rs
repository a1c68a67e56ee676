//! # llm-debate
//!
//! Debate orchestration over OpenAI-compatible chat-completion providers.
//!
//! ## Key Features
//!
//! - **Quota fallback**: a primary provider that runs out of quota is replaced
//!   once by a backup provider, transparently to the caller
//! - **Bounded rate-limit handling**: wait and retry with an attempt cap,
//!   optional total deadline and cancellation
//! - **Tolerant parsing**: fenced JSON, JSON inside prose and plain
//!   `field: value` lines all yield the three debate perspectives
//! - **Prompt building**: use-case templates, agent characters and keyword
//!   templates for prompt generation
//!
//! ## Example
//!
//! ```rust,no_run
//! use llm_debate::{CompletionClient, DebateConfig, DebateSession, ProviderRole, UseCase};
//!
//! # async fn example() -> llm_debate::DebateResult<()> {
//! let config = DebateConfig::from_env()?;
//! let client = CompletionClient::new(config.params.timeout);
//! let session = DebateSession::new(&config, &client);
//!
//! let outcome = session
//!     .run_debate(ProviderRole::Primary, UseCase::SwotAnalysis, "Should we open-source our SDK?")
//!     .await?;
//! println!("{}", outcome.parsed.recommendation);
//! # Ok(())
//! # }
//! ```

#![allow(clippy::missing_errors_doc)]

// Logging utilities (re-exports tracing with log_* naming) - internal only
pub(crate) mod logging;

pub mod client;
pub mod config;
pub mod consensus;
pub mod debate;
pub mod error;
pub mod parser;
pub mod prompt;
pub mod retry;
pub mod types;

#[cfg(test)]
mod tests;

// Re-export main types
pub use client::{ChatTransport, CompletionClient};
pub use config::{CompletionParams, DebateConfig, ProviderProfile, ProviderRole, AGENT_MODELS};
pub use consensus::{cosine_similarity, ConsensusCheck, SentencePair};
pub use debate::{AgentReply, AgentSpec, DebateOutcome, DebateSession, TwoAgentOutcome};
pub use error::{DebateError, DebateResult};
pub use parser::{ParseSource, ParsedDebate, ResponseParser, PLACEHOLDER};
pub use prompt::{AgentLabel, AgentSetup, Character, PromptTemplate, UseCase};
pub use retry::{FallbackExecutor, FallbackOutcome, FallbackPolicy, FallbackState};
pub use tokio_util::sync::CancellationToken;
