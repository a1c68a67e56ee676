//! Prompt building for debates
//!
//! Prompts are produced by literal substitution of the user's text into a
//! small set of fixed templates. User text is not escaped or sanitized.

use crate::config::ProviderProfile;
use crate::error::{DebateError, DebateResult};
use crate::logging::log_debug;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Placeholder replaced by [`PromptTemplate::render`]
pub const KEYWORD_PLACEHOLDER: &str = "[KEYWORD]";

/// Legacy spelling of the placeholder found in older template files
pub const LEGACY_KEYWORD_PLACEHOLDER: &str = "[SCHLAGWORT]";

/// Instruction prepended for providers that tend to answer in prose
pub const JSON_PREAMBLE: &str = "You are a precise JSON response generator. Never answer with prose or code. \
Your only output is the following JSON: \
{\"optimistic\":\"...\", \"pessimistic\":\"...\", \"recommendation\":\"...\"}. \
Do not output Markdown, introductions or explanations. Only pure, minimal JSON.";

/// Debate scenario selecting the instruction template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UseCase {
    GeneralDiscussion,
    SaasValidator,
    SwotAnalysis,
    PitchCritique,
    WltDecision,
}

impl UseCase {
    pub fn all() -> [Self; 5] {
        [
            Self::GeneralDiscussion,
            Self::SaasValidator,
            Self::SwotAnalysis,
            Self::PitchCritique,
            Self::WltDecision,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::GeneralDiscussion => "General Discussion",
            Self::SaasValidator => "SaaS Validator",
            Self::SwotAnalysis => "SWOT Analysis",
            Self::PitchCritique => "Pitch Critique",
            Self::WltDecision => "WLT Decision",
        }
    }

    fn legacy_label(&self) -> &'static str {
        match self {
            Self::GeneralDiscussion => "Allgemeine Diskussion",
            Self::SaasValidator => "SaaS Validator",
            Self::SwotAnalysis => "SWOT Analyse",
            Self::PitchCritique => "Pitch-Kritik",
            Self::WltDecision => "WLT Entscheidung",
        }
    }
}

impl fmt::Display for UseCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for UseCase {
    type Err = DebateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::all()
            .into_iter()
            .find(|use_case| {
                use_case.label().eq_ignore_ascii_case(wanted)
                    || use_case.legacy_label().eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| DebateError::configuration_error(format!("Unknown use case: {wanted}")))
    }
}

/// Prompt asking one model to simulate the whole debate
pub fn build_debate_prompt(use_case: UseCase, question: &str) -> String {
    match use_case {
        UseCase::GeneralDiscussion => format!(
            "Simulate a debate between two AI agents on the topic: '{question}'\n\
             Agent A (optimistic)\n\
             Agent B (pessimistic)\n\
             Answer as JSON with fields: optimistic, pessimistic, recommendation"
        ),
        other => format!(
            "Simulate a debate for the use case '{}': Topic: '{question}'\n\
             Agent A analyses opportunities.\n\
             Agent B analyses risks.\n\
             Answer as JSON: optimistic, pessimistic, recommendation",
            other.label()
        ),
    }
}

/// Prefix the JSON-only instruction when the profile asks for it
pub fn adjust_for_provider(prompt: &str, profile: &ProviderProfile) -> String {
    if profile.json_preamble {
        format!("{JSON_PREAMBLE}\n{prompt}")
    } else {
        prompt.to_string()
    }
}

/// Attitude of an agent in a two-agent debate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Character {
    Optimistic,
    Pessimistic,
    Critical,
}

impl Character {
    pub fn all() -> [Self; 3] {
        [Self::Optimistic, Self::Pessimistic, Self::Critical]
    }

    pub fn adjective(&self) -> &'static str {
        match self {
            Self::Optimistic => "optimistic",
            Self::Pessimistic => "pessimistic",
            Self::Critical => "critical",
        }
    }
}

/// Label of a debating agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentLabel {
    A,
    B,
}

impl fmt::Display for AgentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentLabel::A => write!(f, "A"),
            AgentLabel::B => write!(f, "B"),
        }
    }
}

/// How an agent's instructions are chosen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentSetup {
    /// Free-text instructions, possibly empty
    Prompt(String),
    /// A canned attitude
    Character(Character),
}

impl AgentSetup {
    /// Instructions for the agent, without the question
    pub fn instructions(&self, label: AgentLabel) -> String {
        match self {
            AgentSetup::Prompt(text) => text.clone(),
            AgentSetup::Character(character) => {
                format!("You are Agent {label} and act {}.", character.adjective())
            }
        }
    }

    /// Instructions followed by the question on a new line
    pub fn build_prompt(&self, label: AgentLabel, question: &str) -> String {
        format!("{}\n{question}", self.instructions(label))
    }
}

/// Prompt-generator template with an explicit keyword placeholder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    text: String,
}

impl PromptTemplate {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Read a template file
    ///
    /// # Errors
    ///
    /// Returns [`DebateError::TemplateError`] if the file cannot be read.
    pub fn load(path: impl AsRef<Path>) -> DebateResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            DebateError::template_error(format!("Cannot read {}: {e}", path.display()))
        })?;
        log_debug!(
            path = %path.display(),
            length = text.len(),
            "Loaded prompt template"
        );
        Ok(Self { text })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether the template contains a placeholder at all
    pub fn has_placeholder(&self) -> bool {
        self.text.contains(KEYWORD_PLACEHOLDER) || self.text.contains(LEGACY_KEYWORD_PLACEHOLDER)
    }

    /// Substitute every placeholder occurrence with `keyword`
    pub fn render(&self, keyword: &str) -> String {
        self.text
            .replace(LEGACY_KEYWORD_PLACEHOLDER, KEYWORD_PLACEHOLDER)
            .replace(KEYWORD_PLACEHOLDER, keyword)
    }
}
