// Unit Tests for DebateSession
//
// UNIT UNDER TEST: DebateSession
//
// BUSINESS RESPONSIBILITY:
//   - Builds the debate prompt for the selected provider and use case
//   - Runs every call through the fallback policy
//   - Parses the answer and reports provider, attempts and cost estimate
//   - Runs two agents strictly one after the other
//   - Generates agent prompts from keyword templates on the backup provider
//
// TEST COVERAGE:
//   - Provider selection, JSON preamble and cost estimate
//   - Input validation before any network call
//   - Two-agent ordering, character prompts and per-agent models
//   - Prompt generation without retry
//   - Cancellation and quota fallback seen from the session

use crate::client::MockChatTransport;
use crate::config::ProviderRole;
use crate::debate::{estimate_cost, AgentSpec, DebateSession};
use crate::error::DebateError;
use crate::parser::ParseSource;
use crate::prompt::{AgentLabel, AgentSetup, Character, PromptTemplate, UseCase, JSON_PREAMBLE};
use crate::tests::helpers::{
    backup_profile, create_test_config, debate_json, primary_profile, ScriptedTransport,
};
use mockall::Sequence;
use tokio_util::sync::CancellationToken;

#[cfg(test)]
mod single_call_tests {
    use super::*;

    #[tokio::test]
    async fn test_primary_debate_parses_answer_and_estimates_cost() {
        // Arrange
        let config = create_test_config();
        let mut transport = MockChatTransport::new();
        transport
            .expect_complete()
            .withf(|profile, request| {
                profile.name == "OpenAI (gpt-3.5-turbo)"
                    && request.model == "gpt-3.5-turbo"
                    && request.prompt().contains("Topic: 'Should we hire?'")
                    && request.prompt().contains("SWOT Analysis")
                    && !request.prompt().starts_with(JSON_PREAMBLE)
            })
            .times(1)
            .returning(|_, _| Ok(debate_json("talent", "cost", "hire one")));
        let session = DebateSession::new(&config, &transport);

        // Act
        let outcome = session
            .run_debate(ProviderRole::Primary, UseCase::SwotAnalysis, "  Should we hire?  ")
            .await
            .unwrap();

        // Assert
        assert_eq!(outcome.parsed.optimistic, "talent");
        assert_eq!(outcome.parsed.recommendation, "hire one");
        assert_eq!(outcome.parsed.source, ParseSource::Json);
        assert_eq!(outcome.request_id, session.request_id());
        assert_eq!(outcome.attempts, 1);
        assert!(!outcome.switched);
        assert_eq!(outcome.estimated_tokens, outcome.parsed.word_count());
        let cost = outcome.estimated_cost.unwrap();
        let expected = outcome.estimated_tokens as f64 / 1000.0 * 0.002;
        assert!((cost - expected).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_backup_selection_adds_json_preamble_without_cost() {
        let config = create_test_config();
        let mut transport = MockChatTransport::new();
        transport
            .expect_complete()
            .withf(|profile, request| {
                profile.name == "Groq (mistral-saba-24b)"
                    && request.model == "mistral-saba-24b"
                    && request.prompt().starts_with(JSON_PREAMBLE)
            })
            .times(1)
            .returning(|_, _| Ok(format!("```json\n{}\n```", debate_json("a", "b", "c"))));
        let session = DebateSession::new(&config, &transport);

        let outcome = session
            .run_debate(ProviderRole::Backup, UseCase::GeneralDiscussion, "Remote work?")
            .await
            .unwrap();

        assert_eq!(outcome.parsed.pessimistic, "b");
        assert_eq!(outcome.provider, "Groq (mistral-saba-24b)");
        assert!(outcome.estimated_cost.is_none());
    }

    #[tokio::test]
    async fn test_backup_selection_without_backup_is_configuration_error() {
        let mut config = create_test_config();
        config.backup = None;
        let mut transport = MockChatTransport::new();
        transport.expect_complete().times(0);
        let session = DebateSession::new(&config, &transport);

        let result = session
            .run_debate(ProviderRole::Backup, UseCase::GeneralDiscussion, "Anything")
            .await;

        match result {
            Err(DebateError::ConfigurationError { message }) => {
                assert!(message.contains("No backup provider configured"));
            }
            other => panic!("Expected ConfigurationError, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_question_is_rejected_before_any_request() {
        let config = create_test_config();
        let mut transport = MockChatTransport::new();
        transport.expect_complete().times(0);
        let session = DebateSession::new(&config, &transport);

        let result = session
            .run_debate(ProviderRole::Primary, UseCase::PitchCritique, "   ")
            .await;

        assert!(matches!(result, Err(DebateError::ConfigurationError { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_quota_on_primary_is_answered_by_backup() {
        // Arrange
        let config = create_test_config();
        let transport = ScriptedTransport::new()
            .then_quota_exhausted(1)
            .then_ok(&debate_json("cheap", "slow", "use the free tier"));
        let session = DebateSession::new(&config, &transport);

        // Act
        let outcome = session
            .run_debate(ProviderRole::Primary, UseCase::SaasValidator, "Launch now?")
            .await
            .unwrap();

        // Assert
        let calls = transport.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].request.prompt(), calls[1].request.prompt());
        assert!(outcome.switched);
        assert_eq!(outcome.provider, backup_profile().name);
        assert_eq!(outcome.model, "mistral-saba-24b");
        assert_eq!(outcome.parsed.recommendation, "use the free tier");
        assert!(
            outcome.estimated_cost.is_none(),
            "Cost follows the provider that answered"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_backup_selection_never_switches() {
        let config = create_test_config();
        let transport = ScriptedTransport::new()
            .then_quota_exhausted(1)
            .then_ok("optimistic: fine");
        let session = DebateSession::new(&config, &transport);

        let outcome = session
            .run_debate(ProviderRole::Backup, UseCase::WltDecision, "Buy or build?")
            .await
            .unwrap();

        assert!(!outcome.switched);
        assert_eq!(outcome.attempts, 2);
        assert!(transport
            .calls()
            .iter()
            .all(|c| c.provider == backup_profile().name));
        assert_eq!(outcome.parsed.optimistic, "fine");
    }

    #[tokio::test]
    async fn test_cancelled_session_sends_nothing() {
        let config = create_test_config();
        let transport = ScriptedTransport::new().then_ok("unused");
        let token = CancellationToken::new();
        let session = DebateSession::new(&config, &transport).with_cancellation(token.clone());
        session.cancellation_token().cancel();

        let result = session
            .run_debate(ProviderRole::Primary, UseCase::GeneralDiscussion, "Anything")
            .await;

        assert!(matches!(result, Err(DebateError::Cancelled)));
        assert!(token.is_cancelled());
        assert_eq!(transport.call_count(), 0);
    }

    #[test]
    fn test_estimate_cost_only_for_priced_profiles() {
        assert_eq!(estimate_cost(&primary_profile(), 500), Some(0.001));
        assert_eq!(estimate_cost(&backup_profile(), 500), None);
    }
}

#[cfg(test)]
mod two_agent_tests {
    use super::*;

    #[tokio::test]
    async fn test_agents_answer_in_order_with_their_models() {
        // Arrange
        let config = create_test_config();
        let mut transport = MockChatTransport::new();
        let mut seq = Sequence::new();
        transport
            .expect_complete()
            .withf(|profile, request| {
                profile.name == "OpenAI (gpt-3.5-turbo)"
                    && request.model == "gpt-4"
                    && request.prompt() == "You are Agent A and act optimistic.\nIs AI a fad?"
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok("It will change everything".to_string()));
        transport
            .expect_complete()
            .withf(|_, request| {
                request.model == "claude-3"
                    && request.prompt() == "You are Agent B and act critical.\nIs AI a fad?"
            })
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok("Hype cycles end".to_string()));
        let session = DebateSession::new(&config, &transport);
        let agent_a = AgentSpec::new(
            AgentLabel::A,
            "gpt-4",
            AgentSetup::Character(Character::Optimistic),
        );
        let agent_b = AgentSpec::new(
            AgentLabel::B,
            "claude-3",
            AgentSetup::Character(Character::Critical),
        );

        // Act
        let outcome = session
            .run_two_agents(&agent_a, &agent_b, "Is AI a fad?")
            .await
            .unwrap();

        // Assert
        assert_eq!(outcome.agent_a.content, "It will change everything");
        assert_eq!(outcome.agent_a.model, "gpt-4");
        assert_eq!(outcome.agent_b.label, AgentLabel::B);
        assert_eq!(outcome.agent_b.content, "Hype cycles end");
        assert_eq!(outcome.request_id, session.request_id());
    }

    #[tokio::test]
    async fn test_free_text_setup_is_sent_verbatim() {
        let config = create_test_config();
        let transport = ScriptedTransport::new().then_ok("yes").then_ok("no");
        let session = DebateSession::new(&config, &transport);
        let agent_a = AgentSpec::new(
            AgentLabel::A,
            "gpt-3.5-turbo",
            AgentSetup::Prompt("Argue like a venture capitalist.".to_string()),
        );
        let agent_b = AgentSpec::new(AgentLabel::B, "llama-2-13b", AgentSetup::Prompt(String::new()));

        session
            .run_two_agents(&agent_a, &agent_b, "Seed round?")
            .await
            .unwrap();

        let calls = transport.calls();
        assert_eq!(
            calls[0].request.prompt(),
            "Argue like a venture capitalist.\nSeed round?"
        );
        assert_eq!(calls[1].request.prompt(), "\nSeed round?");
    }

    #[tokio::test]
    async fn test_first_agent_failure_stops_debate() {
        let config = create_test_config();
        let transport = ScriptedTransport::new().then_auth_failure().then_ok("unused");
        let session = DebateSession::new(&config, &transport);
        let agent = AgentSpec::new(
            AgentLabel::A,
            "gpt-4",
            AgentSetup::Character(Character::Pessimistic),
        );

        let result = session.run_two_agents(&agent, &agent, "Anything").await;

        assert!(matches!(result, Err(DebateError::AuthenticationFailed { .. })));
        assert_eq!(transport.call_count(), 1);
    }
}

#[cfg(test)]
mod prompt_generation_tests {
    use super::*;

    #[tokio::test]
    async fn test_generates_prompt_on_backup_with_rendered_template() {
        // Arrange
        let config = create_test_config();
        let mut transport = MockChatTransport::new();
        transport
            .expect_complete()
            .withf(|profile, request| {
                profile.name == "Groq (mistral-saba-24b)"
                    && request.prompt() == "Write instructions for an agent about fintech."
            })
            .times(1)
            .returning(|_, _| Ok("  You are a fintech analyst.\n".to_string()));
        let session = DebateSession::new(&config, &transport);
        let template = PromptTemplate::new("Write instructions for an agent about [KEYWORD].");

        // Act
        let generated = session.generate_prompt(&template, " fintech ").await.unwrap();

        // Assert
        assert_eq!(generated, "You are a fintech analyst.");
    }

    #[tokio::test]
    async fn test_rate_limit_is_not_retried() {
        let config = create_test_config();
        let transport = ScriptedTransport::new().then_rate_limited(1).then_ok("unused");
        let session = DebateSession::new(&config, &transport);
        let template = PromptTemplate::new("[KEYWORD]");

        let result = session.generate_prompt(&template, "health").await;

        assert!(matches!(result, Err(DebateError::RateLimited { .. })));
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn test_empty_keyword_and_missing_backup_are_rejected() {
        let mut config = create_test_config();
        let mut transport = MockChatTransport::new();
        transport.expect_complete().times(0);
        let template = PromptTemplate::new("[KEYWORD]");

        let empty = DebateSession::new(&config, &transport)
            .generate_prompt(&template, "  ")
            .await;
        config.backup = None;
        let no_backup = DebateSession::new(&config, &transport)
            .generate_prompt(&template, "energy")
            .await;

        assert!(matches!(empty, Err(DebateError::ConfigurationError { .. })));
        assert!(matches!(no_backup, Err(DebateError::ConfigurationError { .. })));
    }
}
