//! Two-agent debate: each agent answers the same question with its own model.
//!
//! This example shows how to:
//! - Configure agents with a canned character or generated instructions
//! - Generate agent instructions from a keyword template on the backup provider
//! - Run both agents one after the other
//!
//! # Running
//!
//! ```bash
//! export OPENAI_API_KEY="sk-..."
//! export GROQ_API_KEY="gsk_..."
//! cargo run --example two_agents -- "Should cities ban cars?" urbanism
//! ```

use llm_debate::{
    AgentLabel, AgentSetup, AgentSpec, Character, CompletionClient, DebateConfig, DebateSession,
    PromptTemplate, AGENT_MODELS,
};

const GENERATOR_TEMPLATE: &str = "Write short instructions for an AI agent that argues \
as a domain expert on [KEYWORD]. Answer with the instructions only.";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let question = args
        .next()
        .unwrap_or_else(|| "Should cities ban cars from their centers?".to_string());
    let keyword = args.next();

    let config = DebateConfig::from_env()?;
    let client = CompletionClient::new(config.params.timeout);
    let session = DebateSession::new(&config, &client);

    // Agent B gets generated instructions when a keyword and a backup are available
    let setup_b = match keyword {
        Some(keyword) if config.backup.is_some() => {
            let template = PromptTemplate::new(GENERATOR_TEMPLATE);
            match session.generate_prompt(&template, &keyword).await {
                Ok(instructions) => AgentSetup::Prompt(instructions),
                Err(e) => {
                    eprintln!("Prompt generation failed: {}", e.user_message());
                    AgentSetup::Character(Character::Critical)
                }
            }
        }
        _ => AgentSetup::Character(Character::Pessimistic),
    };

    let agent_a = AgentSpec::new(
        AgentLabel::A,
        AGENT_MODELS[0],
        AgentSetup::Character(Character::Optimistic),
    );
    let agent_b = AgentSpec::new(AgentLabel::B, AGENT_MODELS[1], setup_b);

    println!("Question: {question}");

    let outcome = match session.run_two_agents(&agent_a, &agent_b, &question).await {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("{}", e.user_message());
            return Err(e.into());
        }
    };

    for reply in [&outcome.agent_a, &outcome.agent_b] {
        println!(
            "\nAgent {} ({} via {}):\n{}",
            reply.label, reply.model, reply.provider, reply.content
        );
    }

    Ok(())
}
