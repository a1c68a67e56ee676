//! Single-call debate: one model plays both sides and recommends.
//!
//! This example shows how to:
//! - Load the provider configuration from the environment
//! - Run a debate with quota fallback to the backup provider
//! - Cancel waiting on rate limits with Ctrl-C
//!
//! # Running
//!
//! ```bash
//! export OPENAI_API_KEY="sk-..."
//! export GROQ_API_KEY="gsk_..."   # optional backup
//! cargo run --example single_call -- "SWOT Analysis" "Should we open an office in Berlin?"
//! ```

use llm_debate::{CompletionClient, DebateConfig, DebateSession, ProviderRole, UseCase};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let use_case: UseCase = args
        .next()
        .unwrap_or_else(|| UseCase::GeneralDiscussion.label().to_string())
        .parse()?;
    let question = args
        .next()
        .unwrap_or_else(|| "Is remote work better than office work?".to_string());

    let config = match DebateConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e.user_message());
            return Err(e.into());
        }
    };
    let client = CompletionClient::new(config.params.timeout);
    let session = DebateSession::new(&config, &client);

    // Ctrl-C stops any rate-limit wait
    let cancel = session.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    println!("Debating '{question}' as {use_case}...");

    match session
        .run_debate(ProviderRole::Primary, use_case, &question)
        .await
    {
        Ok(outcome) => {
            for (field, value) in outcome.parsed.fields() {
                println!("\n{field}:\n  {value}");
            }
            if outcome.parsed.needs_inspection() {
                println!("\nRaw answer:\n{}", outcome.parsed.raw);
            }
            println!(
                "\nAnswered by {} after {} attempt(s) in {:.1}s",
                outcome.provider,
                outcome.attempts,
                outcome.duration.as_secs_f64()
            );
            if let Some(cost) = outcome.estimated_cost {
                println!(
                    "Estimated cost: ${cost:.5} for ~{} tokens",
                    outcome.estimated_tokens
                );
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("{}", e.user_message());
            Err(e.into())
        }
    }
}
