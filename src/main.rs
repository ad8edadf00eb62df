use std::sync::Arc;

use anyhow::{Context, Result};
use teloxide::Bot;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use jokebot::config::{self, Config};
use jokebot::dispatcher::ResponseDispatcher;
use jokebot::langsmith::{RunTracer, TracedCompletion};
use jokebot::llm::LlmClient;
use jokebot::mention::MentionParser;
use jokebot::platform::telegram;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,jokebot=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    config::load_dotenv();
    let config = Config::from_env().context("Failed to load configuration")?;

    info!("  Provider: {}", config.llm.provider);
    info!("  Model: {}", config.llm.model);

    let tracer = RunTracer::new(config.tracing.clone());
    info!(
        "  Run tracing: {}",
        if tracer.is_enabled() { "enabled" } else { "disabled" }
    );

    let completion = TracedCompletion::new(
        LlmClient::new(config.llm.clone()),
        config.llm.model.clone(),
        tracer,
    );

    let bot = Bot::new(&config.telegram.bot_token);
    let handle = telegram::fetch_handle(&bot).await?;
    info!("Logged in as @{}", handle);

    telegram::register_commands(&bot).await;

    let parser = MentionParser::new(&handle)?;
    let dispatcher = Arc::new(ResponseDispatcher::new(parser, Arc::new(completion)));

    info!("Bot running...");
    telegram::run(bot, dispatcher).await?;

    Ok(())
}
