//! Parley: terminal chat client for a local Ollama server
//!
//! Startup runs a fixed handshake against the server (heartbeat,
//! version, model listing, capabilities, embedding-model pull,
//! embedding smoke test); any failure there is fatal. The chat loop
//! that follows only ever ends on an exit token.

use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use console::style;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use parley_ollama_client::OllamaClient;

mod config;
mod render;
mod repl;
mod session;
mod startup;

use config::{load_system_message, Config, FALLBACK_SYSTEM_MESSAGE};
use session::ChatSession;

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "parley=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", style("[ERROR]").red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    let client =
        OllamaClient::new(&config.ollama).context("Failed to create Ollama client")?;

    let system_message = match load_system_message(&config.system_message_path) {
        Ok(message) => message,
        Err(e) => {
            warn!(
                path = %config.system_message_path.display(),
                error = %e,
                "Could not load system message, using fallback"
            );
            FALLBACK_SYSTEM_MESSAGE.to_string()
        }
    };

    startup::run_handshake(&client, &config).await?;

    info!(
        model = %config.ollama.model,
        mode = ?config.mode,
        "Startup complete, entering chat loop"
    );

    let session = ChatSession::new(system_message)
        .with_policy(config.failure_policy)
        .with_mode(config.mode)
        .with_think(config.think)
        .with_timeout(Duration::from_secs(config.ollama.timeout_secs));

    repl::run(&client, session).await
}
