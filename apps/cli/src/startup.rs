//! Startup handshake against the Ollama server
//!
//! Runs the fixed pre-chat sequence: connectivity check, version,
//! model listing, capability display, embedding-model pull, and the
//! embedding smoke test. Any failure here is fatal and must happen
//! before the first chat call.

use std::time::Duration;

use anyhow::Context;
use futures_util::StreamExt;

use parley_ollama_client::OllamaClient;

use crate::config::{Config, EMBEDDING_PROBE};
use crate::render;

/// Run the startup sequence; an error means the process must exit
/// without entering the chat loop
pub async fn run_handshake(client: &OllamaClient, config: &Config) -> anyhow::Result<()> {
    render::print_connecting();
    let connect_bound = Duration::from_secs(config.ollama.connect_timeout_secs);
    match tokio::time::timeout(connect_bound, client.heartbeat()).await {
        Ok(Ok(())) => render::print_connected(),
        Ok(Err(e)) => {
            render::print_connection_failure(&config.ollama.url);
            return Err(e).context("Connectivity check failed");
        }
        Err(_) => {
            render::print_connection_failure(&config.ollama.url);
            anyhow::bail!(
                "Connectivity check timed out after {} seconds",
                config.ollama.connect_timeout_secs
            );
        }
    }

    let version = client.version().await.context("Failed to get version")?;
    render::print_version(&version);

    let models = client.list_models().await.context("Failed to list models")?;
    render::print_models(&models, &config.ollama.model);
    render::print_selected_models(&config.ollama.model, &config.ollama.embedding_model);

    let show = client
        .show(&config.ollama.model)
        .await
        .context("Failed to fetch model capabilities")?;
    render::print_capabilities(&config.ollama.model, &show);

    pull_embedding_model(client, &config.ollama.embedding_model)
        .await
        .context("Failed to pull embedding model")?;

    let embedding = client
        .embed(EMBEDDING_PROBE)
        .await
        .context("Embedding smoke test failed")?;
    render::print_embedding_result(&config.ollama.embedding_model, embedding.len());

    Ok(())
}

/// Pull the embedding model, rendering streamed progress in place
async fn pull_embedding_model(client: &OllamaClient, model: &str) -> anyhow::Result<()> {
    println!();
    let mut progress = client.pull(model).await?;
    while let Some(update) = progress.next().await {
        render::print_pull_progress(&update?);
    }
    render::finish_pull(model);
    Ok(())
}
