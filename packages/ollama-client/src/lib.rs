//! Ollama API client for Parley
//!
//! This crate provides a typed async client for the Ollama HTTP API:
//! connectivity check, version query, model listing and inspection,
//! streaming model pulls, embeddings, and streaming completions over
//! both the single-prompt generate endpoint and the multi-turn chat
//! endpoint.
//!
//! # Requirements
//!
//! - Ollama must be running and accessible at the configured URL
//! - Chat models must be pulled before use:
//!   ```bash
//!   ollama pull gpt-oss:20b
//!   ```
//!
//! # Thread Safety
//!
//! `OllamaClient` is `Clone + Send + Sync` and can be safely shared
//! across threads. It uses a shared HTTP client connection pool.
//!
//! # Example
//!
//! ```no_run
//! use futures_util::StreamExt;
//! use parley_ollama_client::{ChatMessage, OllamaClient};
//! use parley_shared_config::OllamaConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = OllamaConfig::default();
//! let client = OllamaClient::new(&config)?;
//!
//! client.heartbeat().await?;
//! println!("Server version: {}", client.version().await?);
//!
//! let messages = vec![
//!     ChatMessage::system("You are a helpful assistant."),
//!     ChatMessage::user("Hello!"),
//! ];
//! let mut stream = client.chat_stream(messages, None, None).await?;
//! while let Some(chunk) = stream.next().await {
//!     print!("{}", chunk?.message.content);
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod models;

pub use client::{ChunkStream, OllamaClient};
pub use error::{OllamaError, OllamaResult};
pub use models::{
    ChatChunk, ChatMessage, ChatRequest, ChatRole, ChunkMessage, EmbeddingRequest,
    EmbeddingResponse, GenerateChunk, GenerateOptions, GenerateRequest, ListModelsResponse,
    ModelDetails, ModelInfo, PullProgress, PullRequest, ShowRequest, ShowResponse, ThinkLevel,
    VersionResponse,
};
