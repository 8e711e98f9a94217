//! Request and response types for the Ollama API

use serde::{Deserialize, Serialize};

/// Chat message role
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// A single chat message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    /// Role of the message sender
    pub role: ChatRole,
    /// Content of the message
    pub content: String,
}

impl ChatMessage {
    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// Reasoning effort requested from models that support thinking
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ThinkLevel {
    Low,
    Medium,
    High,
}

impl std::str::FromStr for ThinkLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(format!("unknown think level: {}", other)),
        }
    }
}

/// Options for text generation
#[derive(Debug, Clone, Serialize, Default)]
pub struct GenerateOptions {
    /// Temperature (0.0 - 1.0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Maximum tokens to generate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_predict: Option<u32>,
    /// Top-p sampling
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    /// Top-k sampling
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
}

/// Request for chat completion
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    /// Model to use
    pub model: String,
    /// Chat messages, oldest first
    pub messages: Vec<ChatMessage>,
    /// Whether to stream the response
    pub stream: bool,
    /// Reasoning effort, for models with a thinking capability
    #[serde(skip_serializing_if = "Option::is_none")]
    pub think: Option<ThinkLevel>,
    /// Generation options
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<GenerateOptions>,
}

/// Incremental message payload inside a streamed chat chunk
///
/// `content` and `thinking` arrive independently: thinking-capable models
/// stream deliberation first, then answer text.
#[derive(Debug, Clone, Deserialize)]
pub struct ChunkMessage {
    /// Role of the sender (assistant for generated chunks)
    #[serde(default)]
    pub role: Option<ChatRole>,
    /// Incremental answer text
    #[serde(default)]
    pub content: String,
    /// Incremental reasoning text
    #[serde(default)]
    pub thinking: Option<String>,
}

/// One streamed chunk of a chat completion
#[derive(Debug, Clone, Deserialize)]
pub struct ChatChunk {
    /// Incremental message payload
    pub message: ChunkMessage,
    /// Whether generation is complete
    #[serde(default)]
    pub done: bool,
    /// Why generation stopped, present on the final chunk
    #[serde(default)]
    pub done_reason: Option<String>,
}

/// Request for single-prompt text generation
#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest {
    /// Model to use
    pub model: String,
    /// Prompt text
    pub prompt: String,
    /// System message, kept separate from the prompt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    /// Whether to stream the response
    pub stream: bool,
    /// Generation options
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<GenerateOptions>,
}

/// One streamed chunk of a generate completion
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateChunk {
    /// Incremental generated text
    #[serde(default)]
    pub response: String,
    /// Whether generation is complete
    #[serde(default)]
    pub done: bool,
    /// Why generation stopped, present on the final chunk
    #[serde(default)]
    pub done_reason: Option<String>,
}

/// Request for generating embeddings
#[derive(Debug, Clone, Serialize)]
pub struct EmbeddingRequest {
    /// Model to use for embeddings
    pub model: String,
    /// Text to generate embeddings for
    pub prompt: String,
}

/// Response from embedding generation
#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingResponse {
    /// Generated embedding vector
    pub embedding: Vec<f32>,
}

/// Response from listing models
#[derive(Debug, Clone, Deserialize)]
pub struct ListModelsResponse {
    /// Available models
    pub models: Vec<ModelInfo>,
}

/// Information about a local model
#[derive(Debug, Clone, Deserialize)]
pub struct ModelInfo {
    /// Model name
    pub name: String,
    /// Model size in bytes
    #[serde(default)]
    pub size: u64,
    /// Model digest
    #[serde(default)]
    pub digest: Option<String>,
    /// Last-modified timestamp
    #[serde(default)]
    pub modified_at: Option<String>,
}

/// Response from the version endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct VersionResponse {
    /// Server version string
    pub version: String,
}

/// Request for model details
#[derive(Debug, Clone, Serialize)]
pub struct ShowRequest {
    /// Model to inspect
    pub model: String,
}

/// Response from the model show endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct ShowResponse {
    /// Capability tags (e.g. "completion", "thinking", "tools")
    #[serde(default)]
    pub capabilities: Vec<String>,
    /// Model architecture details
    #[serde(default)]
    pub details: Option<ModelDetails>,
}

/// Architecture details reported by the show endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct ModelDetails {
    /// Model family (e.g. "llama")
    #[serde(default)]
    pub family: Option<String>,
    /// Parameter count label (e.g. "20.9B")
    #[serde(default)]
    pub parameter_size: Option<String>,
    /// Quantization label (e.g. "Q4_K_M")
    #[serde(default)]
    pub quantization_level: Option<String>,
}

/// Request for pulling a model
#[derive(Debug, Clone, Serialize)]
pub struct PullRequest {
    /// Model to pull
    pub model: String,
    /// Whether to stream progress updates
    pub stream: bool,
}

/// One streamed progress update from a model pull
#[derive(Debug, Clone, Deserialize)]
pub struct PullProgress {
    /// Human-readable phase (e.g. "pulling manifest", "success")
    #[serde(default)]
    pub status: String,
    /// Layer digest being downloaded
    #[serde(default)]
    pub digest: Option<String>,
    /// Total bytes for the current layer
    #[serde(default)]
    pub total: Option<u64>,
    /// Bytes downloaded so far for the current layer
    #[serde(default)]
    pub completed: Option<u64>,
}
