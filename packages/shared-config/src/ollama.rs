//! Ollama server configuration

use crate::{get_env_or_default, parse_env, ConfigResult};

/// Ollama server configuration
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    /// Ollama server URL
    pub url: String,

    /// Default chat model
    pub model: String,

    /// Embedding model for the embedding smoke test
    pub embedding_model: String,

    /// Per-completion-call timeout in seconds
    pub timeout_secs: u64,

    /// Connectivity check timeout in seconds
    pub connect_timeout_secs: u64,
}

impl OllamaConfig {
    /// Load Ollama configuration from environment variables
    pub fn from_env() -> ConfigResult<Self> {
        Ok(Self {
            url: get_env_or_default("OLLAMA_URL", "http://localhost:11434"),
            model: get_env_or_default("OLLAMA_MODEL", "gpt-oss:20b"),
            embedding_model: get_env_or_default("EMBEDDING_MODEL", "nomic-embed-text"),
            timeout_secs: parse_env("OLLAMA_TIMEOUT", 30)?,
            connect_timeout_secs: parse_env("OLLAMA_CONNECT_TIMEOUT", 5)?,
        })
    }

    /// Create a configuration with a custom URL (useful for testing)
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Base URL with any trailing slash removed
    pub fn base_url(&self) -> &str {
        self.url.trim_end_matches('/')
    }

    /// Get the full URL for the chat endpoint
    pub fn chat_url(&self) -> String {
        format!("{}/api/chat", self.base_url())
    }

    /// Get the full URL for the generation endpoint
    pub fn generate_url(&self) -> String {
        format!("{}/api/generate", self.base_url())
    }

    /// Get the full URL for the embeddings endpoint
    pub fn embeddings_url(&self) -> String {
        format!("{}/api/embeddings", self.base_url())
    }

    /// Get the full URL for the model listing endpoint
    pub fn tags_url(&self) -> String {
        format!("{}/api/tags", self.base_url())
    }

    /// Get the full URL for the version endpoint
    pub fn version_url(&self) -> String {
        format!("{}/api/version", self.base_url())
    }

    /// Get the full URL for the model show endpoint
    pub fn show_url(&self) -> String {
        format!("{}/api/show", self.base_url())
    }

    /// Get the full URL for the model pull endpoint
    pub fn pull_url(&self) -> String {
        format!("{}/api/pull", self.base_url())
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:11434".to_string(),
            model: "gpt-oss:20b".to_string(),
            embedding_model: "nomic-embed-text".to_string(),
            timeout_secs: 30,
            connect_timeout_secs: 5,
        }
    }
}
