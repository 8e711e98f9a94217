//! CLI configuration loaded from environment variables
//!
//! Wraps the shared Ollama configuration and adds the knobs that only
//! the terminal client cares about: the system message file, the
//! reasoning effort, and what to do with history when a call fails.

use std::env;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use parley_ollama_client::ThinkLevel;
use parley_shared_config::OllamaConfig;

use crate::session::{CompletionMode, FailurePolicy};

/// System message used when the system message file cannot be read
pub const FALLBACK_SYSTEM_MESSAGE: &str = "You are a helpful assistant.";

/// Text embedded during the startup embedding smoke test
pub const EMBEDDING_PROBE: &str = "The quick brown fox jumps over the lazy dog.";

/// Inputs that end the chat loop, compared case-insensitively
pub const EXIT_TOKENS: &[&str] = &["exit", "quit"];

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Shared Ollama configuration
    pub ollama: OllamaConfig,

    /// Path to the optional system message file
    pub system_message_path: PathBuf,

    /// What happens to appended turns when a completion call fails
    pub failure_policy: FailurePolicy,

    /// Which completion endpoint the loop drives
    pub mode: CompletionMode,

    /// Reasoning effort, None to disable thinking
    pub think: Option<ThinkLevel>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let ollama = OllamaConfig::from_env()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

        let failure_policy = env::var("PARLEY_FAILURE_POLICY")
            .unwrap_or_else(|_| "keep".to_string())
            .parse()
            .map_err(|e: String| anyhow::anyhow!(e))
            .context("Invalid PARLEY_FAILURE_POLICY value")?;

        let mode = env::var("PARLEY_MODE")
            .unwrap_or_else(|_| "chat".to_string())
            .parse()
            .map_err(|e: String| anyhow::anyhow!(e))
            .context("Invalid PARLEY_MODE value")?;

        let think = match env::var("PARLEY_THINK")
            .unwrap_or_else(|_| "low".to_string())
            .to_lowercase()
            .as_str()
        {
            "off" | "none" => None,
            level => Some(
                level
                    .parse()
                    .map_err(|e: String| anyhow::anyhow!(e))
                    .context("Invalid PARLEY_THINK value")?,
            ),
        };

        Ok(Self {
            ollama,
            system_message_path: PathBuf::from(
                env::var("PARLEY_SYSTEM_FILE").unwrap_or_else(|_| "system.txt".to_string()),
            ),
            failure_policy,
            mode,
            think,
        })
    }
}

/// Read the system message file, trimmed of surrounding whitespace
pub fn load_system_message(path: &Path) -> io::Result<String> {
    let contents = std::fs::read_to_string(path)?;
    Ok(contents.trim().to_string())
}
