//! Test utilities for Parley
//!
//! Provides a mock Ollama server so client and session tests can run
//! without a real Ollama instance.

mod ollama;

pub use ollama::MockOllamaServer;
