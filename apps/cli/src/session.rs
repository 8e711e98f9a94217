//! Conversation session: history and per-turn streaming logic
//!
//! The session owns the conversation history and drives one streaming
//! completion per turn, kept free of terminal I/O so it can be tested
//! against a mock server. Rendering goes through [`TurnRenderer`].

use std::time::Duration;

use futures_util::StreamExt;
use parley_ollama_client::{ChatMessage, OllamaClient, OllamaError, OllamaResult, ThinkLevel};
use thiserror::Error;

use crate::config::EXIT_TOKENS;

/// Classification of one line of user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Blank after trimming; no call is made
    Empty,
    /// An exit token; the loop ends
    Exit,
    /// A new user turn (trimmed)
    Message(String),
}

impl Input {
    /// Classify a raw input line
    pub fn from_line(line: &str) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Self::Empty;
        }
        let lowered = trimmed.to_lowercase();
        if EXIT_TOKENS.contains(&lowered.as_str()) {
            return Self::Exit;
        }
        Self::Message(trimmed.to_string())
    }
}

/// What happens to appended turns when a completion call fails
///
/// `KeepTurns` leaves the user turn and the (possibly empty) assistant
/// turn in place, so the failed exchange is resent as context on the
/// next call. `RollbackUser` removes both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    #[default]
    KeepTurns,
    RollbackUser,
}

impl std::str::FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "keep" => Ok(Self::KeepTurns),
            "rollback" => Ok(Self::RollbackUser),
            other => Err(format!("unknown failure policy: {}", other)),
        }
    }
}

/// Which completion endpoint the loop drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompletionMode {
    /// Role-tagged history through /api/chat
    #[default]
    Chat,
    /// Single prompt with a separate system field through /api/generate
    Generate,
}

impl std::str::FromStr for CompletionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "chat" => Ok(Self::Chat),
            "generate" => Ok(Self::Generate),
            other => Err(format!("unknown completion mode: {}", other)),
        }
    }
}

/// A failed turn; the loop reports it and continues
#[derive(Error, Debug)]
pub enum TurnError {
    #[error("completion call failed: {0}")]
    Client(#[from] OllamaError),

    #[error("completion call timed out after {0} seconds")]
    Timeout(u64),
}

/// Sink for incremental turn output
///
/// Fragments are delivered in stream order, answer and reasoning kept
/// separate. `thinking_finished` fires once, before the first answer
/// fragment when reasoning was shown, or at stream end otherwise.
pub trait TurnRenderer {
    /// One fragment of answer text
    fn answer_fragment(&mut self, text: &str);
    /// One fragment of reasoning text
    fn thinking_fragment(&mut self, text: &str);
    /// Reasoning is final and will not update again
    fn thinking_finished(&mut self);
    /// The turn is over, successfully or not
    fn turn_finished(&mut self);
}

/// An interactive conversation with append-only history
///
/// The first history entry is always the system turn. Each completed
/// turn appends exactly one user and one assistant message.
pub struct ChatSession {
    history: Vec<ChatMessage>,
    policy: FailurePolicy,
    mode: CompletionMode,
    think: Option<ThinkLevel>,
    timeout: Duration,
}

impl ChatSession {
    /// Create a session seeded with a system message
    pub fn new(system_message: impl Into<String>) -> Self {
        Self {
            history: vec![ChatMessage::system(system_message)],
            policy: FailurePolicy::default(),
            mode: CompletionMode::default(),
            think: None,
            timeout: Duration::from_secs(30),
        }
    }

    /// Set the failure policy
    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the completion mode
    pub fn with_mode(mut self, mode: CompletionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the reasoning effort
    pub fn with_think(mut self, think: Option<ThinkLevel>) -> Self {
        self.think = think;
        self
    }

    /// Set the per-turn timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The conversation so far, oldest first
    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    /// The seeded system message
    pub fn system_message(&self) -> &str {
        &self.history[0].content
    }

    /// Run one turn: append the user message, stream the completion,
    /// append the accumulated answer as the assistant turn
    ///
    /// The assistant turn is appended even when the call fails or the
    /// answer is empty; under [`FailurePolicy::RollbackUser`] a failed
    /// turn is then removed entirely. Each call gets its own timeout,
    /// released when the call returns.
    pub async fn run_turn<R: TurnRenderer>(
        &mut self,
        client: &OllamaClient,
        text: &str,
        renderer: &mut R,
    ) -> Result<(), TurnError> {
        self.history.push(ChatMessage::user(text));

        let timeout_secs = self.timeout.as_secs();
        let mut answer = String::new();
        let outcome = match tokio::time::timeout(
            self.timeout,
            self.drain_completion(client, &mut answer, renderer),
        )
        .await
        {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(TurnError::Client(e)),
            Err(_) => Err(TurnError::Timeout(timeout_secs)),
        };

        renderer.turn_finished();
        self.history.push(ChatMessage::assistant(answer));

        if outcome.is_err() && self.policy == FailurePolicy::RollbackUser {
            self.history.pop();
            self.history.pop();
        }

        outcome
    }

    /// Consume the completion stream, forwarding fragments in order
    ///
    /// Partial answer text survives a mid-stream failure because the
    /// accumulator is owned by the caller.
    async fn drain_completion<R: TurnRenderer>(
        &self,
        client: &OllamaClient,
        answer: &mut String,
        renderer: &mut R,
    ) -> OllamaResult<()> {
        match self.mode {
            CompletionMode::Chat => {
                let mut stream = client
                    .chat_stream(self.history.clone(), self.think, None)
                    .await?;

                let mut thinking_open = false;
                let mut outcome = Ok(());
                while let Some(chunk) = stream.next().await {
                    let chunk = match chunk {
                        Ok(chunk) => chunk,
                        Err(e) => {
                            outcome = Err(e);
                            break;
                        }
                    };

                    if let Some(thinking) = chunk.message.thinking.as_deref() {
                        // Reasoning stops updating once answer text starts
                        if answer.is_empty() && !thinking.is_empty() {
                            renderer.thinking_fragment(thinking);
                            thinking_open = true;
                        }
                    }

                    if !chunk.message.content.is_empty() {
                        if thinking_open {
                            renderer.thinking_finished();
                            thinking_open = false;
                        }
                        renderer.answer_fragment(&chunk.message.content);
                        answer.push_str(&chunk.message.content);
                    }
                }
                // Reasoning shown on screen must be terminated even
                // when the stream fails before any answer text
                if thinking_open {
                    renderer.thinking_finished();
                }
                outcome
            }
            CompletionMode::Generate => {
                // Single prompt; the system message travels in its own field
                let prompt = self
                    .history
                    .last()
                    .map(|m| m.content.clone())
                    .unwrap_or_default();
                let mut stream = client
                    .generate_stream(&prompt, Some(self.system_message()), None)
                    .await?;

                while let Some(chunk) = stream.next().await {
                    let chunk = chunk?;
                    if !chunk.response.is_empty() {
                        renderer.answer_fragment(&chunk.response);
                        answer.push_str(&chunk.response);
                    }
                }
                Ok(())
            }
        }
    }
}
