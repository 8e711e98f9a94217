//! Core Ollama HTTP client with NDJSON streaming support

use std::marker::PhantomData;
use std::pin::Pin;
use std::time::Duration;

use bytes::Bytes;
use futures_util::Stream;
use parley_shared_config::OllamaConfig;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::{OllamaError, OllamaResult};
use crate::models::{
    ChatChunk, ChatMessage, ChatRequest, EmbeddingRequest, EmbeddingResponse, GenerateChunk,
    GenerateOptions, GenerateRequest, ListModelsResponse, ModelInfo, PullProgress, PullRequest,
    ShowRequest, ShowResponse, ThinkLevel, VersionResponse,
};

/// Maximum error body size to prevent memory exhaustion
const MAX_ERROR_BODY_SIZE: usize = 1000;

/// A pinned, boxed stream of typed NDJSON chunks
pub type ChunkStream<T> = Pin<Box<dyn Stream<Item = OllamaResult<T>> + Send>>;

/// Ollama API client with connection pooling
///
/// Failed calls surface their error exactly once; there is no retry
/// layer. Completion timeouts are the caller's responsibility, so long
/// streams (chat, pull) are never cut off by the HTTP client itself.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    /// HTTP client with connection pool
    http_client: Client,
    /// Configuration
    config: OllamaConfig,
}

impl OllamaClient {
    /// Create a new Ollama client from configuration
    pub fn new(config: &OllamaConfig) -> OllamaResult<Self> {
        let http_client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .build()
            .map_err(OllamaError::HttpError)?;

        Ok(Self {
            http_client,
            config: config.clone(),
        })
    }

    /// Create a client with custom HTTP client (for testing)
    pub fn with_client(config: &OllamaConfig, http_client: Client) -> Self {
        Self {
            http_client,
            config: config.clone(),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &OllamaConfig {
        &self.config
    }

    /// Map a reqwest send error onto the client error variants
    fn map_send_error(&self, e: reqwest::Error) -> OllamaError {
        if e.is_connect() {
            OllamaError::ConnectionRefused(self.config.url.clone())
        } else if e.is_timeout() {
            OllamaError::Timeout(self.config.connect_timeout_secs)
        } else {
            OllamaError::HttpError(e)
        }
    }

    /// Turn a non-2xx response into an error, reading a bounded body
    ///
    /// When `model` is given, a "model ... not found" body maps to
    /// [`OllamaError::ModelNotFound`] so callers can print a pull hint.
    async fn error_for_status(
        response: Response,
        model: Option<&str>,
    ) -> OllamaResult<Response> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = Self::truncate_error_body(response.text().await.unwrap_or_default());

        if let Some(model) = model {
            if body.contains("model") && body.contains("not found") {
                return Err(OllamaError::ModelNotFound(model.to_string()));
            }
        }

        Err(OllamaError::ApiError(format!("Status {}: {}", status, body)))
    }

    /// Truncate error body to prevent memory exhaustion
    /// Safely handles UTF-8 boundaries to avoid panics on multi-byte characters
    fn truncate_error_body(body: String) -> String {
        if body.len() <= MAX_ERROR_BODY_SIZE {
            return body;
        }

        let truncate_at = body
            .char_indices()
            .map(|(i, _)| i)
            .take_while(|i| *i <= MAX_ERROR_BODY_SIZE)
            .last()
            .unwrap_or(0);

        format!("{}... (truncated)", &body[..truncate_at])
    }

    /// Check that the Ollama server is reachable
    pub async fn heartbeat(&self) -> OllamaResult<()> {
        let response = self
            .http_client
            .get(self.config.base_url())
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        Self::error_for_status(response, None).await?;
        Ok(())
    }

    /// Get the server version string
    pub async fn version(&self) -> OllamaResult<String> {
        let response = self
            .http_client
            .get(self.config.version_url())
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let response = Self::error_for_status(response, None).await?;
        let version: VersionResponse = response.json().await?;
        Ok(version.version)
    }

    /// List locally available models
    pub async fn list_models(&self) -> OllamaResult<Vec<ModelInfo>> {
        let response = self
            .http_client
            .get(self.config.tags_url())
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let response = Self::error_for_status(response, None).await?;
        let list: ListModelsResponse = response.json().await?;
        Ok(list.models)
    }

    /// Fetch capability tags and details for a model
    pub async fn show(&self, model: &str) -> OllamaResult<ShowResponse> {
        let request = ShowRequest {
            model: model.to_string(),
        };

        let response = self
            .http_client
            .post(self.config.show_url())
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let response = Self::error_for_status(response, Some(model)).await?;
        Ok(response.json().await?)
    }

    /// Pull a model, streaming progress updates
    pub async fn pull(&self, model: &str) -> OllamaResult<ChunkStream<PullProgress>> {
        debug!(model = %model, "Starting model pull");

        let request = PullRequest {
            model: model.to_string(),
            stream: true,
        };

        let response = self
            .http_client
            .post(self.config.pull_url())
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let response = Self::error_for_status(response, Some(model)).await?;
        Ok(Box::pin(NdjsonStream::new(response.bytes_stream())))
    }

    /// Generate an embedding for a single text
    pub async fn embed(&self, text: &str) -> OllamaResult<Vec<f32>> {
        let request = EmbeddingRequest {
            model: self.config.embedding_model.clone(),
            prompt: text.to_string(),
        };

        debug!(
            model = %self.config.embedding_model,
            text_len = text.len(),
            "Generating embedding"
        );

        let response = self
            .http_client
            .post(self.config.embeddings_url())
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let response =
            Self::error_for_status(response, Some(&self.config.embedding_model)).await?;
        let embedding_response: EmbeddingResponse = response.json().await?;

        debug!(
            dimensions = embedding_response.embedding.len(),
            "Embedding generated"
        );

        Ok(embedding_response.embedding)
    }

    /// Stream a single-prompt completion token by token
    ///
    /// The system message travels in its own request field rather than
    /// being folded into the prompt.
    pub async fn generate_stream(
        &self,
        prompt: &str,
        system: Option<&str>,
        options: Option<GenerateOptions>,
    ) -> OllamaResult<ChunkStream<GenerateChunk>> {
        debug!(
            model = %self.config.model,
            prompt_len = prompt.len(),
            "Starting streaming generate request"
        );

        let request = GenerateRequest {
            model: self.config.model.clone(),
            prompt: prompt.to_string(),
            system: system.map(|s| s.to_string()),
            stream: true,
            options,
        };

        let response = self
            .http_client
            .post(self.config.generate_url())
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let response = Self::error_for_status(response, Some(&self.config.model)).await?;
        Ok(Box::pin(NdjsonStream::new(response.bytes_stream())))
    }

    /// Stream a chat completion token by token
    ///
    /// Sends the full conversation history. Chunks may carry answer
    /// content, reasoning text, or both; delivery order is preserved.
    pub async fn chat_stream(
        &self,
        messages: Vec<ChatMessage>,
        think: Option<ThinkLevel>,
        options: Option<GenerateOptions>,
    ) -> OllamaResult<ChunkStream<ChatChunk>> {
        debug!(
            model = %self.config.model,
            message_count = messages.len(),
            "Starting streaming chat request"
        );

        let request = ChatRequest {
            model: self.config.model.clone(),
            messages,
            stream: true,
            think,
            options,
        };

        let response = self
            .http_client
            .post(self.config.chat_url())
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let response = Self::error_for_status(response, Some(&self.config.model)).await?;
        Ok(Box::pin(NdjsonStream::new(response.bytes_stream())))
    }
}

/// A stream adapter that parses NDJSON (newline-delimited JSON) from a
/// byte stream into typed chunks
///
/// Bytes are buffered raw and only converted to UTF-8 per complete
/// line, so a multi-byte character split across network chunks is
/// reassembled intact. Blank lines are skipped, a trailing unterminated
/// line is drained at end-of-stream, and a malformed line surfaces as
/// an error item without ending the stream.
struct NdjsonStream<S, T> {
    inner: S,
    buffer: Vec<u8>,
    _chunk: PhantomData<T>,
}

impl<S, T> NdjsonStream<S, T> {
    fn new(stream: S) -> Self {
        Self {
            inner: stream,
            buffer: Vec::new(),
            _chunk: PhantomData,
        }
    }

    /// Decode one line of buffered bytes
    fn decode_line(bytes: &[u8]) -> String {
        match std::str::from_utf8(bytes) {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                warn!(
                    error = %e,
                    byte_count = bytes.len(),
                    "Invalid UTF-8 in streaming response line, using lossy conversion"
                );
                String::from_utf8_lossy(bytes).trim().to_string()
            }
        }
    }

    /// Pop the next non-blank complete line from the buffer
    fn next_line(&mut self) -> Option<String> {
        while let Some(newline_pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line_bytes: Vec<u8> = self.buffer.drain(..=newline_pos).collect();
            let line = Self::decode_line(&line_bytes[..newline_pos]);
            if !line.is_empty() {
                return Some(line);
            }
        }
        None
    }
}

impl<S, T, E> Stream for NdjsonStream<S, T>
where
    S: Stream<Item = Result<Bytes, E>> + Unpin,
    T: DeserializeOwned + Unpin,
    E: std::error::Error + Send + Sync + 'static,
{
    type Item = OllamaResult<T>;

    fn poll_next(
        mut self: Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Option<Self::Item>> {
        use std::task::Poll;

        loop {
            if let Some(line) = self.next_line() {
                return Poll::Ready(Some(
                    serde_json::from_str::<T>(&line).map_err(OllamaError::from),
                ));
            }

            match Pin::new(&mut self.inner).poll_next(cx) {
                Poll::Ready(Some(Ok(bytes))) => self.buffer.extend_from_slice(&bytes),
                Poll::Ready(Some(Err(e))) => {
                    return Poll::Ready(Some(Err(OllamaError::ApiError(e.to_string()))));
                }
                Poll::Ready(None) => {
                    // Stream ended; drain any trailing unterminated line
                    let bytes = std::mem::take(&mut self.buffer);
                    let line = Self::decode_line(&bytes);
                    if line.is_empty() {
                        return Poll::Ready(None);
                    }
                    return Poll::Ready(Some(
                        serde_json::from_str::<T>(&line).map_err(OllamaError::from),
                    ));
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(server_url: &str) -> OllamaConfig {
        OllamaConfig::with_url(server_url)
    }

    fn test_client(server_url: &str) -> OllamaClient {
        OllamaClient::new(&test_config(server_url)).unwrap()
    }

    #[test]
    fn test_client_creation() {
        let config = OllamaConfig::default();
        let client = OllamaClient::new(&config);
        assert!(client.is_ok());
    }

    #[test]
    fn test_truncate_error_body() {
        let short = "short error".to_string();
        assert_eq!(OllamaClient::truncate_error_body(short.clone()), short);

        let long = "x".repeat(2000);
        let truncated = OllamaClient::truncate_error_body(long);
        assert!(truncated.len() < 1100);
        assert!(truncated.ends_with("... (truncated)"));
    }

    #[test]
    fn test_truncate_error_body_utf8_boundary() {
        // '日' is 3 bytes in UTF-8
        let utf8_str = "日".repeat(500);
        let truncated = OllamaClient::truncate_error_body(utf8_str);
        assert!(truncated.ends_with("... (truncated)"));
        let _ = truncated.chars().count();
    }

    #[test]
    fn test_truncate_error_body_exact_boundary() {
        let exact = "x".repeat(MAX_ERROR_BODY_SIZE);
        let result = OllamaClient::truncate_error_body(exact.clone());
        assert_eq!(result, exact);
    }

    // ========== heartbeat / version / list / show ==========

    #[tokio::test]
    async fn test_heartbeat_success() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Ollama is running"))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        assert!(client.heartbeat().await.is_ok());
    }

    #[tokio::test]
    async fn test_heartbeat_server_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let result = client.heartbeat().await;
        assert!(matches!(result, Err(OllamaError::ApiError(_))));
    }

    #[tokio::test]
    async fn test_version() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/version"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"version": "0.11.4"})),
            )
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        assert_eq!(client.version().await.unwrap(), "0.11.4");
    }

    #[tokio::test]
    async fn test_list_models() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "models": [
                    {"name": "gpt-oss:20b", "size": 13_000_000_000_u64},
                    {"name": "nomic-embed-text:latest", "size": 274_000_000_u64}
                ]
            })))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let models = client.list_models().await.unwrap();
        assert_eq!(models.len(), 2);
        assert_eq!(models[0].name, "gpt-oss:20b");
        assert_eq!(models[1].size, 274_000_000);
    }

    #[tokio::test]
    async fn test_show_capabilities() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/show"))
            .and(body_partial_json(serde_json::json!({"model": "gpt-oss:20b"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "capabilities": ["completion", "thinking"],
                "details": {"family": "gptoss", "parameter_size": "20.9B"}
            })))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let show = client.show("gpt-oss:20b").await.unwrap();
        assert_eq!(show.capabilities, vec!["completion", "thinking"]);
        assert_eq!(
            show.details.unwrap().parameter_size.as_deref(),
            Some("20.9B")
        );
    }

    #[tokio::test]
    async fn test_show_model_not_found() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/show"))
            .respond_with(ResponseTemplate::new(404).set_body_string("model 'missing' not found"))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let result = client.show("missing").await;
        assert!(matches!(result, Err(OllamaError::ModelNotFound(_))));
    }

    // ========== embed ==========

    #[tokio::test]
    async fn test_embed() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "embedding": [0.1, 0.2, 0.3]
            })))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let embedding = client.embed("hello").await.unwrap();
        assert_eq!(embedding.len(), 3);
    }

    #[tokio::test]
    async fn test_embed_model_not_found() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/embeddings"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_string("model 'nomic-embed-text' not found, try pulling it first"),
            )
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let result = client.embed("hello").await;
        assert!(matches!(result, Err(OllamaError::ModelNotFound(_))));
    }

    // ========== pull ==========

    #[tokio::test]
    async fn test_pull_streams_progress() {
        let server = MockServer::start().await;

        let streaming_response = r#"{"status":"pulling manifest"}
{"status":"pulling aabbcc","digest":"sha256:aabbcc","total":1000,"completed":500}
{"status":"success"}
"#;

        Mock::given(method("POST"))
            .and(path("/api/pull"))
            .respond_with(ResponseTemplate::new(200).set_body_string(streaming_response))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let mut stream = client.pull("nomic-embed-text").await.unwrap();

        let mut updates = Vec::new();
        while let Some(result) = stream.next().await {
            updates.push(result.unwrap());
        }

        assert_eq!(updates.len(), 3);
        assert_eq!(updates[0].status, "pulling manifest");
        assert_eq!(updates[1].completed, Some(500));
        assert_eq!(updates[2].status, "success");
    }

    // ========== generate_stream ==========

    #[tokio::test]
    async fn test_generate_stream() {
        let server = MockServer::start().await;

        let streaming_response = r#"{"response":"Hi","done":false}
{"response":" there","done":false}
{"response":"","done":true,"done_reason":"stop"}
"#;

        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(body_partial_json(serde_json::json!({
                "prompt": "hello",
                "system": "You are terse."
            })))
            .respond_with(ResponseTemplate::new(200).set_body_string(streaming_response))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let mut stream = client
            .generate_stream("hello", Some("You are terse."), None)
            .await
            .unwrap();

        let mut text = String::new();
        while let Some(result) = stream.next().await {
            text.push_str(&result.unwrap().response);
        }

        assert_eq!(text, "Hi there");
    }

    // ========== chat_stream ==========

    #[tokio::test]
    async fn test_chat_stream_parses_ndjson() {
        let server = MockServer::start().await;

        let streaming_response = r#"{"message":{"role":"assistant","content":"Hello"},"done":false}
{"message":{"role":"assistant","content":" world"},"done":false}
{"message":{"role":"assistant","content":"!"},"done":true,"done_reason":"stop"}
"#;

        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_string(streaming_response))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let messages = vec![ChatMessage::user("Hi")];
        let mut stream = client.chat_stream(messages, None, None).await.unwrap();

        let mut chunks = Vec::new();
        while let Some(result) = stream.next().await {
            chunks.push(result.unwrap());
        }

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].message.content, "Hello");
        assert!(!chunks[0].done);
        assert_eq!(chunks[1].message.content, " world");
        assert_eq!(chunks[2].message.content, "!");
        assert!(chunks[2].done);
        assert_eq!(chunks[2].done_reason, Some("stop".to_string()));
    }

    #[tokio::test]
    async fn test_chat_stream_carries_thinking() {
        let server = MockServer::start().await;

        let streaming_response = r#"{"message":{"role":"assistant","thinking":"Consider"},"done":false}
{"message":{"role":"assistant","thinking":" the question"},"done":false}
{"message":{"role":"assistant","content":"Answer"},"done":true}
"#;

        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_partial_json(serde_json::json!({"think": "low"})))
            .respond_with(ResponseTemplate::new(200).set_body_string(streaming_response))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let messages = vec![ChatMessage::user("Hi")];
        let mut stream = client
            .chat_stream(messages, Some(ThinkLevel::Low), None)
            .await
            .unwrap();

        let first = stream.next().await.unwrap().unwrap();
        assert_eq!(first.message.thinking.as_deref(), Some("Consider"));
        assert_eq!(first.message.content, "");

        let second = stream.next().await.unwrap().unwrap();
        assert_eq!(second.message.thinking.as_deref(), Some(" the question"));

        let third = stream.next().await.unwrap().unwrap();
        assert_eq!(third.message.content, "Answer");
        assert!(third.done);
    }

    #[tokio::test]
    async fn test_chat_stream_handles_empty_lines() {
        let server = MockServer::start().await;

        let streaming_response = r#"{"message":{"role":"assistant","content":"a"},"done":false}

{"message":{"role":"assistant","content":"b"},"done":true}
"#;

        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_string(streaming_response))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let mut stream = client
            .chat_stream(vec![ChatMessage::user("test")], None, None)
            .await
            .unwrap();

        let mut chunks = Vec::new();
        while let Some(result) = stream.next().await {
            chunks.push(result.unwrap());
        }

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].message.content, "a");
        assert_eq!(chunks[1].message.content, "b");
    }

    #[tokio::test]
    async fn test_chat_stream_handles_trailing_data() {
        let server = MockServer::start().await;

        // No trailing newline; the final buffered line must still be drained
        let streaming_response =
            r#"{"message":{"role":"assistant","content":"final"},"done":true}"#;

        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_string(streaming_response))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let mut stream = client
            .chat_stream(vec![ChatMessage::user("test")], None, None)
            .await
            .unwrap();

        let chunk = stream.next().await.unwrap().unwrap();
        assert_eq!(chunk.message.content, "final");
        assert!(chunk.done);
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_chat_stream_http_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let result = client
            .chat_stream(vec![ChatMessage::user("test")], None, None)
            .await;

        match result {
            Err(OllamaError::ApiError(_)) => {}
            Err(e) => panic!("Expected ApiError, got: {:?}", e),
            Ok(_) => panic!("Expected error, got Ok"),
        }
    }

    #[tokio::test]
    async fn test_chat_stream_model_not_found() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(
                ResponseTemplate::new(404).set_body_string("model 'gpt-oss:20b' not found"),
            )
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let result = client
            .chat_stream(vec![ChatMessage::user("test")], None, None)
            .await;

        match result {
            Err(OllamaError::ModelNotFound(_)) => {}
            Err(e) => panic!("Expected ModelNotFound, got: {:?}", e),
            Ok(_) => panic!("Expected error, got Ok"),
        }
    }

    #[tokio::test]
    async fn test_chat_stream_invalid_json() {
        let server = MockServer::start().await;

        let streaming_response = r#"{"message":{"role":"assistant","content":"ok"},"done":false}
not valid json
{"message":{"role":"assistant","content":"after"},"done":true}
"#;

        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_string(streaming_response))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let mut stream = client
            .chat_stream(vec![ChatMessage::user("test")], None, None)
            .await
            .unwrap();

        let first = stream.next().await.unwrap();
        assert_eq!(first.unwrap().message.content, "ok");

        // The malformed line surfaces an error without ending the stream
        let second = stream.next().await.unwrap();
        assert!(matches!(second.unwrap_err(), OllamaError::JsonError(_)));

        let third = stream.next().await.unwrap();
        assert_eq!(third.unwrap().message.content, "after");
    }

    // ========== NdjsonStream unit tests ==========

    #[tokio::test]
    async fn test_ndjson_stream_multiple_lines_in_single_chunk() {
        use tokio_stream::iter;

        let data = Bytes::from(
            r#"{"message":{"role":"assistant","content":"a"},"done":false}
{"message":{"role":"assistant","content":"b"},"done":true}
"#,
        );

        let byte_stream = iter(vec![Ok::<_, std::io::Error>(data)]);
        let mut ndjson_stream: NdjsonStream<_, ChatChunk> = NdjsonStream::new(byte_stream);

        let first = ndjson_stream.next().await.unwrap().unwrap();
        assert_eq!(first.message.content, "a");

        let second = ndjson_stream.next().await.unwrap().unwrap();
        assert_eq!(second.message.content, "b");
        assert!(second.done);

        assert!(ndjson_stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_ndjson_stream_split_across_chunks() {
        use tokio_stream::iter;

        let chunk1 = Bytes::from(r#"{"message":{"role":"assistant","#);
        let chunk2 = Bytes::from(
            r#""content":"split"},"done":true}
"#,
        );

        let byte_stream = iter(vec![
            Ok::<_, std::io::Error>(chunk1),
            Ok::<_, std::io::Error>(chunk2),
        ]);
        let mut ndjson_stream: NdjsonStream<_, ChatChunk> = NdjsonStream::new(byte_stream);

        let result = ndjson_stream.next().await.unwrap().unwrap();
        assert_eq!(result.message.content, "split");
        assert!(result.done);
    }

    #[tokio::test]
    async fn test_ndjson_stream_multibyte_split_mid_character() {
        use tokio_stream::iter;

        // '日' is three bytes; split the chunk inside the character so
        // reassembly must happen at the byte level
        let full = r#"{"message":{"role":"assistant","content":"日"},"done":true}
"#
        .as_bytes();
        let split_at = full
            .iter()
            .position(|&b| b >= 0x80)
            .map(|i| i + 1)
            .unwrap();

        let byte_stream = iter(vec![
            Ok::<_, std::io::Error>(Bytes::copy_from_slice(&full[..split_at])),
            Ok::<_, std::io::Error>(Bytes::copy_from_slice(&full[split_at..])),
        ]);
        let mut ndjson_stream: NdjsonStream<_, ChatChunk> = NdjsonStream::new(byte_stream);

        let chunk = ndjson_stream.next().await.unwrap().unwrap();
        assert_eq!(chunk.message.content, "日");
        assert!(chunk.done);
    }

    #[tokio::test]
    async fn test_ndjson_stream_parses_pull_progress() {
        use tokio_stream::iter;

        let data = Bytes::from(
            r#"{"status":"pulling manifest"}
{"status":"success"}
"#,
        );

        let byte_stream = iter(vec![Ok::<_, std::io::Error>(data)]);
        let mut ndjson_stream: NdjsonStream<_, PullProgress> = NdjsonStream::new(byte_stream);

        assert_eq!(
            ndjson_stream.next().await.unwrap().unwrap().status,
            "pulling manifest"
        );
        assert_eq!(
            ndjson_stream.next().await.unwrap().unwrap().status,
            "success"
        );
        assert!(ndjson_stream.next().await.is_none());
    }
}
