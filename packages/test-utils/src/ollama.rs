//! Mock Ollama server for testing
//!
//! Provides a [`MockOllamaServer`] that simulates the Ollama API
//! endpoints Parley uses, including NDJSON streaming responses.

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Mock Ollama server for testing
///
/// This struct wraps a [`wiremock::MockServer`] and provides convenience
/// methods for setting up common Ollama API responses.
///
/// # Example
///
/// ```rust,ignore
/// use parley_test_utils::MockOllamaServer;
///
/// #[tokio::test]
/// async fn test_chat() {
///     let server = MockOllamaServer::start().await;
///     server.mock_chat_stream(&["Hi", " there"]).await;
///
///     // Configure your Ollama client with server.url()
///     let url = server.url();
///     // ... run your test
/// }
/// ```
pub struct MockOllamaServer {
    server: MockServer,
}

impl MockOllamaServer {
    /// Start a new mock Ollama server
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Get the server URL
    pub fn url(&self) -> String {
        self.server.uri()
    }

    /// Get reference to the underlying mock server for custom mock setups
    pub fn inner(&self) -> &MockServer {
        &self.server
    }

    /// Mount a mock for the heartbeat endpoint (GET /)
    pub async fn mock_heartbeat(&self) {
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Ollama is running"))
            .mount(&self.server)
            .await;
    }

    /// Mount a mock for the version endpoint
    pub async fn mock_version(&self, version: &str) {
        Mock::given(method("GET"))
            .and(path("/api/version"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "version": version
            })))
            .mount(&self.server)
            .await;
    }

    /// Mount a mock for the /api/tags endpoint (list models)
    pub async fn mock_list_models(&self, models: &[&str]) {
        let model_list: Vec<serde_json::Value> = models
            .iter()
            .map(|name| {
                json!({
                    "name": name,
                    "modified_at": "2024-01-01T00:00:00Z",
                    "size": 4_000_000_000_i64
                })
            })
            .collect();

        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "models": model_list
            })))
            .mount(&self.server)
            .await;
    }

    /// Mount a mock for the model show endpoint
    pub async fn mock_show(&self, capabilities: &[&str]) {
        Mock::given(method("POST"))
            .and(path("/api/show"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "capabilities": capabilities,
                "details": {"family": "gptoss", "parameter_size": "20.9B"}
            })))
            .mount(&self.server)
            .await;
    }

    /// Mount a mock for a successful streaming model pull
    pub async fn mock_pull_success(&self) {
        let body = concat!(
            r#"{"status":"pulling manifest"}"#,
            "\n",
            r#"{"status":"pulling aabbcc","digest":"sha256:aabbcc","total":1000,"completed":1000}"#,
            "\n",
            r#"{"status":"success"}"#,
            "\n",
        );

        Mock::given(method("POST"))
            .and(path("/api/pull"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&self.server)
            .await;
    }

    /// Mount a mock for a failed model pull
    pub async fn mock_pull_failure(&self, status_code: u16, error_message: &str) {
        Mock::given(method("POST"))
            .and(path("/api/pull"))
            .respond_with(
                ResponseTemplate::new(status_code).set_body_json(json!({
                    "error": error_message
                })),
            )
            .mount(&self.server)
            .await;
    }

    /// Mount a mock for successful embedding generation
    ///
    /// Returns a 768-dimensional embedding (nomic-embed-text dimension)
    pub async fn mock_embeddings_success(&self) {
        let embedding: Vec<f32> = (0..768).map(|i| (i as f32 * 0.001) % 1.0).collect();

        Mock::given(method("POST"))
            .and(path("/api/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "embedding": embedding
            })))
            .mount(&self.server)
            .await;
    }

    /// Mount a mock for embedding generation failure
    pub async fn mock_embeddings_failure(&self, status_code: u16, error_message: &str) {
        Mock::given(method("POST"))
            .and(path("/api/embeddings"))
            .respond_with(
                ResponseTemplate::new(status_code).set_body_json(json!({
                    "error": error_message
                })),
            )
            .mount(&self.server)
            .await;
    }

    /// Mount a mock for a streaming chat completion
    ///
    /// Each fragment becomes one NDJSON chunk; a final `done` chunk with
    /// empty content closes the stream.
    pub async fn mock_chat_stream(&self, fragments: &[&str]) {
        let mut body = String::new();
        for fragment in fragments {
            body.push_str(
                &json!({
                    "message": {"role": "assistant", "content": fragment},
                    "done": false
                })
                .to_string(),
            );
            body.push('\n');
        }
        body.push_str(
            &json!({
                "message": {"role": "assistant", "content": ""},
                "done": true,
                "done_reason": "stop"
            })
            .to_string(),
        );
        body.push('\n');

        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&self.server)
            .await;
    }

    /// Mount a mock for a streaming chat completion with reasoning
    ///
    /// Thinking fragments stream first, then answer fragments, matching
    /// how thinking-capable models deliver chunks.
    pub async fn mock_chat_stream_with_thinking(&self, thinking: &[&str], answer: &[&str]) {
        let mut body = String::new();
        for fragment in thinking {
            body.push_str(
                &json!({
                    "message": {"role": "assistant", "content": "", "thinking": fragment},
                    "done": false
                })
                .to_string(),
            );
            body.push('\n');
        }
        for fragment in answer {
            body.push_str(
                &json!({
                    "message": {"role": "assistant", "content": fragment},
                    "done": false
                })
                .to_string(),
            );
            body.push('\n');
        }
        body.push_str(
            &json!({
                "message": {"role": "assistant", "content": ""},
                "done": true,
                "done_reason": "stop"
            })
            .to_string(),
        );
        body.push('\n');

        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&self.server)
            .await;
    }

    /// Mount a mock for a chat completion with a verbatim NDJSON body
    ///
    /// For exercising malformed or truncated streams.
    pub async fn mock_chat_raw(&self, body: &str) {
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body.to_string()))
            .mount(&self.server)
            .await;
    }

    /// Mount a mock for chat completion failure
    pub async fn mock_chat_failure(&self, status_code: u16, error_message: &str) {
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(
                ResponseTemplate::new(status_code).set_body_json(json!({
                    "error": error_message
                })),
            )
            .mount(&self.server)
            .await;
    }

    /// Mount a mock for a streaming generate completion
    pub async fn mock_generate_stream(&self, fragments: &[&str]) {
        let mut body = String::new();
        for fragment in fragments {
            body.push_str(
                &json!({
                    "response": fragment,
                    "done": false
                })
                .to_string(),
            );
            body.push('\n');
        }
        body.push_str(
            &json!({
                "response": "",
                "done": true,
                "done_reason": "stop"
            })
            .to_string(),
        );
        body.push('\n');

        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&self.server)
            .await;
    }

    /// Mount a mock for a delayed chat response (for timeout tests)
    pub async fn mock_chat_delay(&self, delay_ms: u64) {
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(std::time::Duration::from_millis(delay_ms))
                    .set_body_string(
                        r#"{"message":{"role":"assistant","content":"late"},"done":true}
"#,
                    ),
            )
            .mount(&self.server)
            .await;
    }
}
